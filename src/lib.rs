//! tabframe - Columnar tables with spreadsheet import/export
//!
//! An in-memory DataFrame: insertion-ordered columns of heterogeneous
//! cells with row labels, label- and position-based selection, column
//! statistics, and readers/writers for CSV/TSV, flat JSON arrays, xlsx
//! and ods files.

pub mod error;
pub mod export;
pub mod model;
pub mod parser;
pub mod select;

pub use error::{Error, Result};
pub use model::{CellValue, DataFrame, Series};
pub use select::Selector;
