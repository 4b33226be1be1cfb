//! Data model for columnar tables

mod cell;
mod frame;
mod series;

pub use cell::CellValue;
pub use frame::DataFrame;
pub use series::Series;
