//! Export layer for writing frames to disk

mod csv;
mod json;
mod ods;
mod xlsx;

use std::fs::{self, File};
use std::path::Path;

use crate::error::{Error, Result};

pub use self::csv::CsvExporter;
pub use self::json::JsonExporter;
pub use self::ods::OdsExporter;
pub use self::xlsx::XlsxExporter;

/// Create the output file, making parent directories as needed
pub(crate) fn create_output(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
    }
    File::create(path).map_err(|e| Error::io(path, e))
}
