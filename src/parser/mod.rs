//! Parser layer for reading tabular data files

mod csv;
mod json;
mod ods;
mod xlsx;

use std::path::Path;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::model::CellValue;

pub use self::csv::CsvParser;
pub use self::json::JsonParser;
pub use self::ods::OdsParser;
pub use self::xlsx::XlsxParser;

/// Files below this size are read whole; larger ones stream line by line
pub(crate) const MEMORY_EFFICIENT_THRESHOLD: u64 = 10_000_000; // 10MB

/// Raw result of a parse: ordered columns plus row labels, ready to be
/// installed into a frame
#[derive(Debug, Default)]
pub struct Parsed {
    pub columns: IndexMap<String, Vec<CellValue>>,
    pub labels: Vec<String>,
}

/// Trait for parsing tabular data files
pub trait Importer {
    /// Parse a file into columns and labels
    fn parse(&self, path: &Path) -> Result<Parsed>;

    /// Check if this importer can handle the given file extension
    fn supports_extension(&self, ext: &str) -> bool;
}

/// Factory for picking an importer based on file extension
pub struct ImporterFactory {
    importers: Vec<Box<dyn Importer>>,
}

impl Default for ImporterFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ImporterFactory {
    /// Create a factory with all supported importers
    pub fn new() -> Self {
        Self {
            importers: vec![
                Box::new(CsvParser),
                Box::new(JsonParser),
                Box::new(XlsxParser),
                Box::new(OdsParser),
            ],
        }
    }

    /// Get an importer for the given file path
    pub fn get_importer(&self, path: &Path) -> Result<&dyn Importer> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        for importer in &self.importers {
            if importer.supports_extension(&ext) {
                return Ok(importer.as_ref());
            }
        }

        Err(Error::UnsupportedFormat(format!(
            "no importer for extension '{}'",
            ext
        )))
    }

    /// Parse a file using the appropriate importer
    pub fn parse(&self, path: &Path) -> Result<Parsed> {
        self.get_importer(path)?.parse(path)
    }
}

/// Detect file format from content (for files without a useful extension)
pub fn detect_format(path: &Path) -> Option<&'static str> {
    use std::fs::File;
    use std::io::{BufRead, BufReader, Read};

    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let mut buffer = [0u8; 4];
    reader.read_exact(&mut buffer).ok()?;

    // Zip container: xlsx or ods, told apart by their marker entries
    if &buffer == b"PK\x03\x04" {
        let archive = File::open(path).ok()?;
        if let Ok(mut zip) = zip::ZipArchive::new(archive) {
            if zip.by_name("content.xml").is_ok() {
                return Some("ods");
            }
            if zip.by_name("xl/workbook.xml").is_ok() {
                return Some("xlsx");
            }
        }
        return Some("xlsx");
    }

    // Try to detect JSON
    reader.seek_relative(-(buffer.len() as i64)).ok()?;
    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let trimmed = line.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return Some("json");
    }

    // Default to CSV
    Some("csv")
}
