//! Error types for tabframe

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Library-wide error taxonomy
#[derive(Debug, Error)]
pub enum Error {
    /// Caller-supplied data violates a contract (e.g. Series length mismatch)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Input is syntactically readable but not a supported shape
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A required part (column, archive entry, sheet) is missing
    #[error("{0} not found")]
    NotFound(String),

    /// Malformed builder usage
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// File or stream failure, with the offending path when known
    #[error("I/O error{}: {source}", .path.as_ref().map(|p| format!(" on {}", p.display())).unwrap_or_default())]
    Io {
        path: Option<PathBuf>,
        source: io::Error,
    },

    /// Malformed XML inside a spreadsheet part
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed XML attribute inside a spreadsheet part
    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    /// Zip archive failure
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl Error {
    /// Attach a path to an I/O failure
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: Some(path.into()),
            source,
        }
    }
}

impl From<io::Error> for Error {
    fn from(source: io::Error) -> Self {
        Error::Io { path: None, source }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
