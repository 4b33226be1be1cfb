//! Delimited text writer
//!
//! Writes the header and one line per row over the longest column. Absent
//! and missing cells render as `null`. Quoting wraps every field verbatim;
//! fields are not escaped, so embedded delimiters or quotes pass through
//! unchanged.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::DataFrame;

use super::create_output;

/// Writer for delimited text files
pub struct CsvExporter {
    path: PathBuf,
    delimiter: char,
    quoted: bool,
}

impl CsvExporter {
    pub fn new(path: &Path, delimiter: char, quoted: bool) -> Self {
        Self {
            path: path.to_path_buf(),
            delimiter,
            quoted,
        }
    }

    pub fn save(&self, frame: &DataFrame) -> Result<()> {
        let file = create_output(&self.path)?;
        self.write(BufWriter::new(file), frame)
            .map_err(|e| Error::io(&self.path, e))
    }

    fn write(&self, mut w: impl Write, frame: &DataFrame) -> io::Result<()> {
        let names: Vec<&str> = frame.column_names();
        let header: Vec<String> = names.iter().map(|n| self.field(n)).collect();
        writeln!(w, "{}", self.join(&header))?;

        for row in 0..frame.row_count() {
            let fields: Vec<String> = frame
                .columns
                .values()
                .map(|column| {
                    let text = column
                        .get(row)
                        .map(|cell| cell.to_string())
                        .unwrap_or_else(|| "null".to_string());
                    self.field(&text)
                })
                .collect();
            writeln!(w, "{}", self.join(&fields))?;
        }
        w.flush()
    }

    fn field(&self, text: &str) -> String {
        if self.quoted {
            format!("\"{text}\"")
        } else {
            text.to_string()
        }
    }

    fn join(&self, fields: &[String]) -> String {
        fields.join(&self.delimiter.to_string())
    }
}
