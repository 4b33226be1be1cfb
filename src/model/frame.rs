//! DataFrame container and its import/export boundary

use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::Result;
use crate::export::{CsvExporter, JsonExporter, OdsExporter, XlsxExporter};
use crate::model::{CellValue, Series};
use crate::parser::{CsvParser, Importer, JsonParser, OdsParser, Parsed, XlsxParser};
use crate::select::Selector;

/// A columnar table: insertion-ordered columns of heterogeneous cells plus
/// a row-label sequence.
///
/// Columns may have different lengths; reads past a short column yield
/// [`CellValue::Absent`]. Query operations never mutate the frame; they
/// return fresh ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFrame {
    pub(crate) columns: IndexMap<String, Vec<CellValue>>,
    pub(crate) labels: Vec<String>,
}

impl DataFrame {
    /// Create an empty frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty frame with pre-supplied row labels
    pub fn with_labels(labels: Vec<String>) -> Self {
        Self {
            columns: IndexMap::new(),
            labels,
        }
    }

    /// Append or replace a column, copying the value sequence.
    ///
    /// Adding the first column to a frame without labels generates
    /// "0".."n-1" labels from that column's length.
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<CellValue>) {
        if self.labels.is_empty() {
            self.labels = (0..values.len()).map(|i| i.to_string()).collect();
        }
        self.columns.insert(name.into(), values);
    }

    /// Snapshot one column as an owned [`Series`].
    ///
    /// Short columns are padded with absent cells to the label count, and
    /// positional labels are synthesized for cells past the last label, so
    /// the snapshot always pairs values and labels 1:1.
    pub fn column(&self, name: &str) -> Result<Series> {
        let values = self
            .columns
            .get(name)
            .ok_or_else(|| crate::error::Error::NotFound(format!("column '{}'", name)))?;

        let len = values.len().max(self.labels.len());
        let mut padded = values.clone();
        padded.resize(len, CellValue::Absent);
        let mut labels = self.labels.clone();
        for i in labels.len()..len {
            labels.push(i.to_string());
        }
        Series::new(padded, labels)
    }

    /// Number of rows (longest column)
    pub fn row_count(&self) -> usize {
        self.columns.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column names in insertion order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    /// Row labels
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// First `min(n, label_count)` rows of every column.
    ///
    /// Each column is bounded by its own length, so a shorter column simply
    /// contributes fewer rows. Labels regenerate as "0".."n-1".
    pub fn head(&self, n: usize) -> DataFrame {
        let rows = n.min(self.labels.len());
        let mut subset = DataFrame::new();
        for (name, values) in &self.columns {
            let take = rows.min(values.len());
            subset.add_column(name.clone(), values[..take].to_vec());
        }
        subset
    }

    /// Last `min(n, label_count)` rows of every column
    pub fn tail(&self, n: usize) -> DataFrame {
        let rows = n.min(self.labels.len());
        let mut subset = DataFrame::new();
        for (name, values) in &self.columns {
            let start = values.len().saturating_sub(rows);
            subset.add_column(name.clone(), values[start..].to_vec());
        }
        subset
    }

    /// Build a new frame with rows and columns swapped.
    ///
    /// New column names come from the row labels, falling back to the
    /// positional index once labels run out; the new row labels are the
    /// original column names. Missing source cells transpose to the text
    /// sentinel "null".
    pub fn transpose(&self) -> DataFrame {
        let names: Vec<String> = self.columns.keys().cloned().collect();
        let mut out = DataFrame::with_labels(names);

        for row in 0..self.row_count() {
            let name = self
                .labels
                .get(row)
                .cloned()
                .unwrap_or_else(|| row.to_string());
            let values: Vec<CellValue> = self
                .columns
                .values()
                .map(|col| match col.get(row) {
                    Some(v) if !v.is_absent() => v.clone(),
                    _ => CellValue::Text("null".to_string()),
                })
                .collect();
            out.add_column(name, values);
        }
        out
    }

    /// Begin a lazy selection over this frame
    pub fn select(&self) -> Selector<'_> {
        Selector::new(self)
    }

    // ---- import boundary ----
    //
    // Each read_* parses into a fresh structure and installs it only on
    // success; on failure the frame keeps its prior contents and the error
    // comes back as a value, so batch pipelines can carry on.

    /// Import a CSV/TSV file, replacing any prior content on success
    pub fn read_csv(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        self.install(CsvParser.parse(path.as_ref()), path.as_ref(), "csv")
    }

    /// Import a flat-array JSON file, replacing any prior content on success
    pub fn read_json(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        self.install(JsonParser.parse(path.as_ref()), path.as_ref(), "json")
    }

    /// Import the first sheet of an xlsx workbook, replacing any prior
    /// content on success
    pub fn read_xlsx(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        self.install(XlsxParser.parse(path.as_ref()), path.as_ref(), "xlsx")
    }

    /// Import the first table of an ods spreadsheet, replacing any prior
    /// content on success
    pub fn read_ods(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        self.install(OdsParser.parse(path.as_ref()), path.as_ref(), "ods")
    }

    fn install(&mut self, parsed: Result<Parsed>, path: &Path, format: &str) -> Result<&mut Self> {
        match parsed {
            Ok(parsed) => {
                debug!(
                    path = %path.display(),
                    format,
                    columns = parsed.columns.len(),
                    "import complete"
                );
                self.columns = parsed.columns;
                self.labels = parsed.labels;
                Ok(self)
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    format,
                    error = %e,
                    "import failed; frame left unchanged"
                );
                Err(e)
            }
        }
    }

    // ---- export boundary ----

    /// Write as delimited text. Every field (headers included) is wrapped
    /// in quotes when `quoted` is true; field contents are written raw.
    pub fn write_csv(&self, path: impl AsRef<Path>, delimiter: char, quoted: bool) -> Result<()> {
        CsvExporter::new(path.as_ref(), delimiter, quoted).save(self)
    }

    /// Write as a JSON array of flat objects
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        JsonExporter::new(path.as_ref()).save(self)
    }

    /// Write as a single-sheet xlsx workbook
    pub fn write_xlsx(&self, path: impl AsRef<Path>) -> Result<()> {
        XlsxExporter::new(path.as_ref()).save(self)
    }

    /// Write as a single-sheet ods spreadsheet
    pub fn write_ods(&self, path: impl AsRef<Path>) -> Result<()> {
        OdsExporter::new(path.as_ref()).save(self)
    }
}
