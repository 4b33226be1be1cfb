//! CSV/TSV parser with dialect sniffing
//!
//! Small files are read whole; files past the memory threshold (and
//! whole-file reads that fail on memory) fall back to a line-streaming
//! path that never buffers the full file.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::model::CellValue;

use super::{Importer, Parsed, MEMORY_EFFICIENT_THRESHOLD};

/// Delimiters considered during sniffing, in tie-break priority order
const CANDIDATE_DELIMITERS: [char; 6] = [',', '\t', ';', '|', '#', ':'];

/// Parser for delimited text files
pub struct CsvParser;

impl Importer for CsvParser {
    fn parse(&self, path: &Path) -> Result<Parsed> {
        let size = fs::metadata(path).map_err(|e| Error::io(path, e))?.len();

        if size < MEMORY_EFFICIENT_THRESHOLD {
            match fs::read_to_string(path) {
                Ok(content) => return Ok(parse_content(&content)),
                // Whole-file read ran out of memory; retry row by row with
                // no partial state carried over.
                Err(e) if e.kind() == io::ErrorKind::OutOfMemory => {}
                Err(e) => return Err(Error::io(path, e)),
            }
        }
        parse_streaming(path)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "csv" | "tsv" | "txt")
    }
}

/// Detected delimiter/quoting convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CsvDialect {
    pub delimiter: char,
    pub quoted: bool,
}

/// Sniff the dialect from the header line: the candidate delimiter with
/// the highest count wins, ties broken by list order; quoting is assumed
/// whenever the header contains a double quote.
pub(crate) fn detect_dialect(header: &str) -> CsvDialect {
    let mut best = CANDIDATE_DELIMITERS[0];
    let mut best_count = header.matches(best).count();

    for &candidate in &CANDIDATE_DELIMITERS[1..] {
        let count = header.matches(candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }

    CsvDialect {
        delimiter: best,
        quoted: header.contains('"'),
    }
}

/// Split one line into fields.
///
/// Unquoted dialects split naively on the delimiter. Quoted dialects run a
/// toggle state machine where a doubled quote inside quotes is a literal
/// quote and the delimiter only breaks fields outside quotes.
pub(crate) fn parse_line(line: &str, dialect: CsvDialect) -> Vec<String> {
    if !dialect.quoted {
        return line
            .split(dialect.delimiter)
            .map(str::to_string)
            .collect();
    }

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '"' {
            if in_quotes && i + 1 < chars.len() && chars[i + 1] == '"' {
                current.push('"');
                i += 1;
            } else {
                in_quotes = !in_quotes;
            }
        } else if c == dialect.delimiter && !in_quotes {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
        i += 1;
    }

    fields.push(current);
    fields
}

/// Coerce a trimmed field: empty becomes absent, a dotted token parses as
/// float, an undotted one as integer, and anything unparseable stays text.
pub(crate) fn coerce_field(value: &str) -> CellValue {
    if value.is_empty() {
        return CellValue::Absent;
    }

    if value.contains('.') {
        if let Ok(f) = value.parse::<f64>() {
            return CellValue::Float(f);
        }
    } else if let Ok(i) = value.parse::<i64>() {
        return CellValue::Int(i);
    }

    CellValue::Text(value.to_string())
}

struct ColumnBuilder {
    dialect: CsvDialect,
    headers: Vec<String>,
    columns: IndexMap<String, Vec<CellValue>>,
}

impl ColumnBuilder {
    fn from_header(line: &str) -> Self {
        let dialect = detect_dialect(line);
        let headers: Vec<String> = parse_line(line, dialect)
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut columns = IndexMap::new();
        for header in &headers {
            columns.insert(header.clone(), Vec::new());
        }

        Self {
            dialect,
            headers,
            columns,
        }
    }

    fn push_line(&mut self, line: &str) {
        let values = parse_line(line, self.dialect);
        for (header, value) in self.headers.iter().zip(values.iter()) {
            if let Some(column) = self.columns.get_mut(header) {
                column.push(coerce_field(value.trim()));
            }
        }
    }

    fn finish(self) -> Parsed {
        // Labels are synthesized from the first column's length once all
        // rows are in.
        let rows = self
            .columns
            .values()
            .next()
            .map(Vec::len)
            .unwrap_or(0);
        Parsed {
            columns: self.columns,
            labels: (0..rows).map(|i| i.to_string()).collect(),
        }
    }
}

fn parse_content(content: &str) -> Parsed {
    let mut lines = content.lines();
    let Some(header) = lines.next() else {
        return Parsed::default();
    };

    let mut builder = ColumnBuilder::from_header(header);
    for line in lines {
        builder.push_line(line);
    }
    builder.finish()
}

fn parse_streaming(path: &Path) -> Result<Parsed> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut reader = BufReader::new(file);

    let mut header = String::new();
    if reader
        .read_line(&mut header)
        .map_err(|e| Error::io(path, e))?
        == 0
    {
        return Ok(Parsed::default());
    }

    let mut builder = ColumnBuilder::from_header(header.trim_end_matches(['\r', '\n']));
    for line in reader.lines() {
        let line = line.map_err(|e| Error::io(path, e))?;
        builder.push_line(&line);
    }
    Ok(builder.finish())
}
