//! Minimal ods (OpenDocument spreadsheet) reader
//!
//! Walks `content.xml` inside the zip container and reads the first
//! `table:table` element only. Cells are interpreted through their
//! `office:value-type`; styles and everything past the first sheet are
//! ignored. External entities are never resolved.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::model::CellValue;

use super::{Importer, Parsed};

const CONTENT_PART: &str = "content.xml";

/// Parser for ods spreadsheets
pub struct OdsParser;

impl Importer for OdsParser {
    fn parse(&self, path: &Path) -> Result<Parsed> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mut archive = zip::ZipArchive::new(file)?;

        let content = match archive.by_name(CONTENT_PART) {
            Ok(mut entry) => {
                let mut xml = Vec::with_capacity(entry.size() as usize);
                entry
                    .read_to_end(&mut xml)
                    .map_err(|e| Error::io(CONTENT_PART, e))?;
                xml
            }
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(Error::NotFound(format!("archive entry {CONTENT_PART}")))
            }
            Err(e) => return Err(e.into()),
        };

        parse_content(&content)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "ods")
    }
}

/// Attributes captured from one `table:table-cell`
#[derive(Default)]
struct PendingCell {
    value_type: Option<String>,
    office_value: Option<String>,
    date_value: Option<String>,
    time_value: Option<String>,
    boolean_value: Option<String>,
    repeat: usize,
    text: String,
}

impl PendingCell {
    fn from_start(e: &BytesStart) -> Result<Self> {
        let mut cell = PendingCell { repeat: 1, ..Default::default() };
        for attr in e.attributes() {
            let attr = attr?;
            let value = attr.unescape_value()?.into_owned();
            match attr.key.local_name().as_ref() {
                b"value-type" => cell.value_type = Some(value),
                b"value" => cell.office_value = Some(value),
                b"date-value" => cell.date_value = Some(value),
                b"time-value" => cell.time_value = Some(value),
                b"boolean-value" => cell.boolean_value = Some(value),
                b"number-columns-repeated" => {
                    cell.repeat = value.parse().unwrap_or(1);
                }
                _ => {}
            }
        }
        Ok(cell)
    }

    /// Interpret the cell through its declared value type. A blank display
    /// text means an empty cell no matter what the type says.
    fn into_value(self) -> CellValue {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            return CellValue::Absent;
        }

        let parse_float =
            |attr: Option<&String>| attr.and_then(|v| v.parse::<f64>().ok());

        match self.value_type.as_deref() {
            Some("float") => parse_float(self.office_value.as_ref())
                .or_else(|| text.parse::<f64>().ok())
                .map(CellValue::Float)
                .unwrap_or(CellValue::Text(text)),
            Some("currency") => parse_float(self.office_value.as_ref())
                .map(CellValue::Float)
                .unwrap_or(CellValue::Text(text)),
            Some("percentage") => parse_float(self.office_value.as_ref())
                .map(|v| CellValue::Float(v * 100.0))
                .unwrap_or(CellValue::Text(text)),
            Some("date") => CellValue::Text(self.date_value.unwrap_or(text)),
            Some("time") => CellValue::Text(self.time_value.unwrap_or(text)),
            Some("boolean") => self
                .boolean_value
                .as_deref()
                .and_then(|v| v.parse::<bool>().ok())
                .map(CellValue::Bool)
                .unwrap_or(CellValue::Text(text)),
            _ => CellValue::Text(text),
        }
    }
}

fn parse_content(xml: &[u8]) -> Result<Parsed> {
    let mut reader = Reader::from_reader(BufReader::new(xml));
    let mut buf = Vec::new();

    let mut headers: Vec<String> = Vec::new();
    let mut columns: Vec<Vec<CellValue>> = Vec::new();

    let mut in_table = false;
    let mut header_done = false;
    let mut cell: Option<PendingCell> = None;
    let mut in_text = false;
    let mut row: Vec<PendingCell> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"table" => {
                if header_done || !headers.is_empty() {
                    // Only the first sheet is read.
                    break;
                }
                in_table = true;
            }
            Event::End(e) if e.local_name().as_ref() == b"table" && in_table => break,
            Event::Start(e) if in_table && e.local_name().as_ref() == b"table-row" => {
                row.clear();
            }
            Event::Start(e) if in_table && e.local_name().as_ref() == b"table-cell" => {
                cell = Some(PendingCell::from_start(&e)?);
            }
            Event::Empty(e) if in_table && e.local_name().as_ref() == b"table-cell" => {
                row.push(PendingCell::from_start(&e)?);
            }
            Event::End(e) if e.local_name().as_ref() == b"table-cell" => {
                if let Some(done) = cell.take() {
                    row.push(done);
                }
            }
            Event::Start(e) if cell.is_some() && e.local_name().as_ref() == b"p" => {
                in_text = true;
            }
            Event::End(e) if e.local_name().as_ref() == b"p" => in_text = false,
            Event::Text(t) if in_text => {
                if let Some(cell) = cell.as_mut() {
                    cell.text.push_str(&t.unescape()?);
                }
            }
            Event::End(e) if in_table && e.local_name().as_ref() == b"table-row" => {
                let cells = std::mem::take(&mut row);
                if !header_done {
                    headers = header_row(cells);
                    columns = vec![Vec::new(); headers.len()];
                    header_done = true;
                } else {
                    push_data_row(&mut columns, cells);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let rows = columns.iter().map(Vec::len).max().unwrap_or(0);
    let mut out = IndexMap::new();
    for (header, values) in headers.into_iter().zip(columns) {
        out.insert(header, values);
    }
    Ok(Parsed {
        columns: out,
        labels: (0..rows).map(|i| i.to_string()).collect(),
    })
}

/// Header names come from the first row's display text. An empty single
/// cell gets a placeholder name; repeated empty cells are writer padding
/// and end the header row.
fn header_row(cells: Vec<PendingCell>) -> Vec<String> {
    let mut headers = Vec::new();
    for cell in cells {
        let name = cell.text.trim().to_string();
        if name.is_empty() {
            if cell.repeat > 1 {
                break;
            }
            headers.push(format!("Column{}", headers.len() + 1));
        } else {
            for _ in 0..cell.repeat {
                headers.push(name.clone());
            }
        }
    }
    headers
}

/// Place one data row, expanding repeats and capping at the header count.
/// Columns the row never reaches are padded so every column stays aligned.
fn push_data_row(columns: &mut [Vec<CellValue>], cells: Vec<PendingCell>) {
    let mut position = 0;
    for cell in cells {
        if position >= columns.len() {
            break;
        }
        let repeat = cell.repeat;
        let value = cell.into_value();
        for _ in 0..repeat {
            if position >= columns.len() {
                break;
            }
            columns[position].push(value.clone());
            position += 1;
        }
    }
    for column in columns[position..].iter_mut() {
        column.push(CellValue::Absent);
    }
}
