//! Minimal xlsx (OOXML spreadsheet) reader
//!
//! Reads the first worksheet of the zip container directly: the shared
//! string table (when present) and `xl/worksheets/sheet1.xml`. Only cell
//! values are interpreted; styles, formulas and merged regions are ignored.
//! External entities are never resolved.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use indexmap::IndexMap;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::model::CellValue;

use super::{Importer, Parsed};

const SHEET_PART: &str = "xl/worksheets/sheet1.xml";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Parser for xlsx workbooks
pub struct XlsxParser;

impl Importer for XlsxParser {
    fn parse(&self, path: &Path) -> Result<Parsed> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mut archive = zip::ZipArchive::new(file)?;

        let shared = match read_part(&mut archive, SHARED_STRINGS_PART)? {
            Some(xml) => parse_shared_strings(&xml)?,
            None => Vec::new(),
        };

        let sheet = read_part(&mut archive, SHEET_PART)?
            .ok_or_else(|| Error::NotFound(format!("worksheet part {SHEET_PART}")))?;
        parse_sheet(&sheet, &shared)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "xlsx")
    }
}

fn read_part(archive: &mut zip::ZipArchive<File>, name: &str) -> Result<Option<Vec<u8>>> {
    match archive.by_name(name) {
        Ok(mut entry) => {
            let mut xml = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut xml).map_err(|e| Error::io(name, e))?;
            Ok(Some(xml))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Collect the shared string table: one entry per `<si>`, concatenating
/// every `<t>` run and trimming the result.
fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(BufReader::new(xml));
    let mut buf = Vec::new();

    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) if e.local_name().as_ref() == b"t" => in_text = false,
            Event::Text(t) if in_text => current.push_str(&t.unescape()?),
            Event::End(e) if e.local_name().as_ref() == b"si" => {
                strings.push(current.trim().to_string());
                current.clear();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Convert the letter prefix of a cell reference like `BC12` into a
/// zero-based column index.
fn column_of_ref(cell_ref: &str) -> usize {
    let mut index: usize = 0;
    for c in cell_ref.chars().take_while(|c| c.is_ascii_alphabetic()) {
        index = index * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    index.saturating_sub(1)
}

#[derive(Default)]
struct PendingCell {
    column: usize,
    shared: bool,
    value: Option<String>,
}

fn parse_sheet(xml: &[u8], shared: &[String]) -> Result<Parsed> {
    let mut reader = Reader::from_reader(BufReader::new(xml));
    let mut buf = Vec::new();

    let mut headers: Vec<String> = Vec::new();
    let mut columns: Vec<Vec<CellValue>> = Vec::new();

    let mut row_index: usize = 0;
    let mut seen_rows: usize = 0;
    let mut cell = PendingCell::default();
    let mut in_value = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"row" => {
                // The r attribute is 1-based; zero or garbage falls back
                // to document order.
                row_index = match e.try_get_attribute("r")? {
                    Some(attr) => attr
                        .unescape_value()?
                        .parse::<usize>()
                        .ok()
                        .and_then(|r| r.checked_sub(1))
                        .unwrap_or(seen_rows),
                    None => seen_rows,
                };
                seen_rows += 1;
            }
            Event::Start(e) if e.local_name().as_ref() == b"c" => {
                cell = PendingCell::default();
                if let Some(attr) = e.try_get_attribute("r")? {
                    cell.column = column_of_ref(&attr.unescape_value()?);
                }
                if let Some(attr) = e.try_get_attribute("t")? {
                    cell.shared = attr.unescape_value()?.as_ref() == "s";
                }
            }
            Event::Start(e) if e.local_name().as_ref() == b"v" => in_value = true,
            Event::End(e) if e.local_name().as_ref() == b"v" => in_value = false,
            Event::Text(t) if in_value => cell.value = Some(t.unescape()?.into_owned()),
            Event::End(e) if e.local_name().as_ref() == b"c" => {
                let Some(raw) = cell.value.take() else {
                    buf.clear();
                    continue;
                };
                let resolved = if cell.shared {
                    raw.parse::<usize>()
                        .ok()
                        .and_then(|i| shared.get(i))
                        .cloned()
                        .unwrap_or(raw)
                } else {
                    raw
                };

                if row_index == 0 {
                    set_header(&mut headers, cell.column, resolved);
                } else if cell.column < headers.len() {
                    // Sparse sheets omit empty cells, so pad the column up
                    // to this row before placing the value.
                    let column = &mut columns[cell.column];
                    while column.len() < row_index - 1 {
                        column.push(CellValue::Absent);
                    }
                    column.push(coerce_cell(&resolved, cell.shared));
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"row" => {
                if row_index == 0 {
                    columns = vec![Vec::new(); headers.len()];
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

fn set_header(headers: &mut Vec<String>, column: usize, name: String) {
    while headers.len() < column {
        headers.push(format!("Column{}", headers.len() + 1));
    }
    headers.push(name.trim().to_string());
}

/// Shared strings stay text; everything else that parses as a number is a
/// float, which is how the format stores all numerics.
fn coerce_cell(raw: &str, shared: bool) -> CellValue {
    if shared {
        return CellValue::Text(raw.to_string());
    }
    match raw.parse::<f64>() {
        Ok(f) => CellValue::Float(f),
        Err(_) => CellValue::Text(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_of_ref() {
        assert_eq!(column_of_ref("A1"), 0);
        assert_eq!(column_of_ref("B12"), 1);
        assert_eq!(column_of_ref("Z3"), 25);
        assert_eq!(column_of_ref("AA1"), 26);
        assert_eq!(column_of_ref("BC7"), 54);
    }

    #[test]
    fn test_parse_shared_strings() {
        let xml = br#"<?xml version="1.0"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="2" uniqueCount="2">
  <si><t>name</t></si>
  <si><t xml:space="preserve"> Alice </t></si>
  <si><t>multi</t><t> run</t></si>
</sst>"#;
        let strings = parse_shared_strings(xml).unwrap();
        assert_eq!(strings, vec!["name", "Alice", "multi run"]);
    }

    #[test]
    fn test_parse_sheet_headers_and_types() {
        let shared = vec![
            "name".to_string(),
            "age".to_string(),
            "Alice".to_string(),
        ];
        let xml = br#"<?xml version="1.0"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
    <row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2"><v>25</v></c></row>
  </sheetData>
</worksheet>"#;
        let parsed = parse_sheet(xml, &shared).unwrap();
        assert_eq!(
            parsed.columns.keys().collect::<Vec<_>>(),
            vec!["name", "age"]
        );
        assert_eq!(parsed.columns["name"], vec![CellValue::from("Alice")]);
        // Numeric cells come back as floats regardless of how they were
        // written.
        assert_eq!(parsed.columns["age"], vec![CellValue::Float(25.0)]);
        assert_eq!(parsed.labels, vec!["0"]);
    }

    #[test]
    fn test_sparse_cells_pad_with_absent() {
        let shared = vec!["a".to_string(), "b".to_string()];
        let xml = br#"<worksheet><sheetData>
    <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
    <row r="2"><c r="B2"><v>1</v></c></row>
    <row r="3"><c r="A3"><v>2</v></c></row>
  </sheetData></worksheet>"#;
        let parsed = parse_sheet(xml, &shared).unwrap();
        assert_eq!(
            parsed.columns["a"],
            vec![CellValue::Absent, CellValue::Float(2.0)]
        );
        assert_eq!(parsed.columns["b"], vec![CellValue::Float(1.0)]);
        assert_eq!(parsed.labels, vec!["0", "1"]);
    }

    #[test]
    fn test_header_gaps_get_placeholder_names() {
        let xml = br#"<worksheet><sheetData>
    <row r="1"><c r="C1"><v>3</v></c></row>
  </sheetData></worksheet>"#;
        let parsed = parse_sheet(xml, &[]).unwrap();
        assert_eq!(
            parsed.columns.keys().collect::<Vec<_>>(),
            vec!["Column1", "Column2", "3"]
        );
    }

    #[test]
    fn test_row_attribute_zero_falls_back_to_document_order() {
        // r is 1-based, so a zero (or unparseable) value must not wrap
        // into a huge row index.
        let shared = vec!["a".to_string()];
        let xml = br#"<worksheet><sheetData>
    <row r="0"><c r="A1" t="s"><v>0</v></c></row>
    <row r="2"><c r="A2"><v>5</v></c></row>
  </sheetData></worksheet>"#;
        let parsed = parse_sheet(xml, &shared).unwrap();
        assert_eq!(parsed.columns["a"], vec![CellValue::Float(5.0)]);
        assert_eq!(parsed.labels, vec!["0"]);
    }

    #[test]
    fn test_cells_beyond_headers_are_ignored() {
        let shared = vec!["only".to_string()];
        let xml = br#"<worksheet><sheetData>
    <row r="1"><c r="A1" t="s"><v>0</v></c></row>
    <row r="2"><c r="A2"><v>1</v></c><c r="B2"><v>9</v></c></row>
  </sheetData></worksheet>"#;
        let parsed = parse_sheet(xml, &shared).unwrap();
        assert_eq!(parsed.columns.len(), 1);
        assert_eq!(parsed.columns["only"], vec![CellValue::Float(1.0)]);
    }
}
