//! Minimal xlsx (OOXML spreadsheet) writer
//!
//! Emits a single-sheet workbook: fixed boilerplate parts, a shared string
//! table holding headers and every non-numeric cell in first-encounter
//! order, and `xl/worksheets/sheet1.xml`. Numeric cells are written inline,
//! text and boolean cells go through the shared string table, and absent
//! cells are simply omitted.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use rustc_hash::FxBuildHasher;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::{Error, Result};
use crate::model::{CellValue, DataFrame};

use super::create_output;

const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
  <Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
  <Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>
  <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
</Types>
"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>
"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="Sheet1" sheetId="1" r:id="rId1"/>
  </sheets>
</workbook>
"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>
"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>
  <fills count="1"><fill><patternFill patternType="none"/></fill></fills>
  <borders count="1"><border/></borders>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
  <cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>
</styleSheet>
"#;

type SharedStrings = IndexSet<String, FxBuildHasher>;

/// Writer for xlsx workbooks
pub struct XlsxExporter {
    path: PathBuf,
}

impl XlsxExporter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn save(&self, frame: &DataFrame) -> Result<()> {
        let shared = collect_shared_strings(frame);
        let sheet = build_sheet(frame, &shared).map_err(|e| Error::io(&self.path, e))?;
        let strings = build_shared_strings(&shared).map_err(|e| Error::io(&self.path, e))?;

        let file = create_output(&self.path)?;
        let mut archive = ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        let parts: [(&str, &[u8]); 7] = [
            ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
            ("_rels/.rels", ROOT_RELS.as_bytes()),
            ("xl/workbook.xml", WORKBOOK.as_bytes()),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes()),
            ("xl/styles.xml", STYLES.as_bytes()),
            ("xl/sharedStrings.xml", &strings),
            ("xl/worksheets/sheet1.xml", &sheet),
        ];
        for (name, bytes) in parts {
            archive.start_file(name, options)?;
            archive
                .write_all(bytes)
                .map_err(|e| Error::io(&self.path, e))?;
        }
        archive.finish()?;
        Ok(())
    }
}

/// Convert a zero-based column and row into an `A1` style reference
fn cell_ref(column: usize, row: usize) -> String {
    let mut letters = String::new();
    let mut remaining = column as i64;
    loop {
        letters.insert(0, (b'A' + (remaining % 26) as u8) as char);
        remaining = remaining / 26 - 1;
        if remaining < 0 {
            break;
        }
    }
    format!("{}{}", letters, row + 1)
}

fn shared_text(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Text(s) => Some(s.clone()),
        CellValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn collect_shared_strings(frame: &DataFrame) -> SharedStrings {
    let mut strings = SharedStrings::default();
    for name in frame.columns.keys() {
        strings.insert(name.clone());
    }
    for row in 0..frame.row_count() {
        for column in frame.columns.values() {
            if let Some(text) = column.get(row).and_then(shared_text) {
                strings.insert(text);
            }
        }
    }
    strings
}

fn write_shared_cell<W: io::Write>(
    w: &mut Writer<W>,
    column: usize,
    row: usize,
    index: usize,
) -> io::Result<()> {
    let mut c = BytesStart::new("c");
    c.push_attribute(("r", cell_ref(column, row).as_str()));
    c.push_attribute(("t", "s"));
    w.write_event(Event::Start(c))?;
    w.write_event(Event::Start(BytesStart::new("v")))?;
    w.write_event(Event::Text(BytesText::new(&index.to_string())))?;
    w.write_event(Event::End(BytesEnd::new("v")))?;
    w.write_event(Event::End(BytesEnd::new("c")))
}

fn write_number_cell<W: io::Write>(
    w: &mut Writer<W>,
    column: usize,
    row: usize,
    value: &str,
) -> io::Result<()> {
    let mut c = BytesStart::new("c");
    c.push_attribute(("r", cell_ref(column, row).as_str()));
    w.write_event(Event::Start(c))?;
    w.write_event(Event::Start(BytesStart::new("v")))?;
    w.write_event(Event::Text(BytesText::new(value)))?;
    w.write_event(Event::End(BytesEnd::new("v")))?;
    w.write_event(Event::End(BytesEnd::new("c")))
}

fn build_sheet(frame: &DataFrame, shared: &SharedStrings) -> io::Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

    let mut worksheet = BytesStart::new("worksheet");
    worksheet.push_attribute(("xmlns", SPREADSHEET_NS));
    writer.write_event(Event::Start(worksheet))?;
    writer.write_event(Event::Start(BytesStart::new("sheetData")))?;

    let mut header = BytesStart::new("row");
    header.push_attribute(("r", "1"));
    writer.write_event(Event::Start(header))?;
    for (column, name) in frame.columns.keys().enumerate() {
        let index = shared.get_index_of(name.as_str()).unwrap_or(0);
        write_shared_cell(&mut writer, column, 0, index)?;
    }
    writer.write_event(Event::End(BytesEnd::new("row")))?;

    for row in 0..frame.row_count() {
        let mut row_el = BytesStart::new("row");
        row_el.push_attribute(("r", (row + 2).to_string().as_str()));
        writer.write_event(Event::Start(row_el))?;
        for (column, values) in frame.columns.values().enumerate() {
            match values.get(row) {
                None | Some(CellValue::Absent) => {}
                Some(CellValue::Int(i)) => {
                    write_number_cell(&mut writer, column, row + 1, &i.to_string())?
                }
                Some(CellValue::Float(f)) => {
                    write_number_cell(&mut writer, column, row + 1, &f.to_string())?
                }
                Some(cell) => {
                    let text = shared_text(cell).unwrap_or_default();
                    let index = shared.get_index_of(text.as_str()).unwrap_or(0);
                    write_shared_cell(&mut writer, column, row + 1, index)?;
                }
            }
        }
        writer.write_event(Event::End(BytesEnd::new("row")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
    writer.write_event(Event::End(BytesEnd::new("worksheet")))?;
    Ok(writer.into_inner())
}

fn build_shared_strings(shared: &SharedStrings) -> io::Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

    let mut sst = BytesStart::new("sst");
    sst.push_attribute(("xmlns", SPREADSHEET_NS));
    sst.push_attribute(("count", shared.len().to_string().as_str()));
    sst.push_attribute(("uniqueCount", shared.len().to_string().as_str()));
    writer.write_event(Event::Start(sst))?;

    for text in shared {
        writer.write_event(Event::Start(BytesStart::new("si")))?;
        writer.write_event(Event::Start(BytesStart::new("t")))?;
        writer.write_event(Event::Text(BytesText::new(text)))?;
        writer.write_event(Event::End(BytesEnd::new("t")))?;
        writer.write_event(Event::End(BytesEnd::new("si")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("sst")))?;
    Ok(writer.into_inner())
}
