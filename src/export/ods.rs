//! Minimal ods (OpenDocument spreadsheet) writer
//!
//! The `mimetype` entry must be the first archive member and must be
//! stored uncompressed so format sniffers can read it from the raw bytes.
//! Everything else is boilerplate plus a generated `content.xml` holding a
//! single sheet: numeric cells carry `office:value-type="float"` with the
//! machine value in `office:value`, everything else is written as a string.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::model::{CellValue, DataFrame};

use super::create_output;

const MIMETYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";

const OFFICE_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:office:1.0";
const TABLE_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:table:1.0";
const TEXT_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:text:1.0";

const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.2">
  <manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.oasis.opendocument.spreadsheet"/>
  <manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/>
  <manifest:file-entry manifest:full-path="styles.xml" manifest:media-type="text/xml"/>
  <manifest:file-entry manifest:full-path="meta.xml" manifest:media-type="text/xml"/>
  <manifest:file-entry manifest:full-path="settings.xml" manifest:media-type="text/xml"/>
</manifest:manifest>
"#;

const META: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-meta xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" office:version="1.2">
  <office:meta/>
</office:document-meta>
"#;

const SETTINGS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-settings xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" office:version="1.2">
  <office:settings/>
</office:document-settings>
"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-styles xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" office:version="1.2">
  <office:styles/>
  <office:automatic-styles/>
  <office:master-styles/>
</office:document-styles>
"#;

/// Writer for ods spreadsheets
pub struct OdsExporter {
    path: PathBuf,
}

impl OdsExporter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn save(&self, frame: &DataFrame) -> Result<()> {
        let content = build_content(frame).map_err(|e| Error::io(&self.path, e))?;

        let file = create_output(&self.path)?;
        let mut archive = ZipWriter::new(file);

        // mimetype first, stored, so bytes 30.. of the file spell out the
        // media type.
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        archive.start_file("mimetype", stored)?;
        archive
            .write_all(MIMETYPE.as_bytes())
            .map_err(|e| Error::io(&self.path, e))?;

        let options = SimpleFileOptions::default();
        let parts: [(&str, &[u8]); 5] = [
            ("META-INF/manifest.xml", MANIFEST.as_bytes()),
            ("meta.xml", META.as_bytes()),
            ("settings.xml", SETTINGS.as_bytes()),
            ("styles.xml", STYLES.as_bytes()),
            ("content.xml", &content),
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

fn write_cell<W: io::Write>(w: &mut Writer<W>, cell: Option<&CellValue>) -> io::Result<()> {
    let mut el = BytesStart::new("table:table-cell");
    let text = match cell {
        Some(CellValue::Int(i)) => {
            el.push_attribute(("office:value-type", "float"));
            el.push_attribute(("office:value", i.to_string().as_str()));
            i.to_string()
        }
        Some(CellValue::Float(f)) => {
            el.push_attribute(("office:value-type", "float"));
            el.push_attribute(("office:value", f.to_string().as_str()));
            f.to_string()
        }
        Some(CellValue::Bool(b)) => {
            el.push_attribute(("office:value-type", "string"));
            b.to_string()
        }
        Some(CellValue::Text(s)) => {
            el.push_attribute(("office:value-type", "string"));
            s.clone()
        }
        None | Some(CellValue::Absent) => {
            el.push_attribute(("office:value-type", "string"));
            String::new()
        }
    };

    w.write_event(Event::Start(el))?;
    if text.is_empty() {
        w.write_event(Event::Empty(BytesStart::new("text:p")))?;
    } else {
        w.write_event(Event::Start(BytesStart::new("text:p")))?;
        w.write_event(Event::Text(BytesText::new(&text)))?;
        w.write_event(Event::End(BytesEnd::new("text:p")))?;
    }
    w.write_event(Event::End(BytesEnd::new("table:table-cell")))
}

fn build_content(frame: &DataFrame) -> io::Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("office:document-content");
    root.push_attribute(("xmlns:office", OFFICE_NS));
    root.push_attribute(("xmlns:table", TABLE_NS));
    root.push_attribute(("xmlns:text", TEXT_NS));
    root.push_attribute(("office:version", "1.2"));
    writer.write_event(Event::Start(root))?;
    writer.write_event(Event::Start(BytesStart::new("office:body")))?;
    writer.write_event(Event::Start(BytesStart::new("office:spreadsheet")))?;

    let mut table = BytesStart::new("table:table");
    table.push_attribute(("table:name", "Sheet1"));
    writer.write_event(Event::Start(table))?;

    writer.write_event(Event::Start(BytesStart::new("table:table-row")))?;
    for name in frame.columns.keys() {
        write_cell(&mut writer, Some(&CellValue::Text(name.clone())))?;
    }
    writer.write_event(Event::End(BytesEnd::new("table:table-row")))?;

    for row in 0..frame.row_count() {
        writer.write_event(Event::Start(BytesStart::new("table:table-row")))?;
        for values in frame.columns.values() {
            write_cell(&mut writer, values.get(row))?;
        }
        writer.write_event(Event::End(BytesEnd::new("table:table-row")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("table:table")))?;
    writer.write_event(Event::End(BytesEnd::new("office:spreadsheet")))?;
    writer.write_event(Event::End(BytesEnd::new("office:body")))?;
    writer.write_event(Event::End(BytesEnd::new("office:document-content")))?;
    Ok(writer.into_inner())
}
