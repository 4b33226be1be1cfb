//! Flat JSON array writer
//!
//! One object per row, keys in column order. Absent and missing cells
//! serialize as JSON null, and non-finite floats fall back to null since
//! JSON has no representation for them.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};
use crate::model::{CellValue, DataFrame};

use super::create_output;

/// Writer for flat JSON array files
pub struct JsonExporter {
    path: PathBuf,
}

impl JsonExporter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn save(&self, frame: &DataFrame) -> Result<()> {
        let file = create_output(&self.path)?;
        self.write(BufWriter::new(file), frame)
            .map_err(|e| Error::io(&self.path, e))
    }

    fn write(&self, mut w: impl Write, frame: &DataFrame) -> io::Result<()> {
        writeln!(w, "[")?;
        let rows = frame.row_count();
        for row in 0..rows {
            let mut object = Map::new();
            for (name, column) in &frame.columns {
                object.insert(name.clone(), json_value(column.get(row)));
            }
            let separator = if row + 1 < rows { "," } else { "" };
            writeln!(w, "  {}{separator}", Value::Object(object))?;
        }
        writeln!(w, "]")?;
        w.flush()
    }
}

fn json_value(cell: Option<&CellValue>) -> Value {
    match cell {
        None | Some(CellValue::Absent) => Value::Null,
        Some(CellValue::Int(i)) => Value::Number((*i).into()),
        Some(CellValue::Float(f)) => Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Some(CellValue::Bool(b)) => Value::Bool(*b),
        Some(CellValue::Text(s)) => Value::String(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_rows_as_objects() {
        let mut frame = DataFrame::new();
        frame.add_column(
            "name",
            vec![CellValue::from("Alice"), CellValue::from("Bob")],
        );
        frame.add_column("age", vec![CellValue::Int(25), CellValue::Absent]);
        frame.add_column("active", vec![CellValue::Bool(true), CellValue::Bool(false)]);

        let exporter = JsonExporter::new(Path::new("out.json"));
        let mut out = Vec::new();
        exporter.write(&mut out, &frame).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[\n  {\"name\":\"Alice\",\"age\":25,\"active\":true},\n  {\"name\":\"Bob\",\"age\":null,\"active\":false}\n]\n"
        );
    }

    #[test]
    fn test_nan_serializes_as_null() {
        assert_eq!(json_value(Some(&CellValue::Float(f64::NAN))), Value::Null);
        assert_eq!(
            json_value(Some(&CellValue::Float(2.5))),
            Value::Number(Number::from_f64(2.5).unwrap())
        );
    }

    #[test]
    fn test_empty_frame() {
        let exporter = JsonExporter::new(Path::new("out.json"));
        let mut out = Vec::new();
        exporter.write(&mut out, &DataFrame::new()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[\n]\n");
    }
}
