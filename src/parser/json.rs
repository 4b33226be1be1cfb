//! Flat JSON array parser
//!
//! Accepts exactly one shape: a top-level array of flat objects. Objects
//! are located by a quote-aware balanced-brace scan shared between the
//! whole-file and line-streaming paths, then split on top-level commas and
//! first colons; nothing here recurses.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::model::CellValue;

use super::{Importer, Parsed, MEMORY_EFFICIENT_THRESHOLD};

/// Parser for flat JSON array files
pub struct JsonParser;

impl Importer for JsonParser {
    fn parse(&self, path: &Path) -> Result<Parsed> {
        let size = fs::metadata(path).map_err(|e| Error::io(path, e))?.len();

        if size < MEMORY_EFFICIENT_THRESHOLD {
            match fs::read_to_string(path) {
                Ok(content) => return parse_array(&content),
                // Memory pressure: drop partial state, go line by line.
                Err(e) if e.kind() == io::ErrorKind::OutOfMemory => {}
                Err(e) => return Err(Error::io(path, e)),
            }
        }
        parse_streaming(path)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "json")
    }
}

/// Accumulates one column per key as keys are first seen. Rows missing a
/// key simply leave that column short; positional reads later surface the
/// gap as absent.
#[derive(Default)]
struct RowBuilder {
    columns: IndexMap<String, Vec<CellValue>>,
    labels: Vec<String>,
}

impl RowBuilder {
    fn add_object(&mut self, object: &str) {
        for (key, value) in parse_flat_object(object) {
            self.columns.entry(key).or_default().push(value);
        }
        self.labels.push(format!("row_{}", self.labels.len()));
    }

    fn finish(self) -> Parsed {
        Parsed {
            columns: self.columns,
            labels: self.labels,
        }
    }
}

/// Streaming state for locating balanced `{...}` spans. Quote state is
/// tracked so braces inside string values never open or close a span.
#[derive(Default)]
struct SpanScanner {
    depth: usize,
    in_quotes: bool,
    escaping: bool,
    inside: bool,
    buf: String,
}

impl SpanScanner {
    fn feed(&mut self, chunk: &str, emit: &mut impl FnMut(&str)) {
        for c in chunk.chars() {
            self.feed_char(c, emit);
        }
    }

    fn feed_char(&mut self, c: char, emit: &mut impl FnMut(&str)) {
        if !self.inside {
            if c == '{' {
                self.inside = true;
                self.depth = 1;
                self.in_quotes = false;
                self.escaping = false;
                self.buf.clear();
                self.buf.push('{');
            }
            return;
        }

        self.buf.push(c);
        if self.escaping {
            self.escaping = false;
            return;
        }
        match c {
            '\\' if self.in_quotes => self.escaping = true,
            '"' => self.in_quotes = !self.in_quotes,
            '{' if !self.in_quotes => self.depth += 1,
            '}' if !self.in_quotes => {
                self.depth -= 1;
                if self.depth == 0 {
                    emit(&self.buf);
                    self.inside = false;
                }
            }
            _ => {}
        }
    }
}

fn parse_array(content: &str) -> Result<Parsed> {
    let trimmed = content.trim();
    if !trimmed.starts_with('[') {
        return Err(Error::UnsupportedFormat(
            "top-level JSON must be an array of flat objects".to_string(),
        ));
    }

    let body = &trimmed[1..];
    let body = body.trim_end().strip_suffix(']').unwrap_or(body);

    let mut builder = RowBuilder::default();
    let mut scanner = SpanScanner::default();
    scanner.feed(body, &mut |span| builder.add_object(span));
    Ok(builder.finish())
}

fn parse_streaming(path: &Path) -> Result<Parsed> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let reader = BufReader::new(file);

    let mut builder = RowBuilder::default();
    let mut scanner = SpanScanner::default();
    for line in reader.lines() {
        let line = line.map_err(|e| Error::io(path, e))?;
        scanner.feed(line.trim(), &mut |span| builder.add_object(span));
    }
    Ok(builder.finish())
}

/// Split a `{...}` span into key/value pairs: top-level commas separate
/// pairs, the first colon separates key from value.
fn parse_flat_object(json: &str) -> Vec<(String, CellValue)> {
    let json = json.trim();
    let Some(interior) = json
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
    else {
        return Vec::new();
    };

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaping = false;

    for c in interior.chars() {
        if escaping {
            current.push(c);
            escaping = false;
            continue;
        }
        match c {
            '\\' if in_quotes => {
                current.push(c);
                escaping = true;
            }
            '"' => {
                current.push(c);
                in_quotes = !in_quotes;
            }
            ',' if !in_quotes => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }

    segments
        .iter()
        .filter_map(|segment| {
            let (raw_key, raw_value) = segment.split_once(':')?;
            Some((
                unquote(raw_key.trim()).to_string(),
                coerce_value(raw_value.trim()),
            ))
        })
        .collect()
}

/// Coerce one raw JSON token: quoted text, the case-insensitive literals,
/// then numbers (float when the token carries `.`/`e`/`E`), else text.
fn coerce_value(raw: &str) -> CellValue {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return CellValue::Text(unquote(raw));
    }
    if raw.eq_ignore_ascii_case("null") {
        return CellValue::Absent;
    }
    if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("false") {
        return CellValue::Bool(raw.eq_ignore_ascii_case("true"));
    }

    if raw.contains(['.', 'e', 'E']) {
        if let Ok(f) = raw.parse::<f64>() {
            return CellValue::Float(f);
        }
    } else if let Ok(i) = raw.parse::<i64>() {
        return CellValue::Int(i);
    }
    CellValue::Text(raw.to_string())
}

fn unquote(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        raw[1..raw.len() - 1].replace("\\\"", "\"")
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flat_object_coercion() {
        let pairs = parse_flat_object(
            r#"{"name": "Alice", "age": 25, "score": 4.5, "big": 1e3, "ok": TRUE, "gone": null}"#,
        );
        assert_eq!(pairs[0], ("name".to_string(), CellValue::from("Alice")));
        assert_eq!(pairs[1], ("age".to_string(), CellValue::Int(25)));
        assert_eq!(pairs[2], ("score".to_string(), CellValue::Float(4.5)));
        assert_eq!(pairs[3], ("big".to_string(), CellValue::Float(1000.0)));
        assert_eq!(pairs[4], ("ok".to_string(), CellValue::Bool(true)));
        assert_eq!(pairs[5], ("gone".to_string(), CellValue::Absent));
    }

    #[test]
    fn test_escaped_quotes_unescape() {
        let pairs = parse_flat_object(r#"{"quote": "say \"hi\""}"#);
        assert_eq!(pairs[0].1, CellValue::from("say \"hi\""));
    }

    #[test]
    fn test_commas_inside_strings_do_not_split() {
        let pairs = parse_flat_object(r#"{"a": "x, y", "b": 1}"#);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].1, CellValue::from("x, y"));
    }

    #[test]
    fn test_parse_array_builds_ragged_columns() {
        let parsed = parse_array(
            r#"[
  {"name": "Alice", "age": 25},
  {"name": "Bob"},
  {"name": "Carol", "age": 31}
]"#,
        )
        .unwrap();
        assert_eq!(parsed.labels, vec!["row_0", "row_1", "row_2"]);
        assert_eq!(parsed.columns["name"].len(), 3);
        // Bob has no age, so the column stays short.
        assert_eq!(
            parsed.columns["age"],
            vec![CellValue::Int(25), CellValue::Int(31)]
        );
    }

    #[test]
    fn test_non_array_top_level_is_unsupported() {
        assert!(matches!(
            parse_array(r#"{"a": 1}"#),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(matches!(
            parse_array("42"),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_braces_inside_strings_do_not_open_spans() {
        let parsed = parse_array(r#"[{"a": "{not an object}"}]"#).unwrap();
        assert_eq!(parsed.labels.len(), 1);
        assert_eq!(
            parsed.columns["a"],
            vec![CellValue::from("{not an object}")]
        );
    }

    #[test]
    fn test_empty_array() {
        let parsed = parse_array("[]").unwrap();
        assert!(parsed.columns.is_empty());
        assert!(parsed.labels.is_empty());
    }
}
