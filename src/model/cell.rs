//! Cell value representation

use serde::{Deserialize, Serialize};

/// A single table cell with type information.
///
/// `Absent` marks a missing value and is distinct from empty text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Absent,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Absent, CellValue::Absent) => true,
            (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
            (CellValue::Int(a), CellValue::Int(b)) => a == b,
            (CellValue::Float(a), CellValue::Float(b)) => {
                // Handle NaN comparison
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            // Cross-type numeric comparison
            (CellValue::Int(a), CellValue::Float(b)) => (*a as f64) == *b,
            (CellValue::Float(a), CellValue::Int(b)) => *a == (*b as f64),
            _ => false,
        }
    }
}

impl CellValue {
    /// Check if the value is absent
    pub fn is_absent(&self) -> bool {
        matches!(self, CellValue::Absent)
    }

    /// Numeric view of the cell; booleans and text are not numeric
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// String form used by filters and comparisons; absent cells have none
    pub fn as_str_form(&self) -> Option<String> {
        match self {
            CellValue::Absent => None,
            CellValue::Int(i) => Some(i.to_string()),
            CellValue::Float(f) => Some(f.to_string()),
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Text(s) => Some(s.clone()),
        }
    }
}

impl std::fmt::Display for CellValue {
    /// Display form; absent cells render as the "null" sentinel
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Absent => write!(f, "null"),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl<T> From<Option<T>> for CellValue
where
    T: Into<CellValue>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Absent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_type_numeric_equality() {
        assert_eq!(CellValue::Int(25), CellValue::Float(25.0));
        assert_eq!(CellValue::Float(25.0), CellValue::Int(25));
        assert_ne!(CellValue::Int(25), CellValue::Float(25.5));
        assert_eq!(CellValue::Float(f64::NAN), CellValue::Float(f64::NAN));
    }

    #[test]
    fn test_absent_is_not_empty_text() {
        assert_ne!(CellValue::Absent, CellValue::Text(String::new()));
        assert!(CellValue::Absent.is_absent());
        assert!(!CellValue::Text(String::new()).is_absent());
    }

    #[test]
    fn test_str_form() {
        assert_eq!(CellValue::Int(30).as_str_form().as_deref(), Some("30"));
        assert_eq!(CellValue::Float(30.0).as_str_form().as_deref(), Some("30"));
        assert_eq!(CellValue::Bool(true).as_str_form().as_deref(), Some("true"));
        assert_eq!(CellValue::Absent.as_str_form(), None);
    }

    #[test]
    fn test_display_sentinel() {
        assert_eq!(CellValue::Absent.to_string(), "null");
        assert_eq!(CellValue::Text("x".into()).to_string(), "x");
    }
}
