//! Selection engine: label/position resolution, row filtering, and the
//! lazily evaluated `Selector` builder

use crate::error::{Error, Result};
use crate::model::{CellValue, DataFrame};

/// Empty row selections historically expand to `0..column_count - 1`, a
/// bound taken from the column axis rather than the row axis. Downstream
/// callers rely on the old range, so it stays switchable rather than
/// silently corrected.
pub(crate) const EMPTY_ROW_RANGE_FROM_COLUMN_COUNT: bool = true;

impl DataFrame {
    /// Select rows by label and columns by name.
    ///
    /// Row labels resolve by first match; unknown labels and columns are
    /// skipped silently. The result keeps the requested row order, while
    /// columns come out in the frame's insertion order filtered to the
    /// requested set. An empty array selects the whole axis.
    pub fn get_by_labels(&self, row_labels: &[&str], col_labels: &[&str]) -> DataFrame {
        let rows: Vec<usize> = if row_labels.is_empty() {
            (0..self.row_count()).collect()
        } else {
            row_labels
                .iter()
                .filter_map(|wanted| self.labels.iter().position(|l| l == wanted))
                .collect()
        };

        let mut out = DataFrame::with_labels(
            rows.iter()
                .map(|&i| {
                    self.labels
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| i.to_string())
                })
                .collect(),
        );

        for (name, values) in &self.columns {
            if !col_labels.is_empty() && !col_labels.iter().any(|c| c == name) {
                continue;
            }
            out.add_column(name.clone(), Self::take_rows(values, &rows));
        }
        out
    }

    /// Select rows and columns by position.
    ///
    /// Out-of-range indices are dropped silently. An empty row array
    /// expands per [`EMPTY_ROW_RANGE_FROM_COLUMN_COUNT`]; an empty column
    /// array yields zero columns.
    pub fn get_by_positions(&self, row_indices: &[usize], col_indices: &[usize]) -> DataFrame {
        let rows: Vec<usize> = if row_indices.is_empty() {
            let end = if EMPTY_ROW_RANGE_FROM_COLUMN_COUNT {
                self.column_count().saturating_sub(1)
            } else {
                self.row_count()
            };
            (0..end).filter(|&i| i < self.row_count()).collect()
        } else {
            row_indices
                .iter()
                .copied()
                .filter(|&i| i < self.row_count())
                .collect()
        };

        let mut out = DataFrame::with_labels(
            rows.iter()
                .map(|&i| {
                    self.labels
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| i.to_string())
                })
                .collect(),
        );

        for &col in col_indices {
            if let Some((name, values)) = self.columns.get_index(col) {
                out.add_column(name.clone(), Self::take_rows(values, &rows));
            }
        }
        out
    }

    /// Single cell by row label and column name; absent when either is
    /// missing
    pub fn get_by_label(&self, row_label: &str, col_label: &str) -> CellValue {
        let Some(values) = self.columns.get(col_label) else {
            return CellValue::Absent;
        };
        self.labels
            .iter()
            .position(|l| l == row_label)
            .and_then(|pos| values.get(pos))
            .cloned()
            .unwrap_or(CellValue::Absent)
    }

    /// Single cell by row and column position; absent when out of range
    pub fn get_by_position(&self, row: usize, col: usize) -> CellValue {
        self.columns
            .get_index(col)
            .and_then(|(_, values)| values.get(row))
            .cloned()
            .unwrap_or(CellValue::Absent)
    }

    /// Keep the rows whose cell in `column` satisfies the predicate.
    ///
    /// The predicate receives the cell's string form, or `None` when the
    /// cell is absent or the column is too short for that row.
    pub fn filter_by_string_predicate<F>(&self, column: &str, predicate: F) -> DataFrame
    where
        F: Fn(Option<&str>) -> bool,
    {
        let target = self.columns.get(column);
        let rows: Vec<usize> = (0..self.row_count())
            .filter(|&i| {
                let form = target
                    .and_then(|values| values.get(i))
                    .and_then(CellValue::as_str_form);
                predicate(form.as_deref())
            })
            .collect();

        let mut out = DataFrame::with_labels(
            rows.iter()
                .map(|&i| {
                    self.labels
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| i.to_string())
                })
                .collect(),
        );
        for (name, values) in &self.columns {
            out.add_column(name.clone(), Self::take_rows(values, &rows));
        }
        out
    }

    /// Rows whose cell stringifies exactly to `text`; absent cells are
    /// excluded
    pub fn filter_equals(&self, column: &str, text: &str) -> DataFrame {
        self.filter_by_string_predicate(column, |s| s == Some(text))
    }

    /// Case-insensitive variant of [`DataFrame::filter_equals`]
    pub fn filter_equals_ignore_case(&self, column: &str, text: &str) -> DataFrame {
        self.filter_by_string_predicate(column, |s| {
            s.is_some_and(|v| v.eq_ignore_ascii_case(text))
        })
    }

    /// Rows whose cell's string form contains `text`
    pub fn filter_contains(&self, column: &str, text: &str) -> DataFrame {
        self.filter_by_string_predicate(column, |s| s.is_some_and(|v| v.contains(text)))
    }

    /// Rows whose cell is present and stringifies to non-empty text
    pub fn filter_not_empty(&self, column: &str) -> DataFrame {
        self.filter_by_string_predicate(column, |s| s.is_some_and(|v| !v.is_empty()))
    }

    fn take_rows(values: &[CellValue], rows: &[usize]) -> Vec<CellValue> {
        rows.iter()
            .map(|&i| values.get(i).cloned().unwrap_or(CellValue::Absent))
            .collect()
    }
}

type StringPredicate<'a> = Box<dyn Fn(Option<&str>) -> bool + 'a>;

/// Accumulated selection configuration, evaluated only at [`Selector::get`]
/// or [`Selector::value`]. Filters apply in the order they were chained,
/// before any label/position slicing.
pub struct Selector<'a> {
    frame: &'a DataFrame,
    row_labels: Option<Vec<String>>,
    col_labels: Option<Vec<String>>,
    row_positions: Option<Vec<usize>>,
    col_positions: Option<Vec<usize>>,
    filters: Vec<(String, StringPredicate<'a>)>,
}

impl<'a> Selector<'a> {
    pub(crate) fn new(frame: &'a DataFrame) -> Self {
        Self {
            frame,
            row_labels: None,
            col_labels: None,
            row_positions: None,
            col_positions: None,
            filters: Vec::new(),
        }
    }

    /// Rows to select by label
    pub fn rows(mut self, labels: &[&str]) -> Self {
        self.row_labels = Some(labels.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Columns to select by name
    pub fn columns(mut self, labels: &[&str]) -> Self {
        self.col_labels = Some(labels.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Rows to select by position
    pub fn rows_at(mut self, indices: &[usize]) -> Self {
        self.row_positions = Some(indices.to_vec());
        self
    }

    /// Columns to select by position
    pub fn columns_at(mut self, indices: &[usize]) -> Self {
        self.col_positions = Some(indices.to_vec());
        self
    }

    /// Chain an exact string-equality filter
    pub fn filter_equals(self, column: &str, text: &str) -> Self {
        let text = text.to_string();
        self.filter(column, move |s| s == Some(text.as_str()))
    }

    /// Chain a case-insensitive string-equality filter
    pub fn filter_equals_ignore_case(self, column: &str, text: &str) -> Self {
        let text = text.to_string();
        self.filter(column, move |s| {
            s.is_some_and(|v| v.eq_ignore_ascii_case(&text))
        })
    }

    /// Chain a substring filter
    pub fn filter_contains(self, column: &str, text: &str) -> Self {
        let text = text.to_string();
        self.filter(column, move |s| s.is_some_and(|v| v.contains(&text)))
    }

    /// Chain a present-and-non-empty filter
    pub fn filter_not_empty(self, column: &str) -> Self {
        self.filter(column, |s| s.is_some_and(|v| !v.is_empty()))
    }

    /// Chain an arbitrary string-form predicate
    pub fn filter<F>(mut self, column: &str, predicate: F) -> Self
    where
        F: Fn(Option<&str>) -> bool + 'a,
    {
        self.filters.push((column.to_string(), Box::new(predicate)));
        self
    }

    /// Evaluate the accumulated selection into a new frame
    pub fn get(self) -> DataFrame {
        let filtered = self.filtered_frame();
        let frame = filtered.as_ref().unwrap_or(self.frame);

        if self.row_labels.is_some() || self.col_labels.is_some() {
            let rows = as_str_slice(&self.row_labels);
            let cols = as_str_slice(&self.col_labels);
            frame.get_by_labels(&rows, &cols)
        } else if self.row_positions.is_some() || self.col_positions.is_some() {
            frame.get_by_positions(
                self.row_positions.as_deref().unwrap_or(&[]),
                self.col_positions.as_deref().unwrap_or(&[]),
            )
        } else {
            frame.clone()
        }
    }

    /// Evaluate to a single cell.
    ///
    /// Fails with [`Error::InvalidState`] unless exactly one row and one
    /// column selector, each of length 1, were supplied.
    pub fn value(self) -> Result<CellValue> {
        let filtered = self.filtered_frame();
        let frame = filtered.as_ref().unwrap_or(self.frame);

        if let (Some(rows), Some(cols)) = (&self.row_labels, &self.col_labels) {
            if rows.len() == 1 && cols.len() == 1 {
                return Ok(frame.get_by_label(&rows[0], &cols[0]));
            }
        }
        if let (Some(rows), Some(cols)) = (&self.row_positions, &self.col_positions) {
            if rows.len() == 1 && cols.len() == 1 {
                return Ok(frame.get_by_position(rows[0], cols[0]));
            }
        }
        Err(Error::InvalidState(
            "single value access requires exactly one row and one column".to_string(),
        ))
    }

    fn filtered_frame(&self) -> Option<DataFrame> {
        if self.filters.is_empty() {
            return None;
        }
        let mut frame = None;
        for (column, predicate) in &self.filters {
            let source = frame.as_ref().unwrap_or(self.frame);
            frame = Some(source.filter_by_string_predicate(column, predicate));
        }
        frame
    }
}

fn as_str_slice(labels: &Option<Vec<String>>) -> Vec<&str> {
    labels
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(String::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> DataFrame {
        let mut df = DataFrame::new();
        df.add_column(
            "name",
            vec![
                CellValue::from("Alice"),
                CellValue::from("Bob"),
                CellValue::from("Charlie"),
                CellValue::from("Martha"),
            ],
        );
        df.add_column(
            "age",
            vec![
                CellValue::Int(25),
                CellValue::Int(30),
                CellValue::Int(35),
                CellValue::Absent,
            ],
        );
        df.add_column(
            "city",
            vec![
                CellValue::from("Rome"),
                CellValue::from("Lima"),
                CellValue::from("Oslo"),
                CellValue::from("Kiel"),
            ],
        );
        df
    }

    #[test]
    fn test_get_by_labels_keeps_requested_row_order() {
        let df = people();
        let sub = df.get_by_labels(&["2", "0"], &["name"]);
        assert_eq!(sub.labels(), &["2", "0"]);
        assert_eq!(
            sub.columns["name"],
            vec![CellValue::from("Charlie"), CellValue::from("Alice")]
        );
    }

    #[test]
    fn test_get_by_labels_emits_columns_in_insertion_order() {
        let df = people();
        // Requested column order is ignored; the frame's order wins.
        let sub = df.get_by_labels(&["0"], &["city", "name"]);
        assert_eq!(sub.column_names(), vec!["name", "city"]);
    }

    #[test]
    fn test_get_by_labels_skips_unknown_labels() {
        let df = people();
        let sub = df.get_by_labels(&["1", "ghost"], &["name", "ghost"]);
        assert_eq!(sub.labels(), &["1"]);
        assert_eq!(sub.column_names(), vec!["name"]);
    }

    #[test]
    fn test_get_by_labels_empty_axis_selects_everything() {
        let df = people();
        let sub = df.get_by_labels(&[], &[]);
        assert_eq!(sub, df);
    }

    // Pins current behavior: the expanded range is 0..column_count-1,
    // not a row-axis bound.
    #[test]
    fn test_empty_row_positions_expand_from_column_count() {
        let df = people();
        assert_eq!(df.column_count(), 3);
        let sub = df.get_by_positions(&[], &[1, 2]);
        assert_eq!(sub.labels(), &["0", "1"]);
        assert_eq!(sub.column_names(), vec!["age", "city"]);
    }

    #[test]
    fn test_empty_col_positions_yield_zero_columns() {
        let df = people();
        let sub = df.get_by_positions(&[0, 1], &[]);
        assert_eq!(sub.column_count(), 0);
    }

    #[test]
    fn test_out_of_range_positions_dropped_silently() {
        let df = people();
        let sub = df.get_by_positions(&[1, 99], &[0, 99]);
        assert_eq!(sub.labels(), &["1"]);
        assert_eq!(sub.column_names(), vec!["name"]);
    }

    #[test]
    fn test_filter_equals_matches_stringified_numbers() {
        let df = people();
        let sub = df.filter_equals("age", "30");
        assert_eq!(sub.labels(), &["1"]);
        assert_eq!(sub.columns["name"], vec![CellValue::from("Bob")]);
    }

    #[test]
    fn test_filter_not_empty_drops_absent_rows() {
        let df = people();
        let sub = df.filter_not_empty("age");
        assert_eq!(sub.row_count(), 3);
        assert!(!sub
            .columns["name"]
            .contains(&CellValue::from("Martha")));
    }

    #[test]
    fn test_filter_equals_ignore_case_and_contains() {
        let df = people();
        assert_eq!(df.filter_equals_ignore_case("name", "ALICE").row_count(), 1);
        assert_eq!(df.filter_contains("name", "ar").row_count(), 2); // Charlie, Martha
    }

    #[test]
    fn test_selector_filters_apply_before_slicing() {
        let df = people();
        let sub = df
            .select()
            .filter_not_empty("age")
            .filter_contains("name", "li")
            .columns(&["name"])
            .get();
        // Alice and Charlie survive the chained filters.
        assert_eq!(sub.row_count(), 2);
        assert_eq!(sub.column_names(), vec!["name"]);
    }

    #[test]
    fn test_selector_value_by_labels() {
        let df = people();
        let value = df
            .select()
            .rows(&["1"])
            .columns(&["age"])
            .value()
            .unwrap();
        assert_eq!(value, CellValue::Int(30));
    }

    #[test]
    fn test_selector_value_by_positions() {
        let df = people();
        let value = df.select().rows_at(&[2]).columns_at(&[0]).value().unwrap();
        assert_eq!(value, CellValue::from("Charlie"));
    }

    #[test]
    fn test_selector_value_requires_single_selectors() {
        let df = people();
        let err = df.select().rows(&["0", "1"]).columns(&["age"]).value();
        assert!(matches!(err, Err(Error::InvalidState(_))));
        let err = df.select().rows(&["0"]).value();
        assert!(matches!(err, Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_selector_without_selectors_returns_filtered_frame() {
        let df = people();
        let sub = df.select().filter_equals("name", "Bob").get();
        assert_eq!(sub.row_count(), 1);
        assert_eq!(sub.column_count(), 3);
    }
}
