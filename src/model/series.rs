//! Series: a single-column view with column statistics
//!
//! All statistics operate on the column's numeric subset (integers and
//! floats); absent, boolean and text cells are skipped. Reductions fan out
//! through rayon; order statistics sort the subset first.

use std::cmp::Ordering;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::model::CellValue;

/// An owned, independent copy of one column's values paired 1:1 with row
/// labels. Mutating a Series never affects the frame it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    values: Vec<CellValue>,
    labels: Vec<String>,
}

impl Series {
    /// Create a series from values and labels of equal length
    pub fn new(values: Vec<CellValue>, labels: Vec<String>) -> Result<Self> {
        if values.len() != labels.len() {
            return Err(Error::InvalidArgument(format!(
                "values and labels must be the same length ({} vs {})",
                values.len(),
                labels.len()
            )));
        }
        Ok(Self { values, labels })
    }

    /// Number of cells, absent ones included
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the series holds no cells
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Cell at a position
    pub fn get(&self, position: usize) -> Option<&CellValue> {
        self.values.get(position)
    }

    /// Cell behind the first matching row label
    pub fn get_by_label(&self, label: &str) -> Option<&CellValue> {
        let pos = self.labels.iter().position(|l| l == label)?;
        self.values.get(pos)
    }

    /// Cell values
    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    /// Row labels
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    // ---- statistics ----

    /// Count of non-absent cells of any type
    pub fn count(&self) -> usize {
        self.values.par_iter().filter(|v| !v.is_absent()).count()
    }

    /// Minimum of the numeric subset
    pub fn min(&self) -> Option<f64> {
        self.numeric_values().into_par_iter().reduce_with(f64::min)
    }

    /// Maximum of the numeric subset
    pub fn max(&self) -> Option<f64> {
        self.numeric_values().into_par_iter().reduce_with(f64::max)
    }

    /// Sum of the numeric subset
    pub fn sum(&self) -> Option<f64> {
        let numeric = self.numeric_values();
        if numeric.is_empty() {
            return None;
        }
        Some(numeric.par_iter().sum())
    }

    /// Arithmetic mean of the numeric subset
    pub fn mean(&self) -> Option<f64> {
        let numeric = self.numeric_values();
        if numeric.is_empty() {
            return None;
        }
        let sum: f64 = numeric.par_iter().sum();
        Some(sum / numeric.len() as f64)
    }

    /// Median of the numeric subset; even counts average the two middle
    /// elements
    pub fn median(&self) -> Option<f64> {
        let sorted = self.sorted_numeric_values();
        if sorted.is_empty() {
            return None;
        }
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Some((sorted[mid] + sorted[mid - 1]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }

    /// Population standard deviation (divisor n, not n - 1)
    pub fn std_dev(&self) -> Option<f64> {
        let numeric = self.numeric_values();
        if numeric.is_empty() {
            return None;
        }
        let n = numeric.len() as f64;
        let mean: f64 = numeric.par_iter().sum::<f64>() / n;
        let variance: f64 = numeric.par_iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        Some(variance.sqrt())
    }

    /// Percentile by linear interpolation between bracketing order
    /// statistics at position `p * (n - 1) / 100`.
    ///
    /// `p` outside [0, 100] or an empty numeric subset yield `None`.
    pub fn percentile(&self, p: f64) -> Option<f64> {
        if !(0.0..=100.0).contains(&p) {
            return None;
        }
        let sorted = self.sorted_numeric_values();
        interpolate(&sorted, p)
    }

    /// 25th percentile
    pub fn percentile_25(&self) -> Option<f64> {
        self.percentile(25.0)
    }

    /// 50th percentile, identical to [`Series::median`] for any input
    pub fn percentile_50(&self) -> Option<f64> {
        self.percentile(50.0)
    }

    /// 75th percentile
    pub fn percentile_75(&self) -> Option<f64> {
        self.percentile(75.0)
    }

    /// The default percentile set {25, 50, 75}
    pub fn percentiles_default(&self) -> Vec<(f64, f64)> {
        self.percentiles(&[25.0, 50.0, 75.0])
    }

    /// Requested percentiles, in request order. Values outside [0, 100]
    /// are skipped; an empty numeric subset yields an empty mapping.
    pub fn percentiles(&self, percentiles: &[f64]) -> Vec<(f64, f64)> {
        let sorted = self.sorted_numeric_values();
        if sorted.is_empty() {
            return Vec::new();
        }
        percentiles
            .iter()
            .filter(|p| (0.0..=100.0).contains(*p))
            .filter_map(|&p| interpolate(&sorted, p).map(|v| (p, v)))
            .collect()
    }

    fn numeric_values(&self) -> Vec<f64> {
        self.values.par_iter().filter_map(CellValue::as_f64).collect()
    }

    fn sorted_numeric_values(&self) -> Vec<f64> {
        let mut numeric = self.numeric_values();
        numeric.par_sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        numeric
    }
}

fn interpolate(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = p * (sorted.len() - 1) as f64 / 100.0;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        Some(sorted[lower])
    } else {
        Some(sorted[lower] + (pos - lower as f64) * (sorted[upper] - sorted[lower]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric_series(values: &[f64]) -> Series {
        let cells: Vec<CellValue> = values.iter().map(|&v| CellValue::Float(v)).collect();
        let labels = (0..values.len()).map(|i| i.to_string()).collect();
        Series::new(cells, labels).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        let tolerance = 1e-9 * expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {} within {} of {}",
            actual,
            tolerance,
            expected
        );
    }

    #[test]
    fn test_length_mismatch_is_invalid_argument() {
        let err = Series::new(vec![CellValue::Int(1)], vec![]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_count_includes_non_numeric_cells() {
        let s = Series::new(
            vec![
                CellValue::Int(1),
                CellValue::from("text"),
                CellValue::Bool(true),
                CellValue::Absent,
            ],
            vec!["0".into(), "1".into(), "2".into(), "3".into()],
        )
        .unwrap();
        assert_eq!(s.count(), 3);
    }

    #[test]
    fn test_stats_skip_non_numeric_cells() {
        let s = Series::new(
            vec![
                CellValue::Int(10),
                CellValue::from("oops"),
                CellValue::Float(20.0),
                CellValue::Absent,
                CellValue::Bool(true),
            ],
            (0..5).map(|i| i.to_string()).collect(),
        )
        .unwrap();
        assert_close(s.sum().unwrap(), 30.0);
        assert_close(s.mean().unwrap(), 15.0);
        assert_close(s.min().unwrap(), 10.0);
        assert_close(s.max().unwrap(), 20.0);
    }

    #[test]
    fn test_empty_numeric_subset_yields_none() {
        let s = Series::new(
            vec![CellValue::from("a"), CellValue::Absent],
            vec!["0".into(), "1".into()],
        )
        .unwrap();
        assert_eq!(s.min(), None);
        assert_eq!(s.max(), None);
        assert_eq!(s.sum(), None);
        assert_eq!(s.mean(), None);
        assert_eq!(s.median(), None);
        assert_eq!(s.std_dev(), None);
        assert_eq!(s.percentile(50.0), None);
        assert!(s.percentiles(&[25.0, 50.0]).is_empty());
    }

    #[test]
    fn test_std_dev_uses_population_divisor() {
        // Hand-computed: mean 5, squared deviations sum 32, 32/8 = 4
        let s = numeric_series(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(s.std_dev().unwrap(), 2.0);
    }

    #[test]
    fn test_median_even_count_averages_middle_pair() {
        let s = numeric_series(&[4.0, 1.0, 3.0, 2.0]);
        assert_close(s.median().unwrap(), 2.5);
    }

    #[test]
    fn test_percentile_50_equals_median() {
        for values in [
            &[1.0, 2.0, 3.0][..],
            &[5.0, 1.0, 9.0, 4.0][..],
            &[42.0][..],
            &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0][..],
        ] {
            let s = numeric_series(values);
            assert_close(s.percentile(50.0).unwrap(), s.median().unwrap());
        }
    }

    #[test]
    fn test_percentile_interpolates_between_order_statistics() {
        let s = numeric_series(&[10.0, 20.0, 30.0, 40.0]);
        // position 25 * 3 / 100 = 0.75 -> 10 + 0.75 * 10
        assert_close(s.percentile(25.0).unwrap(), 17.5);
        assert_close(s.percentile(0.0).unwrap(), 10.0);
        assert_close(s.percentile(100.0).unwrap(), 40.0);
    }

    #[test]
    fn test_percentile_out_of_range_yields_none() {
        let s = numeric_series(&[1.0, 2.0]);
        assert_eq!(s.percentile(-0.1), None);
        assert_eq!(s.percentile(100.1), None);
    }

    #[test]
    fn test_percentiles_skips_out_of_range_requests() {
        let s = numeric_series(&[1.0, 2.0, 3.0]);
        let result = s.percentiles(&[50.0, 150.0, 0.0]);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].0, 50.0);
        assert_eq!(result[1].0, 0.0);
    }

    #[test]
    fn test_parallel_sum_matches_sequential_within_tolerance() {
        let values: Vec<f64> = (1..=1000).map(|i| i as f64 * 0.1).collect();
        let s = numeric_series(&values);
        let sequential: f64 = values.iter().sum();
        assert_close(s.sum().unwrap(), sequential);
    }

    #[test]
    fn test_get_by_label_uses_first_match() {
        let s = Series::new(
            vec![CellValue::Int(1), CellValue::Int(2)],
            vec!["x".into(), "x".into()],
        )
        .unwrap();
        assert_eq!(s.get_by_label("x"), Some(&CellValue::Int(1)));
        assert_eq!(s.get_by_label("y"), None);
    }
}
