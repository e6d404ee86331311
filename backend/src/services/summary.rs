//! Summary reports over a loaded table: missing values, column types,
//! descriptive statistics, shape and preview rows.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Column, DType, Table};

/// Missing-value figures for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullReportRow {
    pub column: String,
    pub null_count: usize,
    pub null_fraction: f64,
    pub dtype: DType,
}

/// Columns with at least one missing value, highest fraction first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NullReport {
    pub rows: Vec<NullReportRow>,
}

impl NullReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_nulls(&self) -> usize {
        self.rows.iter().map(|r| r.null_count).sum()
    }
}

/// Descriptive statistics of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// `describe()`-style statistics for every numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DescriptiveStats {
    pub columns: Vec<ColumnStats>,
}

impl DescriptiveStats {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Column name and inferred type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTypeEntry {
    pub column: String,
    pub dtype: DType,
}

/// First rows of the table for a dataset preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePreview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Build the missing-value report.
///
/// Only columns with a nonzero null count are kept, sorted by descending
/// null fraction. Columns with equal fractions keep table order.
pub fn null_report(table: &Table) -> NullReport {
    let height = table.height();
    let mut rows: Vec<NullReportRow> = table
        .columns()
        .iter()
        .filter_map(|column| {
            let null_count = column.null_count();
            if null_count == 0 {
                return None;
            }
            Some(NullReportRow {
                column: column.name().to_string(),
                null_count,
                null_fraction: null_count as f64 / height as f64,
                dtype: column.dtype(),
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.null_fraction
            .partial_cmp(&a.null_fraction)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    NullReport { rows }
}

/// One entry per column, in table order.
pub fn column_types(table: &Table) -> Vec<ColumnTypeEntry> {
    table
        .columns()
        .iter()
        .map(|c| ColumnTypeEntry {
            column: c.name().to_string(),
            dtype: c.dtype(),
        })
        .collect()
}

/// Statistics for every numeric column; empty when there are none.
pub fn describe(table: &Table) -> DescriptiveStats {
    let columns = table
        .numeric_columns()
        .filter_map(|column| {
            let values = column.observed_f64()?;
            Some(compute_column_stats(column.name(), &values))
        })
        .collect();

    DescriptiveStats { columns }
}

/// `(rows, columns)`
pub fn shape(table: &Table) -> (usize, usize) {
    (table.height(), table.width())
}

/// First `rows` rows of every column.
pub fn head(table: &Table, rows: usize) -> TablePreview {
    let columns: Vec<&Column> = table.columns().iter().collect();
    head_of(&columns, rows)
}

/// First `rows` rows of the given columns, in the order given.
pub fn head_of(columns: &[&Column], rows: usize) -> TablePreview {
    let n = columns.iter().map(|c| c.len()).max().unwrap_or(0).min(rows);
    TablePreview {
        columns: columns.iter().map(|c| c.name().to_string()).collect(),
        rows: (0..n)
            .map(|row| columns.iter().map(|c| c.cell(row)).collect())
            .collect(),
    }
}

/// Compute count, mean, sample std, min, quartiles and max.
///
/// Quartiles use linear interpolation between order statistics. An empty
/// input yields a zero count and NaN everywhere else, and a single value has
/// a NaN standard deviation.
fn compute_column_stats(name: &str, values: &[f64]) -> ColumnStats {
    let count = values.len();
    if count == 0 {
        return ColumnStats {
            column: name.to_string(),
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q25: f64::NAN,
            median: f64::NAN,
            q75: f64::NAN,
            max: f64::NAN,
        };
    }

    let mean = values.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    } else {
        f64::NAN
    };

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    ColumnStats {
        column: name.to_string(),
        count,
        mean,
        std,
        min: sorted[0],
        q25: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q75: quantile_sorted(&sorted, 0.75),
        max: sorted[count - 1],
    }
}

/// Linear-interpolation quantile of a sorted, non-empty slice.
pub(crate) fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let weight = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_column_stats() {
        let stats = compute_column_stats("x", &[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(stats.count, 5);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.q25, 2.0);
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.q75, 4.0);
        assert_eq!(stats.max, 5.0);
        assert!((stats.std - 2.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_compute_column_stats_single_value() {
        let stats = compute_column_stats("x", &[7.0]);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.median, 7.0);
        assert!(stats.std.is_nan());
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [10.0, 20.0, 30.0, 40.0];
        assert_eq!(quantile_sorted(&sorted, 0.25), 17.5);
        assert_eq!(quantile_sorted(&sorted, 0.5), 25.0);
        assert_eq!(quantile_sorted(&sorted, 1.0), 40.0);
    }
}
