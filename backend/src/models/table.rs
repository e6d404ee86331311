//! In-memory table produced by the CSV loader.
//!
//! A [`Table`] is an ordered list of named, single-typed columns. It is built
//! once per upload and never mutated afterwards; every dashboard step borrows
//! it read-only.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DashboardError, Result};
use crate::models::series::Series;

/// Inferred column type.
///
/// Display names follow the familiar dataframe vocabulary so the column-type
/// report reads the same as a pandas `dtypes` listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Integer,
    Float,
    Boolean,
    Text,
    /// Every cell of the column is missing.
    Null,
}

impl DType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, DType::Integer | DType::Float)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DType::Integer => "int64",
            DType::Float => "float64",
            DType::Boolean => "bool",
            DType::Text => "object",
            DType::Null => "null",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed cell storage for one column. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Numeric(Vec<Option<f64>>),
    Boolean(Vec<Option<bool>>),
    Text(Vec<Option<String>>),
}

impl ColumnValues {
    fn len(&self) -> usize {
        match self {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Boolean(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
        }
    }
}

/// A named column with a single inferred type.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    dtype: DType,
    values: ColumnValues,
}

impl Column {
    /// Floating point column.
    pub fn float(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            dtype: DType::Float,
            values: ColumnValues::Numeric(values),
        }
    }

    /// Integer column. Values are stored as `f64` but reported as integers.
    pub fn integer(name: impl Into<String>, values: Vec<Option<i64>>) -> Self {
        Self {
            name: name.into(),
            dtype: DType::Integer,
            values: ColumnValues::Numeric(values.into_iter().map(|v| v.map(|x| x as f64)).collect()),
        }
    }

    pub fn boolean(name: impl Into<String>, values: Vec<Option<bool>>) -> Self {
        Self {
            name: name.into(),
            dtype: DType::Boolean,
            values: ColumnValues::Boolean(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            dtype: DType::Text,
            values: ColumnValues::Text(values),
        }
    }

    /// Column whose every cell is missing.
    pub fn null(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            dtype: DType::Null,
            values: ColumnValues::Text(vec![None; len]),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        self.dtype.is_numeric()
    }

    /// Number of missing cells.
    pub fn null_count(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnValues::Boolean(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnValues::Text(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// Numeric view of the column, if it has one.
    ///
    /// Booleans map to 0/1 so they can be plotted on a numeric axis; text and
    /// all-missing columns have no numeric view.
    pub fn as_f64(&self) -> Option<Vec<Option<f64>>> {
        match &self.values {
            ColumnValues::Numeric(v) if self.dtype.is_numeric() => Some(v.clone()),
            ColumnValues::Boolean(v) => Some(
                v.iter()
                    .map(|x| x.map(|b| if b { 1.0 } else { 0.0 }))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Observed (non-missing) numeric values, in row order.
    pub fn observed_f64(&self) -> Option<Vec<f64>> {
        self.as_f64()
            .map(|values| values.into_iter().flatten().filter(|v| v.is_finite()).collect())
    }

    /// Cell at `row` as a JSON value for table views.
    pub fn cell(&self, row: usize) -> Value {
        match &self.values {
            ColumnValues::Numeric(v) => match v.get(row).copied().flatten() {
                Some(x) if self.dtype == DType::Integer => Value::from(x as i64),
                Some(x) => serde_json::Number::from_f64(x)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                None => Value::Null,
            },
            ColumnValues::Boolean(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(Value::Bool)
                .unwrap_or(Value::Null),
            ColumnValues::Text(v) => v
                .get(row)
                .cloned()
                .flatten()
                .map(Value::String)
                .unwrap_or(Value::Null),
        }
    }

    /// Display label of the cell at `row`, `None` when missing.
    pub fn label(&self, row: usize) -> Option<String> {
        match self.cell(row) {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    /// Count of each distinct non-missing value, most frequent first.
    ///
    /// Ties keep first-appearance order.
    pub fn value_counts(&self) -> Vec<(String, usize)> {
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, usize> = HashMap::new();
        for row in 0..self.len() {
            if let Some(label) = self.label(row) {
                let entry = counts.entry(label.clone()).or_insert(0);
                if *entry == 0 {
                    order.push(label);
                }
                *entry += 1;
            }
        }

        let mut result: Vec<(String, usize)> = order
            .into_iter()
            .map(|label| {
                let count = counts[&label];
                (label, count)
            })
            .collect();
        result.sort_by(|a, b| b.1.cmp(&a.1));
        result
    }
}

/// Immutable table of equally long, uniquely named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    height: usize,
}

impl Table {
    /// Build a table, checking that columns are equally long and uniquely named.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let height = columns.first().map(Column::len).unwrap_or(0);

        let mut seen = HashSet::new();
        for column in &columns {
            if column.len() != height {
                return Err(DashboardError::Parse(format!(
                    "column '{}' has {} rows, expected {}",
                    column.name(),
                    column.len(),
                    height
                )));
            }
            if !seen.insert(column.name().to_string()) {
                return Err(DashboardError::Parse(format!(
                    "duplicate column name '{}'",
                    column.name()
                )));
            }
        }

        Ok(Self { columns, height })
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Look up a column the user picked, rejecting unknown names.
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name).ok_or_else(|| {
            DashboardError::invalid_selection(format!("unknown column '{}'", name))
        })
    }

    /// Resolve a column selection in the order it was declared.
    ///
    /// The selection must be non-empty and a subset of the table's columns.
    pub fn select(&self, names: &[String]) -> Result<Vec<&Column>> {
        if names.is_empty() {
            return Err(DashboardError::invalid_selection(
                "select at least one column",
            ));
        }
        names.iter().map(|name| self.require_column(name)).collect()
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_numeric())
    }

    /// Total number of missing cells across the table.
    pub fn missing_cells(&self) -> usize {
        self.columns.iter().map(Column::null_count).sum()
    }

    /// Extract a numeric column as a positional series.
    ///
    /// An all-missing column has no observation to model.
    pub fn series(&self, name: &str) -> Result<Series> {
        let column = self.require_column(name)?;
        if column.dtype() == DType::Null {
            return Err(DashboardError::InsufficientData { needed: 1, got: 0 });
        }
        if !column.is_numeric() {
            return Err(DashboardError::invalid_selection(format!(
                "column '{}' has type {} and cannot be used as a time series",
                name,
                column.dtype()
            )));
        }
        let values = column.as_f64().unwrap_or_default();
        Ok(Series::new(name, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        Table::new(vec![
            Column::integer("id", vec![Some(1), Some(2), Some(3)]),
            Column::float("price", vec![Some(1.5), None, Some(2.5)]),
            Column::text(
                "city",
                vec![Some("Lima".into()), Some("Quito".into()), Some("Lima".into())],
            ),
            Column::boolean("open", vec![Some(true), None, None]),
        ])
        .unwrap()
    }

    #[test]
    fn test_table_dimensions() {
        let table = sample_table();
        assert_eq!(table.height(), 3);
        assert_eq!(table.width(), 4);
        assert_eq!(table.column_names(), vec!["id", "price", "city", "open"]);
    }

    #[test]
    fn test_table_rejects_ragged_columns() {
        let result = Table::new(vec![
            Column::float("a", vec![Some(1.0)]),
            Column::float("b", vec![Some(1.0), Some(2.0)]),
        ]);
        assert!(matches!(result, Err(DashboardError::Parse(_))));
    }

    #[test]
    fn test_table_rejects_duplicate_names() {
        let result = Table::new(vec![
            Column::float("a", vec![Some(1.0)]),
            Column::float("a", vec![Some(2.0)]),
        ]);
        assert!(matches!(result, Err(DashboardError::Parse(_))));
    }

    #[test]
    fn test_missing_cells() {
        assert_eq!(sample_table().missing_cells(), 3);
    }

    #[test]
    fn test_select_validates_subset() {
        let table = sample_table();
        let picked = table.select(&["price".into(), "id".into()]).unwrap();
        assert_eq!(picked[0].name(), "price");
        assert_eq!(picked[1].name(), "id");

        assert!(matches!(
            table.select(&["nope".into()]),
            Err(DashboardError::InvalidSelection(_))
        ));
        assert!(matches!(
            table.select(&[]),
            Err(DashboardError::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_series_of_null_column_is_insufficient_data() {
        let table = Table::new(vec![
            Column::float("sales", vec![Some(1.0), Some(2.0)]),
            Column::null("notes", 2),
        ])
        .unwrap();

        assert_eq!(table.series("sales").unwrap().len(), 2);
        assert_eq!(table.series("notes").unwrap_err().code(), "INSUFFICIENT_DATA");
    }

    #[test]
    fn test_cells_render_by_type() {
        let table = sample_table();
        assert_eq!(table.column("id").unwrap().cell(0), Value::from(1));
        assert_eq!(table.column("price").unwrap().cell(1), Value::Null);
        assert_eq!(table.column("city").unwrap().cell(1), Value::from("Quito"));
        assert_eq!(table.column("open").unwrap().cell(0), Value::Bool(true));
    }

    #[test]
    fn test_value_counts_most_frequent_first() {
        let table = sample_table();
        let counts = table.column("city").unwrap().value_counts();
        assert_eq!(counts, vec![("Lima".to_string(), 2), ("Quito".to_string(), 1)]);
    }

    #[test]
    fn test_series_requires_numeric_column() {
        let table = sample_table();
        let series = table.series("price").unwrap();
        assert_eq!(series.len(), 3);
        assert!(matches!(
            table.series("city"),
            Err(DashboardError::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_boolean_numeric_view() {
        let table = sample_table();
        let open = table.column("open").unwrap();
        assert!(!open.is_numeric());
        assert_eq!(open.as_f64().unwrap(), vec![Some(1.0), None, None]);
        assert!(table.column("city").unwrap().as_f64().is_none());
    }
}
