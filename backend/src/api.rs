//! View types produced by the workflow controller.
//!
//! A [`View`] is an ordered list of blocks: headings, text, tables, figures
//! and in-view errors. All types serialize to JSON for the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DashboardError, ForecastStage};
use crate::models::{Activity, DType};
use crate::services::charts::Figure;
use crate::services::summary::{ColumnTypeEntry, DescriptiveStats, NullReport, TablePreview};

/// Tabular block contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl TableBlock {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            title: None,
            columns,
            rows,
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl From<&NullReport> for TableBlock {
    fn from(report: &NullReport) -> Self {
        let columns = ["column", "# null", "% null", "type"]
            .into_iter()
            .map(String::from)
            .collect();
        let rows = report
            .rows
            .iter()
            .map(|row| {
                vec![
                    Value::from(row.column.clone()),
                    Value::from(row.null_count),
                    number(row.null_fraction),
                    Value::from(row.dtype.as_str()),
                ]
            })
            .collect();
        TableBlock::new(columns, rows)
    }
}

impl From<&DescriptiveStats> for TableBlock {
    /// One column per numeric column, one row per statistic.
    fn from(stats: &DescriptiveStats) -> Self {
        let mut columns = vec![String::new()];
        columns.extend(stats.columns.iter().map(|c| c.column.clone()));

        let labels = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];
        let rows = labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let mut row = vec![Value::from(*label)];
                row.extend(stats.columns.iter().map(|c| match i {
                    0 => Value::from(c.count),
                    1 => number(c.mean),
                    2 => number(c.std),
                    3 => number(c.min),
                    4 => number(c.q25),
                    5 => number(c.median),
                    6 => number(c.q75),
                    _ => number(c.max),
                }));
                row
            })
            .collect();
        TableBlock::new(columns, rows)
    }
}

impl From<&[ColumnTypeEntry]> for TableBlock {
    fn from(entries: &[ColumnTypeEntry]) -> Self {
        TableBlock::new(
            vec!["column".to_string(), "Type".to_string()],
            entries
                .iter()
                .map(|e| vec![Value::from(e.column.clone()), Value::from(e.dtype.as_str())])
                .collect(),
        )
    }
}

impl From<TablePreview> for TableBlock {
    fn from(preview: TablePreview) -> Self {
        TableBlock::new(preview.columns, preview.rows)
    }
}

/// JSON number, or null for NaN and infinities.
fn number(x: f64) -> Value {
    serde_json::Number::from_f64(x)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// One element of a rendered view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewBlock {
    Heading {
        text: String,
    },
    Text {
        text: String,
    },
    Table(TableBlock),
    Figure(Figure),
    /// A step that failed; the rest of the view is unaffected.
    Error {
        step: String,
        code: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        stage: Option<ForecastStage>,
    },
}

impl ViewBlock {
    pub fn heading(text: impl Into<String>) -> Self {
        ViewBlock::Heading { text: text.into() }
    }

    pub fn text(text: impl Into<String>) -> Self {
        ViewBlock::Text { text: text.into() }
    }

    pub fn error(step: impl Into<String>, err: &DashboardError) -> Self {
        ViewBlock::Error {
            step: step.into(),
            code: err.code().to_string(),
            message: err.to_string(),
            stage: err.stage(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ViewBlock::Error { .. })
    }
}

/// Everything rendered for one interaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub activity: Activity,
    pub blocks: Vec<ViewBlock>,
    pub rendered_at: DateTime<Utc>,
}

impl View {
    pub fn new(activity: Activity) -> Self {
        Self {
            activity,
            blocks: Vec::new(),
            rendered_at: Utc::now(),
        }
    }

    pub fn push(&mut self, block: ViewBlock) {
        self.blocks.push(block);
    }

    pub fn errors(&self) -> impl Iterator<Item = &ViewBlock> {
        self.blocks.iter().filter(|b| b.is_error())
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableBlock> {
        self.blocks.iter().filter_map(|b| match b {
            ViewBlock::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn figures(&self) -> impl Iterator<Item = &Figure> {
        self.blocks.iter().filter_map(|b| match b {
            ViewBlock::Figure(f) => Some(f),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().filter_map(|b| match b {
            ViewBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Name and inferred type of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: DType,
}

/// Result of loading an upload: its cache key, size and columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub dataset_id: String,
    pub rows: usize,
    pub columns: Vec<ColumnInfo>,
}
