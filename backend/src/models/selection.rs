//! The current UI selection, passed whole into every controller invocation.
//!
//! Nothing here is retained between requests: the browser sends the complete
//! set of widget values each time it wants a view.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Allowed values for the ACF/PACF lag window slider.
pub const LAG_WINDOW_RANGE: RangeInclusive<usize> = 50..=60;

/// Allowed values for the seasonal period slider.
pub const SEASONAL_PERIOD_RANGE: RangeInclusive<usize> = 24..=48;

/// Smallest number of rows the dataset preview shows.
pub const MIN_PREVIEW_ROWS: usize = 5;

/// Top-level activity picked in the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activity {
    #[serde(rename = "Exploratory Data Analysis")]
    ExploratoryDataAnalysis,
    #[serde(rename = "Plotting and Visualization")]
    PlottingAndVisualization,
    #[serde(rename = "Building Model")]
    BuildingModel,
    #[serde(rename = "About")]
    About,
}

impl Activity {
    pub const ALL: [Activity; 4] = [
        Activity::ExploratoryDataAnalysis,
        Activity::PlottingAndVisualization,
        Activity::BuildingModel,
        Activity::About,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Activity::ExploratoryDataAnalysis => "Exploratory Data Analysis",
            Activity::PlottingAndVisualization => "Plotting and Visualization",
            Activity::BuildingModel => "Building Model",
            Activity::About => "About",
        }
    }

    /// Whether the activity needs an uploaded file before it can render.
    pub fn requires_upload(&self) -> bool {
        !matches!(self, Activity::About)
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Radio choice for the shape step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ShapeView {
    Rows,
    Columns,
    #[default]
    Shape,
}

/// Chart kinds offered in the plotting activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Area,
    Line,
    Scatter,
    Pie,
    Bar,
    Correlation,
    Distribution,
}

impl ChartKind {
    pub const ALL: [ChartKind; 7] = [
        ChartKind::Area,
        ChartKind::Line,
        ChartKind::Scatter,
        ChartKind::Pie,
        ChartKind::Bar,
        ChartKind::Correlation,
        ChartKind::Distribution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Area => "area",
            ChartKind::Line => "line",
            ChartKind::Scatter => "scatter",
            ChartKind::Pie => "pie",
            ChartKind::Bar => "bar",
            ChartKind::Correlation => "correlation",
            ChartKind::Distribution => "distribution",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forecasting models the training step can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ModelKind {
    #[default]
    AutoArima,
}

/// Checkbox state of the exploratory data analysis activity.
///
/// Each populated field is one independent step of the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EdaOptions {
    /// Show the first N rows of the dataset.
    pub show_dataset: Option<usize>,
    pub show_columns: bool,
    pub column_types: bool,
    pub shape: Option<ShapeView>,
    pub null_values: bool,
    pub summary: bool,
    /// Columns picked for the time series / ACF / PACF plot.
    pub time_series: Option<Vec<String>>,
}

/// Plotting activity state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotOptions {
    pub kind: ChartKind,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub x_axis: Option<String>,
    #[serde(default)]
    pub y_axis: Option<String>,
}

/// Building-model activity state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ModelOptions {
    /// Columns used for training; the first one is the modelled series.
    pub columns: Vec<String>,
    pub train_test_split: bool,
    /// Model to train, when the training button was pressed.
    pub train: Option<ModelKind>,
}

/// Every widget value of one interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub activity: Activity,
    #[serde(default = "default_lag_window")]
    pub lag_window: usize,
    #[serde(default = "default_seasonal_period")]
    pub seasonal_period: usize,
    #[serde(default)]
    pub eda: EdaOptions,
    #[serde(default)]
    pub plot: Option<PlotOptions>,
    #[serde(default)]
    pub model: ModelOptions,
}

fn default_lag_window() -> usize {
    *LAG_WINDOW_RANGE.start()
}

fn default_seasonal_period() -> usize {
    *SEASONAL_PERIOD_RANGE.start()
}

impl Selection {
    /// Selection for `activity` with every slider at its minimum and no
    /// sub-option ticked.
    pub fn new(activity: Activity) -> Self {
        Self {
            activity,
            lag_window: default_lag_window(),
            seasonal_period: default_seasonal_period(),
            eda: EdaOptions::default(),
            plot: None,
            model: ModelOptions::default(),
        }
    }

    pub fn with_eda(mut self, eda: EdaOptions) -> Self {
        self.eda = eda;
        self
    }

    pub fn with_plot(mut self, plot: PlotOptions) -> Self {
        self.plot = Some(plot);
        self
    }

    pub fn with_model(mut self, model: ModelOptions) -> Self {
        self.model = model;
        self
    }

    pub fn with_seasonal_period(mut self, period: usize) -> Self {
        self.seasonal_period = period;
        self
    }

    pub fn with_lag_window(mut self, lags: usize) -> Self {
        self.lag_window = lags;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_deserializes_with_defaults() {
        let selection: Selection =
            serde_json::from_str(r#"{"activity": "Building Model"}"#).unwrap();
        assert_eq!(selection.activity, Activity::BuildingModel);
        assert_eq!(selection.lag_window, 50);
        assert_eq!(selection.seasonal_period, 24);
        assert!(selection.plot.is_none());
        assert!(selection.model.columns.is_empty());
    }

    #[test]
    fn test_activity_labels_round_trip_through_serde() {
        for activity in Activity::ALL {
            let json = serde_json::to_string(&activity).unwrap();
            assert_eq!(json, format!("\"{}\"", activity.label()));
        }
    }

    #[test]
    fn test_plot_options_parse() {
        let selection: Selection = serde_json::from_str(
            r#"{"activity": "Plotting and Visualization",
                "plot": {"kind": "scatter", "x_axis": "a", "y_axis": "b"}}"#,
        )
        .unwrap();
        let plot = selection.plot.unwrap();
        assert_eq!(plot.kind, ChartKind::Scatter);
        assert_eq!(plot.x_axis.as_deref(), Some("a"));
        assert!(plot.columns.is_empty());
    }

    #[test]
    fn test_about_needs_no_upload() {
        assert!(!Activity::About.requires_upload());
        assert!(Activity::BuildingModel.requires_upload());
    }
}
