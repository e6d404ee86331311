//! Error types for dashboard operations.
//!
//! Every failure a dashboard step can hit maps onto one of these variants. The
//! workflow controller catches them and turns them into in-view error blocks,
//! so none of them ever reaches the HTTP layer as a transport error.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result type for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Stage of the forecasting pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastStage {
    Fitting,
    Forecasting,
    Rendering,
}

impl fmt::Display for ForecastStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ForecastStage::Fitting => "fitting",
            ForecastStage::Forecasting => "forecasting",
            ForecastStage::Rendering => "rendering",
        };
        f.write_str(name)
    }
}

/// Error type for dashboard operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DashboardError {
    /// The uploaded content is not well-formed delimited text.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Column selection or chart kind does not fit the table.
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// A series is too short to split or to fit.
    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The forecaster could not be fitted or lacks seasonal history.
    #[error("Fit error: {0}")]
    Fit(String),

    /// Drawing a figure failed.
    #[error("Render error: {0}")]
    Render(String),

    /// A forecasting pipeline aborted; `stage` names where.
    #[error("Forecast pipeline failed during {stage}: {source}")]
    Pipeline {
        stage: ForecastStage,
        source: Box<DashboardError>,
    },
}

impl DashboardError {
    /// Stable machine-readable code for the error kind.
    ///
    /// Pipeline failures report the code of the underlying error.
    pub fn code(&self) -> &'static str {
        match self {
            DashboardError::Parse(_) => "PARSE_ERROR",
            DashboardError::InvalidSelection(_) => "INVALID_SELECTION",
            DashboardError::InsufficientData { .. } => "INSUFFICIENT_DATA",
            DashboardError::Fit(_) => "FIT_ERROR",
            DashboardError::Render(_) => "RENDER_ERROR",
            DashboardError::Pipeline { source, .. } => source.code(),
        }
    }

    pub fn invalid_selection(message: impl Into<String>) -> Self {
        DashboardError::InvalidSelection(message.into())
    }

    pub fn fit(message: impl Into<String>) -> Self {
        DashboardError::Fit(message.into())
    }

    /// Record the pipeline stage an error escaped from.
    ///
    /// An error that already names a stage keeps the innermost one.
    pub fn in_stage(self, stage: ForecastStage) -> Self {
        match self {
            DashboardError::Pipeline { .. } => self,
            other => DashboardError::Pipeline {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Pipeline stage that failed, if the error came out of a pipeline.
    pub fn stage(&self) -> Option<ForecastStage> {
        match self {
            DashboardError::Pipeline { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The underlying error with pipeline context removed.
    pub fn root(&self) -> &DashboardError {
        match self {
            DashboardError::Pipeline { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<anofox_forecast::ForecastError> for DashboardError {
    fn from(err: anofox_forecast::ForecastError) -> Self {
        match err {
            anofox_forecast::ForecastError::InsufficientData { needed, got } => {
                DashboardError::InsufficientData { needed, got }
            }
            other => DashboardError::Fit(other.to_string()),
        }
    }
}

/// Map any displayable drawing error into a `Render` error.
pub(crate) fn render_error<E: fmt::Display>(err: E) -> DashboardError {
    DashboardError::Render(err.to_string())
}
