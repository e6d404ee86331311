//! Seasonal ARIMA forecasting on top of `anofox_forecast`.
//!
//! - [`model`]: search limits, criterion and the reported model order
//! - [`correlogram`]: ACF and PACF vectors for the diagnostics chart
//! - [`runner`]: the fit / forecast / render pipeline

pub mod correlogram;
pub mod model;
pub mod runner;

pub use model::{AutoArimaConfig, InformationCriterion, ModelOrder};
pub use runner::{
    fit, forecast, forecasting_pipeline, FittedModel, ForecastOutcome, ForecastRunner, RunnerState,
};
