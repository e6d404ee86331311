//! # Time Series ML Dashboard
//!
//! Backend for a small browser dashboard that explores an uploaded CSV file,
//! charts its columns and forecasts one of them with an automatically
//! selected seasonal ARIMA model.
//!
//! ## Architecture
//!
//! - [`parsing`]: CSV bytes to a typed [`models::Table`] via polars
//! - [`models`]: tables, series and the UI selection
//! - [`services`]: summaries, charts, the train/test split, the parse cache
//!   and the workflow controller that assembles a view
//! - [`forecast`]: auto-ARIMA search settings, correlograms and the forecast runner
//! - [`api`]: serializable view blocks
//! - [`config`]: TOML configuration
//! - [`http`]: axum server (feature `http-server`)
//!
//! A request never mutates shared state beyond the parse cache, so views for
//! the same upload and selection are identical apart from their timestamp.

pub mod api;
pub mod config;
pub mod error;
pub mod forecast;
pub mod models;
pub mod parsing;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;

pub use error::{DashboardError, ForecastStage, Result};
