//! HTTP server module for the dashboard.
//!
//! A thin axum layer over the workflow controller. The browser posts the whole
//! selection together with the uploaded CSV text and gets back a rendered
//! [`View`](crate::api::View); step failures travel inside the view, so only
//! malformed requests and internal faults map to error statuses.
//!
//! # Routes
//!
//! ```text
//! GET  /               single-page dashboard
//! GET  /health         liveness and cache size
//! POST /v1/datasets    raw CSV body, returns the dataset summary
//! POST /v1/view        { csv, selection }, returns a view
//! ```

#[cfg(feature = "http-server")]
pub mod handlers;

#[cfg(feature = "http-server")]
pub mod router;

#[cfg(feature = "http-server")]
pub mod state;

#[cfg(feature = "http-server")]
pub mod error;

#[cfg(feature = "http-server")]
pub mod dto;

#[cfg(feature = "http-server")]
pub use router::create_router;

#[cfg(feature = "http-server")]
pub use state::AppState;
