//! Data Transfer Objects for the HTTP API.
//!
//! Responses mostly reuse the core view types, which already serialize.

use serde::{Deserialize, Serialize};

pub use crate::api::{DatasetSummary, View};
use crate::models::Selection;

/// Response for the health check endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Number of parsed uploads currently cached
    pub cached_tables: usize,
}

/// Request body for rendering a view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Uploaded CSV text; absent until the user picks a file
    #[serde(default)]
    pub csv: Option<String>,
    pub selection: Selection,
}
