//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::services::TableCache;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Parsed uploads keyed by content hash
    pub cache: TableCache,
    pub config: Arc<DashboardConfig>,
}

impl AppState {
    /// Create the state for `config`, sizing the cache from its settings.
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            cache: TableCache::new(config.cache.max_tables),
            config: Arc::new(config),
        }
    }
}
