//! Dashboard configuration file support.
//!
//! Settings are read from a TOML file whose sections all have defaults, so an
//! empty file (or no file at all) yields a working configuration. The server
//! binary applies `HOST` and `PORT` overrides on top of whatever was loaded.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::forecast::AutoArimaConfig;
use crate::services::cache::DEFAULT_CACHE_CAPACITY;
use crate::services::charts::ChartSettings;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("No dashboard.toml found in standard locations")]
    NotFound,

    #[error("Invalid value for {name}: {value}")]
    InvalidOverride { name: &'static str, value: String },
}

/// Full dashboard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DashboardConfig {
    pub server: ServerSettings,
    pub cache: CacheSettings,
    pub forecast: AutoArimaConfig,
    pub charts: ChartSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, in MiB.
    pub body_limit_mib: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            body_limit_mib: 50,
        }
    }
}

impl ServerSettings {
    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mib.saturating_mul(1024 * 1024)
    }
}

/// Parse-cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Number of parsed tables kept; 0 disables caching.
    pub max_tables: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_tables: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `dashboard.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from("dashboard.toml"),
            PathBuf::from("backend/dashboard.toml"),
            PathBuf::from("../dashboard.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(ConfigError::NotFound)
    }

    /// Apply `HOST` and `PORT` style overrides.
    ///
    /// `lookup` returns the value of a variable if set; the server passes
    /// `std::env::var`.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidOverride {
                name: "PORT",
                value: port.clone(),
            })?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::InformationCriterion;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: DashboardConfig = toml::from_str("").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.cache.max_tables, 16);
        assert_eq!(config.charts.pie_max_slices, 20);
        assert_eq!(config.forecast.max_p, 5);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[server]
port = 9000
body_limit_mib = 5

[forecast]
criterion = "bic"
max_seasonal_p = 1
stepwise = false

[charts]
width = 640
"#;
        let config: DashboardConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.body_limit_bytes(), 5 * 1024 * 1024);
        assert_eq!(config.forecast.criterion, InformationCriterion::Bic);
        assert_eq!(config.forecast.max_cap_p, 1);
        assert!(!config.forecast.stepwise);
        assert_eq!(config.charts.width, 640);
        assert_eq!(config.charts.height, 540);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cache]\nmax_tables = 3").unwrap();

        let config = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.cache.max_tables, 3);
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = \"not a number\"").unwrap();

        let err = DashboardConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = DashboardConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_overrides() {
        let config = DashboardConfig::default()
            .apply_overrides(|name| match name {
                "HOST" => Some("127.0.0.1".to_string()),
                "PORT" => Some("3000".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);

        let err = DashboardConfig::default()
            .apply_overrides(|name| (name == "PORT").then(|| "http".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOverride { name: "PORT", .. }));
    }
}
