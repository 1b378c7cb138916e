//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file; every section has defaults, so an
//! empty file is a valid configuration.
//!
//! # Example
//!
//! ```no_run
//! use buylist_optimizer::infrastructure::config::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use super::logging::LoggingConfig;
use super::server::ServerConfig;
use crate::adapter::outbound::fetch::HttpConfig;
use crate::application::optimize::OptimizerConfig;
use crate::application::scan::ScanConfig;
use crate::domain::SiteDescriptor;
use crate::error::{ConfigError, Result};

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// HTTP API bind address and limits.
    #[serde(default)]
    pub server: ServerConfig,

    /// Scan orchestrator concurrency and retention.
    #[serde(default)]
    pub scan: ScanConfig,

    /// Outbound HTTP client used by site fetchers.
    #[serde(default)]
    pub http: HttpConfig,

    /// Optimizer defaults and tunables.
    #[serde(default)]
    pub optimizer: OptimizerConfig,

    /// Vendor sites served by the static site catalog.
    #[serde(default)]
    pub sites: Vec<SiteDescriptor>,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The TOML content is malformed
    /// - Validation fails (e.g., population size out of range)
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.logging.validate()?;
        self.server.socket_addr()?;
        self.optimizer.validate()?;

        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.request_timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.scan.max_concurrent_fetches == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scan.max_concurrent_fetches",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.scan.fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scan.fetch_timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.scan.progress_channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scan.progress_channel_capacity",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.http.timeout_ms == 0 || self.http.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http.timeout_ms",
                reason: "timeouts must be greater than 0".to_string(),
            }
            .into());
        }
        if self.http.retry_max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http.retry_max_attempts",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }

        let mut seen = HashSet::new();
        for site in &self.sites {
            if !seen.insert(&site.id) {
                return Err(ConfigError::InvalidValue {
                    field: "sites.id",
                    reason: format!("duplicate site id '{}'", site.id),
                }
                .into());
            }
            site.parsed_url().map_err(|e| ConfigError::InvalidValue {
                field: "sites.url",
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Algorithm, ParseMethod};
    use crate::error::Error;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.optimizer.default_strategy, Algorithm::Auto);
        assert!(config.sites.is_empty());
    }

    #[test]
    fn sites_are_parsed() {
        let config = Config::parse_toml(
            r#"
            [[sites]]
            id = "401"
            name = "401 Games"
            url = "https://store.401games.ca"
            parse_method = "shopify"

            [[sites]]
            id = "f2f"
            name = "Face to Face"
            url = "https://api.f2f.example"
            method = "f2f"
            active = false
            "#,
        )
        .unwrap();
        assert_eq!(config.sites.len(), 2);
        assert_eq!(config.sites[0].parse_method, ParseMethod::Shopify);
        assert!(!config.sites[1].active);
    }

    #[test]
    fn duplicate_site_ids_are_rejected() {
        let err = Config::parse_toml(
            r#"
            [[sites]]
            id = "a"
            name = "A"
            url = "https://a.example"
            parse_method = "other"

            [[sites]]
            id = "a"
            name = "A again"
            url = "https://a2.example"
            parse_method = "other"
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { field: "sites.id", .. })
        ));
    }

    #[test]
    fn out_of_range_optimizer_default_is_rejected() {
        let err = Config::parse_toml("[optimizer]\ndefault_population_size = 10\n").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Config::parse_toml("[server\nport = 1").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
    }
}
