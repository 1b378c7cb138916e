//! `buylist check-config`: validate the configuration file.

use std::path::Path;

use serde::Serialize;

use super::{load_config, output};
use crate::error::Result;
use crate::infrastructure::bootstrap::build_fetchers;
use crate::infrastructure::config::Config;

/// Summary of a valid configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigCheckReport {
    pub listen: String,
    pub sites: usize,
    pub scannable_sites: usize,
    /// Sites whose parse method has no registered fetcher.
    pub sites_without_fetcher: Vec<String>,
    pub default_strategy: String,
    pub fallback_strategy: String,
    pub max_concurrent_fetches: usize,
    pub max_concurrent_runs: usize,
}

impl ConfigCheckReport {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let fetchers = build_fetchers(config);
        let sites_without_fetcher = config
            .sites
            .iter()
            .filter(|s| s.is_scannable() && fetchers.get(s.parse_method).is_none())
            .map(|s| format!("{} ({})", s.id, s.parse_method))
            .collect();
        Self {
            listen: format!("{}:{}", config.server.host, config.server.port),
            sites: config.sites.len(),
            scannable_sites: config.sites.iter().filter(|s| s.is_scannable()).count(),
            sites_without_fetcher,
            default_strategy: config.optimizer.default_strategy.to_string(),
            fallback_strategy: config.optimizer.fallback_strategy.to_string(),
            max_concurrent_fetches: config.scan.max_concurrent_fetches,
            max_concurrent_runs: config.optimizer.max_concurrent_runs,
        }
    }
}

/// Validate configuration file without starting the server.
pub fn execute(config_path: &Path) -> Result<()> {
    let config = load_config(config_path, true)?;
    let report = ConfigCheckReport::from_config(&config);

    if output::is_json() {
        output::document(&report)?;
        return Ok(());
    }

    output::section("Configuration Check");
    output::field("Config", config_path.display());
    output::success("Configuration file is valid");

    output::section("Summary");
    output::field("Listen", &report.listen);
    output::field("Sites", format!("{} ({} scannable)", report.sites, report.scannable_sites));
    output::field("Strategy", &report.default_strategy);
    output::field("Fallback", &report.fallback_strategy);
    output::field("Fetch slots", report.max_concurrent_fetches);
    output::field("Run slots", report.max_concurrent_runs);
    for site in &report.sites_without_fetcher {
        output::warning(&format!("No fetcher for site {site}; it will fail every scan"));
    }
    Ok(())
}
