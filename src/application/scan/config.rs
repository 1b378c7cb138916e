//! Scan orchestrator configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the scan orchestrator.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Maximum site fetches running at once across all jobs.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    /// Per-site fetch timeout in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// How long a finished job stays queryable, in seconds.
    #[serde(default = "default_job_retention_secs")]
    pub job_retention_secs: u64,
    /// Capacity of each job's tracker event channel.
    #[serde(default = "default_progress_channel_capacity")]
    pub progress_channel_capacity: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: default_max_concurrent_fetches(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            job_retention_secs: default_job_retention_secs(),
            progress_channel_capacity: default_progress_channel_capacity(),
        }
    }
}

impl ScanConfig {
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    #[must_use]
    pub const fn job_retention(&self) -> Duration {
        Duration::from_secs(self.job_retention_secs)
    }
}

fn default_max_concurrent_fetches() -> usize {
    (num_cpus::get() * 2).max(1)
}

const fn default_fetch_timeout_secs() -> u64 {
    30
}

const fn default_job_retention_secs() -> u64 {
    3600
}

const fn default_progress_channel_capacity() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ScanConfig::default();
        assert!(config.max_concurrent_fetches >= 2);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
        assert_eq!(config.job_retention(), Duration::from_secs(3600));
        assert_eq!(config.progress_channel_capacity, 256);
    }
}
