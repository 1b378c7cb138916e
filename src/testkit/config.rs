//! Canonical test configurations.

use std::sync::Arc;

use crate::adapter::inbound::http::AppState;
use crate::adapter::outbound::catalog::StaticSiteCatalog;
use crate::adapter::outbound::fetch::FetcherRegistry;
use crate::application::scan::ScanConfig;
use crate::domain::SiteDescriptor;
use crate::infrastructure::bootstrap::{build_optimizer, build_state_with};
use crate::infrastructure::config::Config;
use crate::port::SiteFetcher;

/// Scan config with short timeouts for tests.
pub fn scan_config() -> ScanConfig {
    ScanConfig {
        max_concurrent_fetches: 4,
        fetch_timeout_secs: 1,
        job_retention_secs: 3600,
        progress_channel_capacity: 64,
    }
}

/// Default config with [`scan_config`] and the given sites.
pub fn test_config(sites: Vec<SiteDescriptor>) -> Config {
    Config {
        scan: scan_config(),
        sites,
        ..Config::default()
    }
}

/// Application state backed by `fetcher` and the real HiGHS optimizer.
pub fn test_state(config: &Config, fetcher: Arc<dyn SiteFetcher>) -> AppState {
    let fetchers = FetcherRegistry::builder().fetcher(fetcher).build();
    build_state_with(
        config,
        fetchers,
        Arc::new(build_optimizer(config)),
        Arc::new(StaticSiteCatalog::new(config.sites.clone())),
    )
}
