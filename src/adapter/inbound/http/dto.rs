//! Request and response bodies.

use serde::{Deserialize, Serialize};

use crate::application::optimize::{ConfigOverrides, OptimizerConfig};
use crate::application::ListingAggregator;
use crate::domain::{
    BuylistCard, CandidatePool, JobId, MarketplaceListing, OptimizationConfig, SiteId,
};
use crate::error::OptimizeError;

/// `POST /scan` body.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanRequest {
    #[serde(alias = "buylist")]
    pub card_list: Vec<BuylistCard>,
    /// Sites to scan. Empty means every scannable catalog site.
    #[serde(default, alias = "sites")]
    pub site_ids: Vec<SiteId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanStarted {
    pub job_id: JobId,
    pub sites: usize,
}

/// `POST /optimize` body.
///
/// Listings come either inline or from a completed scan job.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptimizeRequest {
    #[serde(default, alias = "buylist")]
    pub card_list: Vec<BuylistCard>,
    #[serde(default)]
    pub listings: Vec<MarketplaceListing>,
    #[serde(default)]
    pub scan_job_id: Option<JobId>,
    #[serde(default, alias = "config")]
    pub optimization_config: ConfigOverrides,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl OptimizeRequest {
    /// Validated run configuration, defaults taken from `defaults`.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizeError::Validation`] for out-of-range values.
    pub fn resolve_config(
        &self,
        defaults: &OptimizerConfig,
    ) -> Result<OptimizationConfig, OptimizeError> {
        Ok(self.optimization_config.resolve(defaults, self.seed)?)
    }

    /// Candidate pool from the inline listings.
    #[must_use]
    pub fn inline_pool(&self, aggregator: &ListingAggregator) -> CandidatePool {
        aggregator.aggregate_flat(&self.card_list, self.listings.iter().cloned())
    }
}

/// `POST /test_optimization_config` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeRequest {
    #[serde(default, alias = "config", alias = "optimization_config")]
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub sites: usize,
    pub scan_jobs: usize,
}
