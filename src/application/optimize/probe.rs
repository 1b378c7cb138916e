//! Configuration probe.
//!
//! Validates a set of overrides and, when they are valid, runs them against
//! a small synthetic buylist so the caller learns whether the configuration
//! actually produces a plan and which algorithm to use.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::config::ConfigOverrides;
use super::engine::OptimizationEngine;
use crate::domain::{
    Algorithm, BuylistCard, CandidatePool, CardCandidates, MarketplaceListing,
    OptimizationConfig, Quality,
};

/// Time cap for a probe run, whatever the configured limit.
pub const PROBE_TIME_LIMIT: Duration = Duration::from_secs(5);

const PROBE_CARDS: usize = 5;
const PROBE_SITES: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub recommended_algorithm: Algorithm,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<OptimizationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_result: Option<ProbeRun>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeRun {
    pub success: bool,
    pub algorithm_used: Option<Algorithm>,
    pub fallback_used: bool,
    pub elapsed_ms: u64,
    pub solutions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_cost: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Synthetic buylist: every card listed on every site, prices and
/// conditions staggered so the objectives conflict.
#[must_use]
pub fn synthetic_pool() -> CandidatePool {
    let qualities = [Quality::Nm, Quality::Lp, Quality::Mp];
    let mut listings = Vec::with_capacity(PROBE_CARDS * PROBE_SITES);
    let mut cards = Vec::with_capacity(PROBE_CARDS);
    for c in 0..PROBE_CARDS {
        let name = format!("probe card {c}");
        let mut ids = Vec::with_capacity(PROBE_SITES);
        for s in 0..PROBE_SITES {
            let price = Decimal::new(100 + 25 * ((c + s) % PROBE_SITES) as i64, 2);
            let Ok(listing) = MarketplaceListing::try_new(
                format!("probe-site-{s}"),
                name.clone(),
                qualities[s % qualities.len()],
                4,
                price,
            ) else {
                continue;
            };
            ids.push(listings.len());
            listings.push(listing);
        }
        ids.sort_by_key(|&i: &usize| listings[i].price);
        cards.push(CardCandidates {
            card: BuylistCard::new(name, 2),
            listing_ids: ids,
        });
    }
    CandidatePool::new(listings, cards)
}

/// Validate `overrides` and try them on [`synthetic_pool`].
#[must_use]
pub fn test_optimization_config(
    engine: &OptimizationEngine,
    overrides: &ConfigOverrides,
) -> ProbeReport {
    let builder = overrides.apply(engine.settings(), Some(0));
    let errors: Vec<String> = builder.violations().iter().map(ToString::to_string).collect();
    let pool = synthetic_pool();

    let config = match builder.build() {
        Ok(config) => config,
        Err(_) => {
            return ProbeReport {
                valid: false,
                errors,
                recommended_algorithm: engine.recommend(&pool),
                config: None,
                test_result: None,
            }
        }
    };

    let limit = config.time_limit().min(PROBE_TIME_LIMIT);
    let probe_config = config.delegate(config.algorithm(), limit);
    let outcome = engine.run(&pool, &probe_config, &CancellationToken::new());

    let (recommended_algorithm, test_result) = match outcome {
        Ok(result) => {
            let recommended = if config.algorithm() == Algorithm::Auto {
                engine.recommend(&pool)
            } else if result.fallback_used {
                result.algorithm_used
            } else {
                config.algorithm()
            };
            let run = ProbeRun {
                success: true,
                algorithm_used: Some(result.algorithm_used),
                fallback_used: result.fallback_used,
                elapsed_ms: result.metrics.elapsed_ms,
                solutions: result.pareto_front.len(),
                best_cost: result.best().map(|s| s.total_cost),
                error: None,
            };
            (recommended, run)
        }
        Err(err) => {
            debug!(error = %err, "Probe run failed");
            let run = ProbeRun {
                success: false,
                algorithm_used: None,
                fallback_used: false,
                elapsed_ms: 0,
                solutions: 0,
                best_cost: None,
                error: Some(err.to_string()),
            };
            (config.fallback(), run)
        }
    };

    ProbeReport {
        valid: true,
        errors,
        recommended_algorithm,
        config: Some(config),
        test_result: Some(test_result),
    }
}
