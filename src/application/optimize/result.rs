//! Optimization result types.

use serde::Serialize;

use crate::domain::{Algorithm, BuylistCard, ParetoFront, Solution};

/// Everything one optimization request produces.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    /// Distinct candidate plans from the algorithm that succeeded, cheapest first.
    pub solutions: Vec<Solution>,
    pub pareto_front: ParetoFront,
    pub algorithm_used: Algorithm,
    pub requested_algorithm: Algorithm,
    pub fallback_used: bool,
    pub attempts: Vec<Attempt>,
    pub metrics: RunMetrics,
    pub unfulfillable_cards: Vec<BuylistCard>,
}

impl OptimizationResult {
    /// Cheapest plan on the front.
    #[must_use]
    pub fn best(&self) -> Option<&Solution> {
        self.pareto_front.cheapest()
    }
}

/// One algorithm run within a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attempt {
    pub algorithm: Algorithm,
    pub elapsed_ms: u64,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Succeeded { solutions: usize },
    Failed { error: String },
}

impl AttemptOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Timing and effort counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunMetrics {
    pub elapsed_ms: u64,
    pub generations: usize,
    pub evaluations: usize,
    pub candidate_listings: usize,
    pub complexity: f64,
}
