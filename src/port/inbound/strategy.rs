//! Optimization strategy seam.
//!
//! Each algorithm the engine can run (MILP, NSGA-II, MOEA/D, Hybrid)
//! implements [`OptimizationStrategy`]. The engine picks one by
//! [`Algorithm`] and never inspects its internals.
//!
//! # Example
//!
//! ```ignore
//! use buylist_optimizer::port::{OptimizationStrategy, StrategyOutput};
//!
//! struct Cheapest;
//!
//! impl OptimizationStrategy for Cheapest {
//!     fn algorithm(&self) -> Algorithm { Algorithm::Milp }
//!
//!     fn optimize(&self, pool: &CandidatePool, config: &OptimizationConfig,
//!                 cancel: &CancellationToken) -> Result<StrategyOutput, OptimizeError> {
//!         // build a plan from the cheapest listing of each card
//!     }
//! }
//! ```

use tokio_util::sync::CancellationToken;

use crate::domain::{Algorithm, CandidatePool, OptimizationConfig, Solution};
use crate::error::OptimizeError;

/// What a strategy hands back to the engine.
#[derive(Debug, Clone, Default)]
pub struct StrategyOutput {
    /// Candidate plans. Not necessarily mutually non-dominated.
    pub solutions: Vec<Solution>,
    /// Generations run (0 for exact solvers).
    pub generations: usize,
    /// Objective evaluations performed (0 for exact solvers).
    pub evaluations: usize,
}

impl StrategyOutput {
    /// Output of a single-plan strategy.
    #[must_use]
    pub fn single(solution: Solution) -> Self {
        Self {
            solutions: vec![solution],
            generations: 0,
            evaluations: 0,
        }
    }
}

/// A purchase-plan optimization algorithm.
///
/// Strategies are synchronous and CPU-bound; the engine runs them on a
/// blocking worker. They must poll `cancel` at least once per generation or
/// solver call and return [`OptimizeError::Cancelled`] when it fires.
pub trait OptimizationStrategy: Send + Sync {
    /// The algorithm this strategy implements.
    fn algorithm(&self) -> Algorithm;

    /// Compute candidate plans for `pool`.
    ///
    /// # Errors
    ///
    /// `SolverTimeout` and `InfeasibleProblem` let the engine try the
    /// fallback algorithm; `Internal` is always surfaced.
    fn optimize(
        &self,
        pool: &CandidatePool,
        config: &OptimizationConfig,
        cancel: &CancellationToken,
    ) -> Result<StrategyOutput, OptimizeError>;
}
