//! Optimization engine.
//!
//! Entry point for purchase-plan optimization. The engine resolves the run
//! plan, executes it through [`HybridCoordinator`], reduces the output to a
//! Pareto front and assembles an [`OptimizationResult`].
//!
//! Runs are CPU-bound. [`OptimizationEngine::optimize`] moves them onto the
//! blocking pool and bounds how many execute at once; dropping its future
//! cancels the run cooperatively.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::OptimizerConfig;
use super::hybrid::HybridCoordinator;
use super::registry::StrategyRegistry;
use super::result::{OptimizationResult, RunMetrics};
use super::selection::select_for_size;
use crate::domain::{
    Algorithm, CandidatePool, CardAssignment, OptimizationConfig, ParetoFront, Solution,
};
use crate::error::OptimizeError;
use crate::port::{Solver, StrategyOutput};

pub struct OptimizationEngine {
    strategies: StrategyRegistry,
    settings: OptimizerConfig,
    permits: Arc<Semaphore>,
}

impl OptimizationEngine {
    #[must_use]
    pub fn new(strategies: StrategyRegistry, settings: OptimizerConfig) -> Self {
        let permits = Arc::new(Semaphore::new(settings.max_concurrent_runs.max(1)));
        Self {
            strategies,
            settings,
            permits,
        }
    }

    /// Engine with the built-in strategies, MILP backed by `solver`.
    #[must_use]
    pub fn from_config(settings: &OptimizerConfig, solver: Arc<dyn Solver>) -> Self {
        let strategies = StrategyRegistry::builder()
            .config(settings)
            .solver(solver)
            .build();
        Self::new(strategies, settings.clone())
    }

    #[must_use]
    pub const fn settings(&self) -> &OptimizerConfig {
        &self.settings
    }

    #[must_use]
    pub const fn strategies(&self) -> &StrategyRegistry {
        &self.strategies
    }

    /// Algorithm `auto` would pick for `pool`.
    #[must_use]
    pub fn recommend(&self, pool: &CandidatePool) -> Algorithm {
        select_for_size(pool, self.settings.small_problem_threshold)
    }

    fn coordinator(&self) -> HybridCoordinator<'_> {
        HybridCoordinator::new(
            &self.strategies,
            self.settings.small_problem_threshold,
            self.settings.hybrid_milp_fraction,
        )
    }

    /// Run one optimization on the calling thread.
    ///
    /// A problem no algorithm can satisfy yields a zero-fulfillment plan
    /// rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizeError::SolverTimeout`] when no fallback rescued a
    /// timed-out solver, [`OptimizeError::Cancelled`] when `cancel` fired,
    /// and [`OptimizeError::Internal`] on strategy crashes.
    pub fn run(
        &self,
        pool: &CandidatePool,
        config: &OptimizationConfig,
        cancel: &CancellationToken,
    ) -> Result<OptimizationResult, OptimizeError> {
        let started = Instant::now();
        let monitoring = config.monitoring();

        let (algorithm_used, fallback_used, output, attempts) =
            match self.coordinator().execute(pool, config, cancel) {
                Ok(execution) => (
                    execution.algorithm_used,
                    execution.fallback_used,
                    execution.output,
                    execution.attempts,
                ),
                Err(failure) if failure.error == OptimizeError::InfeasibleProblem => {
                    warn!("No feasible purchase plan, returning an empty plan");
                    let algorithm = failure
                        .attempts
                        .last()
                        .map_or(config.algorithm(), |a| a.algorithm);
                    let fallback_used = failure.attempts.len() > 1;
                    (
                        algorithm,
                        fallback_used,
                        StrategyOutput::single(empty_plan(pool)),
                        failure.attempts,
                    )
                }
                Err(failure) => {
                    warn!(
                        error = %failure.error,
                        attempts = failure.attempts.len(),
                        "Optimization failed"
                    );
                    return Err(failure.error);
                }
            };

        let mut solutions = output.solutions;
        solutions.sort_by(|a, b| a.total_cost.cmp(&b.total_cost));
        solutions.dedup();
        let pareto_front = ParetoFront::build(solutions.clone());

        let metrics = RunMetrics {
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            generations: output.generations,
            evaluations: output.evaluations,
            candidate_listings: pool.listings().len(),
            complexity: pool.complexity(),
        };

        if monitoring.performance_monitoring {
            info!(
                algorithm = %algorithm_used,
                elapsed_ms = metrics.elapsed_ms,
                generations = metrics.generations,
                evaluations = metrics.evaluations,
                front_size = pareto_front.len(),
                "Optimization performance"
            );
        } else {
            debug!(
                algorithm = %algorithm_used,
                elapsed_ms = metrics.elapsed_ms,
                front_size = pareto_front.len(),
                "Optimization complete"
            );
        }

        Ok(OptimizationResult {
            solutions,
            pareto_front,
            algorithm_used,
            requested_algorithm: config.algorithm(),
            fallback_used,
            attempts,
            metrics,
            unfulfillable_cards: pool.unfulfillable().into_iter().cloned().collect(),
        })
    }

    /// Run one optimization on the blocking pool.
    ///
    /// Waits for a free run slot first. Dropping the returned future cancels
    /// the run at its next cancellation check.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run); a panicking strategy becomes
    /// [`OptimizeError::Internal`].
    pub async fn optimize(
        self: &Arc<Self>,
        pool: Arc<CandidatePool>,
        config: OptimizationConfig,
    ) -> Result<OptimizationResult, OptimizeError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| OptimizeError::Internal("optimizer is shut down".into()))?;

        let cancel = CancellationToken::new();
        let _guard = cancel.clone().drop_guard();
        let engine = Arc::clone(self);

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            engine.run(&pool, &config, &cancel)
        });

        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(OptimizeError::Internal("optimizer task panicked".into())),
            Err(e) => Err(OptimizeError::Internal(e.to_string())),
        }
    }
}

impl std::fmt::Debug for OptimizationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimizationEngine")
            .field("strategies", &self.strategies)
            .field("available_permits", &self.permits.available_permits())
            .finish_non_exhaustive()
    }
}

/// Plan that buys nothing and marks every line unfulfilled.
fn empty_plan(pool: &CandidatePool) -> Solution {
    Solution::from_assignments(
        pool.cards()
            .iter()
            .map(|c| CardAssignment::new(c.card.clone(), Vec::new()))
            .collect(),
    )
}
