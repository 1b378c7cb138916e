//! Run-plan execution with fallback.
//!
//! [`HybridCoordinator`] runs the primary step of a [`plan`] and, when that
//! step fails with an error that allows it, hands whatever time is left to
//! the fallback algorithm. `auto`, `hybrid` and explicit algorithms all go
//! through the same path; they only differ in the plan.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::registry::StrategyRegistry;
use super::result::{Attempt, AttemptOutcome};
use super::selection::{plan, Budget, PlannedRun};
use crate::domain::{Algorithm, CandidatePool, OptimizationConfig};
use crate::error::OptimizeError;
use crate::port::StrategyOutput;

/// Smallest budget a fallback step is ever given.
pub const MIN_FALLBACK_BUDGET: Duration = Duration::from_secs(1);

/// Outcome of a coordinated run.
#[derive(Debug, Clone)]
pub struct Execution {
    pub algorithm_used: Algorithm,
    pub fallback_used: bool,
    pub output: StrategyOutput,
    pub attempts: Vec<Attempt>,
}

/// Failed coordinated run, with every attempt made before giving up.
#[derive(Debug, Clone)]
pub struct ExecutionFailure {
    pub error: OptimizeError,
    pub attempts: Vec<Attempt>,
}

pub struct HybridCoordinator<'a> {
    strategies: &'a StrategyRegistry,
    small_problem_threshold: f64,
    hybrid_milp_fraction: f64,
}

impl<'a> HybridCoordinator<'a> {
    #[must_use]
    pub const fn new(
        strategies: &'a StrategyRegistry,
        small_problem_threshold: f64,
        hybrid_milp_fraction: f64,
    ) -> Self {
        Self {
            strategies,
            small_problem_threshold,
            hybrid_milp_fraction,
        }
    }

    /// Plan for `config` on `pool` without running it.
    #[must_use]
    pub fn plan(
        &self,
        pool: &CandidatePool,
        config: &OptimizationConfig,
    ) -> (PlannedRun, Option<PlannedRun>) {
        plan(
            pool,
            config,
            self.small_problem_threshold,
            self.hybrid_milp_fraction,
        )
    }

    /// Run the plan for `config`.
    ///
    /// # Errors
    ///
    /// Returns the primary error when it does not allow fallback or no
    /// fallback step exists, otherwise the fallback's error.
    pub fn execute(
        &self,
        pool: &CandidatePool,
        config: &OptimizationConfig,
        cancel: &CancellationToken,
    ) -> Result<Execution, ExecutionFailure> {
        let started = Instant::now();
        let comparison = config.monitoring().algorithm_comparison;
        let (primary, fallback) = self.plan(pool, config);

        if comparison {
            info!(
                requested = %config.algorithm(),
                selected = %primary.algorithm,
                complexity = pool.complexity(),
                threshold = self.small_problem_threshold,
                fallback = ?fallback.map(|f| f.algorithm),
                "Algorithm selected"
            );
        }

        let mut attempts = Vec::with_capacity(2);
        let error = match self.attempt(primary, pool, config, started, cancel, &mut attempts) {
            Ok(output) => {
                return Ok(Execution {
                    algorithm_used: primary.algorithm,
                    fallback_used: false,
                    output,
                    attempts,
                })
            }
            Err(error) => error,
        };

        let Some(fallback) = fallback.filter(|_| error.allows_fallback()) else {
            return Err(ExecutionFailure { error, attempts });
        };
        warn!(
            primary = %primary.algorithm,
            fallback = %fallback.algorithm,
            error = %error,
            "Primary algorithm failed, falling back"
        );

        match self.attempt(fallback, pool, config, started, cancel, &mut attempts) {
            Ok(output) => {
                if comparison {
                    for attempt in &attempts {
                        info!(
                            algorithm = %attempt.algorithm,
                            elapsed_ms = attempt.elapsed_ms,
                            success = attempt.outcome.is_success(),
                            "Algorithm attempt"
                        );
                    }
                }
                Ok(Execution {
                    algorithm_used: fallback.algorithm,
                    fallback_used: true,
                    output,
                    attempts,
                })
            }
            Err(error) => Err(ExecutionFailure { error, attempts }),
        }
    }

    fn attempt(
        &self,
        step: PlannedRun,
        pool: &CandidatePool,
        config: &OptimizationConfig,
        started: Instant,
        cancel: &CancellationToken,
        attempts: &mut Vec<Attempt>,
    ) -> Result<StrategyOutput, OptimizeError> {
        let budget = match step.budget {
            Budget::Fixed(limit) => limit,
            Budget::Remaining => config
                .time_limit()
                .saturating_sub(started.elapsed())
                .max(MIN_FALLBACK_BUDGET),
        };
        let step_started = Instant::now();
        let result = match self.strategies.get(step.algorithm) {
            Some(strategy) => strategy.optimize(pool, &config.delegate(step.algorithm, budget), cancel),
            None => Err(OptimizeError::Internal(format!(
                "no strategy registered for '{}'",
                step.algorithm
            ))),
        };
        let outcome = match &result {
            Ok(output) => AttemptOutcome::Succeeded {
                solutions: output.solutions.len(),
            },
            Err(e) => AttemptOutcome::Failed {
                error: e.to_string(),
            },
        };
        attempts.push(Attempt {
            algorithm: step.algorithm,
            elapsed_ms: u64::try_from(step_started.elapsed().as_millis()).unwrap_or(u64::MAX),
            outcome,
        });
        result
    }
}
