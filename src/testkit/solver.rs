//! Scripted ILP solver.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{Error, OptimizeError, Result};
use crate::port::{IlpProblem, LpSolution, SolutionStatus, SolveLimits, Solver};

/// Solver that ignores the model and answers with a fixed status or error.
pub struct ScriptedSolver {
    outcome: std::result::Result<SolutionStatus, OptimizeError>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedSolver {
    /// Always report `status` without values.
    pub fn status(status: SolutionStatus) -> Self {
        Self {
            outcome: Ok(status),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always time out without an incumbent.
    pub fn timing_out() -> Self {
        Self::status(SolutionStatus::TimeLimit)
    }

    /// Always fail with `error`.
    pub fn failing(error: OptimizeError) -> Self {
        Self {
            outcome: Err(error),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Solver for ScriptedSolver {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn solve_ilp(&self, _problem: &IlpProblem, _limits: &SolveLimits) -> Result<LpSolution> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Ok(status) => Ok(LpSolution::without_values(*status)),
            Err(e) => Err(Error::Optimize(e.clone())),
        }
    }
}
