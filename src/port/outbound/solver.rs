//! Solver port for integer linear programming.
//!
//! Defines the trait the MILP strategy uses to hand its purchase-plan model
//! to a mathematical solver backend.
//!
//! # Overview
//!
//! - [`Solver`]: Core ILP solver interface
//! - [`LpProblem`] / [`IlpProblem`]: Problem definitions
//! - [`SolveLimits`]: Per-call resource limits
//! - [`LpSolution`]: Solution representation

use std::time::Duration;

use rust_decimal::Decimal;

use crate::error::Result;

pub use crate::domain::constraint::{Constraint, ConstraintSense, VariableBounds};

/// Integer linear programming solver.
///
/// Implementations wrap specific solver backends (HiGHS, CBC, etc.) and
/// provide a unified interface for optimization problems.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (`Send + Sync`); the engine calls
/// them from blocking worker threads.
pub trait Solver: Send + Sync {
    /// Return the solver name for logging and configuration.
    fn name(&self) -> &'static str;

    /// Solve an integer linear programming problem.
    ///
    /// Minimizes the objective function with integer constraints on the
    /// specified variables. Infeasibility and time-limit exhaustion are
    /// reported through [`LpSolution::status`], not as errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend crashes or rejects the model.
    fn solve_ilp(&self, problem: &IlpProblem, limits: &SolveLimits) -> Result<LpSolution>;
}

/// Resource limits for one solver call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveLimits {
    /// Wall-clock budget. `None` means unbounded.
    pub time_limit: Option<Duration>,
}

impl SolveLimits {
    #[must_use]
    pub const fn with_time_limit(time_limit: Duration) -> Self {
        Self {
            time_limit: Some(time_limit),
        }
    }
}

/// Linear programming problem definition.
///
/// Represents a minimization problem of the form:
///
/// ```text
/// minimize    c^T * x
/// subject to  constraints
///             bounds on x
/// ```
#[derive(Debug, Clone)]
pub struct LpProblem {
    /// Objective function coefficients.
    pub objective: Vec<Decimal>,

    /// Linear constraints on the variables.
    pub constraints: Vec<Constraint>,

    /// Lower and upper bounds for each variable.
    pub bounds: Vec<VariableBounds>,
}

impl LpProblem {
    /// Create a new LP problem with the specified number of variables.
    ///
    /// Initializes all objective coefficients to zero and all variable bounds
    /// to non-negative.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            objective: vec![Decimal::ZERO; num_vars],
            constraints: Vec::new(),
            bounds: vec![VariableBounds::default(); num_vars],
        }
    }

    /// Append a variable and return its index.
    pub fn add_variable(&mut self, cost: Decimal, bounds: VariableBounds) -> usize {
        self.objective.push(cost);
        self.bounds.push(bounds);
        self.objective.len() - 1
    }

    /// Return the number of decision variables.
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.objective.len()
    }

    /// Returns `true` if `values` respect every bound and constraint.
    #[must_use]
    pub fn is_feasible(&self, values: &[Decimal], tolerance: Decimal) -> bool {
        values.len() == self.num_vars()
            && self
                .bounds
                .iter()
                .zip(values)
                .all(|(b, &v)| b.contains(v, tolerance))
            && self
                .constraints
                .iter()
                .all(|c| c.is_satisfied(values, tolerance))
    }
}

/// Integer linear programming problem definition.
#[derive(Debug, Clone)]
pub struct IlpProblem {
    /// Underlying linear programming problem.
    pub lp: LpProblem,

    /// Indices of variables constrained to integer values.
    pub integer_vars: Vec<usize>,
}

impl IlpProblem {
    #[must_use]
    pub const fn new(lp: LpProblem, integer_vars: Vec<usize>) -> Self {
        Self { lp, integer_vars }
    }

    /// Create an ILP with every variable integer.
    #[must_use]
    pub fn all_integer(lp: LpProblem) -> Self {
        let integer_vars: Vec<usize> = (0..lp.num_vars()).collect();
        Self { lp, integer_vars }
    }
}

/// Solution to an integer programming problem.
#[derive(Debug, Clone)]
pub struct LpSolution {
    /// Values for each decision variable. Empty unless the status carries a solution.
    pub values: Vec<Decimal>,

    /// Objective function value at `values`.
    pub objective: Decimal,

    /// Termination status of the solver.
    pub status: SolutionStatus,
}

impl LpSolution {
    /// A solution without values for a non-solution status.
    #[must_use]
    pub fn without_values(status: SolutionStatus) -> Self {
        Self {
            values: Vec::new(),
            objective: Decimal::ZERO,
            status,
        }
    }

    /// Return `true` if the solver proved optimality.
    #[must_use]
    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    /// Return `true` if `values` hold a usable assignment.
    #[must_use]
    pub fn has_solution(&self) -> bool {
        matches!(
            self.status,
            SolutionStatus::Optimal | SolutionStatus::Feasible
        )
    }
}

/// Termination status of an optimization solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// Solver found a provably optimal solution.
    Optimal,

    /// Time limit reached with a feasible incumbent.
    Feasible,

    /// No feasible solution exists.
    Infeasible,

    /// Time limit reached without any feasible solution.
    TimeLimit,

    /// Objective function is unbounded.
    Unbounded,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn add_variable_returns_sequential_indices() {
        let mut lp = LpProblem::new(0);
        assert_eq!(lp.add_variable(dec!(1), VariableBounds::binary()), 0);
        assert_eq!(lp.add_variable(dec!(2), VariableBounds::non_negative()), 1);
        assert_eq!(lp.num_vars(), 2);
    }

    #[test]
    fn feasibility_checks_bounds_and_constraints() {
        let mut lp = LpProblem::new(2);
        lp.bounds = vec![VariableBounds::bounded(dec!(0), dec!(3)); 2];
        lp.constraints
            .push(Constraint::eq(vec![(0, dec!(1)), (1, dec!(1))], dec!(4)));

        assert!(lp.is_feasible(&[dec!(1), dec!(3)], dec!(0.0001)));
        assert!(!lp.is_feasible(&[dec!(0), dec!(4)], dec!(0.0001)));
        assert!(!lp.is_feasible(&[dec!(1), dec!(1)], dec!(0.0001)));
        assert!(!lp.is_feasible(&[dec!(1)], dec!(0.0001)));
    }

    #[test]
    fn feasible_status_carries_solution() {
        assert!(LpSolution::without_values(SolutionStatus::Feasible).has_solution());
        assert!(!LpSolution::without_values(SolutionStatus::TimeLimit).has_solution());
    }
}
