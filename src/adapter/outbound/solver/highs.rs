//! HiGHS solver implementation via good_lp.
//!
//! HiGHS is a high-performance open-source linear/mixed-integer programming solver.
//! This implementation wraps it using the good_lp crate for ergonomic Rust usage.

use std::time::Instant;

use good_lp::solvers::highs::highs;
use good_lp::{
    constraint, variable, variables, Expression, ResolutionError, Solution, SolverModel, Variable,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::error::{OptimizeError, Result};
use crate::port::{
    ConstraintSense, IlpProblem, LpProblem, LpSolution, SolutionStatus, SolveLimits, Solver,
};

/// Tolerance used when checking the returned assignment against the model.
const FEASIBILITY_TOLERANCE: Decimal = dec!(0.000001);

/// HiGHS-based ILP solver.
#[derive(Debug, Default, Clone)]
pub struct HiGHSSolver;

impl HiGHSSolver {
    /// Create a new HiGHS solver instance.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Solver for HiGHSSolver {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn solve_ilp(&self, problem: &IlpProblem, limits: &SolveLimits) -> Result<LpSolution> {
        solve_with_good_lp(&problem.lp, &problem.integer_vars, limits)
    }
}

fn linear(vars: &[Variable], terms: &[(usize, Decimal)]) -> Expression {
    terms
        .iter()
        .filter_map(|&(i, c)| vars.get(i).map(|v| c.to_f64().unwrap_or(0.0) * *v))
        .sum()
}

fn solve_with_good_lp(
    problem: &LpProblem,
    integer_vars: &[usize],
    limits: &SolveLimits,
) -> Result<LpSolution> {
    let n = problem.num_vars();

    if n == 0 {
        return Ok(LpSolution::without_values(SolutionStatus::Optimal));
    }

    let mut vars = variables!();
    let mut var_list = Vec::with_capacity(n);

    for (i, bounds) in problem.bounds.iter().enumerate() {
        let mut v = variable();
        if let Some(lb) = bounds.lower {
            v = v.min(lb.to_f64().unwrap_or(0.0));
        }
        if let Some(ub) = bounds.upper {
            v = v.max(ub.to_f64().unwrap_or(f64::INFINITY));
        }
        if integer_vars.contains(&i) {
            v = v.integer();
        }
        var_list.push(vars.add(v));
    }

    let objective: Expression = var_list
        .iter()
        .zip(problem.objective.iter())
        .map(|(v, c)| c.to_f64().unwrap_or(0.0) * *v)
        .sum();

    let mut model = vars.minimise(&objective).using(highs);
    if let Some(limit) = limits.time_limit {
        model = model.set_time_limit(limit.as_secs_f64());
    }

    for constr in &problem.constraints {
        let lhs = linear(&var_list, &constr.terms);
        let rhs = constr.rhs.to_f64().unwrap_or(0.0);

        model = match constr.sense {
            ConstraintSense::GreaterEqual => model.with(constraint!(lhs >= rhs)),
            ConstraintSense::LessEqual => model.with(constraint!(lhs <= rhs)),
            ConstraintSense::Equal => model.with(constraint!(lhs == rhs)),
        };
    }

    let started = Instant::now();
    let outcome = model.solve();
    let hit_limit = limits
        .time_limit
        .is_some_and(|limit| started.elapsed() >= limit);

    match outcome {
        Ok(solution) => {
            // Integer variables come back as floats close to an integer.
            let values: Vec<Decimal> = var_list
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    let raw = solution.value(*v);
                    let raw = if integer_vars.contains(&i) { raw.round() } else { raw };
                    Decimal::try_from(raw).unwrap_or(Decimal::ZERO)
                })
                .collect();

            if !problem.is_feasible(&values, FEASIBILITY_TOLERANCE) {
                // HiGHS reports time-limit exits as success even without an incumbent.
                if limits.time_limit.is_some() {
                    debug!(vars = n, "Solver stopped without a feasible incumbent");
                    return Ok(LpSolution::without_values(SolutionStatus::TimeLimit));
                }
                return Err(OptimizeError::Internal(
                    "solver returned an assignment that violates the model".into(),
                )
                .into());
            }

            let objective: Decimal = values
                .iter()
                .zip(problem.objective.iter())
                .map(|(v, c)| *v * *c)
                .sum();

            Ok(LpSolution {
                values,
                objective,
                status: if hit_limit {
                    SolutionStatus::Feasible
                } else {
                    SolutionStatus::Optimal
                },
            })
        }
        Err(ResolutionError::Infeasible) => {
            Ok(LpSolution::without_values(SolutionStatus::Infeasible))
        }
        Err(ResolutionError::Unbounded) => {
            Ok(LpSolution::without_values(SolutionStatus::Unbounded))
        }
        Err(_) if hit_limit => Ok(LpSolution::without_values(SolutionStatus::TimeLimit)),
        Err(err) => Err(OptimizeError::Internal(format!("highs: {err}")).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{Constraint, VariableBounds};

    #[test]
    fn test_solver_name() {
        let solver = HiGHSSolver::new();
        assert_eq!(solver.name(), "highs");
    }

    #[test]
    fn test_binary_ilp() {
        // Minimize: -x - y (maximize x + y)
        // Subject to: x + y <= 1
        //            x, y in {0, 1}
        let solver = HiGHSSolver::new();

        let lp = LpProblem {
            objective: vec![-Decimal::ONE, -Decimal::ONE],
            constraints: vec![Constraint::leq(
                vec![(0, Decimal::ONE), (1, Decimal::ONE)],
                Decimal::ONE,
            )],
            bounds: vec![VariableBounds::binary(); 2],
        };

        let solution = solver
            .solve_ilp(&IlpProblem::all_integer(lp), &SolveLimits::default())
            .unwrap();

        assert!(solution.is_optimal());
        let sum: Decimal = solution.values.iter().sum();
        assert_eq!(sum, Decimal::ONE);
        assert_eq!(solution.objective, -Decimal::ONE);
    }

    #[test]
    fn test_integer_cover_prefers_cheaper_variable() {
        // Minimize: 1.0x + 1.5y
        // Subject to: x + y = 4, 0 <= x, y <= 4
        let solver = HiGHSSolver::new();

        let lp = LpProblem {
            objective: vec![dec!(1.0), dec!(1.5)],
            constraints: vec![Constraint::eq(
                vec![(0, Decimal::ONE), (1, Decimal::ONE)],
                dec!(4),
            )],
            bounds: vec![VariableBounds::bounded(dec!(0), dec!(4)); 2],
        };

        let solution = solver
            .solve_ilp(
                &IlpProblem::all_integer(lp),
                &SolveLimits::with_time_limit(std::time::Duration::from_secs(10)),
            )
            .unwrap();

        assert!(solution.is_optimal());
        assert_eq!(solution.values, vec![dec!(4), dec!(0)]);
        assert_eq!(solution.objective, dec!(4));
    }

    #[test]
    fn test_infeasible_problem_reports_status() {
        // x >= 2 with x in [0, 1]
        let solver = HiGHSSolver::new();

        let lp = LpProblem {
            objective: vec![Decimal::ONE],
            constraints: vec![Constraint::geq(vec![(0, Decimal::ONE)], dec!(2))],
            bounds: vec![VariableBounds::binary()],
        };

        let solution = solver
            .solve_ilp(&IlpProblem::all_integer(lp), &SolveLimits::default())
            .unwrap();

        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert!(!solution.has_solution());
    }

    #[test]
    fn test_empty_problem() {
        let solver = HiGHSSolver::new();
        let problem = IlpProblem::all_integer(LpProblem::new(0));
        let solution = solver.solve_ilp(&problem, &SolveLimits::default()).unwrap();

        assert!(solution.is_optimal());
        assert!(solution.values.is_empty());
    }
}
