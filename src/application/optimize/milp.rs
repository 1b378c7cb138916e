//! Exact purchase-plan model solved as a mixed-integer program.
//!
//! Variables:
//! - `x[c,l]`: units of buylist line `c` bought from listing `l`, integer in
//!   `[0, min(available, requested)]`.
//! - `y[s]`: site `s` used, binary.
//! - `u[c]`: units of line `c` left unbought, integer in `[0, requested]`.
//!
//! ```text
//! minimize   Σ price[l]·x[c,l] + store_penalty·Σ y[s] + M·Σ u[c]
//! subject to Σ_l x[c,l] + u[c] = requested[c]        for every line c
//!            Σ_c x[c,l] ≤ available[l]               for shared listings
//!            x[c,l] ≤ min(available, requested)·y[site(l)]
//! ```
//!
//! `M` exceeds the cost of buying any single unit from a fresh site, so the
//! model fulfils every unit it can and only leaves truly missing supply
//! in `u`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::{
    Algorithm, CandidatePool, CardAssignment, OptimizationConfig, Pick, SiteId, Solution,
};
use crate::error::{Error, OptimizeError};
use crate::port::{
    Constraint, IlpProblem, LpProblem, OptimizationStrategy, SolutionStatus, SolveLimits, Solver,
    StrategyOutput, VariableBounds,
};

/// Index of an `x[c,l]` variable.
#[derive(Debug, Clone, Copy)]
struct Assignment {
    card: usize,
    listing: usize,
    var: usize,
}

/// The built model with variable bookkeeping.
pub struct PurchaseModel {
    pub problem: IlpProblem,
    assignments: Vec<Assignment>,
}

impl PurchaseModel {
    /// Build the model for `pool`.
    #[must_use]
    pub fn build(pool: &CandidatePool, store_penalty: Decimal) -> Self {
        let mut lp = LpProblem::new(0);
        let max_price = pool
            .listings()
            .iter()
            .map(|l| l.price)
            .max()
            .unwrap_or(Decimal::ZERO);
        let shortfall_penalty = max_price + store_penalty + Decimal::ONE;

        let sites: BTreeMap<SiteId, usize> = pool
            .sites()
            .into_iter()
            .map(|site| {
                let var = lp.add_variable(store_penalty, VariableBounds::binary());
                (site, var)
            })
            .collect();

        let mut assignments = Vec::new();
        let mut users: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (card, candidates) in pool.cards().iter().enumerate() {
            let requested = Decimal::from(candidates.card.quantity);
            let mut cover = Vec::with_capacity(candidates.listing_ids.len() + 1);

            for &listing_id in &candidates.listing_ids {
                let listing = pool.listing(listing_id);
                let cap = Decimal::from(listing.quantity).min(requested);
                let var = lp.add_variable(listing.price, VariableBounds::bounded(Decimal::ZERO, cap));
                assignments.push(Assignment {
                    card,
                    listing: listing_id,
                    var,
                });
                users.entry(listing_id).or_default().push(var);
                cover.push((var, Decimal::ONE));

                if let Some(&site_var) = sites.get(&listing.site_id) {
                    lp.constraints
                        .push(Constraint::leq(vec![(var, Decimal::ONE), (site_var, -cap)], Decimal::ZERO));
                }
            }

            let slack = lp.add_variable(
                shortfall_penalty,
                VariableBounds::bounded(Decimal::ZERO, requested),
            );
            cover.push((slack, Decimal::ONE));
            lp.constraints.push(Constraint::eq(cover, requested));
        }

        for (listing_id, vars) in users {
            if vars.len() > 1 {
                let available = Decimal::from(pool.listing(listing_id).quantity);
                let terms = vars.into_iter().map(|v| (v, Decimal::ONE)).collect();
                lp.constraints.push(Constraint::leq(terms, available));
            }
        }

        Self {
            problem: IlpProblem::all_integer(lp),
            assignments,
        }
    }

    /// Turn solver values into a plan.
    #[must_use]
    pub fn decode(&self, pool: &CandidatePool, values: &[Decimal]) -> Solution {
        let mut picks: Vec<Vec<Pick>> = vec![Vec::new(); pool.cards().len()];
        for a in &self.assignments {
            let quantity = values
                .get(a.var)
                .and_then(|v| v.round().to_u32())
                .unwrap_or(0);
            if quantity > 0 {
                picks[a.card].push(Pick {
                    listing: pool.listing(a.listing).clone(),
                    quantity,
                });
            }
        }
        let assignments = pool
            .cards()
            .iter()
            .zip(picks)
            .map(|(c, p)| CardAssignment::new(c.card.clone(), p))
            .collect();
        Solution::from_assignments(assignments)
    }
}

/// Exact strategy backed by an ILP [`Solver`].
pub struct MilpStrategy {
    solver: Arc<dyn Solver>,
    store_penalty: Decimal,
}

impl MilpStrategy {
    #[must_use]
    pub fn new(solver: Arc<dyn Solver>, store_penalty: Decimal) -> Self {
        Self {
            solver,
            store_penalty,
        }
    }
}

impl OptimizationStrategy for MilpStrategy {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Milp
    }

    fn optimize(
        &self,
        pool: &CandidatePool,
        config: &OptimizationConfig,
        cancel: &CancellationToken,
    ) -> Result<StrategyOutput, OptimizeError> {
        if cancel.is_cancelled() {
            return Err(OptimizeError::Cancelled);
        }
        if pool.requested_units() == 0 {
            return Ok(StrategyOutput::single(Solution::from_assignments(Vec::new())));
        }

        let model = PurchaseModel::build(pool, self.store_penalty);
        let limits = SolveLimits::with_time_limit(config.time_limit());
        if config.monitoring().detailed_logging {
            debug!(
                solver = self.solver.name(),
                vars = model.problem.lp.num_vars(),
                constraints = model.problem.lp.constraints.len(),
                "Solving purchase model"
            );
        }

        let started = Instant::now();
        let solution = self.solver.solve_ilp(&model.problem, &limits).map_err(|err| match err {
            Error::Optimize(inner) => inner,
            other => OptimizeError::Internal(other.to_string()),
        })?;

        if cancel.is_cancelled() {
            return Err(OptimizeError::Cancelled);
        }

        match solution.status {
            SolutionStatus::Optimal | SolutionStatus::Feasible => {
                let plan = model.decode(pool, &solution.values);
                info!(
                    solver = self.solver.name(),
                    status = ?solution.status,
                    total_cost = %plan.total_cost,
                    num_stores = plan.num_stores,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "MILP solved"
                );
                Ok(StrategyOutput::single(plan))
            }
            SolutionStatus::Infeasible => Err(OptimizeError::InfeasibleProblem),
            SolutionStatus::TimeLimit => Err(OptimizeError::SolverTimeout(config.time_limit())),
            SolutionStatus::Unbounded => Err(OptimizeError::Internal(
                "purchase model reported unbounded".into(),
            )),
        }
    }
}
