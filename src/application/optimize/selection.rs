//! Algorithm selection.

use std::time::Duration;

use crate::domain::{Algorithm, CandidatePool, OptimizationConfig};

/// One step of a run plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedRun {
    pub algorithm: Algorithm,
    pub budget: Budget,
}

/// Time budget of a planned step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// A fixed slice of the run's time limit.
    Fixed(Duration),
    /// Whatever the earlier steps left over.
    Remaining,
}

/// `auto` rule: exact solver for small problems, NSGA-II otherwise.
#[must_use]
pub fn select_for_size(pool: &CandidatePool, small_problem_threshold: f64) -> Algorithm {
    if pool.complexity() < small_problem_threshold {
        Algorithm::Milp
    } else {
        Algorithm::Nsga2
    }
}

/// Primary step plus an optional fallback step for `config`.
///
/// The fallback step is omitted when it would rerun the primary algorithm.
#[must_use]
pub fn plan(
    pool: &CandidatePool,
    config: &OptimizationConfig,
    small_problem_threshold: f64,
    hybrid_milp_fraction: f64,
) -> (PlannedRun, Option<PlannedRun>) {
    let limit = config.time_limit();
    let primary = match config.algorithm() {
        Algorithm::Auto => PlannedRun {
            algorithm: select_for_size(pool, small_problem_threshold),
            budget: Budget::Fixed(limit),
        },
        Algorithm::Hybrid => PlannedRun {
            algorithm: Algorithm::Milp,
            budget: Budget::Fixed(limit.mul_f64(hybrid_milp_fraction.clamp(0.0, 1.0))),
        },
        algorithm => PlannedRun {
            algorithm,
            budget: Budget::Fixed(limit),
        },
    };
    let fallback = (config.fallback() != primary.algorithm).then_some(PlannedRun {
        algorithm: config.fallback(),
        budget: Budget::Remaining,
    });
    (primary, fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BuylistCard, CardCandidates, MarketplaceListing, Quality};
    use rust_decimal_macros::dec;

    fn pool(cards: usize, listings_per_card: usize) -> CandidatePool {
        let mut listings = Vec::new();
        let mut lines = Vec::new();
        for c in 0..cards {
            let name = format!("card {c}");
            let ids = (0..listings_per_card)
                .map(|s| {
                    listings.push(
                        MarketplaceListing::try_new(format!("s{s}"), name.clone(), Quality::Nm, 1, dec!(1))
                            .unwrap(),
                    );
                    listings.len() - 1
                })
                .collect();
            lines.push(CardCandidates {
                card: BuylistCard::new(name, 1),
                listing_ids: ids,
            });
        }
        CandidatePool::new(listings, lines)
    }

    fn config(algorithm: Algorithm, fallback: Algorithm) -> OptimizationConfig {
        OptimizationConfig::builder()
            .algorithm(algorithm)
            .fallback(fallback)
            .time_limit_secs(100)
            .build()
            .unwrap()
    }

    #[test]
    fn auto_picks_by_complexity() {
        assert_eq!(select_for_size(&pool(10, 5), 400.0), Algorithm::Milp);
        assert_eq!(select_for_size(&pool(40, 10), 400.0), Algorithm::Nsga2);
    }

    #[test]
    fn hybrid_gives_milp_a_fraction() {
        let (primary, fallback) = plan(
            &pool(2, 2),
            &config(Algorithm::Hybrid, Algorithm::Nsga2),
            400.0,
            0.5,
        );
        assert_eq!(primary.algorithm, Algorithm::Milp);
        assert_eq!(primary.budget, Budget::Fixed(Duration::from_secs(50)));
        assert_eq!(
            fallback,
            Some(PlannedRun {
                algorithm: Algorithm::Nsga2,
                budget: Budget::Remaining
            })
        );
    }

    #[test]
    fn no_fallback_to_the_same_algorithm() {
        let (primary, fallback) = plan(
            &pool(2, 2),
            &config(Algorithm::Nsga2, Algorithm::Nsga2),
            400.0,
            0.5,
        );
        assert_eq!(primary.algorithm, Algorithm::Nsga2);
        assert!(fallback.is_none());
    }
}
