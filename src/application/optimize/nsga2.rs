//! NSGA-II purchase-plan search.
//!
//! Elitist genetic search over per-unit listing choices. Each generation
//! breeds `population_size` children by binary tournament (rank, then
//! crowding distance), merges them with the parents and keeps the best
//! `population_size` by non-dominated rank and crowding. The search stops
//! at the time limit, at `max_generations`, or once the first front stops
//! moving.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::config::SearchParams;
use super::evolution::{
    crowding_distance, non_dominated_sort, objective_scales, offspring, StallDetector,
};
use super::genome::{Encoding, Individual};
use crate::domain::{Algorithm, CandidatePool, OptimizationConfig, Solution};
use crate::error::OptimizeError;
use crate::port::{OptimizationStrategy, StrategyOutput};

/// Resolve the run seed, drawing one when the request has none.
pub(crate) fn run_seed(config: &OptimizationConfig) -> u64 {
    config.seed().unwrap_or_else(|| rand::thread_rng().gen())
}

/// Initial population: greedy seeds, then random genomes.
pub(crate) fn initial_population(
    encoding: &Encoding<'_>,
    size: usize,
    rng: &mut StdRng,
) -> Vec<Individual> {
    let mut population: Vec<Individual> = encoding
        .seeds()
        .into_iter()
        .take(size)
        .map(|g| encoding.individual(g))
        .collect();
    while population.len() < size {
        let genome = encoding.random(rng);
        population.push(encoding.individual(genome));
    }
    population
}

/// Plan for a buylist with nothing to choose.
pub(crate) fn trivial_output(encoding: &Encoding<'_>) -> StrategyOutput {
    let genome = vec![None; encoding.len()];
    StrategyOutput::single(encoding.decode(&genome))
}

#[derive(Debug, Clone, Default)]
pub struct Nsga2Strategy {
    params: SearchParams,
}

impl Nsga2Strategy {
    #[must_use]
    pub const fn new(params: SearchParams) -> Self {
        Self { params }
    }

    fn rank_and_crowding(population: &[Individual]) -> (Vec<Vec<usize>>, Vec<usize>, Vec<f64>) {
        let objectives: Vec<_> = population.iter().map(|i| i.objectives).collect();
        let fronts = non_dominated_sort(&objectives);
        let mut rank = vec![0usize; population.len()];
        let mut crowding = vec![0.0; population.len()];
        for (r, front) in fronts.iter().enumerate() {
            let distance = crowding_distance(&objectives, front);
            for (k, &i) in front.iter().enumerate() {
                rank[i] = r;
                crowding[i] = distance[k];
            }
        }
        (fronts, rank, crowding)
    }

    fn tournament(rank: &[usize], crowding: &[f64], rng: &mut StdRng) -> usize {
        let a = rng.gen_range(0..rank.len());
        let b = rng.gen_range(0..rank.len());
        if rank[a] < rank[b] || (rank[a] == rank[b] && crowding[a] >= crowding[b]) {
            a
        } else {
            b
        }
    }

    /// Keep the best `size` of `combined` by rank, then crowding distance.
    fn survivors(combined: Vec<Individual>, size: usize) -> Vec<Individual> {
        let objectives: Vec<_> = combined.iter().map(|i| i.objectives).collect();
        let fronts = non_dominated_sort(&objectives);
        let mut keep: Vec<usize> = Vec::with_capacity(size);
        for front in fronts {
            if keep.len() + front.len() <= size {
                keep.extend(front);
                continue;
            }
            let distance = crowding_distance(&objectives, &front);
            let mut order: Vec<usize> = (0..front.len()).collect();
            order.sort_by(|&a, &b| distance[b].total_cmp(&distance[a]).then(a.cmp(&b)));
            keep.extend(order.into_iter().take(size - keep.len()).map(|k| front[k]));
            break;
        }
        keep.sort_unstable();

        let mut slots: Vec<Option<Individual>> = combined.into_iter().map(Some).collect();
        keep.into_iter().filter_map(|i| slots[i].take()).collect()
    }
}

impl OptimizationStrategy for Nsga2Strategy {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Nsga2
    }

    fn optimize(
        &self,
        pool: &CandidatePool,
        config: &OptimizationConfig,
        cancel: &CancellationToken,
    ) -> Result<StrategyOutput, OptimizeError> {
        let encoding = Encoding::new(pool);
        if encoding.is_empty() {
            return Ok(trivial_output(&encoding));
        }

        let seed = run_seed(config);
        let mut rng = StdRng::seed_from_u64(seed);
        let size = config.population_size().max(2);
        let deadline = Instant::now() + config.time_limit();
        let detailed = config.monitoring().detailed_logging;

        let mut population = initial_population(&encoding, size, &mut rng);
        let mut evaluations = population.len();
        let mut stall = StallDetector::new(
            objective_scales(&population),
            config.convergence_threshold(),
            self.params.stall_generations,
        );
        let mut generations = 0;

        while generations < self.params.max_generations {
            if cancel.is_cancelled() {
                return Err(OptimizeError::Cancelled);
            }
            if Instant::now() >= deadline {
                debug!(generations, "NSGA-II reached its time limit");
                break;
            }

            let (_, rank, crowding) = Self::rank_and_crowding(&population);
            let mut children = Vec::with_capacity(size);
            while children.len() < size {
                let a = Self::tournament(&rank, &crowding, &mut rng);
                let b = Self::tournament(&rank, &crowding, &mut rng);
                let genome = offspring(
                    &encoding,
                    &population[a].genome,
                    &population[b].genome,
                    self.params.crossover_rate,
                    self.params.mutation_rate,
                    &mut rng,
                );
                children.push(encoding.individual(genome));
            }
            evaluations += children.len();

            let mut combined = population;
            combined.extend(children);
            population = Self::survivors(combined, size);
            generations += 1;

            let (fronts, _, _) = Self::rank_and_crowding(&population);
            let first = fronts.first().map(Vec::as_slice).unwrap_or_default();
            let (change, converged) = stall.observe(first.iter().map(|&i| &population[i].objectives));
            if detailed {
                debug!(
                    algorithm = "nsga2",
                    generation = generations,
                    front_size = first.len(),
                    change,
                    "Generation complete"
                );
            }
            if converged {
                debug!(generations, "NSGA-II converged");
                break;
            }
        }

        let (fronts, _, _) = Self::rank_and_crowding(&population);
        let solutions: Vec<Solution> = fronts
            .first()
            .map(|front| {
                front
                    .iter()
                    .map(|&i| encoding.decode(&population[i].genome))
                    .collect()
            })
            .unwrap_or_default();

        info!(seed, generations, evaluations, front = solutions.len(), "NSGA-II finished");
        Ok(StrategyOutput {
            solutions,
            generations,
            evaluations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BuylistCard, CardCandidates, MarketplaceListing, Quality};
    use rust_decimal_macros::dec;

    fn pool() -> CandidatePool {
        let listings = vec![
            MarketplaceListing::try_new("a", "Bolt", Quality::Mp, 4, dec!(1.00)).unwrap(),
            MarketplaceListing::try_new("b", "Bolt", Quality::Nm, 4, dec!(1.50)).unwrap(),
            MarketplaceListing::try_new("b", "Opt", Quality::Nm, 2, dec!(0.20)).unwrap(),
            MarketplaceListing::try_new("c", "Opt", Quality::Lp, 2, dec!(0.10)).unwrap(),
        ];
        CandidatePool::new(
            listings,
            vec![
                CardCandidates {
                    card: BuylistCard::new("Bolt", 4),
                    listing_ids: vec![0, 1],
                },
                CardCandidates {
                    card: BuylistCard::new("Opt", 2),
                    listing_ids: vec![3, 2],
                },
            ],
        )
    }

    fn config(seed: u64) -> OptimizationConfig {
        OptimizationConfig::builder()
            .algorithm(Algorithm::Nsga2)
            .population_size(50)
            .time_limit_secs(60)
            .seed(Some(seed))
            .build()
            .unwrap()
    }

    #[test]
    fn survivors_keep_requested_size() {
        let pool = pool();
        let encoding = Encoding::new(&pool);
        let mut rng = StdRng::seed_from_u64(5);
        let population = initial_population(&encoding, 20, &mut rng);
        assert_eq!(Nsga2Strategy::survivors(population, 8).len(), 8);
    }

    #[test]
    fn front_contains_cheapest_and_single_store_plans() {
        let strategy = Nsga2Strategy::default();
        let output = strategy
            .optimize(&pool(), &config(11), &CancellationToken::new())
            .unwrap();

        assert!(output.generations > 0);
        let cheapest = output
            .solutions
            .iter()
            .map(|s| s.total_cost)
            .min()
            .unwrap();
        assert_eq!(cheapest, dec!(4.20));
        assert!(output.solutions.iter().any(|s| s.num_stores == 1));
        assert!(output.solutions.iter().all(|s| s.availability_score == 1.0));
    }

    #[test]
    fn cancelled_run_reports_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = Nsga2Strategy::default()
            .optimize(&pool(), &config(1), &cancel)
            .unwrap_err();
        assert_eq!(err, OptimizeError::Cancelled);
    }
}
