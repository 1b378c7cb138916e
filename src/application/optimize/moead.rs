//! MOEA/D purchase-plan search.
//!
//! Decomposes the four objectives into `population_size` scalar
//! subproblems (Tchebycheff, random simplex weights). Each subproblem
//! mates within its weight-space neighbourhood and a child replaces any
//! neighbour it improves. Non-dominated plans seen along the way are kept
//! in an external archive, which is what the strategy returns.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::config::SearchParams;
use super::evolution::{objective_scales, offspring, StallDetector};
use super::genome::{Encoding, Individual, ObjectiveVector};
use super::nsga2::{initial_population, run_seed, trivial_output};
use crate::domain::pareto::dominates;
use crate::domain::{Algorithm, CandidatePool, OptimizationConfig};
use crate::error::OptimizeError;
use crate::port::{OptimizationStrategy, StrategyOutput};

const NEIGHBOURHOOD: usize = 10;
const MIN_WEIGHT: f64 = 1e-6;

#[derive(Debug, Clone, Default)]
pub struct MoeadStrategy {
    params: SearchParams,
}

/// Random weight vectors on the unit simplex.
fn weights(count: usize, rng: &mut StdRng) -> Vec<ObjectiveVector> {
    (0..count)
        .map(|_| {
            let mut w = [0.0; 4];
            for value in &mut w {
                // Exponential draws normalized give a uniform simplex sample.
                *value = -(1.0 - rng.gen::<f64>()).ln();
            }
            let sum: f64 = w.iter().sum();
            for value in &mut w {
                *value = (*value / sum).max(MIN_WEIGHT);
            }
            w
        })
        .collect()
}

/// Indices of the `size` closest weight vectors to each weight vector.
fn neighbourhoods(weights: &[ObjectiveVector], size: usize) -> Vec<Vec<usize>> {
    weights
        .iter()
        .map(|w| {
            let mut order: Vec<(f64, usize)> = weights
                .iter()
                .enumerate()
                .map(|(j, v)| {
                    let d: f64 = w.iter().zip(v).map(|(a, b)| (a - b) * (a - b)).sum();
                    (d, j)
                })
                .collect();
            order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            order.into_iter().take(size).map(|(_, j)| j).collect()
        })
        .collect()
}

fn tchebycheff(
    objectives: &ObjectiveVector,
    weight: &ObjectiveVector,
    ideal: &ObjectiveVector,
    scales: &ObjectiveVector,
) -> f64 {
    (0..4)
        .map(|m| weight[m] * ((objectives[m] - ideal[m]) / scales[m]).abs())
        .fold(0.0, f64::max)
}

/// Insert into the non-dominated archive. Returns `true` if it was added.
fn archive_insert(archive: &mut Vec<Individual>, candidate: &Individual) -> bool {
    if archive.iter().any(|a| {
        dominates(&a.objectives, &candidate.objectives) || a.objectives == candidate.objectives
    }) {
        return false;
    }
    archive.retain(|a| !dominates(&candidate.objectives, &a.objectives));
    archive.push(candidate.clone());
    true
}

impl MoeadStrategy {
    #[must_use]
    pub const fn new(params: SearchParams) -> Self {
        Self { params }
    }
}

impl OptimizationStrategy for MoeadStrategy {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Moead
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

        let weights = weights(size, &mut rng);
        let neighbours = neighbourhoods(&weights, NEIGHBOURHOOD.min(size));
        let mut population = initial_population(&encoding, size, &mut rng);
        let scales = objective_scales(&population);
        let mut ideal = population.iter().fold([f64::MAX; 4], |mut z, ind| {
            for m in 0..4 {
                z[m] = z[m].min(ind.objectives[m]);
            }
            z
        });

        let mut archive: Vec<Individual> = Vec::new();
        for individual in &population {
            archive_insert(&mut archive, individual);
        }

        let mut stall = StallDetector::new(
            scales,
            config.convergence_threshold(),
            self.params.stall_generations,
        );
        let mut evaluations = population.len();
        let mut generations = 0;

        'search: while generations < self.params.max_generations {
            for i in 0..size {
                if cancel.is_cancelled() {
                    return Err(OptimizeError::Cancelled);
                }
                if Instant::now() >= deadline {
                    debug!(generations, "MOEA/D reached its time limit");
                    break 'search;
                }

                let hood = &neighbours[i];
                let a = hood[rng.gen_range(0..hood.len())];
                let b = hood[rng.gen_range(0..hood.len())];
                let genome = offspring(
                    &encoding,
                    &population[a].genome,
                    &population[b].genome,
                    self.params.crossover_rate,
                    self.params.mutation_rate,
                    &mut rng,
                );
                let child = encoding.individual(genome);
                evaluations += 1;

                for m in 0..4 {
                    ideal[m] = ideal[m].min(child.objectives[m]);
                }
                for &j in hood {
                    let current = tchebycheff(&population[j].objectives, &weights[j], &ideal, &scales);
                    let candidate = tchebycheff(&child.objectives, &weights[j], &ideal, &scales);
                    if candidate <= current {
                        population[j] = child.clone();
                    }
                }
                archive_insert(&mut archive, &child);
            }
            generations += 1;

            let (change, converged) = stall.observe(archive.iter().map(|a| &a.objectives));
            if detailed {
                debug!(
                    algorithm = "moead",
                    generation = generations,
                    archive_size = archive.len(),
                    change,
                    "Generation complete"
                );
            }
            if converged {
                debug!(generations, "MOEA/D converged");
                break;
            }
        }

        let solutions = archive.iter().map(|a| encoding.decode(&a.genome)).collect::<Vec<_>>();
        info!(seed, generations, evaluations, front = solutions.len(), "MOEA/D finished");
        Ok(StrategyOutput {
            solutions,
            generations,
            evaluations,
        })
    }
}
