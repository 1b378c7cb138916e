//! Operators shared by NSGA-II and MOEA/D: variation, non-dominated
//! sorting, crowding distance and the stall-based stop rule.

use rand::Rng;

use super::genome::{Encoding, Genome, Individual, ObjectiveVector};
use crate::domain::pareto::dominates;

/// Per-card uniform crossover: each buylist line's genes come whole from
/// one parent or the other.
pub fn crossover<R: Rng>(encoding: &Encoding<'_>, a: &Genome, b: &Genome, rng: &mut R) -> Genome {
    let mut child = a.clone();
    for range in encoding.card_ranges() {
        if rng.gen_bool(0.5) {
            child[range.clone()].copy_from_slice(&b[range.clone()]);
        }
    }
    child
}

/// Re-draw each gene with probability `rate`.
pub fn mutate<R: Rng>(encoding: &Encoding<'_>, genome: &mut Genome, rate: f64, rng: &mut R) {
    for g in 0..genome.len() {
        if rng.gen_bool(rate) {
            genome[g] = encoding.random_option(g, rng);
        }
    }
}

/// Crossover (with probability `crossover_rate`), mutation and repair.
pub fn offspring<R: Rng>(
    encoding: &Encoding<'_>,
    a: &Genome,
    b: &Genome,
    crossover_rate: f64,
    mutation_rate: f64,
    rng: &mut R,
) -> Genome {
    let mut child = if rng.gen_bool(crossover_rate) {
        crossover(encoding, a, b, rng)
    } else {
        a.clone()
    };
    mutate(encoding, &mut child, mutation_rate, rng);
    encoding.repair(&mut child, rng);
    child
}

/// Fast non-dominated sort. Returns fronts of indices, best first.
#[must_use]
pub fn non_dominated_sort(objectives: &[ObjectiveVector]) -> Vec<Vec<usize>> {
    let n = objectives.len();
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut domination_count = vec![0usize; n];
    let mut fronts: Vec<Vec<usize>> = vec![Vec::new()];

    for p in 0..n {
        for q in (p + 1)..n {
            if dominates(&objectives[p], &objectives[q]) {
                dominated_by[p].push(q);
                domination_count[q] += 1;
            } else if dominates(&objectives[q], &objectives[p]) {
                dominated_by[q].push(p);
                domination_count[p] += 1;
            }
        }
    }
    for p in 0..n {
        if domination_count[p] == 0 {
            fronts[0].push(p);
        }
    }

    let mut i = 0;
    while i < fronts.len() && !fronts[i].is_empty() {
        let mut next = Vec::new();
        for &p in &fronts[i] {
            for &q in &dominated_by[p] {
                domination_count[q] -= 1;
                if domination_count[q] == 0 {
                    next.push(q);
                }
            }
        }
        next.sort_unstable();
        fronts.push(next);
        i += 1;
    }
    fronts.retain(|f| !f.is_empty());
    fronts
}

/// Crowding distance of each member of `front`, in the same order.
#[must_use]
pub fn crowding_distance(objectives: &[ObjectiveVector], front: &[usize]) -> Vec<f64> {
    let len = front.len();
    let mut distance = vec![0.0; len];
    if len <= 2 {
        return vec![f64::INFINITY; len];
    }
    for m in 0..4 {
        let mut order: Vec<usize> = (0..len).collect();
        order.sort_by(|&a, &b| objectives[front[a]][m].total_cmp(&objectives[front[b]][m]));
        let min = objectives[front[order[0]]][m];
        let max = objectives[front[order[len - 1]]][m];
        distance[order[0]] = f64::INFINITY;
        distance[order[len - 1]] = f64::INFINITY;
        let span = max - min;
        if span <= f64::EPSILON {
            continue;
        }
        for k in 1..len - 1 {
            let prev = objectives[front[order[k - 1]]][m];
            let next = objectives[front[order[k + 1]]][m];
            distance[order[k]] += (next - prev) / span;
        }
    }
    distance
}

/// Fixed per-objective scales taken from the initial population, so the
/// stop rule compares generations on a stable footing.
#[must_use]
pub fn objective_scales(population: &[Individual]) -> ObjectiveVector {
    let mut scales = [1.0; 4];
    for (m, scale) in scales.iter_mut().enumerate() {
        let (min, max) = population.iter().fold((f64::MAX, f64::MIN), |(lo, hi), ind| {
            (lo.min(ind.objectives[m]), hi.max(ind.objectives[m]))
        });
        let span = max - min;
        let magnitude = max.abs().max(min.abs());
        *scale = if span > f64::EPSILON {
            span
        } else if magnitude > f64::EPSILON {
            magnitude
        } else {
            1.0
        };
    }
    scales
}

/// Stop rule: the normalized centroid of the current front moves less than
/// `threshold` for `patience` consecutive generations.
#[derive(Debug, Clone)]
pub struct StallDetector {
    scales: ObjectiveVector,
    threshold: f64,
    patience: usize,
    previous: Option<ObjectiveVector>,
    stalled: usize,
}

impl StallDetector {
    #[must_use]
    pub fn new(scales: ObjectiveVector, threshold: f64, patience: usize) -> Self {
        Self {
            scales,
            threshold,
            patience: patience.max(1),
            previous: None,
            stalled: 0,
        }
    }

    /// Record this generation's front. Returns the change from the previous
    /// generation and whether the search has converged.
    pub fn observe<'a, I>(&mut self, front: I) -> (f64, bool)
    where
        I: IntoIterator<Item = &'a ObjectiveVector>,
    {
        let mut centroid = [0.0; 4];
        let mut count = 0usize;
        for objectives in front {
            for m in 0..4 {
                centroid[m] += objectives[m] / self.scales[m];
            }
            count += 1;
        }
        if count > 0 {
            for value in &mut centroid {
                *value /= count as f64;
            }
        }

        let change = self.previous.map_or(f64::INFINITY, |prev| {
            prev.iter()
                .zip(&centroid)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max)
        });
        self.previous = Some(centroid);

        if change < self.threshold {
            self.stalled += 1;
        } else {
            self.stalled = 0;
        }
        (change, self.stalled >= self.patience)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_splits_fronts() {
        let objectives = vec![
            [1.0, 0.0, 0.0, 1.0],
            [2.0, 0.0, 0.0, 1.0],
            [0.5, 0.0, 0.0, 2.0],
            [3.0, 0.0, 0.0, 3.0],
        ];
        let fronts = non_dominated_sort(&objectives);
        assert_eq!(fronts, vec![vec![0, 2], vec![1], vec![3]]);
    }

    #[test]
    fn boundary_points_get_infinite_crowding() {
        let objectives = vec![
            [1.0, 0.0, 0.0, 3.0],
            [2.0, 0.0, 0.0, 2.0],
            [3.0, 0.0, 0.0, 1.0],
        ];
        let distance = crowding_distance(&objectives, &[0, 1, 2]);
        assert!(distance[0].is_infinite());
        assert!(distance[2].is_infinite());
        assert!((distance[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn stall_detector_needs_consecutive_quiet_generations() {
        let mut detector = StallDetector::new([1.0; 4], 1e-3, 2);
        let a = [1.0, -1.0, -1.0, 1.0];
        assert!(!detector.observe([&a]).1);
        assert!(!detector.observe([&a]).1);
        assert!(detector.observe([&a]).1);

        let b = [0.5, -1.0, -1.0, 1.0];
        let (change, converged) = detector.observe([&b]);
        assert!((change - 0.5).abs() < 1e-12);
        assert!(!converged);
    }
}
