//! Pareto dominance and the presentation-ordered front.
//!
//! Solution `a` dominates `b` when it is no worse in every objective (cost
//! and store count minimized, quality and availability maximized) and
//! strictly better in at least one.

use std::cmp::Ordering;

use serde::Serialize;

use super::solution::Solution;

/// Returns `true` if minimization vector `a` dominates `b`.
#[must_use]
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    debug_assert_eq!(a.len(), b.len());
    let mut strictly_better = false;
    for (x, y) in a.iter().zip(b) {
        if x > y {
            return false;
        }
        if x < y {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Returns `true` if solution `a` dominates solution `b`.
#[must_use]
pub fn solution_dominates(a: &Solution, b: &Solution) -> bool {
    dominates(
        &a.objectives().minimization_vector(),
        &b.objectives().minimization_vector(),
    )
}

/// Mutually non-dominated solutions sorted for presentation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParetoFront(Vec<Solution>);

impl ParetoFront {
    /// Reduce `solutions` to the non-dominated subset.
    ///
    /// Solutions with identical objective vectors are collapsed to the first
    /// one seen. The result is sorted by ascending total cost, then
    /// descending quality, then descending availability. Empty input yields
    /// an empty front.
    #[must_use]
    pub fn build(solutions: Vec<Solution>) -> Self {
        let vectors: Vec<[f64; 4]> = solutions
            .iter()
            .map(|s| s.objectives().minimization_vector())
            .collect();

        let mut kept: Vec<(Solution, [f64; 4])> = Vec::new();
        for (i, solution) in solutions.into_iter().enumerate() {
            let v = vectors[i];
            let dominated = vectors.iter().any(|other| dominates(other, &v));
            if dominated {
                continue;
            }
            let duplicate = kept
                .iter()
                .any(|(k, kv)| *kv == v && k.total_cost == solution.total_cost);
            if !duplicate {
                kept.push((solution, v));
            }
        }

        let mut front: Vec<Solution> = kept.into_iter().map(|(s, _)| s).collect();
        front.sort_by(presentation_order);
        Self(front)
    }

    #[must_use]
    pub fn solutions(&self) -> &[Solution] {
        &self.0
    }

    #[must_use]
    pub fn into_solutions(self) -> Vec<Solution> {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Cheapest plan on the front.
    #[must_use]
    pub fn cheapest(&self) -> Option<&Solution> {
        self.0.first()
    }
}

fn presentation_order(a: &Solution, b: &Solution) -> Ordering {
    a.total_cost
        .cmp(&b.total_cost)
        .then_with(|| b.quality_score.total_cmp(&a.quality_score))
        .then_with(|| b.availability_score.total_cmp(&a.availability_score))
}
