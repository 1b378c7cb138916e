//! Genome encoding shared by the evolutionary strategies.
//!
//! A genome holds one gene per requested unit: the listing that unit is
//! bought from, or `None` when no acceptable listing has capacity left.
//! Genes of the same buylist line are contiguous. Every genome handed to
//! the search is repaired so no listing sells more than it has.

use std::collections::BTreeMap;
use std::ops::Range;

use rand::Rng;
use rust_decimal::prelude::ToPrimitive;

use crate::domain::{CandidatePool, CardAssignment, Pick, Solution};

/// Listing choice per requested unit.
pub type Genome = Vec<Option<usize>>;

/// Objective vector oriented for minimization:
/// `[cost, -quality, -availability, stores]`.
pub type ObjectiveVector = [f64; 4];

/// A genome with its evaluated objectives.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    pub genome: Genome,
    pub objectives: ObjectiveVector,
}

/// Pool-derived lookup tables for fast evaluation.
pub struct Encoding<'a> {
    pool: &'a CandidatePool,
    /// Gene range per buylist line.
    card_ranges: Vec<Range<usize>>,
    /// Buylist line per gene.
    gene_card: Vec<usize>,
    capacity: Vec<u32>,
    price: Vec<f64>,
    quality: Vec<f64>,
    site: Vec<usize>,
    site_count: usize,
    requested: usize,
}

impl<'a> Encoding<'a> {
    #[must_use]
    pub fn new(pool: &'a CandidatePool) -> Self {
        let mut card_ranges = Vec::with_capacity(pool.cards().len());
        let mut gene_card = Vec::new();
        for (card, candidates) in pool.cards().iter().enumerate() {
            let start = gene_card.len();
            gene_card.extend(std::iter::repeat(card).take(candidates.card.quantity as usize));
            card_ranges.push(start..gene_card.len());
        }

        let mut site_ids: BTreeMap<&str, usize> = BTreeMap::new();
        let mut site = Vec::with_capacity(pool.listings().len());
        for listing in pool.listings() {
            let next = site_ids.len();
            site.push(*site_ids.entry(listing.site_id.as_str()).or_insert(next));
        }

        Self {
            pool,
            requested: gene_card.len(),
            card_ranges,
            gene_card,
            capacity: pool.listings().iter().map(|l| l.quantity).collect(),
            price: pool
                .listings()
                .iter()
                .map(|l| l.price.to_f64().unwrap_or(f64::MAX))
                .collect(),
            quality: pool.listings().iter().map(|l| l.quality.weight()).collect(),
            site,
            site_count: site_ids.len(),
        }
    }

    #[must_use]
    pub fn pool(&self) -> &CandidatePool {
        self.pool
    }

    /// Number of genes (requested units).
    #[must_use]
    pub fn len(&self) -> usize {
        self.requested
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requested == 0
    }

    #[must_use]
    pub fn card_ranges(&self) -> &[Range<usize>] {
        &self.card_ranges
    }

    /// Acceptable listings for gene `gene`, cheapest first.
    #[must_use]
    pub fn options(&self, gene: usize) -> &[usize] {
        &self.pool.cards()[self.gene_card[gene]].listing_ids
    }

    /// A uniformly random option for `gene`, `None` if it has none.
    pub fn random_option<R: Rng>(&self, gene: usize, rng: &mut R) -> Option<usize> {
        let options = self.options(gene);
        if options.is_empty() {
            None
        } else {
            Some(options[rng.gen_range(0..options.len())])
        }
    }

    /// A random genome, repaired.
    pub fn random<R: Rng>(&self, rng: &mut R) -> Genome {
        let mut genome: Genome = (0..self.requested)
            .map(|g| self.random_option(g, rng))
            .collect();
        self.repair(&mut genome, rng);
        genome
    }

    /// Enforce listing capacities and fill every unit that can be filled.
    ///
    /// Genes over a listing's capacity are cleared in gene order; cleared or
    /// empty genes are then refilled from a random option with capacity left.
    pub fn repair<R: Rng>(&self, genome: &mut Genome, rng: &mut R) {
        let mut used = vec![0u32; self.capacity.len()];
        for gene in genome.iter_mut() {
            if let Some(listing) = *gene {
                if used[listing] < self.capacity[listing] {
                    used[listing] += 1;
                } else {
                    *gene = None;
                }
            }
        }

        let mut open: Vec<usize> = Vec::new();
        for g in 0..genome.len() {
            if genome[g].is_some() {
                continue;
            }
            open.clear();
            open.extend(
                self.options(g)
                    .iter()
                    .copied()
                    .filter(|&l| used[l] < self.capacity[l]),
            );
            if !open.is_empty() {
                let listing = open[rng.gen_range(0..open.len())];
                used[listing] += 1;
                genome[g] = Some(listing);
            }
        }
    }

    /// Deterministic fill: each unit takes the first option in `order`
    /// with capacity left.
    pub fn greedy<K, F>(&self, key: F) -> Genome
    where
        F: Fn(usize) -> K,
        K: Ord,
    {
        let mut used = vec![0u32; self.capacity.len()];
        let mut genome: Genome = vec![None; self.requested];
        for range in &self.card_ranges {
            let Some(first) = range.clone().next() else {
                continue;
            };
            let mut options = self.options(first).to_vec();
            options.sort_by_key(|&l| key(l));
            for g in range.clone() {
                if let Some(&l) = options.iter().find(|&&l| used[l] < self.capacity[l]) {
                    used[l] += 1;
                    genome[g] = Some(l);
                }
            }
        }
        genome
    }

    /// Seed genomes: cheapest, best condition, fewest stores.
    #[must_use]
    pub fn seeds(&self) -> Vec<Genome> {
        let cheapest = self.greedy(|l| (ordered(self.price[l]), l));
        let best_quality =
            self.greedy(|l| (std::cmp::Reverse(ordered(self.quality[l])), ordered(self.price[l]), l));

        // Rank sites by how many requested units they can cover on their own.
        let mut coverage = vec![0u64; self.site_count];
        for (card, range) in self.card_ranges.iter().enumerate() {
            let wanted = range.len() as u64;
            let mut per_site = vec![0u64; self.site_count];
            for &l in &self.pool.cards()[card].listing_ids {
                per_site[self.site[l]] += u64::from(self.capacity[l]);
            }
            for (s, units) in per_site.into_iter().enumerate() {
                coverage[s] += units.min(wanted);
            }
        }
        let mut ranked: Vec<usize> = (0..self.site_count).collect();
        ranked.sort_by_key(|&s| (std::cmp::Reverse(coverage[s]), s));
        let mut rank = vec![0usize; self.site_count];
        for (position, &s) in ranked.iter().enumerate() {
            rank[s] = position;
        }
        let fewest_stores = self.greedy(|l| (rank[self.site[l]], ordered(self.price[l]), l));

        vec![cheapest, best_quality, fewest_stores]
    }

    /// Objective vector of a genome.
    #[must_use]
    pub fn evaluate(&self, genome: &Genome) -> ObjectiveVector {
        let mut cost = 0.0;
        let mut quality = 0.0;
        let mut filled = 0usize;
        let mut sites = vec![false; self.site_count];
        for &listing in genome.iter().flatten() {
            cost += self.price[listing];
            quality += self.quality[listing];
            filled += 1;
            sites[self.site[listing]] = true;
        }
        let quality = if filled == 0 { 0.0 } else { quality / filled as f64 };
        let availability = if self.requested == 0 {
            1.0
        } else {
            filled as f64 / self.requested as f64
        };
        let stores = sites.iter().filter(|&&s| s).count() as f64;
        [cost, -quality, -availability, stores]
    }

    #[must_use]
    pub fn individual(&self, genome: Genome) -> Individual {
        let objectives = self.evaluate(&genome);
        Individual { genome, objectives }
    }

    /// Expand a genome into a purchase plan.
    #[must_use]
    pub fn decode(&self, genome: &Genome) -> Solution {
        let assignments = self
            .card_ranges
            .iter()
            .zip(self.pool.cards())
            .map(|(range, candidates)| {
                let mut counts: BTreeMap<usize, u32> = BTreeMap::new();
                for &listing in genome[range.clone()].iter().flatten() {
                    *counts.entry(listing).or_default() += 1;
                }
                let picks = counts
                    .into_iter()
                    .map(|(listing, quantity)| Pick {
                        listing: self.pool.listing(listing).clone(),
                        quantity,
                    })
                    .collect();
                CardAssignment::new(candidates.card.clone(), picks)
            })
            .collect();
        Solution::from_assignments(assignments)
    }
}

/// Fixed-point sort key for finite values.
fn ordered(value: f64) -> i64 {
    (value * 1_000_000.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BuylistCard, CardCandidates, MarketplaceListing, Quality};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    fn pool() -> CandidatePool {
        let listings = vec![
            MarketplaceListing::try_new("a", "Bolt", Quality::Lp, 2, dec!(1.00)).unwrap(),
            MarketplaceListing::try_new("b", "Bolt", Quality::Nm, 4, dec!(1.50)).unwrap(),
            MarketplaceListing::try_new("b", "Opt", Quality::Nm, 4, dec!(0.20)).unwrap(),
        ];
        CandidatePool::new(
            listings,
            vec![
                CardCandidates {
                    card: BuylistCard::new("Bolt", 3),
                    listing_ids: vec![0, 1],
                },
                CardCandidates {
                    card: BuylistCard::new("Opt", 1),
                    listing_ids: vec![2],
                },
            ],
        )
    }

    #[test]
    fn repair_respects_capacity_and_fills_units() {
        let pool = pool();
        let encoding = Encoding::new(&pool);
        let mut rng = StdRng::seed_from_u64(1);
        let mut genome = vec![Some(0), Some(0), Some(0), None];
        encoding.repair(&mut genome, &mut rng);

        assert_eq!(genome, vec![Some(0), Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn cheapest_seed_uses_cheap_listing_first() {
        let pool = pool();
        let encoding = Encoding::new(&pool);
        let seeds = encoding.seeds();

        assert_eq!(seeds[0], vec![Some(0), Some(0), Some(1), Some(2)]);
        assert_eq!(seeds[1], vec![Some(1), Some(1), Some(1), Some(2)]);
        // Site b covers both lines on its own.
        assert_eq!(seeds[2], vec![Some(1), Some(1), Some(1), Some(2)]);
    }

    #[test]
    fn evaluation_matches_decoded_solution() {
        let pool = pool();
        let encoding = Encoding::new(&pool);
        let genome = vec![Some(0), Some(0), Some(1), Some(2)];
        let objectives = encoding.evaluate(&genome);
        let solution = encoding.decode(&genome);

        assert_eq!(solution.total_cost, dec!(3.70));
        assert!((objectives[0] - 3.70).abs() < 1e-9);
        assert_eq!(objectives[3], 2.0);
        assert_eq!(objectives[2], -1.0);
        assert!((objectives[1] + solution.quality_score).abs() < 1e-12);
    }

    #[test]
    fn unfillable_units_stay_empty() {
        let pool = CandidatePool::new(
            vec![],
            vec![CardCandidates {
                card: BuylistCard::new("Ghost", 2),
                listing_ids: vec![],
            }],
        );
        let encoding = Encoding::new(&pool);
        let mut rng = StdRng::seed_from_u64(3);
        let genome = encoding.random(&mut rng);
        assert_eq!(genome, vec![None, None]);
        assert_eq!(encoding.evaluate(&genome)[2], 0.0);
    }
}
