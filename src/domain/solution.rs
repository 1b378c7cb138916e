//! Purchase plans and their objective metrics.

use std::collections::BTreeSet;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::card::BuylistCard;
use super::id::SiteId;
use super::listing::MarketplaceListing;

/// Units bought from one listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    pub listing: MarketplaceListing,
    pub quantity: u32,
}

impl Pick {
    #[must_use]
    pub fn cost(&self) -> Decimal {
        self.listing.price * Decimal::from(self.quantity)
    }
}

/// How one buylist line is covered by a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardAssignment {
    pub card: BuylistCard,
    pub picks: Vec<Pick>,
    pub fulfilled: u32,
    pub unfulfilled: u32,
}

impl CardAssignment {
    /// Build an assignment, deriving the fulfilled/unfulfilled split.
    #[must_use]
    pub fn new(card: BuylistCard, picks: Vec<Pick>) -> Self {
        let fulfilled: u32 = picks.iter().map(|p| p.quantity).sum();
        let unfulfilled = card.quantity.saturating_sub(fulfilled);
        Self {
            card,
            picks,
            fulfilled,
            unfulfilled,
        }
    }

    #[must_use]
    pub fn is_fully_covered(&self) -> bool {
        self.unfulfilled == 0
    }
}

/// Objective vector of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Objectives {
    pub total_cost: f64,
    pub quality_score: f64,
    pub availability_score: f64,
    pub num_stores: usize,
}

impl Objectives {
    /// Objective vector with every component oriented for minimization.
    #[must_use]
    pub fn minimization_vector(&self) -> [f64; 4] {
        [
            self.total_cost,
            -self.quality_score,
            -self.availability_score,
            self.num_stores as f64,
        ]
    }
}

/// A complete purchase plan for a buylist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub assignments: Vec<CardAssignment>,
    pub total_cost: Decimal,
    pub quality_score: f64,
    pub availability_score: f64,
    pub num_stores: usize,
}

impl Solution {
    /// Build a plan and derive its metrics.
    ///
    /// - `total_cost`: sum of price × quantity.
    /// - `quality_score`: unit-weighted mean condition weight (0 if nothing bought).
    /// - `availability_score`: bought units / requested units (1 for an empty request).
    /// - `num_stores`: distinct sites touched.
    #[must_use]
    pub fn from_assignments(assignments: Vec<CardAssignment>) -> Self {
        let mut total_cost = Decimal::ZERO;
        let mut quality_sum = 0.0;
        let mut bought: u64 = 0;
        let mut requested: u64 = 0;
        let mut sites: BTreeSet<&SiteId> = BTreeSet::new();

        for assignment in &assignments {
            requested += u64::from(assignment.card.quantity);
            for pick in assignment.picks.iter().filter(|p| p.quantity > 0) {
                total_cost += pick.cost();
                quality_sum += pick.listing.quality.weight() * f64::from(pick.quantity);
                bought += u64::from(pick.quantity);
                sites.insert(&pick.listing.site_id);
            }
        }

        let quality_score = if bought == 0 {
            0.0
        } else {
            quality_sum / bought as f64
        };
        let availability_score = if requested == 0 {
            1.0
        } else {
            bought.min(requested) as f64 / requested as f64
        };
        let num_stores = sites.len();

        Self {
            assignments,
            total_cost,
            quality_score,
            availability_score,
            num_stores,
        }
    }

    #[must_use]
    pub fn objectives(&self) -> Objectives {
        Objectives {
            total_cost: self.total_cost.to_f64().unwrap_or(f64::MAX),
            quality_score: self.quality_score,
            availability_score: self.availability_score,
            num_stores: self.num_stores,
        }
    }

    /// Total units left unbought.
    #[must_use]
    pub fn unfulfilled_units(&self) -> u32 {
        self.assignments.iter().map(|a| a.unfulfilled).sum()
    }

    /// Distinct sites in the plan, sorted.
    #[must_use]
    pub fn sites(&self) -> Vec<SiteId> {
        let sites: BTreeSet<&SiteId> = self
            .assignments
            .iter()
            .flat_map(|a| a.picks.iter().map(|p| &p.listing.site_id))
            .collect();
        sites.into_iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::card::Quality;
    use rust_decimal_macros::dec;

    fn listing(site: &str, quality: Quality, price: Decimal) -> MarketplaceListing {
        MarketplaceListing::try_new(site, "Opt", quality, 10, price).unwrap()
    }

    #[test]
    fn metrics_are_derived_from_picks() {
        let card = BuylistCard::new("Opt", 4);
        let picks = vec![
            Pick {
                listing: listing("a", Quality::Nm, dec!(1.00)),
                quantity: 2,
            },
            Pick {
                listing: listing("b", Quality::Mp, dec!(0.50)),
                quantity: 1,
            },
        ];
        let solution = Solution::from_assignments(vec![CardAssignment::new(card, picks)]);

        assert_eq!(solution.total_cost, dec!(2.50));
        assert_eq!(solution.num_stores, 2);
        assert!((solution.availability_score - 0.75).abs() < 1e-12);
        let expected_quality = (2.0 * 1.0 + 0.6) / 3.0;
        assert!((solution.quality_score - expected_quality).abs() < 1e-12);
        assert_eq!(solution.unfulfilled_units(), 1);
    }

    #[test]
    fn empty_plan_has_zero_availability() {
        let solution =
            Solution::from_assignments(vec![CardAssignment::new(BuylistCard::new("Opt", 2), vec![])]);
        assert_eq!(solution.total_cost, Decimal::ZERO);
        assert_eq!(solution.availability_score, 0.0);
        assert_eq!(solution.quality_score, 0.0);
        assert_eq!(solution.num_stores, 0);
    }

    #[test]
    fn minimization_vector_flips_maximized_objectives() {
        let objectives = Objectives {
            total_cost: 3.0,
            quality_score: 0.8,
            availability_score: 1.0,
            num_stores: 2,
        };
        assert_eq!(objectives.minimization_vector(), [3.0, -0.8, -1.0, 2.0]);
    }
}
