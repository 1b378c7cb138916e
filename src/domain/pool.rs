//! Candidate pool: accepted listings per buylist line.
//!
//! Listings are stored once and referenced by index, so a listing that
//! satisfies several buylist lines shares its available quantity between
//! them. The pool is built once and then only read.

use std::collections::BTreeSet;

use serde::Serialize;

use super::card::BuylistCard;
use super::id::SiteId;
use super::listing::MarketplaceListing;

/// Accepted listings for one buylist line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardCandidates {
    pub card: BuylistCard,
    /// Indices into [`CandidatePool::listings`], cheapest first.
    pub listing_ids: Vec<usize>,
}

impl CardCandidates {
    /// A line with no acceptable listing.
    #[must_use]
    pub fn is_unfulfillable(&self) -> bool {
        self.listing_ids.is_empty()
    }
}

/// Read-only input to the optimization engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CandidatePool {
    listings: Vec<MarketplaceListing>,
    cards: Vec<CardCandidates>,
}

impl CandidatePool {
    /// Assemble a pool. Listing ids must index into `listings`.
    #[must_use]
    pub fn new(listings: Vec<MarketplaceListing>, cards: Vec<CardCandidates>) -> Self {
        debug_assert!(cards
            .iter()
            .flat_map(|c| &c.listing_ids)
            .all(|&id| id < listings.len()));
        Self { listings, cards }
    }

    #[must_use]
    pub fn listings(&self) -> &[MarketplaceListing] {
        &self.listings
    }

    #[must_use]
    pub fn listing(&self, id: usize) -> &MarketplaceListing {
        &self.listings[id]
    }

    #[must_use]
    pub fn cards(&self) -> &[CardCandidates] {
        &self.cards
    }

    /// Buylist lines for which no listing was accepted.
    #[must_use]
    pub fn unfulfillable(&self) -> Vec<&BuylistCard> {
        self.cards
            .iter()
            .filter(|c| c.is_unfulfillable())
            .map(|c| &c.card)
            .collect()
    }

    /// Distinct sites referenced by any accepted listing.
    #[must_use]
    pub fn sites(&self) -> Vec<SiteId> {
        let sites: BTreeSet<&SiteId> = self
            .cards
            .iter()
            .flat_map(|c| c.listing_ids.iter().map(|&id| &self.listings[id].site_id))
            .collect();
        sites.into_iter().cloned().collect()
    }

    /// Mean number of accepted listings per buylist line.
    #[must_use]
    pub fn avg_listings_per_card(&self) -> f64 {
        if self.cards.is_empty() {
            return 0.0;
        }
        let total: usize = self.cards.iter().map(|c| c.listing_ids.len()).sum();
        total as f64 / self.cards.len() as f64
    }

    /// Problem size used by algorithm selection:
    /// distinct requested cards × mean listings per card.
    #[must_use]
    pub fn complexity(&self) -> f64 {
        self.cards.len() as f64 * self.avg_listings_per_card()
    }

    /// Total units requested across the buylist.
    #[must_use]
    pub fn requested_units(&self) -> u64 {
        self.cards.iter().map(|c| u64::from(c.card.quantity)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::card::Quality;
    use rust_decimal_macros::dec;

    fn pool() -> CandidatePool {
        let listings = vec![
            MarketplaceListing::try_new("a", "Opt", Quality::Nm, 4, dec!(0.25)).unwrap(),
            MarketplaceListing::try_new("b", "Opt", Quality::Lp, 4, dec!(0.20)).unwrap(),
        ];
        CandidatePool::new(
            listings,
            vec![
                CardCandidates {
                    card: BuylistCard::new("Opt", 4),
                    listing_ids: vec![1, 0],
                },
                CardCandidates {
                    card: BuylistCard::new("Ponder", 2),
                    listing_ids: vec![],
                },
            ],
        )
    }

    #[test]
    fn reports_unfulfillable_lines() {
        let pool = pool();
        let missing = pool.unfulfillable();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].name, "Ponder");
    }

    #[test]
    fn complexity_is_cards_times_mean_listings() {
        let pool = pool();
        assert!((pool.avg_listings_per_card() - 1.0).abs() < 1e-12);
        assert!((pool.complexity() - 2.0).abs() < 1e-12);
        assert_eq!(pool.requested_units(), 6);
        assert_eq!(pool.sites(), vec![SiteId::from("a"), SiteId::from("b")]);
    }
}
