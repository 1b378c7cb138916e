//! Listing aggregation.
//!
//! Merges per-site listings into a [`CandidatePool`]: for each buylist line,
//! the listings that satisfy its acceptance rule. Lines with no acceptable
//! listing stay in the pool as unfulfillable.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use crate::domain::{
    normalize_name, BuylistCard, CandidatePool, CardCandidates, MarketplaceListing, SiteId,
};

/// Acceptance rule switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AcceptanceRules {
    /// Require the listing condition to equal the requested one instead of
    /// meeting or exceeding it.
    #[serde(default)]
    pub exact_quality: bool,
    /// Require the listing language to equal the requested one. When off,
    /// a requested language is ignored.
    #[serde(default = "default_exact_language")]
    pub exact_language: bool,
}

const fn default_exact_language() -> bool {
    true
}

impl Default for AcceptanceRules {
    fn default() -> Self {
        Self {
            exact_quality: false,
            exact_language: default_exact_language(),
        }
    }
}

impl AcceptanceRules {
    /// Returns `true` if `listing` may fill `card`. Names are compared
    /// after normalization by the caller.
    #[must_use]
    pub fn accepts(&self, card: &BuylistCard, listing: &MarketplaceListing) -> bool {
        if !listing.is_purchasable() {
            return false;
        }
        if let Some(edition) = card.edition.as_deref().filter(|e| !e.trim().is_empty()) {
            if normalize_name(edition) != normalize_name(&listing.edition) {
                return false;
            }
        }
        if card.foil.is_some_and(|foil| foil != listing.foil) {
            return false;
        }
        if let Some(quality) = card.quality {
            if !listing.quality.satisfies(quality, self.exact_quality) {
                return false;
            }
        }
        if self.exact_language {
            if let Some(language) = card.language.as_deref() {
                if !language.trim().eq_ignore_ascii_case(listing.language.trim()) {
                    return false;
                }
            }
        }
        true
    }
}

/// Builds candidate pools from scan output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListingAggregator {
    rules: AcceptanceRules,
}

impl ListingAggregator {
    #[must_use]
    pub const fn new(rules: AcceptanceRules) -> Self {
        Self { rules }
    }

    #[must_use]
    pub const fn rules(&self) -> AcceptanceRules {
        self.rules
    }

    /// Aggregate listings grouped by the site that produced them.
    ///
    /// Listings are re-tagged with the site they were fetched from.
    pub fn aggregate<I>(&self, buylist: &[BuylistCard], listings_by_site: I) -> CandidatePool
    where
        I: IntoIterator<Item = (SiteId, Vec<MarketplaceListing>)>,
    {
        let listings = listings_by_site.into_iter().flat_map(|(site, listings)| {
            listings.into_iter().map(move |mut l| {
                l.site_id = site.clone();
                l
            })
        });
        self.aggregate_flat(buylist, listings)
    }

    /// Aggregate an already flattened listing set.
    pub fn aggregate_flat<I>(&self, buylist: &[BuylistCard], listings: I) -> CandidatePool
    where
        I: IntoIterator<Item = MarketplaceListing>,
    {
        let wanted: Vec<String> = buylist.iter().map(BuylistCard::normalized_name).collect();

        // Keep only listings some line could use, indexed by normalized name.
        let mut kept: Vec<MarketplaceListing> = Vec::new();
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for listing in listings {
            let name = listing.normalized_name();
            if wanted.contains(&name) && listing.is_purchasable() {
                by_name.entry(name).or_default().push(kept.len());
                kept.push(listing);
            }
        }

        let cards = buylist
            .iter()
            .zip(&wanted)
            .map(|(card, name)| {
                let mut listing_ids: Vec<usize> = by_name
                    .get(name)
                    .map(|ids| {
                        ids.iter()
                            .copied()
                            .filter(|&id| self.rules.accepts(card, &kept[id]))
                            .collect()
                    })
                    .unwrap_or_default();
                listing_ids.sort_by(|&a, &b| {
                    kept[a]
                        .price
                        .cmp(&kept[b].price)
                        .then(kept[b].quality.cmp(&kept[a].quality))
                        .then(kept[a].site_id.cmp(&kept[b].site_id))
                });
                if listing_ids.is_empty() {
                    debug!(card = %card.name, "No acceptable listing");
                }
                CardCandidates {
                    card: card.clone(),
                    listing_ids,
                }
            })
            .collect();

        CandidatePool::new(kept, cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Quality;
    use rust_decimal_macros::dec;

    fn listing(site: &str, name: &str, quality: Quality, price: rust_decimal::Decimal) -> MarketplaceListing {
        MarketplaceListing::try_new(site, name, quality, 4, price).unwrap()
    }

    #[test]
    fn quality_meets_or_exceeds_request() {
        let card = BuylistCard::new("Opt", 1).with_quality(Quality::Lp);
        let rules = AcceptanceRules::default();

        assert!(rules.accepts(&card, &listing("a", "Opt", Quality::Nm, dec!(1))));
        assert!(rules.accepts(&card, &listing("a", "Opt", Quality::Lp, dec!(1))));
        assert!(!rules.accepts(&card, &listing("a", "Opt", Quality::Mp, dec!(1))));

        let exact = AcceptanceRules {
            exact_quality: true,
            ..AcceptanceRules::default()
        };
        assert!(!exact.accepts(&card, &listing("a", "Opt", Quality::Nm, dec!(1))));
    }

    #[test]
    fn foil_and_language_filters() {
        let card = BuylistCard::new("Opt", 1).with_foil(true).with_language("Japanese");
        let rules = AcceptanceRules::default();

        let plain = listing("a", "Opt", Quality::Nm, dec!(1));
        let foil_en = plain.clone().with_foil(true);
        let foil_jp = foil_en.clone().with_language("japanese");

        assert!(!rules.accepts(&card, &plain));
        assert!(!rules.accepts(&card, &foil_en));
        assert!(rules.accepts(&card, &foil_jp));

        let relaxed = AcceptanceRules {
            exact_language: false,
            ..AcceptanceRules::default()
        };
        assert!(relaxed.accepts(&card, &foil_en));
    }

    #[test]
    fn pool_is_keyed_by_normalized_name_cheapest_first() {
        let buylist = vec![BuylistCard::new("Lightning Bolt", 4), BuylistCard::new("Ponder", 1)];
        let by_site = vec![
            (
                SiteId::from("b"),
                vec![listing("ignored", "lightning  bolt", Quality::Nm, dec!(1.50))],
            ),
            (
                SiteId::from("a"),
                vec![
                    listing("a", "Lightning Bolt", Quality::Nm, dec!(1.00)),
                    listing("a", "Counterspell", Quality::Nm, dec!(0.10)),
                ],
            ),
        ];

        let pool = ListingAggregator::default().aggregate(&buylist, by_site);

        assert_eq!(pool.listings().len(), 2);
        let bolt = &pool.cards()[0];
        let prices: Vec<_> = bolt.listing_ids.iter().map(|&i| pool.listing(i).price).collect();
        assert_eq!(prices, vec![dec!(1.00), dec!(1.50)]);
        assert_eq!(pool.listing(bolt.listing_ids[1]).site_id, SiteId::from("b"));
        assert!(pool.cards()[1].is_unfulfillable());
    }

    #[test]
    fn sold_out_listings_are_dropped() {
        let buylist = vec![BuylistCard::new("Opt", 1)];
        let sold_out = MarketplaceListing::try_new("a", "Opt", Quality::Nm, 0, dec!(0.1)).unwrap();
        let pool = ListingAggregator::default().aggregate_flat(&buylist, vec![sold_out]);
        assert!(pool.cards()[0].is_unfulfillable());
    }
}
