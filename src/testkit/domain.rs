//! Builders for domain primitives used across tests.

use rust_decimal::Decimal;

use crate::domain::{
    BuylistCard, CandidatePool, CardCandidates, MarketplaceListing, ParseMethod, Quality,
    SiteDescriptor,
};

/// Active site `id` handled by `method`, at `https://{id}.test`.
pub fn site(id: &str, method: ParseMethod) -> SiteDescriptor {
    SiteDescriptor::new(id, format!("Site {id}"), format!("https://{id}.test"), method)
}

/// Near-mint English listing.
pub fn listing(site: &str, card: &str, quantity: u32, price: Decimal) -> MarketplaceListing {
    listing_with_quality(site, card, Quality::Nm, quantity, price)
}

pub fn listing_with_quality(
    site: &str,
    card: &str,
    quality: Quality,
    quantity: u32,
    price: Decimal,
) -> MarketplaceListing {
    match MarketplaceListing::try_new(site, card, quality, quantity, price) {
        Ok(listing) => listing,
        Err(e) => panic!("invalid test listing: {e}"),
    }
}

/// Buylist from `(name, quantity)` pairs.
pub fn buylist(lines: &[(&str, u32)]) -> Vec<BuylistCard> {
    lines
        .iter()
        .map(|&(name, quantity)| BuylistCard::new(name, quantity))
        .collect()
}

/// Pool where every line accepts every listing with the same card name,
/// cheapest first.
pub fn pool(cards: &[BuylistCard], listings: Vec<MarketplaceListing>) -> CandidatePool {
    let lines = cards
        .iter()
        .map(|card| {
            let name = card.normalized_name();
            let mut ids: Vec<usize> = listings
                .iter()
                .enumerate()
                .filter(|(_, l)| l.normalized_name() == name)
                .map(|(i, _)| i)
                .collect();
            ids.sort_by_key(|&i| listings[i].price);
            CardCandidates {
                card: card.clone(),
                listing_ids: ids,
            }
        })
        .collect();
    CandidatePool::new(listings, lines)
}

/// `cards` buylist lines of one unit each, every card on `sites` sites with
/// staggered prices. Complexity is `cards * sites`.
pub fn grid_pool(cards: usize, sites: usize) -> CandidatePool {
    let lines: Vec<BuylistCard> = (0..cards)
        .map(|c| BuylistCard::new(format!("card {c}"), 1))
        .collect();
    let mut listings = Vec::with_capacity(cards * sites);
    for c in 0..cards {
        for s in 0..sites {
            let cents = 100 + ((c * 7 + s * 13) % 50) as i64;
            listings.push(listing(
                &format!("site-{s}"),
                &format!("card {c}"),
                2,
                Decimal::new(cents, 2),
            ));
        }
    }
    pool(&lines, listings)
}
