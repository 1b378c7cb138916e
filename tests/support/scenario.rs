use buylist_optimizer::domain::{
    BuylistCard, CandidatePool, MarketplaceListing, ParseMethod, SiteDescriptor,
};
use buylist_optimizer::testkit::domain::{buylist, listing, pool, site};
use rust_decimal_macros::dec;

/// Four Lightning Bolts wanted; `cheap` sells four at $1.00, `pricey` four at $1.50.
pub fn lightning_bolt_buylist() -> Vec<BuylistCard> {
    buylist(&[("Lightning Bolt", 4)])
}

pub fn cheap_listings() -> Vec<MarketplaceListing> {
    vec![listing("cheap", "Lightning Bolt", 4, dec!(1.00))]
}

pub fn pricey_listings() -> Vec<MarketplaceListing> {
    vec![listing("pricey", "Lightning Bolt", 4, dec!(1.50))]
}

pub fn lightning_bolt_sites() -> Vec<SiteDescriptor> {
    vec![
        site("cheap", ParseMethod::Shopify),
        site("pricey", ParseMethod::Shopify),
    ]
}

pub fn lightning_bolt_pool() -> CandidatePool {
    let mut listings = cheap_listings();
    listings.extend(pricey_listings());
    pool(&lightning_bolt_buylist(), listings)
}
