//! Shopify storefront fetcher.
//!
//! Walks the public `/products.json` catalogue page by page and turns every
//! in-stock variant into a listing. Shopify card shops encode condition,
//! finish and language in the variant title, e.g.
//! `"Near Mint Foil / Japanese"`, and the printing in square brackets after
//! the product title, e.g. `"Lightning Bolt [Magic 2010]"`.

use std::collections::HashSet;
use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info};

use super::client::FetchClient;
use crate::domain::{
    normalize_name, BuylistCard, MarketplaceListing, ParseMethod, Quality, SiteDescriptor,
};
use crate::error::ScanError;
use crate::port::{ProgressSink, SiteFetcher};

const PAGE_SIZE: u32 = 250;

/// Languages recognised in variant titles.
const LANGUAGES: [&str; 11] = [
    "English",
    "Japanese",
    "German",
    "French",
    "Italian",
    "Spanish",
    "Portuguese",
    "Russian",
    "Korean",
    "Chinese Simplified",
    "Chinese Traditional",
];

#[derive(Debug, Deserialize)]
struct ProductsPage {
    #[serde(default)]
    products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
struct Product {
    title: String,
    #[serde(default)]
    variants: Vec<Variant>,
}

#[derive(Debug, Deserialize)]
struct Variant {
    #[serde(default)]
    title: String,
    price: String,
    #[serde(default)]
    available: bool,
    #[serde(default)]
    inventory_quantity: Option<i64>,
}

/// Condition, finish and language decoded from a variant title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VariantTraits {
    pub quality: Quality,
    pub foil: bool,
    pub language: Option<String>,
}

/// Decode a variant title. Unknown conditions default to NM, the Shopify
/// card-shop convention for single-variant products.
pub(crate) fn parse_variant_title(title: &str) -> VariantTraits {
    let mut traits = VariantTraits {
        quality: Quality::Nm,
        foil: false,
        language: None,
    };

    let title = title.replace(" - ", "/");
    for part in title.split(['/', ',']).map(str::trim) {
        if part.is_empty() {
            continue;
        }
        let lower = part.to_ascii_lowercase().replace('-', " ");
        let mut rest = lower.as_str();
        if let Some(stripped) = rest.strip_suffix(" foil") {
            traits.foil = true;
            rest = stripped;
        } else if rest == "foil" {
            traits.foil = true;
            continue;
        } else if rest == "non foil" || rest == "nonfoil" || rest == "normal" {
            continue;
        }
        if let Ok(quality) = Quality::from_str(rest) {
            traits.quality = quality;
        } else if let Some(lang) = LANGUAGES.iter().find(|l| l.eq_ignore_ascii_case(part)) {
            traits.language = Some((*lang).to_string());
        }
    }
    traits
}

/// Split `"Name [Edition]"` into name and edition.
pub(crate) fn split_product_title(title: &str) -> (&str, &str) {
    match (title.find('['), title.rfind(']')) {
        (Some(open), Some(close)) if open < close => {
            (title[..open].trim(), title[open + 1..close].trim())
        }
        _ => (title.trim(), ""),
    }
}

/// Fetcher for Shopify-hosted stores.
#[derive(Debug, Clone)]
pub struct ShopifyFetcher {
    client: FetchClient,
    max_pages: u32,
}

impl ShopifyFetcher {
    #[must_use]
    pub fn new(client: FetchClient, max_pages: u32) -> Self {
        Self {
            client,
            max_pages: max_pages.max(1),
        }
    }

    fn to_listings(
        site: &SiteDescriptor,
        product: Product,
        wanted: &HashSet<String>,
    ) -> Vec<MarketplaceListing> {
        let (name, edition) = split_product_title(&product.title);
        if !wanted.contains(&normalize_name(name)) {
            return Vec::new();
        }

        product
            .variants
            .into_iter()
            .filter(|v| v.available)
            .filter_map(|v| {
                let price = Decimal::from_str(v.price.trim()).ok()?;
                let quantity = match v.inventory_quantity {
                    Some(q) if q > 0 => u32::try_from(q).unwrap_or(u32::MAX),
                    Some(_) => return None,
                    None => 1,
                };
                let traits = parse_variant_title(&v.title);
                let listing =
                    MarketplaceListing::try_new(site.id.clone(), name, traits.quality, quantity, price)
                        .ok()?
                        .with_edition(edition)
                        .with_foil(traits.foil);
                Some(match traits.language {
                    Some(lang) => listing.with_language(lang),
                    None => listing,
                })
            })
            .collect()
    }
}

#[async_trait]
impl SiteFetcher for ShopifyFetcher {
    fn name(&self) -> &'static str {
        "shopify"
    }

    fn methods(&self) -> &[ParseMethod] {
        &[ParseMethod::Shopify]
    }

    async fn fetch(
        &self,
        site: &SiteDescriptor,
        buylist: &[BuylistCard],
        progress: &dyn ProgressSink,
    ) -> Result<Vec<MarketplaceListing>, ScanError> {
        let base = site
            .parsed_url()
            .map_err(|e| ScanError::SiteUnreachable(e.to_string()))?;
        let wanted: HashSet<String> = buylist.iter().map(BuylistCard::normalized_name).collect();
        let total = u32::try_from(buylist.len()).unwrap_or(u32::MAX);

        let mut listings = Vec::new();
        for page in 1..=self.max_pages {
            let mut url = base
                .join("products.json")
                .map_err(|e| ScanError::SiteUnreachable(e.to_string()))?;
            url.query_pairs_mut()
                .append_pair("limit", &PAGE_SIZE.to_string())
                .append_pair("page", &page.to_string());

            let body: ProductsPage = self.client.get_json(&url).await?;
            if body.products.is_empty() {
                break;
            }
            debug!(site_id = %site.id, page, products = body.products.len(), "Fetched Shopify page");
            for product in body.products {
                listings.extend(Self::to_listings(site, product, &wanted));
            }

            let processed = u64::from(page) * u64::from(total) / u64::from(self.max_pages);
            progress.report(u32::try_from(processed).unwrap_or(total), total);
        }
        progress.report(total, total);

        info!(site_id = %site.id, listings = listings.len(), "Shopify fetch complete");
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn variant_title_with_condition_foil_and_language() {
        let traits = parse_variant_title("Lightly Played Foil / Japanese");
        assert_eq!(traits.quality, Quality::Lp);
        assert!(traits.foil);
        assert_eq!(traits.language.as_deref(), Some("Japanese"));
    }

    #[test]
    fn default_title_is_near_mint_non_foil() {
        let traits = parse_variant_title("Default Title");
        assert_eq!(traits.quality, Quality::Nm);
        assert!(!traits.foil);
        assert_eq!(traits.language, None);
    }

    #[test]
    fn non_foil_is_not_foil() {
        let traits = parse_variant_title("Moderately Played - Non-Foil");
        assert_eq!(traits.quality, Quality::Mp);
        assert!(!traits.foil);
    }

    #[test]
    fn product_title_edition_in_brackets() {
        assert_eq!(
            split_product_title("Lightning Bolt [Magic 2010]"),
            ("Lightning Bolt", "Magic 2010")
        );
        assert_eq!(split_product_title("Counterspell"), ("Counterspell", ""));
    }

    #[test]
    fn only_wanted_available_variants_become_listings() {
        let site = SiteDescriptor::new("shop", "Shop", "https://shop.example", ParseMethod::Shopify);
        let product = Product {
            title: "Lightning Bolt [Magic 2010]".into(),
            variants: vec![
                Variant {
                    title: "Near Mint".into(),
                    price: "1.25".into(),
                    available: true,
                    inventory_quantity: Some(3),
                },
                Variant {
                    title: "Heavily Played".into(),
                    price: "0.50".into(),
                    available: false,
                    inventory_quantity: Some(0),
                },
            ],
        };
        let wanted: HashSet<String> = [normalize_name("lightning bolt")].into_iter().collect();

        let listings = ShopifyFetcher::to_listings(&site, product, &wanted);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].price, dec!(1.25));
        assert_eq!(listings[0].quantity, 3);
        assert_eq!(listings[0].edition, "Magic 2010");

        let other = Product {
            title: "Opt".into(),
            variants: vec![],
        };
        assert!(ShopifyFetcher::to_listings(&site, other, &wanted).is_empty());
    }
}
