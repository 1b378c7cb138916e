//! Generic JSON inventory feed fetcher.
//!
//! Used for `f2f` and `other` sites exposing a lookup endpoint of the form
//! `GET {url}?name=<card name>` that returns an array of rows:
//!
//! ```json
//! [{"name": "Lightning Bolt", "set": "M10", "condition": "NM",
//!   "foil": false, "language": "English", "quantity": 4, "price": "1.00"}]
//! ```

use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use super::client::FetchClient;
use crate::domain::{BuylistCard, MarketplaceListing, ParseMethod, Quality, SiteDescriptor};
use crate::error::ScanError;
use crate::port::{ProgressSink, SiteFetcher};

#[derive(Debug, Deserialize)]
pub(crate) struct FeedRow {
    name: String,
    #[serde(default, alias = "edition", alias = "version")]
    set: Option<String>,
    #[serde(default, alias = "quality")]
    condition: Option<String>,
    #[serde(default)]
    foil: bool,
    #[serde(default)]
    language: Option<String>,
    quantity: u32,
    price: Decimal,
}

impl FeedRow {
    fn into_listing(self, site: &SiteDescriptor) -> Result<MarketplaceListing, ScanError> {
        let quality = match self.condition.as_deref() {
            Some(raw) => Quality::from_str(raw).map_err(|e| ScanError::ParseError(e.to_string()))?,
            None => Quality::Nm,
        };
        let listing =
            MarketplaceListing::try_new(site.id.clone(), self.name, quality, self.quantity, self.price)
                .map_err(|e| ScanError::ParseError(e.to_string()))?
                .with_edition(self.set.unwrap_or_default())
                .with_foil(self.foil);
        Ok(match self.language {
            Some(lang) => listing.with_language(lang),
            None => listing,
        })
    }
}

/// Fetcher for sites with a per-card JSON lookup endpoint.
#[derive(Debug, Clone)]
pub struct JsonFeedFetcher {
    client: FetchClient,
}

impl JsonFeedFetcher {
    #[must_use]
    pub const fn new(client: FetchClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SiteFetcher for JsonFeedFetcher {
    fn name(&self) -> &'static str {
        "json_feed"
    }

    fn methods(&self) -> &[ParseMethod] {
        &[ParseMethod::F2f, ParseMethod::Other]
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
        let total = u32::try_from(buylist.len()).unwrap_or(u32::MAX);

        let mut listings = Vec::new();
        for (i, card) in buylist.iter().enumerate() {
            let mut url = base.clone();
            url.query_pairs_mut().append_pair("name", &card.name);

            let rows: Vec<FeedRow> = self.client.get_json(&url).await?;
            debug!(site_id = %site.id, card = %card.name, rows = rows.len(), "Fetched feed rows");
            for row in rows {
                match row.into_listing(site) {
                    Ok(listing) => listings.push(listing),
                    Err(err) => warn!(site_id = %site.id, error = %err, "Skipping feed row"),
                }
            }
            progress.report(u32::try_from(i + 1).unwrap_or(total), total);
        }
        Ok(listings)
    }
}
