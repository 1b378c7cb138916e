//! Marketplace listings produced by site fetches.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::card::{normalize_name, Quality};
use super::error::DomainError;
use super::id::SiteId;

/// Language assumed when a vendor does not state one.
pub const DEFAULT_LANGUAGE: &str = "English";

/// One offer found on a vendor site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceListing {
    pub site_id: SiteId,
    pub card_name: String,
    #[serde(default, alias = "version")]
    pub edition: String,
    #[serde(default)]
    pub foil: bool,
    pub quality: Quality,
    #[serde(default = "default_language")]
    pub language: String,
    pub quantity: u32,
    pub price: Decimal,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl MarketplaceListing {
    /// Create a non-foil English listing.
    ///
    /// # Errors
    ///
    /// Returns an error if `price` is negative.
    pub fn try_new(
        site_id: impl Into<SiteId>,
        card_name: impl Into<String>,
        quality: Quality,
        quantity: u32,
        price: Decimal,
    ) -> Result<Self, DomainError> {
        if price < Decimal::ZERO {
            return Err(DomainError::NegativePrice { price });
        }
        Ok(Self {
            site_id: site_id.into(),
            card_name: card_name.into(),
            edition: String::new(),
            foil: false,
            quality,
            language: default_language(),
            quantity,
            price,
        })
    }

    #[must_use]
    pub fn with_edition(mut self, edition: impl Into<String>) -> Self {
        self.edition = edition.into();
        self
    }

    #[must_use]
    pub fn with_foil(mut self, foil: bool) -> Self {
        self.foil = foil;
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Normalized card name used for matching.
    #[must_use]
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.card_name)
    }

    /// Returns `true` if the listing can actually be bought.
    #[must_use]
    pub fn is_purchasable(&self) -> bool {
        self.quantity > 0 && self.price >= Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn try_new_rejects_negative_price() {
        let err = MarketplaceListing::try_new("s", "Opt", Quality::Nm, 1, dec!(-0.01)).unwrap_err();
        assert!(matches!(err, DomainError::NegativePrice { .. }));
    }

    #[test]
    fn defaults_language_when_missing() {
        let listing: MarketplaceListing = serde_json::from_str(
            r#"{"site_id":"s","card_name":"Opt","quality":"LP","quantity":2,"price":"0.25"}"#,
        )
        .unwrap();
        assert_eq!(listing.language, DEFAULT_LANGUAGE);
        assert_eq!(listing.price, dec!(0.25));
        assert!(!listing.foil);
    }

    #[test]
    fn zero_quantity_is_not_purchasable() {
        let listing = MarketplaceListing::try_new("s", "Opt", Quality::Nm, 0, dec!(1)).unwrap();
        assert!(!listing.is_purchasable());
    }
}
