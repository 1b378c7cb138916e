//! Buylist cards and card condition tiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Card condition tier.
///
/// Ordered so that a better condition compares greater:
/// `Nm > Lp > Mp > Hp > Dmg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "DMG")]
    Dmg,
    #[serde(rename = "HP")]
    Hp,
    #[serde(rename = "MP")]
    Mp,
    #[serde(rename = "LP")]
    Lp,
    #[serde(rename = "NM")]
    Nm,
}

impl Quality {
    /// All tiers from best to worst.
    pub const ALL: [Self; 5] = [Self::Nm, Self::Lp, Self::Mp, Self::Hp, Self::Dmg];

    /// Weight used by the quality objective, in `(0, 1]`.
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::Nm => 1.0,
            Self::Lp => 0.8,
            Self::Mp => 0.6,
            Self::Hp => 0.4,
            Self::Dmg => 0.2,
        }
    }

    /// Short code as printed by most vendors.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Nm => "NM",
            Self::Lp => "LP",
            Self::Mp => "MP",
            Self::Hp => "HP",
            Self::Dmg => "DMG",
        }
    }

    /// Returns `true` if a listing in this condition is acceptable for a
    /// request asking for `requested`.
    #[must_use]
    pub fn satisfies(self, requested: Self, exact: bool) -> bool {
        if exact {
            self == requested
        } else {
            self >= requested
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Quality {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        let quality = match key.as_str() {
            "nm" | "near mint" | "mint" | "nm m" | "m" => Self::Nm,
            "lp" | "lightly played" | "slightly played" | "sp" | "excellent" | "ex" => Self::Lp,
            "mp" | "moderately played" | "played" | "pl" => Self::Mp,
            "hp" | "heavily played" => Self::Hp,
            "dmg" | "damaged" | "poor" | "po" => Self::Dmg,
            _ => {
                return Err(DomainError::UnknownVariant {
                    kind: "quality",
                    value: s.to_string(),
                })
            }
        };
        Ok(quality)
    }
}

/// One requested line of a buylist.
///
/// `None` for edition, foil, quality or language means "any".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuylistCard {
    pub name: String,
    #[serde(default, alias = "version", skip_serializing_if = "Option::is_none")]
    pub edition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foil: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<Quality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

/// Most copies a single buylist line may request.
///
/// Heuristic genomes carry one gene per requested copy.
pub const MAX_QUANTITY: u32 = 10_000;

const fn default_quantity() -> u32 {
    1
}

impl BuylistCard {
    /// Create a request for `quantity` copies of any printing of `name`.
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            edition: None,
            foil: None,
            quality: None,
            language: None,
            quantity,
        }
    }

    #[must_use]
    pub fn with_edition(mut self, edition: impl Into<String>) -> Self {
        self.edition = Some(edition.into());
        self
    }

    #[must_use]
    pub fn with_foil(mut self, foil: bool) -> Self {
        self.foil = Some(foil);
        self
    }

    #[must_use]
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = Some(quality);
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Check the invariants of a buylist line.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the quantity is zero or
    /// above [`MAX_QUANTITY`].
    pub fn validate(&self) -> Result<(), DomainError> {
        if normalize_name(&self.name).is_empty() {
            return Err(DomainError::EmptyCardName);
        }
        if self.quantity == 0 {
            return Err(DomainError::ZeroQuantity {
                card: self.name.clone(),
            });
        }
        if self.quantity > MAX_QUANTITY {
            return Err(DomainError::out_of_range(
                "quantity",
                self.quantity,
                1,
                MAX_QUANTITY,
            ));
        }
        Ok(())
    }

    /// Normalized card name used for matching listings.
    #[must_use]
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Validate every line of a buylist.
///
/// # Errors
///
/// Returns the first violated invariant.
pub fn validate_buylist(cards: &[BuylistCard]) -> Result<(), DomainError> {
    cards.iter().try_for_each(BuylistCard::validate)
}

/// Normalize a card name for comparison.
///
/// Lowercases, drops punctuation and collapses whitespace, so
/// `"Fire // Ice"` and `"fire ice"` compare equal.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .flat_map(char::to_lowercase)
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_orders_best_first() {
        assert!(Quality::Nm > Quality::Lp);
        assert!(Quality::Lp > Quality::Mp);
        assert!(Quality::Mp > Quality::Hp);
        assert!(Quality::Hp > Quality::Dmg);
    }

    #[test]
    fn quality_weight_degrades_monotonically() {
        let weights: Vec<f64> = Quality::ALL.iter().map(|q| q.weight()).collect();
        assert!(weights.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn quality_satisfies_meet_or_exceed() {
        assert!(Quality::Nm.satisfies(Quality::Lp, false));
        assert!(Quality::Lp.satisfies(Quality::Lp, false));
        assert!(!Quality::Mp.satisfies(Quality::Lp, false));
        assert!(!Quality::Nm.satisfies(Quality::Lp, true));
    }

    #[test]
    fn quality_parses_vendor_spellings() {
        assert_eq!("Near Mint".parse::<Quality>().unwrap(), Quality::Nm);
        assert_eq!("lightly-played".parse::<Quality>().unwrap(), Quality::Lp);
        assert_eq!("HP".parse::<Quality>().unwrap(), Quality::Hp);
        assert!("shiny".parse::<Quality>().is_err());
    }

    #[test]
    fn quality_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Quality::Dmg).unwrap(), "\"DMG\"");
    }

    #[test]
    fn normalize_name_ignores_case_and_punctuation() {
        assert_eq!(normalize_name("  Fire // Ice "), "fire ice");
        assert_eq!(normalize_name("Jace, the Mind Sculptor"), "jace the mind sculptor");
        assert_eq!(normalize_name("Æther Vial"), "æther vial");
    }

    #[test]
    fn buylist_card_deserializes_with_defaults() {
        let card: BuylistCard =
            serde_json::from_str(r#"{"name":"Lightning Bolt","quantity":4}"#).unwrap();
        assert_eq!(card, BuylistCard::new("Lightning Bolt", 4));
    }

    #[test]
    fn buylist_card_validation() {
        assert!(BuylistCard::new("Opt", 1).validate().is_ok());
        assert_eq!(
            BuylistCard::new(" ,", 1).validate(),
            Err(DomainError::EmptyCardName)
        );
        assert!(matches!(
            BuylistCard::new("Opt", 0).validate(),
            Err(DomainError::ZeroQuantity { .. })
        ));
    }

    #[test]
    fn buylist_card_quantity_is_capped() {
        assert!(BuylistCard::new("Opt", MAX_QUANTITY).validate().is_ok());
        assert!(matches!(
            BuylistCard::new("Opt", MAX_QUANTITY + 1).validate(),
            Err(DomainError::OutOfRange {
                field: "quantity",
                ..
            })
        ));
        assert!(matches!(
            validate_buylist(&[BuylistCard::new("Opt", 1), BuylistCard::new("Bolt", u32::MAX)]),
            Err(DomainError::OutOfRange { .. })
        ));
    }
}
