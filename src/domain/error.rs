//! Domain validation errors for core domain types.
//!
//! This module defines errors that occur when domain invariants are violated.
//! These errors are returned by `try_new` constructors that validate inputs,
//! so malformed input is rejected before any scan or optimization work starts.
//!
//! # Examples
//!
//! ```
//! use buylist_optimizer::domain::error::DomainError;
//! use buylist_optimizer::domain::optimization::{Algorithm, OptimizationConfig};
//!
//! let result = OptimizationConfig::builder()
//!     .algorithm(Algorithm::Nsga2)
//!     .population_size(10)
//!     .build();
//!
//! assert!(matches!(result, Err(DomainError::OutOfRange { field: "population_size", .. })));
//! ```

use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// A numeric setting falls outside its allowed range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value, rendered for display.
        value: String,
        /// Inclusive lower bound.
        min: String,
        /// Inclusive upper bound.
        max: String,
    },

    /// The fallback algorithm cannot itself delegate to another algorithm.
    #[error("fallback algorithm must be milp, nsga2 or moead, got {0}")]
    InvalidFallback(String),

    /// Buylist entries must name a card.
    #[error("card name cannot be empty")]
    EmptyCardName,

    /// Buylist entries must request at least one copy.
    #[error("requested quantity for '{card}' must be positive")]
    ZeroQuantity {
        /// The card whose quantity was zero.
        card: String,
    },

    /// Site URLs must parse as absolute http(s) URLs.
    #[error("invalid url for site {site}: {reason}")]
    InvalidUrl {
        /// The site identifier.
        site: String,
        /// Why the URL was rejected.
        reason: String,
    },

    /// Listing prices must not be negative.
    #[error("listing price must be non-negative, got {price}")]
    NegativePrice {
        /// The rejected price.
        price: rust_decimal::Decimal,
    },

    /// A string could not be mapped to a known enum value.
    #[error("unknown {kind}: '{value}'")]
    UnknownVariant {
        /// The kind of value being parsed (e.g. "quality").
        kind: &'static str,
        /// The raw input.
        value: String,
    },
}

impl DomainError {
    /// Build an [`DomainError::OutOfRange`] from displayable bounds.
    pub fn out_of_range(
        field: &'static str,
        value: impl ToString,
        min: impl ToString,
        max: impl ToString,
    ) -> Self {
        Self::OutOfRange {
            field,
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }
}
