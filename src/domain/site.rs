//! Vendor site descriptors.
//!
//! Site metadata is owned by the site-management collaborator; the core only
//! reads it to decide which sites take part in a scan and which fetcher
//! handles them.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use super::error::DomainError;
use super::id::SiteId;

/// How a site's inventory is retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMethod {
    /// Crystal Commerce storefront.
    Crystal,
    /// Shopify storefront API.
    Shopify,
    /// Face to Face Games API.
    F2f,
    /// Generic HTML scraper.
    Scraper,
    /// Anything else.
    Other,
}

impl ParseMethod {
    /// Stable lowercase name used in config files and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Crystal => "crystal",
            Self::Shopify => "shopify",
            Self::F2f => "f2f",
            Self::Scraper => "scraper",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ParseMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Business classification of a site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SiteType {
    #[default]
    Primary,
    Extended,
    Marketplace,
    NoInventory,
    NotWorking,
}

/// Read-only description of a vendor site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteDescriptor {
    pub id: SiteId,
    pub name: String,
    pub url: String,
    #[serde(alias = "method")]
    pub parse_method: ParseMethod,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub country: String,
    #[serde(default, rename = "type", alias = "site_type")]
    pub site_type: SiteType,
}

const fn default_active() -> bool {
    true
}

impl SiteDescriptor {
    /// Create an active primary site.
    pub fn new(
        id: impl Into<SiteId>,
        name: impl Into<String>,
        url: impl Into<String>,
        parse_method: ParseMethod,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            parse_method,
            active: true,
            country: String::new(),
            site_type: SiteType::Primary,
        }
    }

    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    #[must_use]
    pub fn with_site_type(mut self, site_type: SiteType) -> Self {
        self.site_type = site_type;
        self
    }

    /// Returns `true` if the site should take part in scans.
    ///
    /// Inactive sites and sites flagged `NotWorking` are skipped.
    #[must_use]
    pub fn is_scannable(&self) -> bool {
        self.active && self.site_type != SiteType::NotWorking
    }

    /// Parse the site URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not an absolute http(s) URL.
    pub fn parsed_url(&self) -> Result<Url, DomainError> {
        let url = Url::parse(&self.url).map_err(|e| DomainError::InvalidUrl {
            site: self.id.to_string(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(DomainError::InvalidUrl {
                site: self.id.to_string(),
                reason: format!("unsupported scheme '{other}'"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteDescriptor {
        SiteDescriptor::new("s1", "Store One", "https://store.example", ParseMethod::Shopify)
    }

    #[test]
    fn scannable_requires_active_and_working() {
        assert!(site().is_scannable());
        assert!(!site().with_active(false).is_scannable());
        assert!(!site().with_site_type(SiteType::NotWorking).is_scannable());
        assert!(site().with_site_type(SiteType::NoInventory).is_scannable());
    }

    #[test]
    fn parsed_url_rejects_non_http() {
        assert!(site().parsed_url().is_ok());
        let mut ftp = site();
        ftp.url = "ftp://store.example".into();
        assert!(matches!(ftp.parsed_url(), Err(DomainError::InvalidUrl { .. })));
    }

    #[test]
    fn deserializes_from_settings_shape() {
        let json = r#"{
            "id": "f2f", "name": "F2F", "url": "https://f2f.example/api",
            "method": "f2f", "country": "CA", "type": "Marketplace"
        }"#;
        let site: SiteDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(site.parse_method, ParseMethod::F2f);
        assert_eq!(site.site_type, SiteType::Marketplace);
        assert!(site.active);
    }
}
