use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::ParseMethod;
use crate::port::SiteFetcher;

use super::client::FetchClient;
use super::json_feed::JsonFeedFetcher;
use super::settings::HttpConfig;
use super::shopify::ShopifyFetcher;

/// Fetchers keyed by the parse method they serve.
///
/// Use [`FetcherRegistry::builder`] to wire the built-in fetchers from
/// configuration.
#[derive(Default, Clone)]
pub struct FetcherRegistry {
    fetchers: HashMap<ParseMethod, Arc<dyn SiteFetcher>>,
}

impl FetcherRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn builder() -> FetcherRegistryBuilder {
        FetcherRegistryBuilder::default()
    }

    /// Register a fetcher for every method it declares.
    ///
    /// A later registration for the same method replaces the earlier one.
    pub fn register(&mut self, fetcher: Arc<dyn SiteFetcher>) {
        for method in fetcher.methods() {
            self.fetchers.insert(*method, Arc::clone(&fetcher));
        }
    }

    #[must_use]
    pub fn get(&self, method: ParseMethod) -> Option<Arc<dyn SiteFetcher>> {
        self.fetchers.get(&method).cloned()
    }

    /// Methods with a registered fetcher.
    #[must_use]
    pub fn methods(&self) -> Vec<ParseMethod> {
        let mut methods: Vec<_> = self.fetchers.keys().copied().collect();
        methods.sort_by_key(|m| m.as_str());
        methods
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fetchers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fetchers.is_empty()
    }
}

impl std::fmt::Debug for FetcherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetcherRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}

/// Builder for [`FetcherRegistry`].
///
/// # Example
///
/// ```ignore
/// let registry = FetcherRegistry::builder()
///     .http(config.http.clone())
///     .with_builtin()
///     .fetcher(Arc::new(MyCrystalScraper::new()))
///     .build();
/// ```
#[derive(Default)]
pub struct FetcherRegistryBuilder {
    http: HttpConfig,
    builtin: bool,
    extra: Vec<Arc<dyn SiteFetcher>>,
}

impl FetcherRegistryBuilder {
    #[must_use]
    pub fn http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Include the Shopify and JSON feed fetchers.
    #[must_use]
    pub fn with_builtin(mut self) -> Self {
        self.builtin = true;
        self
    }

    /// Add a custom fetcher. Custom fetchers override built-in ones.
    #[must_use]
    pub fn fetcher(mut self, fetcher: Arc<dyn SiteFetcher>) -> Self {
        self.extra.push(fetcher);
        self
    }

    #[must_use]
    pub fn build(self) -> FetcherRegistry {
        let mut registry = FetcherRegistry::new();
        if self.builtin {
            let client = FetchClient::from_config(&self.http);
            registry.register(Arc::new(ShopifyFetcher::new(
                client.clone(),
                self.http.shopify_max_pages,
            )));
            registry.register(Arc::new(JsonFeedFetcher::new(client)));
        }
        for fetcher in self.extra {
            registry.register(fetcher);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_shopify_f2f_and_other() {
        let registry = FetcherRegistry::builder().with_builtin().build();
        assert_eq!(
            registry.methods(),
            vec![ParseMethod::F2f, ParseMethod::Other, ParseMethod::Shopify]
        );
        assert!(registry.get(ParseMethod::Crystal).is_none());
        assert!(registry.get(ParseMethod::Scraper).is_none());
        assert_eq!(registry.get(ParseMethod::F2f).unwrap().name(), "json_feed");
    }

    #[test]
    fn empty_builder_yields_empty_registry() {
        assert!(FetcherRegistry::builder().build().is_empty());
    }
}
