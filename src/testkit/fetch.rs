//! Scripted site fetcher.
//!
//! [`ScriptedFetcher`] answers each site according to a [`Script`], so tests
//! can mix healthy, failing, slow and crashing sites in one scan.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{BuylistCard, MarketplaceListing, ParseMethod, SiteDescriptor, SiteId};
use crate::error::ScanError;
use crate::port::{ProgressSink, SiteFetcher};

/// How a scripted site responds.
#[derive(Debug, Clone)]
pub enum Script {
    /// Return these listings, reporting progress once per buylist line.
    Listings(Vec<MarketplaceListing>),
    /// Sleep this long per buylist line, reporting progress after each,
    /// then return these listings.
    Slow(Duration, Vec<MarketplaceListing>),
    /// Fail with this error.
    Fail(ScanError),
    /// Never return.
    Hang,
    /// Panic inside the fetch.
    Panic,
}

/// Fetcher with per-site scripted responses. Unscripted sites return nothing.
pub struct ScriptedFetcher {
    methods: Vec<ParseMethod>,
    scripts: HashMap<SiteId, Script>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedFetcher {
    pub fn new(method: ParseMethod) -> Self {
        Self {
            methods: vec![method],
            scripts: HashMap::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Script the response of `site`.
    pub fn site(mut self, site: &str, script: Script) -> Self {
        self.scripts.insert(SiteId::from(site), script);
        self
    }

    /// Shared counter of `fetch` calls.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl SiteFetcher for ScriptedFetcher {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn methods(&self) -> &[ParseMethod] {
        &self.methods
    }

    async fn fetch(
        &self,
        site: &SiteDescriptor,
        buylist: &[BuylistCard],
        progress: &dyn ProgressSink,
    ) -> Result<Vec<MarketplaceListing>, ScanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let total = u32::try_from(buylist.len()).unwrap_or(u32::MAX);
        let script = self
            .scripts
            .get(&site.id)
            .cloned()
            .unwrap_or(Script::Listings(Vec::new()));

        match script {
            Script::Listings(listings) => {
                for processed in 1..=total {
                    progress.report(processed, total);
                }
                Ok(listings)
            }
            Script::Slow(delay, listings) => {
                for processed in 1..=total.max(1) {
                    tokio::time::sleep(delay).await;
                    progress.report(processed.min(total), total);
                }
                Ok(listings)
            }
            Script::Fail(error) => Err(error),
            Script::Hang => {
                std::future::pending::<()>().await;
                Ok(Vec::new())
            }
            Script::Panic => panic!("scripted fetcher panic for {}", site.id),
        }
    }
}
