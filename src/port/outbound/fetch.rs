//! Site fetch port.
//!
//! A [`SiteFetcher`] turns a site descriptor plus a buylist into the
//! listings that site currently offers. One implementation exists per parse
//! method; the orchestrator picks one by the site's declared method.

use async_trait::async_trait;

use crate::domain::{BuylistCard, MarketplaceListing, ParseMethod, SiteDescriptor};
use crate::error::ScanError;

/// Receiver for incremental fetch progress.
///
/// Fetchers call [`ProgressSink::report`] as they work through the buylist.
/// Reports are fire-and-forget; a sink never blocks the fetcher.
pub trait ProgressSink: Send + Sync {
    /// `processed` of `total` buylist lines have been looked up.
    fn report(&self, processed: u32, total: u32);
}

/// Sink that drops every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _processed: u32, _total: u32) {}
}

/// Fetch capability for one family of vendor sites.
#[async_trait]
pub trait SiteFetcher: Send + Sync {
    /// Return the fetcher name for logging.
    fn name(&self) -> &'static str;

    /// Parse methods this fetcher handles.
    fn methods(&self) -> &[ParseMethod];

    /// Look up the buylist on `site`.
    ///
    /// Returned listings need not be filtered against the buylist; the
    /// aggregator applies acceptance rules afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::SiteUnreachable`] when the site cannot be
    /// contacted and [`ScanError::ParseError`] when its response cannot be
    /// understood.
    async fn fetch(
        &self,
        site: &SiteDescriptor,
        buylist: &[BuylistCard],
        progress: &dyn ProgressSink,
    ) -> Result<Vec<MarketplaceListing>, ScanError>;
}
