//! Vendor-site fetch adapters.
//!
//! One [`SiteFetcher`](crate::port::SiteFetcher) per parse-method family,
//! all sharing a retrying [`FetchClient`]. `crystal` and `scraper` sites
//! need an externally registered fetcher.

mod client;
mod json_feed;
mod registry;
mod settings;
mod shopify;

pub use client::FetchClient;
pub use json_feed::JsonFeedFetcher;
pub use registry::{FetcherRegistry, FetcherRegistryBuilder};
pub use settings::HttpConfig;
pub use shopify::ShopifyFetcher;
