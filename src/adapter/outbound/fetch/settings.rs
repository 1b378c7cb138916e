//! Vendor-site HTTP client configuration.

use serde::Deserialize;

/// HTTP settings shared by every fetcher.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_http_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Maximum number of attempts for transient failures.
    #[serde(default = "default_http_retry_max_attempts")]
    pub retry_max_attempts: u32,
    /// Backoff between retries in milliseconds.
    #[serde(default = "default_http_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// User-Agent header sent to vendor sites.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Upper bound on `/products.json` pages walked per Shopify site.
    #[serde(default = "default_shopify_max_pages")]
    pub shopify_max_pages: u32,
}

const fn default_http_timeout_ms() -> u64 {
    10_000
}

const fn default_http_connect_timeout_ms() -> u64 {
    3000
}

const fn default_http_retry_max_attempts() -> u32 {
    3
}

const fn default_http_retry_backoff_ms() -> u64 {
    500
}

fn default_user_agent() -> String {
    concat!("buylist-optimizer/", env!("CARGO_PKG_VERSION")).to_string()
}

const fn default_shopify_max_pages() -> u32 {
    20
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_http_timeout_ms(),
            connect_timeout_ms: default_http_connect_timeout_ms(),
            retry_max_attempts: default_http_retry_max_attempts(),
            retry_backoff_ms: default_http_retry_backoff_ms(),
            user_agent: default_user_agent(),
            shopify_max_pages: default_shopify_max_pages(),
        }
    }
}
