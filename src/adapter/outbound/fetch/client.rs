//! Retrying JSON client shared by the vendor-site fetchers.

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use super::settings::HttpConfig;
use crate::error::ScanError;

/// HTTP client with bounded retries on transient failures.
///
/// Connection errors and timeouts are retried; HTTP error statuses and
/// malformed bodies are not.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: HttpClient,
    retry_max_attempts: u32,
    retry_backoff_ms: u64,
}

impl FetchClient {
    #[must_use]
    pub fn from_config(config: &HttpConfig) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        Self {
            http,
            retry_max_attempts: config.retry_max_attempts,
            retry_backoff_ms: config.retry_backoff_ms,
        }
    }

    /// GET `url` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// [`ScanError::SiteUnreachable`] for transport failures and error
    /// statuses, [`ScanError::ParseError`] for bodies that do not decode.
    pub async fn get_json<T>(&self, url: &Url) -> Result<T, ScanError>
    where
        T: DeserializeOwned,
    {
        let mut attempt = 0;
        let max_attempts = self.retry_max_attempts.max(1);

        loop {
            attempt += 1;
            debug!(url = %url, attempt, "GET");
            let response = match self.http.get(url.clone()).send().await {
                Ok(response) => response,
                Err(err) => {
                    if attempt >= max_attempts || !Self::should_retry(&err) {
                        return Err(ScanError::SiteUnreachable(err.to_string()));
                    }
                    self.backoff(attempt, max_attempts, &err).await;
                    continue;
                }
            };

            let response = response
                .error_for_status()
                .map_err(|err| ScanError::SiteUnreachable(err.to_string()))?;

            match response.json::<T>().await {
                Ok(parsed) => return Ok(parsed),
                Err(err) => {
                    if attempt >= max_attempts || !Self::should_retry(&err) {
                        return Err(ScanError::ParseError(err.to_string()));
                    }
                    self.backoff(attempt, max_attempts, &err).await;
                }
            }
        }
    }

    fn should_retry(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect()
    }

    async fn backoff(&self, attempt: u32, max_attempts: u32, err: &reqwest::Error) {
        warn!(
            attempt,
            max_attempts,
            error = %err,
            "Vendor request failed, retrying"
        );
        if self.retry_backoff_ms > 0 {
            sleep(Duration::from_millis(self.retry_backoff_ms)).await;
        }
    }
}
