use crate::auth::bearer_headers;
use crate::error::ApiError;
use async_trait::async_trait;
use configuration::UpstreamSettings;
use core_types::{PriceSeries, WindowMinutes};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use std::time::Duration;

mod auth;
pub mod error;
pub mod responses;
pub mod retry;
// --- Public API ---
pub use responses::ApiErrorResponse;
pub use retry::RetryPolicy;

/// The abstract interface to the upstream price-history provider.
/// This trait is the contract the aggregator uses, allowing the underlying
/// implementation (live or test double) to be swapped out.
#[async_trait]
pub trait PriceFetcher: Send + Sync {
    /// Fetches the price samples of `ticker` over the last `window` minutes,
    /// in the order the provider returns them.
    async fn fetch_series(
        &self,
        ticker: &str,
        window: Option<WindowMinutes>,
    ) -> Result<PriceSeries, ApiError>;

    /// Same request as `fetch_series`, with the body returned byte for byte.
    async fn fetch_raw(
        &self,
        ticker: &str,
        window: Option<WindowMinutes>,
    ) -> Result<Box<RawValue>, ApiError>;

    /// Fetches the provider's ticker catalog, byte for byte.
    async fn list_stocks(&self) -> Result<Box<RawValue>, ApiError>;
}

/// A concrete implementation of `PriceFetcher` over the provider's HTTP API.
#[derive(Clone)]
pub struct StockExchangeClient {
    client: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl StockExchangeClient {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, ApiError> {
        let base_url = Url::parse(settings.base_url.trim_end_matches('/')).map_err(|e| {
            ApiError::InvalidConfig(format!("invalid base url '{}': {}", settings.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidConfig(format!(
                "base url '{}' cannot carry a path",
                settings.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .default_headers(bearer_headers(&settings.token)?)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            retry: RetryPolicy::new(
                settings.max_retries,
                Duration::from_millis(settings.retry_backoff_ms),
            ),
        })
    }

    /// The base URL extended by `segments`, each percent-encoded as a single
    /// path segment.
    fn url_with_segments(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs, so this branch always runs.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// `{base}/stocks`
    fn catalog_url(&self) -> Url {
        self.url_with_segments(&["stocks"])
    }

    /// `{base}/stocks/{ticker}?minutes={window}`
    fn series_url(&self, ticker: &str, window: Option<WindowMinutes>) -> Url {
        let mut url = self.url_with_segments(&["stocks", ticker]);
        if let Some(window) = window {
            url.query_pairs_mut()
                .append_pair("minutes", &window.to_string());
        }
        url
    }

    async fn _get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, ApiError> {
        let mut retry = 0;
        loop {
            match self._get_once(url).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && retry < self.retry.max_retries => {
                    let delay = self.retry.delay_for(retry);
                    retry += 1;
                    tracing::warn!(
                        error = %e,
                        path = url.path(),
                        retry,
                        delay_ms = delay.as_millis() as u64,
                        "Upstream request failed, retrying."
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn _get_once<T: DeserializeOwned>(&self, url: &Url) -> Result<T, ApiError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str::<T>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
        } else {
            // Prefer the provider's own message; fall back to the raw body.
            let message = serde_json::from_str::<ApiErrorResponse>(&text)
                .map(|body| body.error)
                .unwrap_or(text);
            Err(ApiError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl PriceFetcher for StockExchangeClient {
    async fn fetch_series(
        &self,
        ticker: &str,
        window: Option<WindowMinutes>,
    ) -> Result<PriceSeries, ApiError> {
        let url = self.series_url(ticker, window);
        let series: PriceSeries = self._get_json(&url).await?;
        tracing::debug!(ticker, points = series.len(), "Fetched price series.");
        Ok(series)
    }

    async fn fetch_raw(
        &self,
        ticker: &str,
        window: Option<WindowMinutes>,
    ) -> Result<Box<RawValue>, ApiError> {
        let url = self.series_url(ticker, window);
        self._get_json(&url).await
    }

    async fn list_stocks(&self) -> Result<Box<RawValue>, ApiError> {
        let url = self.catalog_url();
        self._get_json(&url).await
    }
}
