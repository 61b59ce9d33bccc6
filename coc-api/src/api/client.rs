use std::sync::Arc;

use bytes::Bytes;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use nonzero_ext::nonzero;
use reqwest::StatusCode;
use serde::Serialize;

use crate::types::{CocApiError, CocApiResponse};

use super::metrics::RequestMetrics;

/// Official API entry point.
pub const DEFAULT_BASE_URL: &str = "https://api.clashofclans.com/v1";

/// Low level HTTP client shared by the typed endpoint wrappers.
///
/// Owns the bearer token, a client side rate limiter and the request
/// metrics. Endpoint wrappers build paths relative to `base_url`.
#[derive(Debug)]
pub struct ApiClientBase {
    pub client: reqwest::Client,
    pub limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    key: String,
    base_url: String,
    pub metrics: Arc<RequestMetrics>,
}

impl ApiClientBase {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Client pointed at a custom entry point, used by tests to target a
    /// local mock server.
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        // Developer keys allow far more, the sequential pollers never get
        // close. This only guards against command bursts.
        let q = Quota::per_second(nonzero!(10u32)).allow_burst(nonzero!(10u32));

        Self {
            client: reqwest::Client::new(),
            limiter: RateLimiter::direct(q),
            key: api_key,
            base_url,
            metrics: RequestMetrics::new("coc"),
        }
    }

    /// Whether a non empty API token was provided at construction.
    pub fn has_key(&self) -> bool {
        !self.key.trim().is_empty()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Perform a GET request and return the raw body on HTTP 200.
    pub async fn request(&self, path: String) -> CocApiResponse<Bytes> {
        self.limiter.until_ready().await;
        self.metrics.inc();

        let res = self
            .client
            .get(self.url(&path))
            .bearer_auth(&self.key)
            .send()
            .await
            .inspect_err(|_| self.metrics.inc_failure())
            .map_err(CocApiError::Reqwest)?;

        match res.status() {
            StatusCode::OK => res.bytes().await.map_err(CocApiError::Reqwest),
            status => {
                self.metrics.inc_failure();
                Err(CocApiError::Status(status))
            }
        }
    }

    /// Perform a POST request with a JSON body and return the raw response
    /// body on HTTP 200.
    pub async fn post_json<B: Serialize + Sync>(
        &self,
        path: String,
        body: &B,
    ) -> CocApiResponse<Bytes> {
        self.limiter.until_ready().await;
        self.metrics.inc();

        let res = self
            .client
            .post(self.url(&path))
            .bearer_auth(&self.key)
            .json(body)
            .send()
            .await
            .inspect_err(|_| self.metrics.inc_failure())
            .map_err(CocApiError::Reqwest)?;

        match res.status() {
            StatusCode::OK => res.bytes().await.map_err(CocApiError::Reqwest),
            status => {
                self.metrics.inc_failure();
                Err(CocApiError::Status(status))
            }
        }
    }
}
