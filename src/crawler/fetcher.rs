//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building HTTP clients with the configured user agent and timeout
//! - GET requests with bounded retries and exponential backoff
//! - The optional TTL response cache
//! - Cancellation of in-flight requests and backoff sleeps

use crate::config::{Config, HttpConfig};
use crate::storage::{CachedResponse, ResponseCache};
use crate::HarvestError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// File name of the response cache database inside the output directory
pub const CACHE_FILE_NAME: &str = "http_cache.sqlite";

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Response body
        body: String,
    },

    /// Non-success HTTP status after any retries
    HttpError {
        /// The HTTP status code
        status_code: u16,
        /// Body of the error response; empty if it could not be read
        body: String,
    },

    /// Network error (connection refused, timeout, etc.) after any retries
    NetworkError {
        /// Error description
        error: String,
    },

    /// The cancellation token fired before the fetch completed
    Cancelled,
}

/// Retry schedule for transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retries: u32,

    /// Base backoff; attempt `n` waits `backoff * 2^n`
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Delay before retrying after the given zero-based attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl From<&HttpConfig> for RetryPolicy {
    fn from(config: &HttpConfig) -> Self {
        Self {
            retries: config.retries,
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }
}

/// Returns true for statuses worth retrying (429 and 500/502/503/504)
pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use doc_harvest::config::HttpConfig;
/// use doc_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,*/*;q=0.8"),
    );

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// One request attempt: the result and whether it may be retried
struct Attempt {
    result: FetchResult,
    retryable: bool,
}

/// GET-only fetcher with retries, caching and cancellation
pub struct HttpFetcher {
    client: Client,
    retry: RetryPolicy,
    cache: Option<Arc<ResponseCache>>,
    cancel: CancellationToken,
}

impl HttpFetcher {
    /// Creates a fetcher from the HTTP configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Client and retry settings
    /// * `cache` - Response cache, if enabled
    /// * `cancel` - Token that aborts in-flight requests and backoff sleeps
    pub fn new(
        config: &HttpConfig,
        cache: Option<Arc<ResponseCache>>,
        cancel: CancellationToken,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            retry: RetryPolicy::from(config),
            cache,
            cancel,
        })
    }

    /// Creates a fetcher from the full configuration
    ///
    /// When `http.cache-ttl-secs` is set, the response cache is opened at
    /// `<output dir>/http_cache.sqlite` (creating the directory) and expired
    /// entries are purged.
    pub fn from_config(config: &Config, cancel: CancellationToken) -> Result<Self, HarvestError> {
        let cache = match config.http.cache_ttl_secs {
            Some(ttl) => {
                let dir = Path::new(&config.output.dir);
                std::fs::create_dir_all(dir)?;
                let cache = ResponseCache::open(&dir.join(CACHE_FILE_NAME), Duration::from_secs(ttl))?;
                let purged = cache.purge_expired()?;
                info!("Response cache enabled (ttl {}s, {} expired entries purged)", ttl, purged);
                Some(Arc::new(cache))
            }
            None => None,
        };

        Ok(Self::new(&config.http, cache, cancel)?)
    }

    /// The cancellation token observed by this fetcher
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Fetches a URL
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx | Success (stored in the cache when enabled) |
    /// | HTTP 429, 500, 502, 503, 504 | Retry with backoff |
    /// | Timeout, connection error | Retry with backoff |
    /// | Other HTTP status | Immediate `HttpError` carrying the body |
    /// | Other network error | Immediate `NetworkError` |
    pub async fn fetch(&self, url: &str) -> FetchResult {
        self.fetch_with_headers(url, HeaderMap::new()).await
    }

    /// Fetches a JSON API resource, with a bearer token when one is given
    pub async fn fetch_api(&self, url: &str, accept: &'static str, token: Option<&str>) -> FetchResult {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(accept));

        if let Some(token) = token {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(e) => warn!("Ignoring unusable API token: {}", e),
            }
        }

        self.fetch_with_headers(url, headers).await
    }

    async fn fetch_with_headers(&self, url: &str, headers: HeaderMap) -> FetchResult {
        if self.cancel.is_cancelled() {
            return FetchResult::Cancelled;
        }

        if let Some(hit) = self.cached(url) {
            return hit;
        }

        let mut attempt = 0;
        loop {
            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => return FetchResult::Cancelled,
                outcome = self.send_once(url, headers.clone()) => outcome,
            };

            if !outcome.retryable || attempt >= self.retry.retries {
                if let FetchResult::Success { final_url, status_code, body } = &outcome.result {
                    self.store(url, final_url, *status_code, body);
                }
                return outcome.result;
            }

            let delay = self.retry.delay_for(attempt);
            attempt += 1;
            warn!(
                "Transient failure fetching {} ({:?}), retry {}/{} in {:?}",
                url, outcome.result, attempt, self.retry.retries, delay
            );

            tokio::select! {
                _ = self.cancel.cancelled() => return FetchResult::Cancelled,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn send_once(&self, url: &str, headers: HeaderMap) -> Attempt {
        let response = match self.client.get(url).headers(headers).send().await {
            Ok(response) => response,
            Err(e) => {
                return Attempt {
                    retryable: e.is_timeout() || e.is_connect(),
                    result: FetchResult::NetworkError {
                        error: e.to_string(),
                    },
                };
            }
        };

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            let retryable = is_retryable_status(status);
            // Retryable responses are discarded unread
            let body = if retryable {
                String::new()
            } else {
                response.text().await.unwrap_or_default()
            };
            return Attempt {
                retryable,
                result: FetchResult::HttpError {
                    status_code: status.as_u16(),
                    body,
                },
            };
        }

        match response.text().await {
            Ok(body) => Attempt {
                retryable: false,
                result: FetchResult::Success {
                    final_url,
                    status_code: status.as_u16(),
                    body,
                },
            },
            Err(e) => Attempt {
                retryable: e.is_timeout(),
                result: FetchResult::NetworkError {
                    error: e.to_string(),
                },
            },
        }
    }

    fn cached(&self, url: &str) -> Option<FetchResult> {
        let cache = self.cache.as_ref()?;
        match cache.get(url) {
            Ok(Some(hit)) => {
                debug!("Cache hit for {}", url);
                Some(FetchResult::Success {
                    final_url: hit.final_url,
                    status_code: hit.status_code,
                    body: hit.body,
                })
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Response cache lookup failed for {}: {}", url, e);
                None
            }
        }
    }

    fn store(&self, url: &str, final_url: &str, status_code: u16, body: &str) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };

        let response = CachedResponse {
            final_url: final_url.to_string(),
            status_code,
            body: body.to_string(),
        };
        if let Err(e) = cache.put(url, &response) {
            warn!("Failed to cache response for {}: {}", url, e);
        }
    }
}
