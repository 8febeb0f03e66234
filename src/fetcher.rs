//! HTTP fetching with a mandatory timeout and optional retry decorator.
//!
//! # Architecture
//!
//! - [`PageFetcher`]: Core trait, one GET in and a [`RawDocument`] out
//! - [`HttpFetcher`]: `reqwest` implementation that always sends an
//!   identification header and never waits longer than its timeout
//! - [`RetryFetch`]: Decorator that adds backoff retries to any
//!   [`PageFetcher`]; the crawler owns the retry policy, so the fetcher
//!   itself performs exactly one attempt
//!
//! # Retry Strategy
//!
//! Only transient failures (timeouts, connection errors, 5xx/429) are
//! retried. The delay between attempts follows:
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
//! ```

use crate::error::{ConfigError, FetchError};
use crate::models::RawDocument;
use chrono::Utc;
use rand::{Rng, rng};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};
use url::Url;

/// Desktop browser identity; several news sites answer default client
/// identities with 403s.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Something that can GET a URL.
pub trait PageFetcher {
    /// Fetch `url` once, returning the body of a 2xx response.
    async fn fetch(&self, url: &Url) -> Result<RawDocument, FetchError>;
}

/// Settings for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Upper bound for connect + response + body download.
    pub timeout: Duration,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Extra headers sent with every request.
    pub headers: Vec<(String, String)>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: Vec::new(),
        }
    }
}

/// [`PageFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Build the client.
    ///
    /// The client sends `config.user_agent` plus browser-style `Accept`
    /// headers and any extra `config.headers` on every request, and follows
    /// up to 10 redirects.
    ///
    /// # Arguments
    ///
    /// * `config` - Timeout, user agent and extra headers
    ///
    /// # Returns
    ///
    /// A fetcher whose every request is bounded by `config.timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] for a zero timeout, an empty
    /// user agent, or a header that is not valid HTTP.
    pub fn new(config: &FetcherConfig) -> Result<Self, ConfigError> {
        if config.timeout.is_zero() {
            return Err(ConfigError::InvalidSetting {
                field: "timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        if config.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                field: "user_agent",
                reason: "must not be empty".to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(USER_AGENT, header_value("user_agent", &config.user_agent)?);
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ConfigError::InvalidSetting {
                    field: "headers",
                    reason: format!("{name}: {e}"),
                }
            })?;
            headers.insert(name, header_value("headers", value)?);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| ConfigError::InvalidSetting {
                field: "http_client",
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }
}

fn header_value(field: &'static str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidSetting {
        field,
        reason: e.to_string(),
    })
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url) -> Result<RawDocument, FetchError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchError::classify(&e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "Non-success status");
            return Err(FetchError::HttpStatus {
                code: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::classify(&e))?;

        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(RawDocument {
            url: final_url,
            status_code: status.as_u16(),
            body: body.to_vec(),
            fetched_at: Utc::now(),
        })
    }
}

/// Wrapper that retries transient failures of an inner [`PageFetcher`].
///
/// With `max_retries == 0` it performs a single attempt, which is the
/// default crawl policy.
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetryFetch<T>
where
    T: PageFetcher,
{
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }

    /// Backoff before retry number `attempt` (1-based), without jitter.
    fn backoff(&self, attempt: usize) -> Duration {
        let shift = (attempt.saturating_sub(1)).min(16) as u32;
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> PageFetcher for RetryFetch<T>
where
    T: PageFetcher,
{
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url) -> Result<RawDocument, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch(url).await {
                Ok(doc) => return Ok(doc),
                Err(e) => {
                    attempt += 1;
                    if !e.is_transient() || attempt > self.max_retries {
                        if self.max_retries > 0 {
                            error!(
                                attempt,
                                max = self.max_retries,
                                elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                                error = %e,
                                "fetch() giving up"
                            );
                        }
                        return Err(e);
                    }

                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = self.backoff(attempt) + Duration::from_millis(jitter_ms);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        ?delay,
                        error = %e,
                        "fetch() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
