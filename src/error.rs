//! Error taxonomy for the crawl pipeline.
//!
//! - [`ConfigError`]: rejected before any network activity (fatal)
//! - [`FetchError`]: one HTTP request failed (recoverable, skip the unit)
//! - [`ExtractionError`]: a page had no article text (recoverable)
//! - [`CrawlError`]: what [`crate::crawler::Crawler::crawl`] can return
//!
//! Recoverable failures never leave the crawler as errors; they are
//! collected as [`CrawlWarning`]s next to the results.

use std::error::Error as _;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("at least one non-empty tag is required")]
    EmptyTags,
    #[error("max articles per site must be between {min} and {max}, got {value}")]
    InvalidBudget { value: usize, min: usize, max: usize },
    #[error("invalid site `{name}`: {reason}")]
    InvalidSite { name: String, reason: String },
    #[error("no sites configured")]
    NoSites,
    #[error("invalid setting `{field}`: {reason}")]
    InvalidSetting { field: &'static str, reason: String },
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Why a single HTTP request failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("unexpected HTTP status {code}")]
    HttpStatus { code: u16 },
    #[error("TLS failure: {0}")]
    Tls(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    /// Map a client error onto the fetch taxonomy.
    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return FetchError::Timeout;
        }
        if let Some(status) = err.status() {
            return FetchError::HttpStatus {
                code: status.as_u16(),
            };
        }
        let chain = error_chain(err);
        if err.is_builder() {
            return FetchError::InvalidRequest(chain);
        }
        // The top-level message embeds the request URL, so only the
        // underlying causes are inspected.
        let causes = source_chain(err);
        if !has_socket_failure(err) && looks_like_tls(&causes) {
            return FetchError::Tls(chain);
        }
        FetchError::ConnectionFailed(chain)
    }

    /// Whether a second attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::ConnectionFailed(_) => true,
            FetchError::HttpStatus { code } => *code >= 500 || *code == 429,
            FetchError::Tls(_) | FetchError::InvalidRequest(_) => false,
        }
    }
}

/// Flatten an error and its sources into one line.
fn error_chain(err: &reqwest::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        source = inner.source();
    }
    out
}

/// Sources below the top-level error, joined into one line.
fn source_chain(err: &reqwest::Error) -> String {
    let mut out = Vec::new();
    let mut source = err.source();
    while let Some(inner) = source {
        out.push(inner.to_string());
        source = inner.source();
    }
    out.join(": ")
}

/// An I/O error in the chain that means the socket itself failed.
fn has_socket_failure(err: &reqwest::Error) -> bool {
    use std::io::ErrorKind;

    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                ErrorKind::ConnectionRefused
                    | ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::NotConnected
                    | ErrorKind::AddrNotAvailable
                    | ErrorKind::HostUnreachable
                    | ErrorKind::NetworkUnreachable
            ) {
                return true;
            }
        }
        source = inner.source();
    }
    false
}

fn looks_like_tls(chain: &str) -> bool {
    let lower = chain.to_ascii_lowercase();
    ["certificate", "tls", "ssl", "handshake"]
        .iter()
        .any(|needle| lower.contains(needle))
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// No paragraph-level text anywhere in the document.
    #[error("document has no paragraph text")]
    EmptyBody,
}

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("crawl cancelled")]
    Cancelled,
}

/// What went wrong for a [`CrawlWarning`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// The site's front page could not be fetched; the site was skipped.
    FrontPage(FetchError),
    /// An article candidate could not be fetched.
    Fetch(FetchError),
    /// An article candidate had no extractable text.
    Extraction(ExtractionError),
}

/// A recoverable failure reported alongside crawl results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlWarning {
    pub site: String,
    pub url: Url,
    pub kind: WarningKind,
}

impl std::fmt::Display for CrawlWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            WarningKind::FrontPage(e) => {
                write!(f, "[{}] front page {} skipped: {}", self.site, self.url, e)
            }
            WarningKind::Fetch(e) => write!(f, "[{}] fetch {} failed: {}", self.site, self.url, e),
            WarningKind::Extraction(e) => {
                write!(f, "[{}] extract {} failed: {}", self.site, self.url, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::Timeout.is_transient());
        assert!(FetchError::ConnectionFailed("reset".into()).is_transient());
        assert!(FetchError::HttpStatus { code: 503 }.is_transient());
        assert!(FetchError::HttpStatus { code: 429 }.is_transient());
        assert!(!FetchError::HttpStatus { code: 404 }.is_transient());
        assert!(!FetchError::Tls("bad certificate".into()).is_transient());
    }

    #[test]
    fn test_tls_detection() {
        assert!(looks_like_tls("error trying to connect: invalid peer certificate"));
        assert!(looks_like_tls("TLS handshake eof"));
        assert!(!looks_like_tls("connection refused"));
    }

    #[test]
    fn test_warning_display() {
        let warning = CrawlWarning {
            site: "Test".to_string(),
            url: Url::parse("http://a.example/").unwrap(),
            kind: WarningKind::FrontPage(FetchError::HttpStatus { code: 503 }),
        };
        assert_eq!(
            warning.to_string(),
            "[Test] front page http://a.example/ skipped: unexpected HTTP status 503"
        );
    }

    #[test]
    fn test_budget_error_message() {
        let err = ConfigError::InvalidBudget {
            value: 0,
            min: 1,
            max: 50,
        };
        assert_eq!(
            err.to_string(),
            "max articles per site must be between 1 and 50, got 0"
        );
    }
}
