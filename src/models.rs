//! Data models shared by every stage of the crawl pipeline.
//!
//! This module defines the records that flow from the fetcher to the
//! result aggregator:
//! - [`SiteSpec`]: A configured news site (name + front page URL)
//! - [`CandidateUrl`]: A link discovered on a front page
//! - [`RawDocument`]: A fetched HTTP response body
//! - [`ExtractedArticle`]: Normalized title/body text of one article
//! - [`MatchResult`]: An article together with the tags it matched
//! - [`ArticleRecord`]: The flat, serializable record handed to callers
//!
//! Crawl-scoped values ([`CandidateUrl`], [`RawDocument`]) are consumed once
//! and dropped; nothing here is persisted.

use crate::error::ConfigError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use url::Url;

/// Smallest accepted per-site article budget.
pub const MIN_ARTICLES_PER_SITE: usize = 1;
/// Largest accepted per-site article budget.
pub const MAX_ARTICLES_PER_SITE: usize = 50;

/// A news site to crawl, fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SiteSpec {
    /// Human readable source name, copied onto every article from this site.
    pub name: String,
    /// Front page URL; article links are discovered here.
    pub base_url: Url,
}

impl SiteSpec {
    /// Build a site from a name and a URL string.
    pub fn new(name: impl Into<String>, base_url: &str) -> Result<Self, ConfigError> {
        let name = name.into();
        let base_url = Url::parse(base_url).map_err(|e| ConfigError::InvalidSite {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        let site = Self { name, base_url };
        site.validate()?;
        Ok(site)
    }

    /// Reject nameless sites and non-HTTP front pages.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidSite {
                name: self.name.clone(),
                reason: "site name is empty".to_string(),
            });
        }
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidSite {
                name: self.name.clone(),
                reason: format!("unsupported scheme `{}`", self.base_url.scheme()),
            });
        }
        Ok(())
    }
}

/// A link found on a front page that may or may not be an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateUrl {
    /// Absolute URL with the fragment removed.
    pub url: Url,
}

impl CandidateUrl {
    /// Wrap an absolute URL, dropping any `#fragment`.
    pub fn new(mut url: Url) -> Self {
        url.set_fragment(None);
        Self { url }
    }

    /// De-duplication key: the normalized absolute URL string.
    pub fn key(&self) -> &str {
        self.url.as_str()
    }
}

/// A fetched HTTP response body.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Final URL of the response (after redirects).
    pub url: Url,
    /// HTTP status code; always 2xx for documents the fetcher returns.
    pub status_code: u16,
    /// Raw response body.
    pub body: Vec<u8>,
    /// When the response finished downloading.
    pub fetched_at: DateTime<Utc>,
}

impl RawDocument {
    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Normalized content of one article page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedArticle {
    pub title: String,
    /// Body text, never empty.
    pub text: String,
    /// Filled by an annotator; empty when none ran.
    pub keywords: Vec<String>,
    /// Name of the [`SiteSpec`] the article was found on.
    pub source_name: String,
    pub url: Url,
    pub publish_date: Option<NaiveDate>,
}

/// An article plus the query tags it contains.
///
/// Only constructed when at least one tag matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub article: ExtractedArticle,
    pub matched_tags: Vec<String>,
}

/// Maximum number of matched articles accepted from any single site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlBudget {
    max_articles_per_site: usize,
}

impl CrawlBudget {
    /// Validate and build a budget.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidBudget`] when the value is outside
    /// [`MIN_ARTICLES_PER_SITE`]..=[`MAX_ARTICLES_PER_SITE`].
    pub fn new(max_articles_per_site: usize) -> Result<Self, ConfigError> {
        if !(MIN_ARTICLES_PER_SITE..=MAX_ARTICLES_PER_SITE).contains(&max_articles_per_site) {
            return Err(ConfigError::InvalidBudget {
                value: max_articles_per_site,
                min: MIN_ARTICLES_PER_SITE,
                max: MAX_ARTICLES_PER_SITE,
            });
        }
        Ok(Self {
            max_articles_per_site,
        })
    }

    pub fn max_articles_per_site(&self) -> usize {
        self.max_articles_per_site
    }
}

/// Sites completed out of sites configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlProgress {
    pub completed: usize,
    pub total: usize,
}

impl CrawlProgress {
    /// Completed fraction in `0.0..=1.0`; an empty crawl counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Flat record handed to display/export collaborators.
///
/// Field names are the stable output schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub source: String,
    pub title: String,
    pub text: String,
    pub url: String,
    /// Comma-joined keywords, empty when no annotator ran.
    pub keywords: String,
    pub publish_date: Option<NaiveDate>,
    pub matched_tags: Vec<String>,
}

impl ArticleRecord {
    /// Flatten a match, optionally cutting `text` to `preview_len` characters.
    pub fn from_match(result: &MatchResult, preview_len: Option<usize>) -> Self {
        let article = &result.article;
        let text = match preview_len {
            Some(max) => crate::utils::truncate_chars(&article.text, max).into_owned(),
            None => article.text.clone(),
        };
        Self {
            source: article.source_name.clone(),
            title: article.title.clone(),
            text,
            url: article.url.to_string(),
            keywords: article.keywords.join(", "),
            publish_date: article.publish_date,
            matched_tags: result.matched_tags.clone(),
        }
    }
}
