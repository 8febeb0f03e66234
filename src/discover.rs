//! Front page link discovery.
//!
//! Turns an already-fetched front page into an ordered list of article
//! candidates. No network I/O happens here.
//!
//! # Filtering
//!
//! A link is dropped when it:
//! - is not `http`/`https` after resolution (`mailto:`, `javascript:`, ...)
//! - ends in a non-article file extension (images, documents, archives, media)
//! - has a path segment naming a non-article section (video, gallery, tag, ...)
//! - points back at the front page itself
//! - leaves the site, when same-host filtering is on
//!
//! Survivors keep document order, so links that appear earlier on the
//! front page are consumed first by the per-site budget.

use crate::models::CandidateUrl;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{debug, instrument};
use url::Url;

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("static selector"));

const NON_ARTICLE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".bmp", ".ico", ".tif", ".tiff", ".pdf",
    ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".csv", ".txt", ".zip", ".tar", ".gz",
    ".tgz", ".bz2", ".7z", ".rar", ".mp3", ".wav", ".ogg", ".mp4", ".avi", ".mov", ".webm",
    ".m3u8", ".css", ".js", ".json", ".xml", ".rss", ".exe", ".dmg", ".apk",
];

const NON_ARTICLE_SEGMENTS: &[&str] = &[
    "video",
    "videos",
    "audio",
    "podcast",
    "podcasts",
    "gallery",
    "galleries",
    "photos",
    "pictures",
    "in-pictures",
    "tag",
    "tags",
    "topic",
    "topics",
    "category",
    "categories",
    "live",
    "author",
    "authors",
];

/// Link discovery options.
#[derive(Debug, Clone, Copy)]
pub struct DiscoverOptions {
    /// Drop links whose host is unrelated to the front page host.
    pub same_host_only: bool,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            same_host_only: true,
        }
    }
}

/// Extract article candidates from a front page.
///
/// Relative references are resolved against `base_url`. The result holds
/// no two candidates with the same [`CandidateUrl::key`].
#[instrument(level = "debug", skip_all, fields(%base_url))]
pub fn discover(html: &str, base_url: &Url, options: DiscoverOptions) -> Vec<CandidateUrl> {
    let document = Html::parse_document(html);
    let mut front = base_url.clone();
    front.set_fragment(None);

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    let mut rejected = 0usize;

    for element in document.select(&LINK_SELECTOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(candidate) = resolve(href, base_url) else {
            rejected += 1;
            continue;
        };
        if candidate.url == front
            || !is_article_path(&candidate.url)
            || (options.same_host_only && !same_site(&candidate.url, base_url))
        {
            rejected += 1;
            continue;
        }
        if seen.insert(candidate.key().to_string()) {
            candidates.push(candidate);
        }
    }

    debug!(
        count = candidates.len(),
        rejected, "Discovered candidate article URLs"
    );
    candidates
}

/// Resolve one `href` to an absolute http(s) candidate.
fn resolve(href: &str, base_url: &Url) -> Option<CandidateUrl> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let resolved = base_url.join(href).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    Some(CandidateUrl::new(resolved))
}

fn is_article_path(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    if NON_ARTICLE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return false;
    }
    !path
        .split('/')
        .any(|segment| NON_ARTICLE_SEGMENTS.contains(&segment))
}

/// Same host (ignoring `www.`), or a subdomain of the front page host.
///
/// Parent domains are not accepted: from `www.bbc.co.uk` a link to `co.uk`
/// is off-site.
fn same_site(url: &Url, base_url: &Url) -> bool {
    let (Some(host), Some(base)) = (url.host_str(), base_url.host_str()) else {
        return false;
    };
    let host = host.trim_start_matches("www.");
    let base = base.trim_start_matches("www.");
    host == base || host.ends_with(&format!(".{base}"))
}
