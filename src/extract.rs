//! Article content extraction.
//!
//! The body is located with an ordered chain of [`TextStrategy`]s; the
//! first strategy that yields non-empty text wins:
//!
//! 1. [`ArticleContainer`]: paragraphs inside `<article>`
//! 2. [`MainContainer`]: paragraphs inside `<main>` / `role="main"`
//! 3. [`WholeDocument`]: every paragraph in the page
//!
//! A missing title falls back to [`NO_TITLE`]; missing text is the only
//! extraction failure ([`ExtractionError::EmptyBody`]). Hub and video pages
//! linked from front pages answer 200 without any paragraphs, so they end
//! up here rather than in the results.

use crate::error::ExtractionError;
use crate::models::{ExtractedArticle, RawDocument};
use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

/// Title used when the document carries none.
pub const NO_TITLE: &str = "No title found";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static ARTICLE_P: Lazy<Selector> = Lazy::new(|| selector("article p"));
static MAIN_P: Lazy<Selector> =
    Lazy::new(|| selector(r#"main p, [role="main"] p, #main-content p"#));
static ANY_P: Lazy<Selector> = Lazy::new(|| selector("p"));
static OG_TITLE: Lazy<Selector> = Lazy::new(|| selector(r#"meta[property="og:title"]"#));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static H1: Lazy<Selector> = Lazy::new(|| selector("h1"));
static DATE_META: Lazy<Selector> = Lazy::new(|| {
    selector(
        r#"meta[property="article:published_time"], meta[name="date"], meta[name="pubdate"], meta[name="publishdate"], meta[itemprop="datePublished"]"#,
    )
});
static TIME_DATETIME: Lazy<Selector> = Lazy::new(|| selector("time[datetime]"));
static JSON_LD: Lazy<Selector> = Lazy::new(|| selector(r#"script[type="application/ld+json"]"#));
static JSON_LD_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""datePublished"\s*:\s*"([^"]+)""#).expect("static regex"));

/// One way of locating article body text.
pub trait TextStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Normalized body text, or `None` when this strategy finds nothing.
    fn extract_text(&self, document: &Html) -> Option<String>;
}

/// Paragraphs inside a semantic `<article>` region.
#[derive(Debug, Default)]
pub struct ArticleContainer;

/// Paragraphs inside the main content region.
#[derive(Debug, Default)]
pub struct MainContainer;

/// Every paragraph in the document.
#[derive(Debug, Default)]
pub struct WholeDocument;

impl TextStrategy for ArticleContainer {
    fn name(&self) -> &'static str {
        "article"
    }

    fn extract_text(&self, document: &Html) -> Option<String> {
        paragraph_text(document.select(&ARTICLE_P))
    }
}

impl TextStrategy for MainContainer {
    fn name(&self) -> &'static str {
        "main"
    }

    fn extract_text(&self, document: &Html) -> Option<String> {
        paragraph_text(document.select(&MAIN_P))
    }
}

impl TextStrategy for WholeDocument {
    fn name(&self) -> &'static str {
        "document"
    }

    fn extract_text(&self, document: &Html) -> Option<String> {
        paragraph_text(document.select(&ANY_P))
    }
}

fn paragraph_text<'a>(paragraphs: impl Iterator<Item = ElementRef<'a>>) -> Option<String> {
    let text = paragraphs
        .map(|p| normalize_text(&p.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

/// Collapse whitespace runs to one space and drop non-printable characters.
pub fn normalize_text(raw: &str) -> String {
    raw.chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some(' ')
            } else if c.is_control() || is_invisible(c) {
                None
            } else {
                Some(c)
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{00ad}' | '\u{200b}'..='\u{200f}' | '\u{2060}' | '\u{feff}' | '\u{fffd}'
    )
}

/// Runs the strategy chain over fetched documents.
pub struct Extractor {
    strategies: Vec<Box<dyn TextStrategy>>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(vec![
            Box::new(ArticleContainer),
            Box::new(MainContainer),
            Box::new(WholeDocument),
        ])
    }
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.strategies.iter().map(|s| s.name()))
            .finish()
    }
}

impl Extractor {
    /// Build an extractor that tries `strategies` in order.
    pub fn new(strategies: Vec<Box<dyn TextStrategy>>) -> Self {
        Self { strategies }
    }

    /// Turn a fetched document into an article attributed to `source_name`.
    ///
    /// # Errors
    ///
    /// [`ExtractionError::EmptyBody`] when no strategy finds paragraph text.
    #[instrument(level = "debug", skip_all, fields(url = %doc.url))]
    pub fn extract(
        &self,
        doc: RawDocument,
        source_name: &str,
    ) -> Result<ExtractedArticle, ExtractionError> {
        let document = Html::parse_document(&doc.text());

        let (strategy, text) = self
            .strategies
            .iter()
            .find_map(|s| {
                s.extract_text(&document)
                    .map(|text| normalize_text(&text))
                    .filter(|text| !text.is_empty())
                    .map(|text| (s.name(), text))
            })
            .ok_or(ExtractionError::EmptyBody)?;

        let title = extract_title(&document);
        let publish_date = extract_publish_date(&document);
        debug!(strategy, chars = text.len(), %title, "Extracted article");

        Ok(ExtractedArticle {
            title,
            text,
            keywords: Vec::new(),
            source_name: source_name.to_string(),
            url: doc.url,
            publish_date,
        })
    }
}

fn extract_title(document: &Html) -> String {
    let og = document
        .select(&OG_TITLE)
        .filter_map(|m| m.value().attr("content"))
        .map(normalize_text);
    let title = document
        .select(&TITLE)
        .map(|t| normalize_text(&t.text().collect::<String>()));
    let h1 = document
        .select(&H1)
        .map(|t| normalize_text(&t.text().collect::<String>()));

    og.chain(title)
        .chain(h1)
        .find(|t| !t.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string())
}

fn extract_publish_date(document: &Html) -> Option<NaiveDate> {
    let meta = document
        .select(&DATE_META)
        .filter_map(|m| m.value().attr("content"))
        .map(str::to_string);
    let json_ld = document.select(&JSON_LD).filter_map(|s| {
        let body = s.text().collect::<String>();
        JSON_LD_DATE
            .captures(&body)
            .map(|caps| caps[1].to_string())
    });
    let time = document
        .select(&TIME_DATETIME)
        .filter_map(|t| t.value().attr("datetime"))
        .map(str::to_string);

    meta.chain(json_ld)
        .chain(time)
        .find_map(|raw| parse_date(&raw))
}

/// RFC 3339 timestamps or anything starting with `YYYY-MM-DD`.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    let prefix = raw.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}
