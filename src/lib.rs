//! Tag-filtered news crawling.
//!
//! The pipeline runs in one direction:
//!
//! ```text
//! Crawler ─▶ discover (per site) ─▶ PageFetcher (per URL) ─▶ Extractor ─▶ Annotator? ─▶ TagSet ─▶ ResultSet
//! ```
//!
//! - [`crawler`]: Per-site budgets, pacing, cancellation and progress
//! - [`discover`]: Candidate article links from a front page
//! - [`fetcher`]: HTTP GET with a mandatory timeout, plus a retry decorator
//! - [`extract`]: Title/body extraction with a fallback strategy chain
//! - [`annotate`]: Optional keyword annotation
//! - [`matcher`]: Case-insensitive tag matching
//! - [`results`]: Ordered result collection and flat output records
//! - [`config`] / [`outputs`]: YAML settings and JSON export

pub mod annotate;
pub mod config;
pub mod crawler;
pub mod discover;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod matcher;
pub mod models;
pub mod outputs;
pub mod results;
pub mod utils;
