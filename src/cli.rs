//! Command-line interface definitions.
//!
//! Flags override the values loaded from the optional YAML config file.

use clap::Parser;
use std::path::PathBuf;
use tagged_news::config::AppConfig;

/// Crawl news front pages and keep the articles that mention any tag.
///
/// # Examples
///
/// ```sh
/// # Built-in sites, default budget
/// tagged_news --tags "climate, technology, health"
///
/// # Custom sites, write results to ./results
/// tagged_news -t climate -c sites.yaml -o ./results --max-articles 20
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Tags to look for; comma-separated and/or repeated
    #[arg(short, long, env = "NEWS_TAGS", value_delimiter = ',', required = true)]
    pub tags: Vec<String>,

    /// Maximum matched articles kept per site (1-50)
    #[arg(short = 'n', long)]
    pub max_articles: Option<usize>,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for the JSON results file; nothing is written when omitted
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Pause before each article fetch, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Number of sites crawled at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Retries for transient fetch failures
    #[arg(long)]
    pub retries: Option<usize>,

    /// Skip keyword annotation
    #[arg(long)]
    pub no_keywords: bool,

    /// Keep full article text in the output instead of a preview
    #[arg(long)]
    pub full_text: bool,
}

impl Cli {
    /// Apply flag overrides on top of `config`.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(n) = self.max_articles {
            config.max_articles_per_site = n;
        }
        if let Some(ms) = self.delay_ms {
            config.politeness_delay_ms = ms;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout_secs = secs;
        }
        if let Some(n) = self.concurrency {
            config.concurrency = n;
        }
        if let Some(n) = self.retries {
            config.max_retries = n;
        }
        if self.no_keywords {
            config.keywords = false;
        }
        if self.full_text {
            config.preview_len = None;
        }
    }
}
