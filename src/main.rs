//! # Tagged News
//!
//! Crawls a fixed set of news front pages, extracts article text, and keeps
//! the articles that mention any of the requested tags.
//!
//! ## Usage
//!
//! ```sh
//! tagged_news --tags "climate, technology" -o ./results
//! ```
//!
//! ## Pipeline
//!
//! 1. **Discovery**: Collect candidate article links from each front page
//! 2. **Fetching**: Download candidates one at a time per site, with a pause
//! 3. **Extraction**: Pull title and body text out of each page
//! 4. **Matching**: Keep articles mentioning a tag, up to the per-site budget
//! 5. **Output**: Log the matches and optionally write a JSON results file

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tagged_news::annotate::KeywordAnnotator;
use tagged_news::config::AppConfig;
use tagged_news::crawler::Crawler;
use tagged_news::fetcher::{HttpFetcher, RetryFetch};
use tagged_news::matcher::TagSet;
use tagged_news::models::{CrawlBudget, CrawlProgress};
use tagged_news::outputs::json;
use tagged_news::utils::truncate_for_log;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::Cli;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("tagged_news starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Configuration (fatal on error, before any request) ----
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    args.apply(&mut config);
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    let tags = match TagSet::new(&args.tags) {
        Ok(tags) => tags,
        Err(e) => {
            error!(error = %e, "Please enter at least one tag");
            return Err(e.into());
        }
    };
    let budget = CrawlBudget::new(config.max_articles_per_site)?;
    info!(
        tags = ?tags.tags().collect::<Vec<_>>(),
        sites = config.sites.len(),
        max_articles_per_site = budget.max_articles_per_site(),
        "Configuration ready"
    );

    // ---- Crawler ----
    let fetcher = RetryFetch::new(
        HttpFetcher::new(&config.fetcher_config())?,
        config.max_retries,
        config.retry_base_delay(),
    );
    let mut crawler = Crawler::new(fetcher, config.crawl_settings());
    if config.keywords {
        crawler = crawler.with_annotator(KeywordAnnotator::default());
    }

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received; cancelling crawl");
                cancel.cancel();
            }
        })
    };

    let progress = |p: CrawlProgress| {
        info!(
            completed = p.completed,
            total = p.total,
            percent = (p.fraction() * 100.0).round() as u32,
            "Crawl progress"
        );
    };

    let outcome = crawler
        .crawl(&config.sites, &tags, budget, &cancel, &progress)
        .await;
    interrupt.abort();
    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Crawl aborted");
            return Err(e.into());
        }
    };

    for summary in &report.sites {
        info!(
            site = %summary.site,
            front_page_failed = summary.front_page_failed,
            candidates = summary.candidates,
            fetched = summary.fetched,
            matched = summary.matched,
            "Site summary"
        );
    }
    if !report.warnings.is_empty() {
        warn!(count = report.warnings.len(), "Crawl finished with skipped pages");
    }

    // ---- Results ----
    let records = report.results.records(config.preview_len);
    if records.is_empty() {
        info!("No articles found matching your tags");
    } else {
        info!(count = records.len(), "Found articles matching your tags");
    }
    for (idx, record) in records.iter().enumerate() {
        info!(
            index = idx + 1,
            source = %record.source,
            title = %record.title,
            url = %record.url,
            keywords = %record.keywords,
            tags = ?record.matched_tags,
            preview = %truncate_for_log(&record.text, 200),
            "Article"
        );
    }

    if let Some(dir) = &args.output_dir {
        match json::write_results(&records, dir, Local::now()).await {
            Ok(path) => info!(path = %path.display(), "Results saved"),
            Err(e) => error!(error = %e, "Failed to write results"),
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
