//! Crawl orchestration.
//!
//! For every configured site the crawler walks the phases
//!
//! ```text
//! Idle → FetchingFrontPage → DiscoveringLinks → {FetchingArticle → Extracting → Matching}* → Done
//! ```
//!
//! A site whose front page cannot be fetched goes straight to `Done`; the
//! other sites are unaffected. Within a site candidates are handled one at a
//! time with a politeness delay before each article fetch, and the site stops
//! as soon as its budget of matches is met. Sites themselves run in a
//! bounded pool (`futures::stream::buffered`) so the results keep site
//! configuration order.
//!
//! Recoverable failures become [`CrawlWarning`]s. The only errors returned
//! are configuration errors (before any I/O) and cancellation.

use crate::annotate::Annotator;
use crate::discover::{DiscoverOptions, discover};
use crate::error::{ConfigError, CrawlError, CrawlWarning, FetchError, WarningKind};
use crate::extract::Extractor;
use crate::fetcher::PageFetcher;
use crate::matcher::TagSet;
use crate::models::{CrawlBudget, CrawlProgress, MatchResult, RawDocument, SiteSpec};
use crate::results::ResultSet;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Default pause before each article fetch within a site.
pub const DEFAULT_POLITENESS_DELAY: Duration = Duration::from_secs(1);
/// Default number of sites crawled at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Tunables for a [`Crawler`].
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Pause inserted before every article fetch within one site.
    pub politeness_delay: Duration,
    /// Upper bound on sites crawled concurrently; `1` is fully sequential.
    pub concurrency: usize,
    /// Stop scanning a site after this many candidates even if the budget
    /// is not met.
    pub max_candidates_per_site: Option<usize>,
    pub discover: DiscoverOptions,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            politeness_delay: DEFAULT_POLITENESS_DELAY,
            concurrency: DEFAULT_CONCURRENCY,
            max_candidates_per_site: None,
            discover: DiscoverOptions::default(),
        }
    }
}

/// Receives progress once per finished site.
pub trait ProgressObserver {
    fn on_progress(&self, progress: CrawlProgress);
}

impl<F> ProgressObserver for F
where
    F: Fn(CrawlProgress),
{
    fn on_progress(&self, progress: CrawlProgress) {
        self(progress)
    }
}

/// Observer that ignores progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _progress: CrawlProgress) {}
}

/// Where a site's crawl currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitePhase {
    Idle,
    FetchingFrontPage,
    DiscoveringLinks,
    FetchingArticle,
    Extracting,
    Matching,
    Done,
}

impl fmt::Display for SitePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SitePhase::Idle => "idle",
            SitePhase::FetchingFrontPage => "fetching_front_page",
            SitePhase::DiscoveringLinks => "discovering_links",
            SitePhase::FetchingArticle => "fetching_article",
            SitePhase::Extracting => "extracting",
            SitePhase::Matching => "matching",
            SitePhase::Done => "done",
        };
        f.write_str(s)
    }
}

/// Per-site counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSummary {
    pub site: String,
    pub front_page_failed: bool,
    /// Candidates surviving link discovery.
    pub candidates: usize,
    /// Candidates fetched successfully.
    pub fetched: usize,
    pub matched: usize,
}

/// Everything a crawl produced.
#[derive(Debug, Default)]
pub struct CrawlReport {
    pub results: ResultSet,
    pub warnings: Vec<CrawlWarning>,
    pub sites: Vec<SiteSummary>,
}

struct SiteCrawl {
    matches: Vec<MatchResult>,
    warnings: Vec<CrawlWarning>,
    summary: SiteSummary,
    phase: SitePhase,
}

impl SiteCrawl {
    fn new(site: &SiteSpec) -> Self {
        Self {
            matches: Vec::new(),
            warnings: Vec::new(),
            summary: SiteSummary {
                site: site.name.clone(),
                front_page_failed: false,
                candidates: 0,
                fetched: 0,
                matched: 0,
            },
            phase: SitePhase::Idle,
        }
    }

    fn enter(&mut self, next: SitePhase) {
        debug!(site = %self.summary.site, from = %self.phase, to = %next, "Site phase");
        self.phase = next;
    }

    fn warn(&mut self, url: &Url, kind: WarningKind) {
        let warning = CrawlWarning {
            site: self.summary.site.clone(),
            url: url.clone(),
            kind,
        };
        warn!(%warning, "Skipping");
        self.warnings.push(warning);
    }
}

/// Drives discovery, fetching, extraction and matching across sites.
pub struct Crawler<F> {
    fetcher: F,
    extractor: Extractor,
    annotator: Option<Box<dyn Annotator>>,
    settings: CrawlSettings,
}

impl<F> fmt::Debug for Crawler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crawler")
            .field("extractor", &self.extractor)
            .field("annotator", &self.annotator.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}

impl<F> Crawler<F>
where
    F: PageFetcher,
{
    pub fn new(fetcher: F, settings: CrawlSettings) -> Self {
        Self {
            fetcher,
            extractor: Extractor::default(),
            annotator: None,
            settings,
        }
    }

    /// Run `annotator` on every extracted article before matching.
    pub fn with_annotator(mut self, annotator: impl Annotator + 'static) -> Self {
        self.annotator = Some(Box::new(annotator));
        self
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Validate raw tags and budget, then [`Crawler::crawl`].
    ///
    /// # Errors
    ///
    /// [`CrawlError::Config`] for an empty tag list or an out-of-range
    /// budget, before any request is sent.
    pub async fn crawl_with<I, S>(
        &self,
        sites: &[SiteSpec],
        tags: I,
        max_articles_per_site: usize,
        cancel: &CancellationToken,
        progress: &dyn ProgressObserver,
    ) -> Result<CrawlReport, CrawlError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = TagSet::new(tags)?;
        let budget = CrawlBudget::new(max_articles_per_site)?;
        self.crawl(sites, &tags, budget, cancel, progress).await
    }

    /// Crawl every site and return the articles matching `tags`.
    ///
    /// At most `budget.max_articles_per_site()` matches are kept per site.
    /// A crawl that finds nothing returns an empty [`ResultSet`].
    ///
    /// # Arguments
    ///
    /// * `sites` - Front pages to crawl, in output order
    /// * `tags` - Validated tag set an article must mention
    /// * `budget` - Per-site cap on matched articles
    /// * `cancel` - Stops the crawl before the next site, candidate or delay
    /// * `progress` - Notified once per finished site
    ///
    /// # Returns
    ///
    /// A [`CrawlReport`] holding the matches in site order, the skipped pages
    /// as warnings, and one [`SiteSummary`] per site.
    ///
    /// # Errors
    ///
    /// [`CrawlError::Config`] for invalid sites or settings (no request is
    /// sent), [`CrawlError::Cancelled`] once `cancel` fires.
    #[instrument(level = "info", skip_all, fields(sites = sites.len(), tags = tags.len()))]
    pub async fn crawl(
        &self,
        sites: &[SiteSpec],
        tags: &TagSet,
        budget: CrawlBudget,
        cancel: &CancellationToken,
        progress: &dyn ProgressObserver,
    ) -> Result<CrawlReport, CrawlError> {
        if self.settings.concurrency == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "concurrency",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        for site in sites {
            site.validate()?;
        }
        if cancel.is_cancelled() {
            return Err(CrawlError::Cancelled);
        }

        let total = sites.len();
        let width = self.settings.concurrency.min(total.max(1));
        info!(
            total,
            width,
            max_articles_per_site = budget.max_articles_per_site(),
            "Starting crawl"
        );

        let completed = AtomicUsize::new(0);
        let completed = &completed;
        let outcomes: Vec<SiteCrawl> = stream::iter(sites)
            .map(move |site| async move {
                let outcome = self.crawl_site(site, tags, budget, cancel).await?;
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                progress.on_progress(CrawlProgress {
                    completed: done,
                    total,
                });
                Ok::<_, CrawlError>(outcome)
            })
            .buffered(width)
            .try_collect()
            .await?;

        let mut report = CrawlReport::default();
        for outcome in outcomes {
            report.results.extend(outcome.matches);
            report.warnings.extend(outcome.warnings);
            report.sites.push(outcome.summary);
        }
        info!(
            matches = report.results.len(),
            warnings = report.warnings.len(),
            "Crawl complete"
        );
        Ok(report)
    }

    #[instrument(level = "info", skip_all, fields(site = %site.name))]
    async fn crawl_site(
        &self,
        site: &SiteSpec,
        tags: &TagSet,
        budget: CrawlBudget,
        cancel: &CancellationToken,
    ) -> Result<SiteCrawl, CrawlError> {
        let mut state = SiteCrawl::new(site);
        if cancel.is_cancelled() {
            return Err(CrawlError::Cancelled);
        }

        state.enter(SitePhase::FetchingFrontPage);
        let front = match self.fetch_or_cancel(&site.base_url, cancel).await? {
            Ok(doc) => doc,
            Err(e) => {
                state.warn(&site.base_url, WarningKind::FrontPage(e));
                state.summary.front_page_failed = true;
                state.enter(SitePhase::Done);
                return Ok(state);
            }
        };

        state.enter(SitePhase::DiscoveringLinks);
        let candidates = discover(&front.text(), &front.url, self.settings.discover);
        drop(front);
        state.summary.candidates = candidates.len();
        info!(count = candidates.len(), "Discovered candidates");

        let scan_limit = self.settings.max_candidates_per_site.unwrap_or(usize::MAX);
        for candidate in candidates.into_iter().take(scan_limit) {
            if state.matches.len() >= budget.max_articles_per_site() {
                debug!("Budget met");
                break;
            }
            if cancel.is_cancelled() {
                return Err(CrawlError::Cancelled);
            }
            self.pause(cancel).await?;

            state.enter(SitePhase::FetchingArticle);
            let doc = match self.fetch_or_cancel(&candidate.url, cancel).await? {
                Ok(doc) => doc,
                Err(e) => {
                    state.warn(&candidate.url, WarningKind::Fetch(e));
                    continue;
                }
            };
            state.summary.fetched += 1;

            state.enter(SitePhase::Extracting);
            let mut article = match self.extractor.extract(doc, &site.name) {
                Ok(article) => article,
                Err(e) => {
                    state.warn(&candidate.url, WarningKind::Extraction(e));
                    continue;
                }
            };
            if let Some(annotator) = &self.annotator {
                annotator.annotate(&mut article);
            }

            state.enter(SitePhase::Matching);
            let matched_tags = tags.matched(&article);
            if matched_tags.is_empty() {
                debug!(url = %candidate.url, "No tag matched");
                continue;
            }
            info!(url = %candidate.url, title = %article.title, ?matched_tags, "Matched article");
            state.matches.push(MatchResult {
                article,
                matched_tags,
            });
        }

        state.summary.matched = state.matches.len();
        state.enter(SitePhase::Done);
        info!(
            candidates = state.summary.candidates,
            fetched = state.summary.fetched,
            matched = state.summary.matched,
            "Site done"
        );
        Ok(state)
    }

    /// Fetch `url` unless `cancel` fires first.
    async fn fetch_or_cancel(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<Result<RawDocument, FetchError>, CrawlError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CrawlError::Cancelled),
            result = self.fetcher.fetch(url) => Ok(result),
        }
    }

    async fn pause(&self, cancel: &CancellationToken) -> Result<(), CrawlError> {
        if self.settings.politeness_delay.is_zero() {
            return Ok(());
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CrawlError::Cancelled),
            _ = sleep(self.settings.politeness_delay) => Ok(()),
        }
    }
}
