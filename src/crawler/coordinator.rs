//! Crawler coordinator - main traversal loop
//!
//! This module drives a harvest run, including:
//! - Seeding the session (and reloading prior pages in incremental mode)
//! - Pulling URLs from the frontier and gating them through the classifier
//! - Fetching, extracting and discovering links for each page
//! - Politeness delay, periodic checkpoints and cancellation

use crate::config::{Config, CrawlerConfig};
use crate::crawler::{discover_links, extract_page, FetchResult, HttpFetcher, PageSelectors};
use crate::output::ArtifactLayout;
use crate::state::{CrawlSession, CrawlState, Disposition};
use crate::storage::{JsonPageStore, PageRecord, PageStore, StorageError};
use crate::url::SiteContext;
use crate::HarvestError;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Counters collected during a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Pages loaded from a previous run in incremental mode
    pub pages_resumed: usize,

    /// Successful HTTP fetches
    pub pages_fetched: usize,

    /// Pages turned into records
    pub pages_extracted: usize,

    /// Fetches that failed after retries
    pub fetch_failures: usize,

    /// Fetched pages the extractor could not handle
    pub extract_failures: usize,

    /// URLs rejected by the classifier
    pub non_doc_skipped: usize,

    /// Checkpoints written
    pub checkpoints: usize,
}

/// Result of a harvest run
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Terminal state the run ended in
    pub state: CrawlState,

    /// All pages of the session, resumed ones first, in harvest order
    pub pages: Vec<PageRecord>,

    pub stats: CrawlStats,
}

/// Documentation site harvester
pub struct Harvester {
    crawler: CrawlerConfig,
    site: SiteContext,
    selectors: PageSelectors,
    fetcher: HttpFetcher,
    layout: ArtifactLayout,
    store: JsonPageStore,
}

impl Harvester {
    /// Creates a harvester for a seed URL
    ///
    /// All validation happens here, before any network activity.
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration
    /// * `seed` - The documentation root URL
    /// * `cancel` - Token that stops the run at the next safe point
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Ready to run
    /// * `Err(HarvestError)` - Malformed seed, bad selector, or cache/client setup failure
    pub fn new(config: &Config, seed: &str, cancel: CancellationToken) -> Result<Self, HarvestError> {
        let site = SiteContext::from_seed(seed)?;
        let selectors = PageSelectors::from_config(&config.selectors)?;
        let layout = ArtifactLayout::for_site(Path::new(&config.output.dir), &site);
        let store = JsonPageStore::new(layout.json_path());
        let fetcher = HttpFetcher::from_config(config, cancel)?;

        Ok(Self {
            crawler: config.crawler.clone(),
            site,
            selectors,
            fetcher,
            layout,
            store,
        })
    }

    pub fn site(&self) -> &SiteContext {
        &self.site
    }

    /// Where this site's artifacts are written
    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Title used for the HTML and PDF documents
    pub fn document_title(&self) -> String {
        format!("{} Documentation", self.site.domain)
    }

    /// Creates the session for a run
    ///
    /// In incremental mode the previous JSON collection is loaded and every
    /// URL in it is marked visited. A missing or unreadable file starts a
    /// fresh crawl.
    pub fn new_session(&self) -> CrawlSession {
        let mut session = CrawlSession::new(self.site.clone(), self.crawler.page_limit());

        if !self.crawler.incremental {
            return session;
        }

        match self.store.load_pages() {
            Ok(pages) if pages.is_empty() => {
                tracing::info!("No existing pages in {}. Starting fresh crawl.", self.store.describe());
            }
            Ok(pages) => {
                let loaded = pages.len();
                let duplicates = session.resume(pages);
                if duplicates > 0 {
                    tracing::warn!("Dropped {} duplicate URLs from {}", duplicates, self.store.describe());
                }
                tracing::info!(
                    "Loaded {} existing pages from {} (incremental mode)",
                    loaded - duplicates,
                    self.store.describe()
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to load existing pages from {}: {}. Starting fresh crawl.",
                    self.store.describe(),
                    e
                );
            }
        }

        session
    }

    /// Runs a harvest from the seed URL
    pub async fn run(&self) -> CrawlOutcome {
        let session = self.new_session();
        self.run_session(session).await
    }

    /// Drives an existing session to a terminal state
    ///
    /// # Loop
    ///
    /// 1. Stop as `Cancelled` if the token fired
    /// 2. Ask the session for the next URL (page limit, frontier, visited set, classifier)
    /// 3. Fetch it; failures are logged and the URL stays visited
    /// 4. Extract a record and discover links from the same body
    /// 5. After a successful extraction, checkpoint every `checkpoint-interval`
    ///    pages and wait the politeness delay
    pub async fn run_session(&self, mut session: CrawlSession) -> CrawlOutcome {
        let cancel = self.fetcher.cancel_token().clone();
        let mut stats = CrawlStats {
            pages_resumed: session.pages().len(),
            ..CrawlStats::default()
        };
        let mut since_checkpoint = 0;
        let limit = self
            .crawler
            .page_limit()
            .map_or_else(|| "unbounded".to_string(), |n| n.to_string());

        tracing::info!("Starting crawl of {}", self.site.base_url);
        if let Some(restriction) = &self.site.github_path_restriction {
            tracing::info!("GitHub path restriction: {}", restriction);
        }

        session.set_state(CrawlState::Running);

        loop {
            if cancel.is_cancelled() {
                session.set_state(CrawlState::Cancelled);
                break;
            }

            let url = match session.next_url() {
                Disposition::Fetch(url) => url,
                Disposition::AlreadyVisited(_) => continue,
                Disposition::Rejected(_) => continue,
                Disposition::Stop(state) => {
                    if state == CrawlState::LimitReached && session.non_doc_count() > 0 {
                        tracing::warn!(
                            "Stopped after {} pages ({} non-docs URLs skipped)",
                            session.visited_count(),
                            session.non_doc_count()
                        );
                    }
                    break;
                }
            };

            tracing::info!("Processing [{}/{}]: {}", session.visited_count(), limit, url);

            let body = match self.fetcher.fetch(&url).await {
                FetchResult::Success { body, .. } => body,
                FetchResult::Cancelled => {
                    session.set_state(CrawlState::Cancelled);
                    break;
                }
                FetchResult::HttpError { status_code, body } => {
                    tracing::warn!("Skipping {}: HTTP {}", url, status_code);
                    stats.fetch_failures += 1;
                    let queued = self.enqueue_links(&mut session, &body, &url);
                    if queued > 0 {
                        tracing::debug!("Queued {} new links from error page {}", queued, url);
                    }
                    continue;
                }
                FetchResult::NetworkError { error } => {
                    tracing::warn!("Skipping {}: {}", url, error);
                    stats.fetch_failures += 1;
                    continue;
                }
            };
            stats.pages_fetched += 1;

            let extracted = match extract_page(&body, &url, &self.selectors, self.crawler.strip_images) {
                Ok(page) => {
                    session.record_page(page);
                    stats.pages_extracted += 1;
                    true
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    stats.extract_failures += 1;
                    false
                }
            };

            let queued = self.enqueue_links(&mut session, &body, &url);
            tracing::debug!("Queued {} new links from {}", queued, url);

            if !extracted {
                continue;
            }

            since_checkpoint += 1;
            if self.crawler.checkpoint_interval > 0 && since_checkpoint >= self.crawler.checkpoint_interval {
                tracing::info!("Auto-saving progress ({} pages collected)...", session.pages().len());
                if self.checkpoint(session.pages()) {
                    stats.checkpoints += 1;
                }
                since_checkpoint = 0;
            }

            if self.crawler.delay_ms > 0 {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        session.set_state(CrawlState::Cancelled);
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_millis(self.crawler.delay_ms)) => {}
                }
            }
        }

        stats.non_doc_skipped = session.non_doc_count();
        let state = session.state();

        tracing::info!(
            "Crawl {}: {} pages collected ({} new)",
            state,
            session.pages().len(),
            stats.pages_extracted
        );
        if stats.non_doc_skipped > 0 {
            tracing::info!("Skipped {} non-docs URLs", stats.non_doc_skipped);
        }

        CrawlOutcome {
            state,
            pages: session.into_pages(),
            stats,
        }
    }

    /// Persists the collection; failures are logged and the crawl continues
    fn checkpoint(&self, pages: &[PageRecord]) -> bool {
        let result = self
            .layout
            .ensure_dir()
            .map_err(StorageError::from)
            .and_then(|_| self.store.save_pages(pages));

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Checkpoint to {} failed: {}", self.store.describe(), e);
                false
            }
        }
    }

    /// Queues the in-scope links of `body`, returning how many were new
    fn enqueue_links(&self, session: &mut CrawlSession, body: &str, url: &str) -> usize {
        discover_links(body, url, &self.site, &self.selectors)
            .into_iter()
            .filter(|link| session.enqueue(link.clone()))
            .count()
    }
}
