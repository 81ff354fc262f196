//! Per-run crawl session
//!
//! The session owns everything the traversal loop mutates: the FIFO frontier,
//! the visited set, the circuit breaker counter and the collected pages. It
//! decides what to fetch next but never performs I/O itself.

use crate::state::CrawlState;
use crate::storage::PageRecord;
use crate::url::{is_valid_doc_url, SiteContext};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Number of rejected URLs tolerated before the circuit breaker trips
///
/// The breaker trips on the rejection that pushes the count past this value.
pub const MAX_NON_DOC_URLS: usize = 5;

/// Outcome of asking the session for the next URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// URL has been marked visited and should be fetched now
    Fetch(String),

    /// URL was already visited and has been discarded
    AlreadyVisited(String),

    /// URL failed the classifier and counted toward the circuit breaker
    Rejected(String),

    /// The traversal must stop in the given terminal state
    Stop(CrawlState),
}

/// Mutable state of a single harvest run
#[derive(Debug)]
pub struct CrawlSession {
    site: SiteContext,
    state: CrawlState,
    max_pages: Option<usize>,
    visited: HashSet<String>,
    frontier: VecDeque<String>,
    queued: HashSet<String>,
    non_doc_count: usize,
    pages: Vec<PageRecord>,
}

impl CrawlSession {
    /// Creates a session whose frontier holds only the site's base URL
    ///
    /// # Arguments
    ///
    /// * `site` - Site context derived from the seed
    /// * `max_pages` - Visited-set size at which the run stops; `None` for unbounded
    pub fn new(site: SiteContext, max_pages: Option<usize>) -> Self {
        let seed = site.base_url.clone();
        Self::with_seeds(site, [seed], max_pages)
    }

    /// Creates a session with an explicit list of seed URLs
    ///
    /// Seeds are queued in order, with duplicates dropped. They still go
    /// through the classifier when dequeued.
    pub fn with_seeds<I, S>(site: SiteContext, seeds: I, max_pages: Option<usize>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut session = Self {
            site,
            state: CrawlState::Idle,
            max_pages,
            visited: HashSet::new(),
            frontier: VecDeque::new(),
            queued: HashSet::new(),
            non_doc_count: 0,
            pages: Vec::new(),
        };

        for seed in seeds {
            session.enqueue(seed.into());
        }

        session
    }

    /// Pre-populates the session from a previously persisted collection
    ///
    /// Every loaded URL is marked visited so it is never fetched again.
    /// Records with a URL seen earlier in the collection are dropped.
    ///
    /// # Returns
    ///
    /// The number of duplicate records dropped
    pub fn resume(&mut self, pages: Vec<PageRecord>) -> usize {
        let mut duplicates = 0;

        for page in pages {
            if !self.visited.insert(page.url.clone()) {
                duplicates += 1;
                continue;
            }
            self.queued.remove(&page.url);
            self.pages.push(page);
        }

        duplicates
    }

    /// Queues a URL unless it is already visited or pending
    ///
    /// # Returns
    ///
    /// `true` if the URL was added to the frontier
    pub fn enqueue(&mut self, url: String) -> bool {
        if self.visited.contains(&url) || self.queued.contains(&url) {
            return false;
        }
        self.queued.insert(url.clone());
        self.frontier.push_back(url);
        true
    }

    /// Advances the traversal by one decision
    ///
    /// Checks the page limit, pops the next URL and gates it through the
    /// visited set and the classifier. A URL returned as `Fetch` is already
    /// marked visited. `Stop` also moves the session into that state.
    pub fn next_url(&mut self) -> Disposition {
        if let Some(limit) = self.max_pages {
            if self.visited.len() >= limit {
                return self.stop(CrawlState::LimitReached);
            }
        }

        let Some(url) = self.frontier.pop_front() else {
            return self.stop(CrawlState::Completed);
        };
        self.queued.remove(&url);

        if self.visited.contains(&url) {
            return Disposition::AlreadyVisited(url);
        }

        if !is_valid_doc_url(&url, &self.site) {
            self.non_doc_count += 1;
            debug!(
                "Skipping non-doc URL {} ({}/{})",
                url, self.non_doc_count, MAX_NON_DOC_URLS
            );
            if self.non_doc_count > MAX_NON_DOC_URLS {
                return self.stop(CrawlState::LimitReached);
            }
            return Disposition::Rejected(url);
        }

        self.visited.insert(url.clone());
        Disposition::Fetch(url)
    }

    /// Appends a harvested page
    pub fn record_page(&mut self, page: PageRecord) {
        self.pages.push(page);
    }

    /// Moves the session into a new state
    pub fn set_state(&mut self, state: CrawlState) {
        self.state = state;
    }

    fn stop(&mut self, state: CrawlState) -> Disposition {
        self.state = state;
        Disposition::Stop(state)
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn site(&self) -> &SiteContext {
        &self.site
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn non_doc_count(&self) -> usize {
        self.non_doc_count
    }

    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    /// Consumes the session, returning the collected pages in harvest order
    pub fn into_pages(self) -> Vec<PageRecord> {
        self.pages
    }
}
