//! Crawler module for documentation harvesting
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry, cache and cancellation support
//! - Content extraction from heterogeneous documentation HTML
//! - Navigation-aware link discovery
//! - The traversal loop tying them together

mod coordinator;
mod discoverer;
mod extractor;
mod fetcher;
mod selectors;

pub use coordinator::{CrawlOutcome, CrawlStats, Harvester};
pub use discoverer::discover_links;
pub use extractor::{extract_page, ExtractError};
pub use fetcher::{
    build_http_client, is_retryable_status, FetchResult, HttpFetcher, RetryPolicy, CACHE_FILE_NAME,
};
pub use selectors::PageSelectors;

use crate::config::Config;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl of a documentation site
///
/// This builds a `Harvester` for the seed and runs it to completion. Output
/// artifacts are not written; see `output::write_outputs`.
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `seed` - The documentation root URL
/// * `cancel` - Token that stops the run at the next safe point
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - The run reached a terminal state
/// * `Err(HarvestError)` - Setup failed before any network activity
pub async fn crawl(
    config: &Config,
    seed: &str,
    cancel: CancellationToken,
) -> crate::Result<CrawlOutcome> {
    let harvester = Harvester::new(config, seed, cancel)?;
    Ok(harvester.run().await)
}
