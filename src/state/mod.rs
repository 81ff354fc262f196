//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: Lifecycle of a harvest run (idle, running, and the terminal states)
//! - `CrawlSession`: Frontier, visited set, circuit breaker counter and collected pages

mod crawl_state;
mod session;

pub use crawl_state::CrawlState;
pub use session::{CrawlSession, Disposition, MAX_NON_DOC_URLS};
