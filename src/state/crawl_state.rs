/// Crawl lifecycle states
///
/// A run moves from `Idle` to `Running` and ends in exactly one of the
/// terminal states.
use std::fmt;

/// Represents the current state of a harvest run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CrawlState {
    /// Session created, nothing fetched yet
    #[default]
    Idle,

    /// Traversal loop in progress
    Running,

    // ===== Terminal States =====
    /// Frontier drained
    Completed,

    /// Page limit reached or circuit breaker tripped
    LimitReached,

    /// Cancellation was requested
    Cancelled,
}

impl CrawlState {
    /// Returns true if the run has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::LimitReached | Self::Cancelled)
    }

    /// Returns a short lowercase name for logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::LimitReached => "limit_reached",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
