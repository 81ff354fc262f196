//! GitHub repository documentation fetching
//!
//! Instead of crawling rendered pages, this mode lists a repository's docs
//! directory through the GitHub contents API, downloads every markdown file
//! and converts it to HTML page records.
//!
//! # Components
//!
//! - `ContentsClient`: Iterative directory listing with docs-path fallbacks
//! - `GitHubHarvester`: Downloads, converts and checkpoints the markdown pages
//! - `markdown_to_html`: Markdown conversion with GitHub-flavored extensions

mod client;
mod harvester;
mod markdown;

pub use client::{ContentEntry, ContentsClient, EntryKind, MarkdownFile, FALLBACK_DOCS_PATHS};
pub use harvester::GitHubHarvester;
pub use markdown::{markdown_title, markdown_to_html};

use thiserror::Error;

/// Errors that can occur while talking to the GitHub API
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request to {url} failed with HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("GitHub API request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("Unexpected GitHub API response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("GitHub request cancelled")]
    Cancelled,
}

impl GitHubError {
    /// Returns true if the API reported the path as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }
}

/// Result type for GitHub operations
pub type GitHubResult<T> = Result<T, GitHubError>;
