//! URL handling module
//!
//! This module provides:
//! - Site context derivation from the seed URL
//! - The documentation URL classifier that scopes a crawl
//! - Parsing of GitHub repository URLs into owner/repo/branch/path

mod classifier;
mod github;
mod site;

pub use classifier::{
    is_valid_doc_url, GITHUB_SKIP_PATTERNS, SKIP_EXTENSIONS, SKIP_PATH_PATTERNS,
};
pub use github::{parse_github_url, GitHubRepo};
pub use site::SiteContext;

use url::Url;

/// Returns the authority (host plus explicit port) of a parsed URL
///
/// # Examples
///
/// ```
/// use doc_harvest::url::authority;
/// use url::Url;
///
/// let url = Url::parse("http://127.0.0.1:8080/guide").unwrap();
/// assert_eq!(authority(&url), "127.0.0.1:8080");
///
/// let url = Url::parse("https://docs.example.com/guide").unwrap();
/// assert_eq!(authority(&url), "docs.example.com");
/// ```
pub fn authority(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

/// Returns the authority of a URL string, or an empty string if it does not parse
pub fn authority_of(url_str: &str) -> String {
    Url::parse(url_str)
        .map(|url| authority(&url))
        .unwrap_or_default()
}

/// Hosts serving GitHub repository pages
const GITHUB_HOSTS: &[&str] = &["github.com", "www.github.com"];

/// Returns true if the authority belongs to the GitHub web host
pub fn is_github_domain(domain: &str) -> bool {
    let host = domain.split(':').next().unwrap_or_default();
    GITHUB_HOSTS.contains(&host)
}
