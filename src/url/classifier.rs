//! Documentation URL classifier
//!
//! The classifier is the scope boundary of a crawl: every URL is checked
//! against it before being queued and again before being fetched.

use crate::url::{authority_of, SiteContext};

/// Suffixes of downloads that are never documentation pages
pub const SKIP_EXTENSIONS: &[&str] = &[".pdf", ".zip", ".tar.gz"];

/// Path fragments of non-content areas
pub const SKIP_PATH_PATTERNS: &[&str] = &["/api/", "/images/", "/assets/", "/static/", "/_next/"];

/// GitHub feature areas that are never part of a repository's docs
pub const GITHUB_SKIP_PATTERNS: &[&str] = &[
    "/issues/",
    "/pull/",
    "/releases/",
    "/actions/",
    "/security/",
    "/pulse/",
    "/graphs/",
    "/wiki/",
    "/projects/",
    "/settings/",
];

/// Decides whether a URL is a documentation page within the crawl scope
///
/// # Rules
///
/// Applied in order; the first failing rule rejects:
///
/// 1. The URL's authority must equal the site domain exactly
/// 2. In-page anchors and `.pdf`/`.zip`/`.tar.gz` downloads are rejected
/// 3. URLs containing `/api/`, `/images/`, `/assets/`, `/static/`, `/_next/` are rejected
/// 4. On GitHub:
///    - feature areas (issues, pulls, releases, ...) are rejected
///    - with a path restriction, only `blob` URLs under that branch and path pass
///    - `blob` URLs must end in `.md`
///    - `tree` URLs pass only if they contain the path restriction
///
/// # Arguments
///
/// * `url` - The absolute URL to classify
/// * `site` - The site context derived from the seed URL
///
/// # Examples
///
/// ```
/// use doc_harvest::url::{is_valid_doc_url, SiteContext};
///
/// let site = SiteContext::from_seed("https://docs.example.com").unwrap();
/// assert!(is_valid_doc_url("https://docs.example.com/guide", &site));
/// assert!(!is_valid_doc_url("https://other.com/guide", &site));
/// assert!(!is_valid_doc_url("https://docs.example.com/static/app.js", &site));
/// ```
pub fn is_valid_doc_url(url: &str, site: &SiteContext) -> bool {
    if authority_of(url) != site.domain {
        return false;
    }

    if url.starts_with('#') || SKIP_EXTENSIONS.iter().any(|ext| url.ends_with(ext)) {
        return false;
    }

    if SKIP_PATH_PATTERNS.iter().any(|pattern| url.contains(pattern)) {
        return false;
    }

    if site.is_github() {
        return is_valid_github_url(url, site.github_path_restriction.as_deref());
    }

    true
}

/// GitHub-specific rules, applied after the generic ones
fn is_valid_github_url(url: &str, restriction: Option<&str>) -> bool {
    if GITHUB_SKIP_PATTERNS.iter().any(|pattern| url.contains(pattern)) {
        return false;
    }

    if let Some(restriction) = restriction {
        if !url.starts_with(&restricted_blob_prefix(url, restriction)) {
            return false;
        }
    }

    if url.contains("/blob/") {
        url.ends_with(".md")
    } else if url.contains("/tree/") {
        restriction.is_some_and(|restriction| url.contains(restriction))
    } else {
        true
    }
}

/// Builds `https://github.com/<owner>/<repo>/blob/<branch>/<path>` for a URL
///
/// Owner and repo are taken from the URL's own path segments, branch and
/// path from the restriction.
fn restricted_blob_prefix(url: &str, restriction: &str) -> String {
    let owner_repo = url.split('/').skip(3).take(2).collect::<Vec<_>>().join("/");

    let mut parts = restriction.split('/');
    let branch = parts.next().unwrap_or_default();
    let path = parts.collect::<Vec<_>>().join("/");

    format!("https://github.com/{}/blob/{}/{}", owner_repo, branch, path)
}
