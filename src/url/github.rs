//! GitHub repository URL parsing

use crate::url::is_github_domain;
use crate::{UrlError, UrlResult};
use url::Url;

const DEFAULT_BRANCH: &str = "main";
const DEFAULT_DOCS_PATH: &str = "docs";

/// A GitHub repository location parsed from a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubRepo {
    pub owner: String,
    pub repo: String,

    /// Branch to read from (`main` unless the URL names one)
    pub branch: String,

    /// Directory holding the docs (`docs` unless the URL names one)
    pub docs_path: String,

    /// Whether `docs_path` came from the URL rather than the default
    pub explicit_path: bool,
}

impl GitHubRepo {
    /// Returns `owner/repo`
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Name of the per-repository output directory
    pub fn project_dir_name(&self) -> String {
        format!("github_docs_{}_{}", self.owner, self.repo)
    }

    /// File stem shared by the JSON, HTML and PDF artifacts
    pub fn artifact_stem(&self) -> String {
        format!("{}_{}_docs", self.owner, self.repo)
    }
}

/// Parses a GitHub repository URL
///
/// # Supported Forms
///
/// - `https://github.com/owner/repo`
/// - `https://github.com/owner/repo/tree/branch`
/// - `https://github.com/owner/repo/tree/branch/path/to/docs`
/// - `https://github.com/owner/repo/path/to/docs`
///
/// # Returns
///
/// * `Ok(GitHubRepo)` - The parsed repository location
/// * `Err(UrlError)` - Not a GitHub URL, or fewer than two path segments
///
/// # Examples
///
/// ```
/// use doc_harvest::url::parse_github_url;
///
/// let repo = parse_github_url("https://github.com/ollama/ollama/tree/main/docs/api").unwrap();
/// assert_eq!(repo.owner, "ollama");
/// assert_eq!(repo.branch, "main");
/// assert_eq!(repo.docs_path, "docs/api");
/// ```
pub fn parse_github_url(url: &str) -> UrlResult<GitHubRepo> {
    let trimmed = url.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(format!("{}: {}", url, e)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            parsed.scheme()
        )));
    }

    if !parsed.host_str().is_some_and(is_github_domain) {
        return Err(UrlError::NotGitHub(url.to_string()));
    }

    let parts: Vec<&str> = parsed
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    if parts.len() < 2 {
        return Err(UrlError::InvalidGitHubPath(url.to_string()));
    }

    let owner = parts[0].to_string();
    let repo = parts[1].trim_end_matches(".git").to_string();
    let mut branch = DEFAULT_BRANCH.to_string();
    let mut docs_path = DEFAULT_DOCS_PATH.to_string();
    let mut explicit_path = false;

    if parts.len() >= 4 && parts[2] == "tree" {
        branch = parts[3].to_string();
        if parts.len() > 4 {
            docs_path = parts[4..].join("/");
            explicit_path = true;
        }
    } else if parts.len() > 2 {
        docs_path = parts[2..].join("/");
        explicit_path = true;
    }

    Ok(GitHubRepo {
        owner,
        repo,
        branch,
        docs_path,
        explicit_path,
    })
}
