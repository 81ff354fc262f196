//! GitHub contents API client
//!
//! `GET {api_base}/repos/{owner}/{repo}/contents/{path}?ref={branch}` returns
//! either an array of entries (a directory) or a single entry (a file).

use crate::crawler::{FetchResult, HttpFetcher};
use crate::github::{GitHubError, GitHubResult};
use crate::url::GitHubRepo;
use serde::Deserialize;
use std::collections::VecDeque;

/// Media type requested from the contents API
pub const GITHUB_JSON: &str = "application/vnd.github+json";

/// Docs directories tried, in order, when the default one does not exist
///
/// The empty path is the repository root.
pub const FALLBACK_DOCS_PATHS: &[&str] = &["doc", "documentation", ""];

/// Kind of a contents API entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}

/// One entry of a contents API listing
#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub download_url: Option<String>,
    pub html_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Listing {
    Directory(Vec<ContentEntry>),
    File(ContentEntry),
}

/// A markdown file found in the docs tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownFile {
    /// File name, e.g. `intro.md`
    pub name: String,

    /// Path from the repository root
    pub path: String,

    /// Raw content URL
    pub download_url: String,

    /// Browser URL, when the API provides one
    pub html_url: Option<String>,
}

impl MarkdownFile {
    /// URL identifying the page in harvested records
    pub fn page_url(&self) -> &str {
        self.html_url.as_deref().unwrap_or(&self.download_url)
    }

    /// Title used when the markdown has no top-level heading
    pub fn fallback_title(&self) -> String {
        self.name.replace(".md", "")
    }
}

/// Lists markdown files through the contents API
pub struct ContentsClient<'a> {
    fetcher: &'a HttpFetcher,
    api_base: String,
    token: Option<String>,
}

impl<'a> ContentsClient<'a> {
    /// Creates a client
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Shared HTTP fetcher (retries, cache, cancellation)
    /// * `api_base` - API root, `https://api.github.com` unless configured
    /// * `token` - Optional token sent as `Authorization: Bearer`
    pub fn new(fetcher: &'a HttpFetcher, api_base: &str, token: Option<String>) -> Self {
        Self {
            fetcher,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Builds the contents URL for a path on the repository's branch
    pub fn contents_url(&self, repo: &GitHubRepo, path: &str) -> String {
        let path = path.trim_matches('/');
        let mut url = format!("{}/repos/{}/{}/contents", self.api_base, repo.owner, repo.repo);
        if !path.is_empty() {
            url.push('/');
            url.push_str(path);
        }
        format!("{}?ref={}", url, repo.branch)
    }

    /// Lists one path
    pub async fn list(&self, repo: &GitHubRepo, path: &str) -> GitHubResult<Vec<ContentEntry>> {
        let url = self.contents_url(repo, path);

        let body = match self
            .fetcher
            .fetch_api(&url, GITHUB_JSON, self.token.as_deref())
            .await
        {
            FetchResult::Success { body, .. } => body,
            FetchResult::HttpError { status_code, .. } => {
                return Err(GitHubError::Http {
                    url,
                    status: status_code,
                })
            }
            FetchResult::NetworkError { error } => {
                return Err(GitHubError::Network {
                    url,
                    message: error,
                })
            }
            FetchResult::Cancelled => return Err(GitHubError::Cancelled),
        };

        match serde_json::from_str::<Listing>(&body) {
            Ok(Listing::Directory(entries)) => Ok(entries),
            Ok(Listing::File(entry)) => Ok(vec![entry]),
            Err(source) => Err(GitHubError::Decode { url, source }),
        }
    }

    /// Collects every markdown file below a path
    ///
    /// Directories are walked breadth-first. A failure listing the starting
    /// path is returned; failures in subdirectories are logged and skipped.
    pub async fn list_markdown_files(
        &self,
        repo: &GitHubRepo,
        root: &str,
    ) -> GitHubResult<Vec<MarkdownFile>> {
        let mut files = Vec::new();
        let mut pending = VecDeque::from([root.to_string()]);
        let mut is_root = true;

        while let Some(path) = pending.pop_front() {
            let entries = match self.list(repo, &path).await {
                Ok(entries) => entries,
                Err(e) if is_root || matches!(e, GitHubError::Cancelled) => return Err(e),
                Err(e) => {
                    tracing::warn!("Skipping directory {}: {}", path, e);
                    continue;
                }
            };
            is_root = false;

            for entry in entries {
                match entry.kind {
                    EntryKind::File if entry.name.ends_with(".md") => match entry.download_url {
                        Some(download_url) => files.push(MarkdownFile {
                            name: entry.name,
                            path: entry.path,
                            download_url,
                            html_url: entry.html_url,
                        }),
                        None => tracing::debug!("No download URL for {}", entry.path),
                    },
                    EntryKind::Dir => pending.push_back(entry.path),
                    _ => {}
                }
            }
        }

        Ok(files)
    }

    /// Finds the repository's markdown documentation
    ///
    /// Lists the repository's docs path. When that path was not given in
    /// the URL and does not exist, `doc`, `documentation` and the repository
    /// root are tried in turn.
    ///
    /// # Returns
    ///
    /// The docs path that was used and the markdown files under it
    pub async fn find_docs(&self, repo: &GitHubRepo) -> GitHubResult<(String, Vec<MarkdownFile>)> {
        match self.list_markdown_files(repo, &repo.docs_path).await {
            Ok(files) => return Ok((repo.docs_path.clone(), files)),
            Err(e) if repo.explicit_path || !e.is_not_found() => return Err(e),
            Err(_) => {
                tracing::info!("No '{}' directory in {}, trying fallbacks", repo.docs_path, repo.slug());
            }
        }

        let mut last_error = None;
        for path in FALLBACK_DOCS_PATHS {
            match self.list_markdown_files(repo, path).await {
                Ok(files) => {
                    let shown = if path.is_empty() { "<root>" } else { path };
                    tracing::info!("Using docs path {}", shown);
                    return Ok((path.to_string(), files));
                }
                Err(e) if e.is_not_found() => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(GitHubError::Http {
            url: self.contents_url(repo, ""),
            status: 404,
        }))
    }
}
