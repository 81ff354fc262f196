//! Markdown harvesting from a GitHub repository

use crate::config::{Config, CrawlerConfig};
use crate::crawler::{CrawlOutcome, CrawlStats, FetchResult, HttpFetcher};
use crate::github::markdown::fragment_text;
use crate::github::{markdown_title, markdown_to_html, ContentsClient, GitHubError, MarkdownFile};
use crate::output::ArtifactLayout;
use crate::state::CrawlState;
use crate::storage::{write_atomic, JsonPageStore, PageRecord, PageStore};
use crate::url::{parse_github_url, GitHubRepo};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Harvests a repository's markdown docs into page records
pub struct GitHubHarvester {
    repo: GitHubRepo,
    crawler: CrawlerConfig,
    api_base: String,
    token: Option<String>,
    fetcher: HttpFetcher,
    layout: ArtifactLayout,
    store: JsonPageStore,
}

impl GitHubHarvester {
    /// Creates a harvester for a GitHub repository URL
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration (`[github]` supplies the API base and token)
    /// * `repo_url` - e.g. `https://github.com/owner/repo/tree/main/docs`
    /// * `cancel` - Token that stops the run at the next safe point
    ///
    /// # Returns
    ///
    /// * `Ok(GitHubHarvester)` - Ready to run
    /// * `Err(HarvestError)` - Not a GitHub URL, or client setup failed
    pub fn new(config: &Config, repo_url: &str, cancel: CancellationToken) -> crate::Result<Self> {
        let repo = parse_github_url(repo_url)?;
        let layout = ArtifactLayout::for_repo(Path::new(&config.output.dir), &repo);
        let store = JsonPageStore::new(layout.json_path());
        let fetcher = HttpFetcher::from_config(config, cancel)?;

        Ok(Self {
            repo,
            crawler: config.crawler.clone(),
            api_base: config.github.api_base.clone(),
            token: config.github.token.clone().filter(|t| !t.is_empty()),
            fetcher,
            layout,
            store,
        })
    }

    pub fn repo(&self) -> &GitHubRepo {
        &self.repo
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Title used for the HTML and PDF documents
    pub fn document_title(&self) -> String {
        format!("{} Documentation", self.repo.slug())
    }

    /// Lists, downloads and converts the repository's markdown files
    ///
    /// Raw markdown is kept under the project's `markdown/` directory. In
    /// incremental mode files whose page URL is already in the previous JSON
    /// collection are not downloaded again.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOutcome)` - The run reached a terminal state
    /// * `Err(HarvestError)` - The docs listing failed or the output directory could not be created
    pub async fn run(&self) -> crate::Result<CrawlOutcome> {
        let cancel = self.fetcher.cancel_token().clone();
        let mut stats = CrawlStats::default();
        let (mut pages, mut seen) = self.load_previous();
        stats.pages_resumed = pages.len();

        tracing::info!("Fetching markdown files from {}", self.repo.slug());

        let client = ContentsClient::new(&self.fetcher, &self.api_base, self.token.clone());
        let files = match client.find_docs(&self.repo).await {
            Ok((_, files)) => files,
            Err(GitHubError::Cancelled) => {
                return Ok(CrawlOutcome {
                    state: CrawlState::Cancelled,
                    pages,
                    stats,
                })
            }
            Err(e) => return Err(e.into()),
        };

        if files.is_empty() {
            tracing::warn!("No markdown files found");
        } else {
            tracing::info!("Found {} markdown files", files.len());
        }

        let markdown_dir = self.layout.markdown_dir();
        std::fs::create_dir_all(&markdown_dir)?;

        let total = files.len();
        let mut state = CrawlState::Completed;
        let mut since_checkpoint = 0;

        for (idx, file) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                state = CrawlState::Cancelled;
                break;
            }
            if self.crawler.page_limit().is_some_and(|limit| pages.len() >= limit) {
                state = CrawlState::LimitReached;
                break;
            }
            if seen.contains(file.page_url()) {
                tracing::debug!("Already harvested {}", file.path);
                continue;
            }

            tracing::info!("Downloading [{}/{}]: {}", idx + 1, total, file.name);

            let markdown = match self.fetcher.fetch(&file.download_url).await {
                FetchResult::Success { body, .. } => body,
                FetchResult::Cancelled => {
                    state = CrawlState::Cancelled;
                    break;
                }
                FetchResult::HttpError { status_code, .. } => {
                    tracing::warn!("Error downloading {}: HTTP {}", file.name, status_code);
                    stats.fetch_failures += 1;
                    continue;
                }
                FetchResult::NetworkError { error } => {
                    tracing::warn!("Error downloading {}: {}", file.name, error);
                    stats.fetch_failures += 1;
                    continue;
                }
            };
            stats.pages_fetched += 1;

            if let Err(e) = save_markdown(&markdown_dir, file, &markdown) {
                tracing::warn!("Failed to save raw markdown for {}: {}", file.path, e);
            }

            let page = markdown_page(file, &markdown);
            seen.insert(page.url.clone());
            pages.push(page);
            stats.pages_extracted += 1;

            since_checkpoint += 1;
            if self.crawler.checkpoint_interval > 0 && since_checkpoint >= self.crawler.checkpoint_interval {
                tracing::info!("Auto-saving progress ({} files downloaded)...", pages.len());
                match self.store.save_pages(&pages) {
                    Ok(()) => stats.checkpoints += 1,
                    Err(e) => tracing::warn!("Checkpoint to {} failed: {}", self.store.describe(), e),
                }
                since_checkpoint = 0;
            }

            if self.crawler.delay_ms > 0 {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        state = CrawlState::Cancelled;
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_millis(self.crawler.delay_ms)) => {}
                }
            }
        }

        tracing::info!("Downloaded {} files ({})", stats.pages_extracted, state);

        Ok(CrawlOutcome {
            state,
            pages,
            stats,
        })
    }

    /// Loads the previous collection in incremental mode, dropping duplicate URLs
    fn load_previous(&self) -> (Vec<PageRecord>, HashSet<String>) {
        let mut pages = Vec::new();
        let mut seen = HashSet::new();

        if !self.crawler.incremental {
            return (pages, seen);
        }

        match self.store.load_pages() {
            Ok(loaded) => {
                for page in loaded {
                    if seen.insert(page.url.clone()) {
                        pages.push(page);
                    }
                }
                tracing::info!(
                    "Loaded {} existing pages from {} (incremental mode)",
                    pages.len(),
                    self.store.describe()
                );
            }
            Err(e) => tracing::warn!(
                "Failed to load existing pages from {}: {}. Starting fresh.",
                self.store.describe(),
                e
            ),
        }

        (pages, seen)
    }
}

/// Builds the page record for a downloaded markdown file
fn markdown_page(file: &MarkdownFile, markdown: &str) -> PageRecord {
    let content = markdown_to_html(markdown);
    let title = markdown_title(&content).unwrap_or_else(|| file.fallback_title());
    let text = fragment_text(&content);

    PageRecord {
        url: file.page_url().to_string(),
        title,
        content,
        text,
    }
}

/// Writes raw markdown under `markdown_dir`, mirroring the repository path
fn save_markdown(markdown_dir: &Path, file: &MarkdownFile, markdown: &str) -> std::io::Result<()> {
    let relative: PathBuf = Path::new(&file.path)
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();

    let target = if relative.as_os_str().is_empty() {
        markdown_dir.join(&file.name)
    } else {
        markdown_dir.join(relative)
    };

    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    write_atomic(&target, markdown.as_bytes())
}
