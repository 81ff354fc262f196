use serde::Deserialize;

/// Main configuration structure for doc-harvest
///
/// Every section is optional; missing sections and keys fall back to the
/// defaults below, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub github: GitHubConfig,
}

/// Traversal behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of visited pages (0 means unbounded)
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Politeness delay after every successful extraction (milliseconds)
    #[serde(rename = "delay-ms", default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Persist the page collection every N successful extractions (0 disables)
    #[serde(rename = "checkpoint-interval", default = "default_checkpoint_interval")]
    pub checkpoint_interval: usize,

    /// Remove images from extracted content instead of absolutizing them
    #[serde(rename = "strip-images", default)]
    pub strip_images: bool,

    /// Reload the previous session's JSON output before crawling
    #[serde(default)]
    pub incremental: bool,
}

impl CrawlerConfig {
    /// Returns the page limit, or `None` when the crawl is unbounded
    pub fn page_limit(&self) -> Option<usize> {
        if self.max_pages == 0 {
            None
        } else {
            Some(self.max_pages)
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            delay_ms: default_delay_ms(),
            checkpoint_interval: default_checkpoint_interval(),
            strip_images: false,
            incremental: false,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of retries for transient failures
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Base delay for exponential backoff between retries (milliseconds)
    #[serde(rename = "backoff-ms", default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Enables the on-disk response cache with this time-to-live (seconds)
    #[serde(rename = "cache-ttl-secs", default)]
    pub cache_ttl_secs: Option<u64>,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            backoff_ms: default_backoff_ms(),
            cache_ttl_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Artifact output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Base directory for all artifacts
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// Which artifacts to produce
    #[serde(default)]
    pub format: OutputFormat,

    /// External program (and arguments) that reads HTML on stdin and writes PDF on stdout
    #[serde(rename = "pdf-command", default = "default_pdf_command")]
    pub pdf_command: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            format: OutputFormat::default(),
            pdf_command: default_pdf_command(),
        }
    }
}

/// Artifact formats that can be produced at the end of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Pdf,
    Html,
    /// JSON and PDF
    #[default]
    Both,
}

impl OutputFormat {
    pub fn writes_json(&self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }

    /// PDF output always writes the HTML it was rendered from
    pub fn writes_html(&self) -> bool {
        matches!(self, Self::Html | Self::Pdf | Self::Both)
    }

    pub fn writes_pdf(&self) -> bool {
        matches!(self, Self::Pdf | Self::Both)
    }
}

/// CSS selector lists driving extraction and link discovery
///
/// Lists are ordered: for content selectors the first match wins.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    /// Candidate main-content regions, in priority order
    #[serde(default = "default_content_selectors")]
    pub content: Vec<String>,

    /// Navigation link selectors tried before falling back to every anchor
    #[serde(default = "default_navigation_selectors")]
    pub navigation: Vec<String>,

    /// Tag names removed from the content region
    #[serde(rename = "strip-tags", default = "default_strip_tags")]
    pub strip_tags: Vec<String>,

    /// Class names whose elements are removed from the content region
    #[serde(rename = "strip-classes", default = "default_strip_classes")]
    pub strip_classes: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            content: default_content_selectors(),
            navigation: default_navigation_selectors(),
            strip_tags: default_strip_tags(),
            strip_classes: default_strip_classes(),
        }
    }
}

/// GitHub contents API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    /// Base URL of the REST API
    #[serde(rename = "api-base", default = "default_github_api_base")]
    pub api_base: String,

    /// Personal access token sent as a bearer token
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: default_github_api_base(),
            token: None,
        }
    }
}

fn default_max_pages() -> usize {
    100
}

fn default_delay_ms() -> u64 {
    500
}

fn default_checkpoint_interval() -> usize {
    10
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_retries() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    500
}

fn default_user_agent() -> String {
    format!("doc-harvest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_output_dir() -> String {
    "harvested_docs".to_string()
}

fn default_pdf_command() -> Vec<String> {
    ["wkhtmltopdf", "--quiet", "--encoding", "utf-8", "-", "-"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_content_selectors() -> Vec<String> {
    [
        "main",
        ".markdown-body",
        ".content",
        "article",
        ".docusaurus-content",
        ".gitbook-content",
        ".md-content",
        "[role=\"main\"]",
        "#readme",
        ".Box-body",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_navigation_selectors() -> Vec<String> {
    [
        "nav a[href]",
        ".sidebar a[href]",
        ".navigation a[href]",
        ".toc a[href]",
        ".menu a[href]",
        ".js-navigation-item a[href]",
        ".Box a[href]",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_strip_tags() -> Vec<String> {
    ["nav", "footer", "aside", "header"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_strip_classes() -> Vec<String> {
    ["sidebar", "navigation", "nav", "toc", "menu"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_github_api_base() -> String {
    "https://api.github.com".to_string()
}
