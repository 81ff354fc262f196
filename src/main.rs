//! doc-harvest main entry point
//!
//! This is the command-line interface for the documentation harvester.

use anyhow::Context;
use clap::Parser;
use doc_harvest::config::{load_config_with_hash, validate, Config, OutputFormat};
use doc_harvest::crawler::Harvester;
use doc_harvest::github::GitHubHarvester;
use doc_harvest::output::{write_outputs, ArtifactLayout, OutputReport};
use doc_harvest::url::{parse_github_url, SiteContext};
use doc_harvest::CrawlOutcome;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// doc-harvest: compile a documentation site into one document
///
/// doc-harvest crawls a documentation website starting at URL, extracts the
/// main content of every page and writes the collection as JSON, HTML
/// and/or PDF. With --github it reads a repository's markdown docs through
/// the GitHub contents API instead.
#[derive(Parser, Debug)]
#[command(name = "doc-harvest")]
#[command(version)]
#[command(about = "Harvest documentation sites into a single document", long_about = None)]
struct Cli {
    /// Documentation root URL (or GitHub repository URL with --github)
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of pages to harvest
    #[arg(long, value_name = "N", conflicts_with = "unbounded")]
    max_pages: Option<usize>,

    /// Harvest without a page limit
    #[arg(long)]
    unbounded: bool,

    /// Base directory for output artifacts
    #[arg(long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Artifacts to produce
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Remove images from extracted content
    #[arg(long)]
    no_images: bool,

    /// Reuse the previous run's JSON and only fetch new pages
    #[arg(long)]
    incremental: bool,

    /// Cache HTTP responses on disk for this many seconds
    #[arg(long, value_name = "SECS")]
    cache_ttl: Option<u64>,

    /// Fetch markdown through the GitHub contents API instead of crawling
    #[arg(long)]
    github: bool,

    /// GitHub token for API requests
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Validate config and URL, print the plan and exit without network access
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Layers command-line flags over the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(max_pages) = self.max_pages {
            config.crawler.max_pages = max_pages;
        }
        if self.unbounded {
            config.crawler.max_pages = 0;
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if self.no_images {
            config.crawler.strip_images = true;
        }
        if self.incremental {
            config.crawler.incremental = true;
        }
        if let Some(ttl) = self.cache_ttl {
            config.http.cache_ttl_secs = Some(ttl);
        }
        if let Some(token) = &self.github_token {
            config.github.token = Some(token.clone());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => load_configuration(path)?,
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        return handle_dry_run(&cli, &config);
    }

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    if cli.github {
        handle_github(&cli.url, &config, cancel).await
    } else {
        handle_crawl(&cli.url, &config, cancel).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("doc_harvest=info,warn"),
            1 => EnvFilter::new("doc_harvest=debug,info"),
            2 => EnvFilter::new("doc_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn load_configuration(path: &Path) -> anyhow::Result<Config> {
    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Cancels the run on Ctrl-C; a second Ctrl-C exits immediately
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!("Interrupted, saving collected pages (press Ctrl-C again to abort)");
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}

/// Handles the --dry-run mode: validates the URL and shows what would be harvested
fn handle_dry_run(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    println!("=== doc-harvest Dry Run ===\n");

    let output_dir = Path::new(&config.output.dir);
    let layout = if cli.github {
        let repo = parse_github_url(&cli.url)?;
        println!("GitHub Repository:");
        println!("  Repository: {}", repo.slug());
        println!("  Branch: {}", repo.branch);
        println!(
            "  Docs path: {}{}",
            repo.docs_path,
            if repo.explicit_path { "" } else { " (falls back to doc, documentation, root)" }
        );
        println!("  API base: {}", config.github.api_base);
        println!(
            "  Token: {}",
            if config.github.token.is_some() { "set" } else { "not set" }
        );
        ArtifactLayout::for_repo(output_dir, &repo)
    } else {
        let site = SiteContext::from_seed(&cli.url)?;
        println!("Site:");
        println!("  Seed: {}", site.base_url);
        println!("  Domain: {}", site.domain);
        if let Some(restriction) = &site.github_path_restriction {
            println!("  Path restriction: {}", restriction);
        }
        ArtifactLayout::for_site(output_dir, &site)
    };

    println!("\nCrawler Configuration:");
    match config.crawler.page_limit() {
        Some(limit) => println!("  Max pages: {}", limit),
        None => println!("  Max pages: unbounded"),
    }
    println!("  Delay: {}ms", config.crawler.delay_ms);
    println!("  Checkpoint interval: {}", config.crawler.checkpoint_interval);
    println!("  Strip images: {}", config.crawler.strip_images);
    println!("  Incremental: {}", config.crawler.incremental);

    println!("\nHTTP:");
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!("  Retries: {} (backoff {}ms)", config.http.retries, config.http.backoff_ms);
    match config.http.cache_ttl_secs {
        Some(ttl) => println!("  Cache TTL: {}s", ttl),
        None => println!("  Cache: disabled"),
    }
    println!("  User agent: {}", config.http.user_agent);

    println!("\nOutput:");
    println!("  Directory: {}", layout.dir().display());
    if config.output.format.writes_json() {
        println!("  JSON: {}", layout.json_path().display());
    }
    if config.output.format.writes_html() {
        println!("  HTML: {}", layout.html_path().display());
    }
    if config.output.format.writes_pdf() {
        println!("  PDF: {} (via {})", layout.pdf_path().display(), config.output.pdf_command.join(" "));
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main website crawl
async fn handle_crawl(url: &str, config: &Config, cancel: CancellationToken) -> anyhow::Result<()> {
    let harvester = Harvester::new(config, url, cancel)?;
    let outcome = harvester.run().await;
    let report = write_outputs(
        &outcome.pages,
        harvester.layout(),
        &config.output,
        &harvester.document_title(),
    )
    .await?;

    print_summary(&outcome, &report);
    Ok(())
}

/// Handles the --github mode
async fn handle_github(url: &str, config: &Config, cancel: CancellationToken) -> anyhow::Result<()> {
    let harvester = GitHubHarvester::new(config, url, cancel)?;
    let outcome = harvester.run().await?;
    let report = write_outputs(
        &outcome.pages,
        harvester.layout(),
        &config.output,
        &harvester.document_title(),
    )
    .await?;

    print_summary(&outcome, &report);
    Ok(())
}

fn print_summary(outcome: &CrawlOutcome, report: &OutputReport) {
    let stats = &outcome.stats;

    println!("\n=== Harvest Summary ===");
    println!("Result: {}", outcome.state);
    println!("Pages collected: {}", outcome.pages.len());
    if stats.pages_resumed > 0 {
        println!("  Reused from previous run: {}", stats.pages_resumed);
    }
    println!("  Fetched this run: {}", stats.pages_fetched);
    if stats.fetch_failures + stats.extract_failures > 0 {
        println!(
            "  Skipped: {} fetch failures, {} extraction failures",
            stats.fetch_failures, stats.extract_failures
        );
    }

    if let Some(path) = &report.json {
        println!("JSON: {}", path.display());
    }
    if let Some(path) = &report.html {
        println!("HTML: {}", path.display());
    }
    if let Some(path) = &report.pdf {
        println!("PDF: {}", path.display());
    }
    if let Some(reason) = &report.pdf_error {
        println!("PDF not generated ({}); use the HTML file instead", reason);
    }
}
