//! Integration tests for GitHub markdown harvesting
//!
//! A wiremock server stands in for both the contents API and the raw
//! download host.

use doc_harvest::config::{Config, OutputFormat};
use doc_harvest::github::{GitHubError, GitHubHarvester};
use doc_harvest::output::write_outputs;
use doc_harvest::storage::{JsonPageStore, PageStore};
use doc_harvest::{CrawlState, HarvestError};
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_config(dir: &Path, api_base: &str) -> Config {
    let mut config = Config::default();
    config.output.dir = dir.display().to_string();
    config.output.format = OutputFormat::Html;
    config.crawler.delay_ms = 0;
    config.http.backoff_ms = 1;
    config.github.api_base = api_base.to_string();
    config
}

fn file_entry(server: &MockServer, repo_path: &str) -> Value {
    let name = repo_path.rsplit('/').next().unwrap_or(repo_path);
    json!({
        "name": name,
        "path": repo_path,
        "type": "file",
        "download_url": format!("{}/raw/{}", server.uri(), repo_path),
        "html_url": format!("https://github.com/o/r/blob/main/{}", repo_path),
    })
}

fn dir_entry(repo_path: &str) -> Value {
    let name = repo_path.rsplit('/').next().unwrap_or(repo_path);
    json!({
        "name": name,
        "path": repo_path,
        "type": "dir",
        "download_url": null,
        "html_url": format!("https://github.com/o/r/tree/main/{}", repo_path),
    })
}

async fn mount_listing(server: &MockServer, contents_path: &str, listing: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/o/r/contents{}", contents_path)))
        .and(query_param("ref", "main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing))
        .mount(server)
        .await;
}

async fn mount_raw(server: &MockServer, repo_path: &str, markdown: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/raw/{}", repo_path)))
        .respond_with(ResponseTemplate::new(200).set_body_string(markdown))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_harvest_docs_tree() {
    let server = MockServer::start().await;

    mount_listing(
        &server,
        "/docs",
        json!([
            file_entry(&server, "docs/intro.md"),
            dir_entry("docs/guide"),
            file_entry(&server, "docs/logo.png"),
        ]),
    )
    .await;
    mount_listing(
        &server,
        "/docs/guide",
        json!([file_entry(&server, "docs/guide/setup-steps.md")]),
    )
    .await;
    mount_raw(&server, "docs/intro.md", "# Introduction\n\nWelcome to the project.\n").await;
    mount_raw(&server, "docs/guide/setup-steps.md", "Install it first.\n").await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &server.uri());

    let harvester =
        GitHubHarvester::new(&config, "https://github.com/o/r", CancellationToken::new()).unwrap();
    let outcome = harvester.run().await.unwrap();

    assert_eq!(outcome.state, CrawlState::Completed);
    assert_eq!(outcome.pages.len(), 2);

    let intro = &outcome.pages[0];
    assert_eq!(intro.url, "https://github.com/o/r/blob/main/docs/intro.md");
    assert_eq!(intro.title, "Introduction");
    assert!(intro.content.contains("<h1>Introduction</h1>"));
    assert!(intro.text.contains("Welcome to the project."));

    let setup = &outcome.pages[1];
    assert_eq!(setup.title, "setup-steps");

    let markdown_dir = harvester.layout().markdown_dir();
    assert_eq!(
        std::fs::read_to_string(markdown_dir.join("docs/intro.md")).unwrap(),
        "# Introduction\n\nWelcome to the project.\n"
    );
    assert!(markdown_dir.join("docs/guide/setup-steps.md").exists());

    let report = write_outputs(
        &outcome.pages,
        harvester.layout(),
        &config.output,
        &harvester.document_title(),
    )
    .await
    .unwrap();

    let html = std::fs::read_to_string(report.html.unwrap()).unwrap();
    assert!(html.contains("<title>o/r Documentation</title>"));
    assert!(html.contains("Introduction"));
    assert!(report.json.is_none());
}

#[tokio::test]
async fn test_token_sent_as_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/contents/docs"))
        .and(header("authorization", "Bearer secret-token"))
        .and(header("accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path(), &server.uri());
    config.github.token = Some("secret-token".to_string());

    let harvester =
        GitHubHarvester::new(&config, "https://github.com/o/r", CancellationToken::new()).unwrap();
    let outcome = harvester.run().await.unwrap();

    assert_eq!(outcome.state, CrawlState::Completed);
    assert!(outcome.pages.is_empty());
}

#[tokio::test]
async fn test_falls_back_to_documentation_dir() {
    let server = MockServer::start().await;

    // `docs` and `doc` are unmounted and answer 404
    mount_listing(
        &server,
        "/documentation",
        json!([file_entry(&server, "documentation/usage.md")]),
    )
    .await;
    mount_raw(&server, "documentation/usage.md", "# Usage\n").await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &server.uri());

    let harvester =
        GitHubHarvester::new(&config, "https://github.com/o/r", CancellationToken::new()).unwrap();
    let outcome = harvester.run().await.unwrap();

    assert_eq!(outcome.pages.len(), 1);
    assert_eq!(outcome.pages[0].title, "Usage");
}

#[tokio::test]
async fn test_falls_back_to_repository_root() {
    let server = MockServer::start().await;

    mount_listing(&server, "", json!([file_entry(&server, "README.md")])).await;
    mount_raw(&server, "README.md", "# Readme\n").await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &server.uri());

    let harvester =
        GitHubHarvester::new(&config, "https://github.com/o/r", CancellationToken::new()).unwrap();
    let outcome = harvester.run().await.unwrap();

    assert_eq!(outcome.pages.len(), 1);
    assert_eq!(outcome.pages[0].url, "https://github.com/o/r/blob/main/README.md");
}

#[tokio::test]
async fn test_explicit_path_does_not_fall_back() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/contents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &server.uri());

    let harvester = GitHubHarvester::new(
        &config,
        "https://github.com/o/r/tree/main/site/guides",
        CancellationToken::new(),
    )
    .unwrap();
    let result = harvester.run().await;

    assert!(matches!(
        result,
        Err(HarvestError::GitHub(GitHubError::Http { status: 404, .. }))
    ));
}

#[tokio::test]
async fn test_single_file_listing() {
    let server = MockServer::start().await;

    mount_listing(&server, "/docs/only.md", file_entry(&server, "docs/only.md")).await;
    mount_raw(&server, "docs/only.md", "# Only\n").await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &server.uri());

    let harvester = GitHubHarvester::new(
        &config,
        "https://github.com/o/r/tree/main/docs/only.md",
        CancellationToken::new(),
    )
    .unwrap();
    let outcome = harvester.run().await.unwrap();

    assert_eq!(outcome.pages.len(), 1);
    assert_eq!(outcome.pages[0].title, "Only");
}

#[tokio::test]
async fn test_failed_download_is_skipped() {
    let server = MockServer::start().await;

    mount_listing(
        &server,
        "/docs",
        json!([
            file_entry(&server, "docs/broken.md"),
            file_entry(&server, "docs/fine.md"),
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/raw/docs/broken.md"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    mount_raw(&server, "docs/fine.md", "# Fine\n").await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &server.uri());

    let harvester =
        GitHubHarvester::new(&config, "https://github.com/o/r", CancellationToken::new()).unwrap();
    let outcome = harvester.run().await.unwrap();

    assert_eq!(outcome.pages.len(), 1);
    assert_eq!(outcome.stats.fetch_failures, 1);
}

#[tokio::test]
async fn test_page_limit_applies() {
    let server = MockServer::start().await;

    mount_listing(
        &server,
        "/docs",
        json!([
            file_entry(&server, "docs/a.md"),
            file_entry(&server, "docs/b.md"),
        ]),
    )
    .await;
    mount_raw(&server, "docs/a.md", "# A\n").await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path(), &server.uri());
    config.crawler.max_pages = 1;

    let harvester =
        GitHubHarvester::new(&config, "https://github.com/o/r", CancellationToken::new()).unwrap();
    let outcome = harvester.run().await.unwrap();

    assert_eq!(outcome.state, CrawlState::LimitReached);
    assert_eq!(outcome.pages.len(), 1);
}

#[tokio::test]
async fn test_incremental_skips_downloaded_files() {
    let server = MockServer::start().await;

    mount_listing(
        &server,
        "/docs",
        json!([
            file_entry(&server, "docs/old.md"),
            file_entry(&server, "docs/new.md"),
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/raw/docs/old.md"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Old\n"))
        .expect(0)
        .mount(&server)
        .await;
    mount_raw(&server, "docs/new.md", "# New\n").await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path(), &server.uri());
    config.crawler.incremental = true;

    let harvester =
        GitHubHarvester::new(&config, "https://github.com/o/r", CancellationToken::new()).unwrap();

    let previous = doc_harvest::PageRecord {
        url: "https://github.com/o/r/blob/main/docs/old.md".to_string(),
        title: "Old".to_string(),
        content: "<h1>Old</h1>\n".to_string(),
        text: "Old".to_string(),
    };
    harvester.layout().ensure_dir().unwrap();
    JsonPageStore::new(harvester.layout().json_path())
        .save_pages(&[previous.clone()])
        .unwrap();

    let outcome = harvester.run().await.unwrap();

    assert_eq!(outcome.stats.pages_resumed, 1);
    assert_eq!(outcome.pages.len(), 2);
    assert_eq!(outcome.pages[0], previous);
    assert_eq!(outcome.pages[1].title, "New");
}

#[tokio::test]
async fn test_cancelled_before_listing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &server.uri());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let harvester = GitHubHarvester::new(&config, "https://github.com/o/r", cancel).unwrap();
    let outcome = harvester.run().await.unwrap();

    assert_eq!(outcome.state, CrawlState::Cancelled);
}
