//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full harvest cycle end-to-end.

use doc_harvest::config::{Config, HttpConfig, OutputFormat};
use doc_harvest::crawler::{FetchResult, Harvester, HttpFetcher};
use doc_harvest::output::write_outputs;
use doc_harvest::storage::{JsonPageStore, PageStore, ResponseCache};
use doc_harvest::{CrawlSession, CrawlState, PageRecord};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into `dir` with no politeness delay
fn create_test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.output.dir = dir.display().to_string();
    config.output.format = OutputFormat::Json;
    config.crawler.delay_ms = 0;
    config.http.backoff_ms = 1;
    config.http.timeout_secs = 5;
    config
}

fn html_page(title: &str, nav: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(
            r#"<html><head><title>{title}</title></head><body>
            <nav>{nav}</nav>
            <main><h1>{title}</h1>{body}</main>
            <footer>Copyright</footer>
            </body></html>"#
        ))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, page: ResponseTemplate, expected: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(page)
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_harvest_two_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        html_page(
            "Welcome",
            r#"<a href="/guide/two">Two</a><a href="https://other.example/x">Elsewhere</a>"#,
            "<p>Start here.</p>",
        ),
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/guide/two",
        html_page("Second", "", "<p>More docs.</p>"),
        1,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let harvester = Harvester::new(&config, &base_url, CancellationToken::new()).unwrap();
    let outcome = harvester.run().await;

    assert_eq!(outcome.state, CrawlState::Completed);
    assert_eq!(outcome.pages.len(), 2);
    assert_eq!(outcome.pages[0].url, base_url);
    assert_eq!(outcome.pages[0].title, "Welcome");
    assert_eq!(outcome.pages[1].url, format!("{}/guide/two", base_url));
    assert_eq!(outcome.pages[1].title, "Second");
    assert!(outcome.pages[1].text.contains("More docs."));
    assert!(!outcome.pages[0].content.contains("Copyright"));
    assert!(!outcome.pages[0].content.contains("Elsewhere"));
    assert_eq!(outcome.stats.pages_fetched, 2);

    let report = write_outputs(
        &outcome.pages,
        harvester.layout(),
        &config.output,
        &harvester.document_title(),
    )
    .await
    .unwrap();

    let json_path = report.json.expect("JSON should be written");
    assert!(json_path.starts_with(dir.path()));
    let saved = JsonPageStore::new(&json_path).load_pages().unwrap();
    assert_eq!(saved, outcome.pages);
}

#[tokio::test]
async fn test_each_url_fetched_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Pages link to each other repeatedly; none link back to the seed
    mount_page(
        &mock_server,
        "/",
        html_page("Home", r#"<a href="/a">A</a><a href="/b">B</a><a href="/a">A again</a>"#, ""),
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/a",
        html_page("A", r#"<a href="/b">B</a><a href="/a">Self</a>"#, "<p>a</p>"),
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/b",
        html_page("B", r#"<a href="/a">A</a><a href="/b">Self</a>"#, "<p>b</p>"),
        1,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let harvester = Harvester::new(&config, &base_url, CancellationToken::new()).unwrap();
    let outcome = harvester.run().await;

    assert_eq!(outcome.state, CrawlState::Completed);
    assert_eq!(outcome.pages.len(), 3);
    assert_eq!(outcome.stats.pages_fetched, 3);
}

#[tokio::test]
async fn test_page_limit_stops_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        html_page("Home", r#"<a href="/one">1</a><a href="/two">2</a><a href="/three">3</a>"#, ""),
        1,
    )
    .await;
    mount_page(&mock_server, "/one", html_page("One", "", "<p>1</p>"), 1).await;
    mount_page(&mock_server, "/two", html_page("Two", "", "<p>2</p>"), 0).await;
    mount_page(&mock_server, "/three", html_page("Three", "", "<p>3</p>"), 0).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.crawler.max_pages = 2;

    let harvester = Harvester::new(&config, &base_url, CancellationToken::new()).unwrap();
    let outcome = harvester.run().await;

    assert_eq!(outcome.state, CrawlState::LimitReached);
    assert_eq!(outcome.pages.len(), 2);
}

#[tokio::test]
async fn test_circuit_breaker_trips_on_sixth_rejection() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", html_page("Home", "", "<p>never reached</p>"), 0).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let harvester = Harvester::new(&config, &base_url, CancellationToken::new()).unwrap();

    let mut seeds: Vec<String> = (0..6)
        .map(|i| format!("https://elsewhere.example/page{}", i))
        .collect();
    seeds.push(base_url.clone());

    let session = CrawlSession::with_seeds(harvester.site().clone(), seeds, None);
    let outcome = harvester.run_session(session).await;

    assert_eq!(outcome.state, CrawlState::LimitReached);
    assert!(outcome.pages.is_empty());
    assert_eq!(outcome.stats.non_doc_skipped, 6);
}

#[tokio::test]
async fn test_five_rejections_do_not_trip_breaker() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", html_page("Home", "", "<p>reached</p>"), 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let harvester = Harvester::new(&config, &base_url, CancellationToken::new()).unwrap();

    let mut seeds: Vec<String> = (0..5)
        .map(|i| format!("{}/static/file{}.js", base_url, i))
        .collect();
    seeds.push(base_url.clone());

    let session = CrawlSession::with_seeds(harvester.site().clone(), seeds, None);
    let outcome = harvester.run_session(session).await;

    assert_eq!(outcome.state, CrawlState::Completed);
    assert_eq!(outcome.pages.len(), 1);
}

#[tokio::test]
async fn test_incremental_resume_skips_known_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", html_page("Home", "", ""), 0).await;
    mount_page(&mock_server, "/guide/new", html_page("New", "", "<p>fresh</p>"), 1).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.crawler.incremental = true;

    let harvester = Harvester::new(&config, &base_url, CancellationToken::new()).unwrap();

    let previous = PageRecord {
        url: base_url.clone(),
        title: "Home".to_string(),
        content: "<p>old</p>".to_string(),
        text: "old".to_string(),
    };
    harvester.layout().ensure_dir().unwrap();
    JsonPageStore::new(harvester.layout().json_path())
        .save_pages(&[previous.clone(), previous.clone()])
        .unwrap();

    let mut session = harvester.new_session();
    assert!(session.is_visited(&base_url));
    session.enqueue(format!("{}/guide/new", base_url));

    let outcome = harvester.run_session(session).await;

    assert_eq!(outcome.state, CrawlState::Completed);
    assert_eq!(outcome.stats.pages_resumed, 1);
    assert_eq!(outcome.stats.pages_fetched, 1);
    assert_eq!(outcome.pages.len(), 2);
    assert_eq!(outcome.pages[0], previous);
    assert_eq!(outcome.pages[1].title, "New");
}

#[tokio::test]
async fn test_incremental_run_refetches_nothing() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        html_page("Home", r#"<a href="/guide/two">Two</a>"#, "<p>home</p>"),
        1,
    )
    .await;
    mount_page(&mock_server, "/guide/two", html_page("Two", "", "<p>two</p>"), 1).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());

    let first = Harvester::new(&config, &base_url, CancellationToken::new()).unwrap();
    let outcome = first.run().await;
    assert_eq!(outcome.pages.len(), 2);
    write_outputs(&outcome.pages, first.layout(), &config.output, &first.document_title())
        .await
        .unwrap();

    // Second run only sees mocks that must not be hit
    mock_server.verify().await;
    mock_server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    config.crawler.incremental = true;
    let second = Harvester::new(&config, &base_url, CancellationToken::new()).unwrap();
    let resumed = second.run().await;

    assert_eq!(resumed.state, CrawlState::Completed);
    assert_eq!(resumed.stats.pages_fetched, 0);
    assert_eq!(resumed.pages, outcome.pages);
}

#[tokio::test]
async fn test_checkpoint_written_during_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        html_page("Home", r#"<a href="/a">A</a><a href="/b">B</a>"#, "<p>home</p>"),
        1,
    )
    .await;
    mount_page(&mock_server, "/a", html_page("A", "", "<p>a</p>"), 1).await;
    mount_page(&mock_server, "/b", html_page("B", "", "<p>b</p>"), 1).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.crawler.checkpoint_interval = 2;

    let harvester = Harvester::new(&config, &base_url, CancellationToken::new()).unwrap();
    let outcome = harvester.run().await;

    assert_eq!(outcome.stats.checkpoints, 1);
    let saved = JsonPageStore::new(harvester.layout().json_path())
        .load_pages()
        .unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[..], outcome.pages[..2]);
}

#[tokio::test]
async fn test_failed_page_is_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        html_page("Home", r#"<a href="/missing">Gone</a><a href="/ok">Ok</a>"#, "<p>home</p>"),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/ok", html_page("Ok", "", "<p>ok</p>"), 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let harvester = Harvester::new(&config, &base_url, CancellationToken::new()).unwrap();
    let outcome = harvester.run().await;

    assert_eq!(outcome.state, CrawlState::Completed);
    assert_eq!(outcome.pages.len(), 2);
    assert_eq!(outcome.stats.fetch_failures, 1);
}

#[tokio::test]
async fn test_links_followed_from_error_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        ResponseTemplate::new(404)
            .set_body_string(
                r#"<html><body><nav><a href="/guide/intro">Intro</a></nav><p>Not found</p></body></html>"#,
            )
            .insert_header("content-type", "text/html"),
        1,
    )
    .await;
    mount_page(&mock_server, "/guide/intro", html_page("Intro", "", "<p>intro</p>"), 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let harvester = Harvester::new(&config, &base_url, CancellationToken::new()).unwrap();
    let outcome = harvester.run().await;

    assert_eq!(outcome.state, CrawlState::Completed);
    assert_eq!(outcome.pages.len(), 1);
    assert_eq!(outcome.pages[0].url, format!("{}/guide/intro", base_url));
    assert_eq!(outcome.pages[0].title, "Intro");
    assert_eq!(outcome.stats.fetch_failures, 1);
    assert_eq!(outcome.stats.pages_fetched, 1);
}

#[tokio::test]
async fn test_fetcher_returns_error_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410).set_body_string("<a href=\"/home\">Home</a>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&HttpConfig::default(), None, CancellationToken::new()).unwrap();
    match fetcher.fetch(&format!("{}/gone", mock_server.uri())).await {
        FetchResult::HttpError { status_code, body } => {
            assert_eq!(status_code, 410);
            assert!(body.contains("/home"));
        }
        other => panic!("expected HttpError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cancelled_harvest_fetches_nothing() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", html_page("Home", "", ""), 0).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let harvester = Harvester::new(&config, &base_url, cancel).unwrap();
    let outcome = harvester.run().await;

    assert_eq!(outcome.state, CrawlState::Cancelled);
    assert!(outcome.pages.is_empty());
}

#[tokio::test]
async fn test_fetcher_retries_transient_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let http = HttpConfig {
        retries: 3,
        backoff_ms: 1,
        ..HttpConfig::default()
    };
    let fetcher = HttpFetcher::new(&http, None, CancellationToken::new()).unwrap();

    match fetcher.fetch(&format!("{}/flaky", mock_server.uri())).await {
        FetchResult::Success { body, status_code, .. } => {
            assert_eq!(status_code, 200);
            assert_eq!(body, "recovered");
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetcher_gives_up_after_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let http = HttpConfig {
        retries: 1,
        backoff_ms: 1,
        ..HttpConfig::default()
    };
    let fetcher = HttpFetcher::new(&http, None, CancellationToken::new()).unwrap();

    let result = fetcher.fetch(&format!("{}/down", mock_server.uri())).await;
    assert!(matches!(result, FetchResult::HttpError { status_code: 503, .. }));
}

#[tokio::test]
async fn test_fetcher_does_not_retry_client_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let http = HttpConfig {
        retries: 3,
        backoff_ms: 1,
        ..HttpConfig::default()
    };
    let fetcher = HttpFetcher::new(&http, None, CancellationToken::new()).unwrap();

    let result = fetcher.fetch(&format!("{}/missing", mock_server.uri())).await;
    assert!(matches!(result, FetchResult::HttpError { status_code: 404, .. }));
}

#[tokio::test]
async fn test_cache_hit_avoids_network() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cached"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>cached body</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let cache = ResponseCache::open(&dir.path().join("http_cache.sqlite"), Duration::from_secs(60)).unwrap();
    let fetcher = HttpFetcher::new(
        &HttpConfig::default(),
        Some(Arc::new(cache)),
        CancellationToken::new(),
    )
    .unwrap();

    let url = format!("{}/cached", mock_server.uri());
    let first = fetcher.fetch(&url).await;
    let second = fetcher.fetch(&url).await;

    match (first, second) {
        (FetchResult::Success { body: a, .. }, FetchResult::Success { body: b, .. }) => {
            assert_eq!(a, b);
            assert_eq!(b, "<p>cached body</p>");
        }
        other => panic!("expected two successes, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cache_enabled_from_config() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", html_page("Home", "", "<p>home</p>"), 1).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.http.cache_ttl_secs = Some(3600);

    let first = Harvester::new(&config, &base_url, CancellationToken::new()).unwrap();
    assert_eq!(first.run().await.pages.len(), 1);
    assert!(dir.path().join("http_cache.sqlite").exists());

    // A fresh harvester over the same output directory is served from the cache
    let second = Harvester::new(&config, &base_url, CancellationToken::new()).unwrap();
    let outcome = second.run().await;
    assert_eq!(outcome.pages.len(), 1);
    assert_eq!(outcome.pages[0].title, "Home");
}

#[tokio::test]
async fn test_crawl_entry_point() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", html_page("Only", "", "<p>single page</p>"), 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let outcome = doc_harvest::crawler::crawl(&config, &base_url, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.state, CrawlState::Completed);
    assert_eq!(outcome.pages.len(), 1);
    assert!(outcome.pages[0].text.contains("single page"));
}
