//! Integration tests for FullText using wiremock

use fulltext::{
    ErrorKind, FetchRequest, Fetcher, FullTextResponse, HttpFetcher, Outcome, RetrievalConfig,
    RetrievalService,
};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ARTICLE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Test Article</title></head>
<body>
    <nav><a href="/">Home</a> <a href="/news">News</a> <a href="/about">About</a></nav>
    <article><p>Real content here.</p></article>
    <footer><p>Copyright 2024 Example Corp. All rights reserved.</p></footer>
</body>
</html>"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn service() -> RetrievalService {
    init_tracing();
    RetrievalService::builder()
        .retry_backoff(Duration::from_millis(10))
        .build()
        .unwrap()
}

fn blocks(outcome: &Outcome) -> Vec<String> {
    match outcome {
        Outcome::Success(result) => result.blocks.clone(),
        Outcome::Failure(failure) => panic!("unexpected failure: {failure:?}"),
    }
}

async fn mount_html(server: &MockServer, at: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_article_page() {
    let mock_server = MockServer::start().await;
    mount_html(&mock_server, "/article", ARTICLE_PAGE).await;

    let outcome = service()
        .get_full_text(&format!("{}/article", mock_server.uri()))
        .await;

    assert_eq!(blocks(&outcome), vec!["Real content here."]);
    assert_eq!(outcome.http_status(), 200);
    assert_eq!(
        outcome.to_response(),
        FullTextResponse::Success {
            title: "Test Article".to_string(),
            text: vec!["Real content here.".to_string()],
        }
    );
}

#[tokio::test]
async fn test_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&mock_server)
        .await;

    let outcome = service()
        .get_full_text(&format!("{}/missing", mock_server.uri()))
        .await;

    assert_eq!(outcome.error_kind(), Some(ErrorKind::NotFound));
    assert_eq!(outcome.http_status(), 404);
    let json = serde_json::to_value(outcome.to_response()).unwrap();
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_server_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = service().get_full_text(&mock_server.uri()).await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::UpstreamError));
    assert_eq!(outcome.http_status(), 502);
}

#[tokio::test]
async fn test_image_is_unsupported() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(vec![0x89, b'P', b'N', b'G', 0, 0], "image/png"),
        )
        .mount(&mock_server)
        .await;

    let outcome = service()
        .get_full_text(&format!("{}/logo.png", mock_server.uri()))
        .await;

    assert_eq!(outcome.error_kind(), Some(ErrorKind::UnsupportedContentType));
    assert_eq!(outcome.http_status(), 415);
}

#[tokio::test]
async fn test_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(ARTICLE_PAGE, "text/html")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    init_tracing();
    let service = RetrievalService::builder()
        .timeout(Duration::from_millis(100))
        .retry_backoff(Duration::from_millis(10))
        .build()
        .unwrap();
    let outcome = service.get_full_text(&mock_server.uri()).await;

    assert_eq!(outcome.error_kind(), Some(ErrorKind::Timeout));
    assert_eq!(outcome.http_status(), 504);
}

#[tokio::test]
async fn test_abandoned_request_is_cancelled() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(ARTICLE_PAGE, "text/html")
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&mock_server)
        .await;
    mount_html(&mock_server, "/quick", ARTICLE_PAGE).await;

    let service = service();
    let started = Instant::now();
    let abandoned = tokio::time::timeout(
        Duration::from_millis(200),
        service.get_full_text(&format!("{}/slow", mock_server.uri())),
    )
    .await;

    assert!(abandoned.is_err());
    assert!(started.elapsed() < Duration::from_secs(2));

    // The service stays usable after a cancelled call
    let outcome = service
        .get_full_text(&format!("{}/quick", mock_server.uri()))
        .await;
    assert_eq!(blocks(&outcome), vec!["Real content here."]);
}

#[tokio::test]
async fn test_too_many_redirects() {
    let mock_server = MockServer::start().await;
    for i in 0..6 {
        Mock::given(method("GET"))
            .and(path(format!("/r{i}")))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", format!("/r{}", i + 1)),
            )
            .mount(&mock_server)
            .await;
    }
    mount_html(&mock_server, "/r6", ARTICLE_PAGE).await;

    let outcome = service()
        .get_full_text(&format!("{}/r0", mock_server.uri()))
        .await;

    assert_eq!(outcome.error_kind(), Some(ErrorKind::TooManyRedirects));
    assert_eq!(outcome.http_status(), 502);
}

#[tokio::test]
async fn test_redirects_within_limit() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/moved"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(
            ResponseTemplate::new(307)
                .insert_header("location", format!("{}/new", mock_server.uri())),
        )
        .mount(&mock_server)
        .await;
    mount_html(&mock_server, "/new", ARTICLE_PAGE).await;

    let outcome = service()
        .get_full_text(&format!("{}/old", mock_server.uri()))
        .await;
    assert_eq!(blocks(&outcome), vec!["Real content here."]);
}

#[tokio::test]
async fn test_redirect_chain_is_reported() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/b"))
        .mount(&mock_server)
        .await;
    mount_html(&mock_server, "/b", ARTICLE_PAGE).await;

    let fetcher = HttpFetcher::new(&RetrievalConfig::default()).unwrap();
    let request = FetchRequest::new(format!("{}/a", mock_server.uri())).unwrap();
    let result = fetcher.fetch(&request).await.unwrap();

    assert_eq!(result.status, 200);
    assert_eq!(result.final_url.path(), "/b");
    assert_eq!(result.redirects.len(), 1);
    assert_eq!(result.content_type.as_deref(), Some("text/html"));
    assert!(!result.truncated);
}

#[tokio::test]
async fn test_redirect_loop() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/pong"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pong"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/ping"))
        .mount(&mock_server)
        .await;

    let outcome = service()
        .get_full_text(&format!("{}/ping", mock_server.uri()))
        .await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::TooManyRedirects));
}

#[tokio::test]
async fn test_redirect_to_other_scheme() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "ftp://example.com/file"),
        )
        .mount(&mock_server)
        .await;

    let outcome = service().get_full_text(&mock_server.uri()).await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::UpstreamError));
}

#[tokio::test]
async fn test_transient_status_retried_once() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ARTICLE_PAGE, "text/html"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = service().get_full_text(&mock_server.uri()).await;
    assert_eq!(blocks(&outcome), vec!["Real content here."]);
}

#[tokio::test]
async fn test_rate_limit_retried_once() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&mock_server)
        .await;

    let outcome = service().get_full_text(&mock_server.uri()).await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::UpstreamError));
}

#[tokio::test]
async fn test_persistent_unavailable_surfaces_after_one_retry() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let outcome = service().get_full_text(&mock_server.uri()).await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::UpstreamError));
}

#[tokio::test]
async fn test_cache_hit_is_identical_and_skips_network() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cached"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ARTICLE_PAGE, "text/html"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = service();
    let url = format!("{}/cached", mock_server.uri());
    let first = service.get_full_text(&url).await;
    let second = service.get_full_text(&format!("{url}#section")).await;

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_vec(&first.to_response()).unwrap(),
        serde_json::to_vec(&second.to_response()).unwrap()
    );
}

#[tokio::test]
async fn test_oversized_body_is_truncated_not_failed() {
    let mock_server = MockServer::start().await;
    let html = format!(
        "<html><body><article><p>{}</p></article></body></html>",
        "word ".repeat(2000)
    );
    mount_html(&mock_server, "/big", &html).await;

    init_tracing();
    let service = RetrievalService::builder()
        .max_body_bytes(256)
        .build()
        .unwrap();
    let outcome = service
        .get_full_text(&format!("{}/big", mock_server.uri()))
        .await;

    let blocks = blocks(&outcome);
    assert_eq!(blocks.len(), 1);
    assert!(blocks[0].starts_with("word word"));
    assert!(blocks[0].len() < 256);
}

#[tokio::test]
async fn test_declared_charset_is_decoded() {
    let mock_server = MockServer::start().await;
    let mut body = b"<html><body><article><p>Caf".to_vec();
    body.push(0xE9);
    body.extend_from_slice(b" au lait, served warm every morning.</p></article></body></html>");
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=windows-1252"),
        )
        .mount(&mock_server)
        .await;

    let outcome = service().get_full_text(&mock_server.uri()).await;
    assert_eq!(
        blocks(&outcome),
        vec!["Café au lait, served warm every morning."]
    );
}

#[tokio::test]
async fn test_plain_text_document() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "A plain text note about\nthe release schedule.\n\nSecond paragraph follows here.",
            "text/plain; charset=utf-8",
        ))
        .mount(&mock_server)
        .await;

    let outcome = service().get_full_text(&mock_server.uri()).await;
    assert_eq!(
        blocks(&outcome),
        vec![
            "A plain text note about the release schedule.",
            "Second paragraph follows here."
        ]
    );
    let json = serde_json::to_value(outcome.to_response()).unwrap();
    assert_eq!(json["title"], "");
}

#[tokio::test]
async fn test_page_without_content() {
    let mock_server = MockServer::start().await;
    mount_html(
        &mock_server,
        "/empty",
        "<html><body><nav><a href='/'>Home</a></nav><script>app()</script></body></html>",
    )
    .await;

    let outcome = service()
        .get_full_text(&format!("{}/empty", mock_server.uri()))
        .await;
    assert_eq!(outcome.error_kind(), Some(ErrorKind::ExtractionFailed));
    assert_eq!(outcome.http_status(), 422);
}

#[tokio::test]
async fn test_invalid_urls() {
    let service = service();
    for url in ["", "example.com", "ftp://example.com/", "http://"] {
        let outcome = service.get_full_text(url).await;
        assert_eq!(outcome.error_kind(), Some(ErrorKind::InvalidUrl), "{url:?}");
        assert_eq!(outcome.http_status(), 400);
    }
}

#[tokio::test]
async fn test_concurrent_requests() {
    let mock_server = MockServer::start().await;
    mount_html(&mock_server, "/article", ARTICLE_PAGE).await;

    let service = service();
    let handles: Vec<_> = (0..10)
        .map(|i| {
            let service = service.clone();
            let url = format!("{}/article?page={i}", mock_server.uri());
            tokio::spawn(async move { service.get_full_text(&url).await })
        })
        .collect();

    for handle in handles {
        let outcome = handle.await.unwrap();
        assert_eq!(blocks(&outcome), vec!["Real content here."]);
    }
}
