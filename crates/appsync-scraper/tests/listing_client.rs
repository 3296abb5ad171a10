//! Integration tests for `ListingClient`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no
//! real network traffic is made.

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appsync_scraper::{ListingClient, ListingSource, ScraperError};

/// 5-second timeout, descriptive UA, no retries.
fn test_client() -> ListingClient {
    ListingClient::new(5, "appsync-test/0.1", 0, 0).expect("failed to build test ListingClient")
}

fn test_client_with_retries(max_retries: u32) -> ListingClient {
    ListingClient::new(5, "appsync-test/0.1", max_retries, 0)
        .expect("failed to build test ListingClient")
}

#[tokio::test]
async fn fetch_html_returns_page_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/small-appliances"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>ok</body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/search/small-appliances?page=1", server.uri());
    let body = test_client().fetch_html(&url).await.unwrap();
    assert_eq!(body, "<html><body>ok</body></html>");
}

#[tokio::test]
async fn fetch_bytes_returns_raw_image() {
    let server = MockServer::start().await;
    let png: Vec<u8> = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a];

    Mock::given(method("GET"))
        .and(path("/img/9981.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png.clone()))
        .mount(&server)
        .await;

    let url = format!("{}/img/9981.png", server.uri());
    let bytes = test_client().fetch_bytes(&url).await.unwrap();
    assert_eq!(bytes, png);
}

#[tokio::test]
async fn not_found_is_typed_and_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/img/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/img/missing.jpg", server.uri());
    let err = test_client_with_retries(3)
        .fetch_bytes(&url)
        .await
        .unwrap_err();
    assert!(
        matches!(err, ScraperError::NotFound { ref url } if url.ends_with("/img/missing.jpg")),
        "expected NotFound, got: {err:?}"
    );
}

#[tokio::test]
async fn rate_limited_carries_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "17"))
        .mount(&server)
        .await;

    let url = format!("{}/search?page=1", server.uri());
    let err = test_client().fetch_html(&url).await.unwrap_err();
    assert!(
        matches!(
            err,
            ScraperError::RateLimited {
                retry_after_secs: 17,
                ..
            }
        ),
        "expected RateLimited, got: {err:?}"
    );
}

#[tokio::test]
async fn server_error_without_retries_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/search?page=1", server.uri());
    let err = test_client().fetch_html(&url).await.unwrap_err();
    assert!(
        matches!(err, ScraperError::UnexpectedStatus { status: 502, .. }),
        "expected UnexpectedStatus(502), got: {err:?}"
    );
}

#[tokio::test]
async fn server_error_is_retried_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/search?page=1", server.uri());
    let body = test_client_with_retries(3).fetch_html(&url).await.unwrap();
    assert_eq!(body, "<html></html>");
}

#[tokio::test]
async fn timeout_surfaces_as_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html></html>")
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = ListingClient::new(1, "appsync-test/0.1", 0, 0).unwrap();
    let url = format!("{}/search?page=1", server.uri());
    let err = client.fetch_html(&url).await.unwrap_err();
    assert!(
        matches!(err, ScraperError::Http(ref e) if e.is_timeout()),
        "expected timeout, got: {err:?}"
    );
}
