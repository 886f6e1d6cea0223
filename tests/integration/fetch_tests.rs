//! Fetch client behaviour against a live mock server

use crate::common::{crawler_config, instant_coordinator, instant_fetcher, page_of};
use listing_sweep::crawler::PageFetcher;
use listing_sweep::{FetchError, SweepError};
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_browser_headers_reach_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/monitors"))
        .and(header_exists("user-agent"))
        .and(header_exists("accept-language"))
        .and(header("sec-fetch-mode", "navigate"))
        .and(header("sec-fetch-dest", "document"))
        .and(header("upgrade-insecure-requests", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = instant_fetcher();
    let body = fetcher
        .fetch(&format!("{}/monitors", mock_server.uri()), None)
        .await
        .expect("Fetch with browser headers failed");

    assert_eq!(body, "<html>ok</html>");
}

#[tokio::test]
async fn test_redirects_are_followed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old-listing"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/monitors", mock_server.uri()).as_str()),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/monitors"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>moved</html>"))
        .mount(&mock_server)
        .await;

    let body = instant_fetcher()
        .fetch(&format!("{}/old-listing", mock_server.uri()), None)
        .await
        .unwrap();

    assert_eq!(body, "<html>moved</html>");
}

#[tokio::test]
async fn test_status_classification() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/throttled"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let fetcher = instant_fetcher();

    let missing = fetcher
        .fetch(&format!("{}/missing", mock_server.uri()), None)
        .await
        .unwrap_err();
    assert!(matches!(missing, FetchError::NotFound { .. }));
    assert!(!missing.is_retryable());

    let throttled = fetcher
        .fetch(&format!("{}/throttled", mock_server.uri()), None)
        .await
        .unwrap_err();
    assert_eq!(throttled.status_code(), Some(429));
    assert!(throttled.is_retryable());
}

#[tokio::test]
async fn test_connection_failure_is_network_error() {
    // Nothing listens on the discard port
    let err = instant_fetcher()
        .fetch("http://127.0.0.1:9/monitors", None)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Network { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_server_error_is_retried_four_times() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/monitors"))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&mock_server)
        .await;

    let config = crawler_config(&mock_server.uri(), 20, 5);
    let mut coordinator = instant_coordinator(&config);
    let result = coordinator.run().await;

    match result {
        Err(SweepError::FirstPage(FetchError::Status { status_code, .. })) => {
            assert_eq!(status_code, 500)
        }
        other => panic!("Expected first page failure, got {:?}", other.map(|o| o.summary)),
    }
    assert_eq!(coordinator.state().errors, 1);
}

#[tokio::test]
async fn test_not_found_page_is_fetched_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/monitors"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/monitors"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_of(1, 3)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = crawler_config(&mock_server.uri(), 20, 2);
    let outcome = instant_coordinator(&config).run().await.unwrap();

    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.summary.pages_processed, 1);
    assert_eq!(outcome.summary.errors, 1);
}
