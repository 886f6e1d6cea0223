//! End-to-end sweeps over a mock listing site

use crate::common::{card, config, crawler_config, instant_coordinator, listing_page, page_of};
use listing_sweep::config::OutputConfig;
use listing_sweep::output::{
    JsonLinesSink, JsonSummaryWriter, MultiSink, MultiSummaryWriter, SharedStorage,
    SqliteOutputHandler,
};
use listing_sweep::run_crawl;
use listing_sweep::storage::{RunStatus, SqliteStorage, Storage};
use listing_sweep::SweepError;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts `body` for `page`; page 1 is the bare listing path
async fn mount_page(server: &MockServer, page: u32, response: ResponseTemplate) {
    let mock = Mock::given(method("GET")).and(path("/monitors"));
    if page == 1 {
        mock.respond_with(response).mount(server).await;
    } else {
        mock.and(query_param("page", page.to_string().as_str()))
            .respond_with(response)
            .mount(server)
            .await;
    }
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_full_sweep_across_pages() {
    let mock_server = MockServer::start().await;

    // Specific pages first: the bare path mock also matches ?page=N
    mount_page(&mock_server, 2, html(page_of(2, 3))).await;
    mount_page(&mock_server, 3, html(listing_page(&[]))).await;
    mount_page(&mock_server, 1, html(page_of(1, 4))).await;

    let config = crawler_config(&mock_server.uri(), 20, 5);
    let mut coordinator = instant_coordinator(&config);
    let outcome = coordinator.run().await.expect("Sweep failed");

    assert_eq!(outcome.records.len(), 7);
    assert_eq!(outcome.summary.pages_processed, 3);
    assert_eq!(outcome.summary.errors, 0);
    assert!(outcome.summary.success);

    let first = &outcome.records[0];
    assert_eq!(first.id.as_deref(), Some("MON1X1"));
    assert_eq!(first.title.as_deref(), Some("Monitor 1 1"));
    assert_eq!(first.price, Some(7499));
    assert_eq!(first.original_price, Some(9999));
    assert_eq!(first.discount_percent, Some(20));
    assert_eq!(first.rating, Some(4.3));
    assert_eq!(first.rating_count, Some(1234));
    assert_eq!(first.review_count, Some(56));
    assert_eq!(
        first.url.as_deref(),
        Some(format!("{}/monitor-1-1/p/MON1X1?pid=MON1X1&lid=x", mock_server.uri()).as_str())
    );
    assert_eq!(
        first.image_url.as_deref(),
        Some("https://img.example/MON1X1.jpg")
    );
    let specs = first.specifications.as_ref().unwrap();
    assert_eq!(specs.get("Panel Type"), Some("IPS"));
    assert_eq!(specs.get("spec_2"), Some("75 Hz Refresh Rate"));

    assert_eq!(outcome.records[6].id.as_deref(), Some("MON2X3"));
}

#[tokio::test]
async fn test_duplicates_across_pages_are_dropped() {
    let mock_server = MockServer::start().await;

    let repeated = card("SHARED1", "Shared Monitor", "₹5,000");
    mount_page(
        &mock_server,
        2,
        html(listing_page(&[repeated.clone(), card("ONLY2", "Second Page", "₹6,000")])),
    )
    .await;
    mount_page(
        &mock_server,
        1,
        html(listing_page(&[repeated, card("ONLY1", "First Page", "₹4,000")])),
    )
    .await;

    let config = crawler_config(&mock_server.uri(), 20, 2);
    let outcome = instant_coordinator(&config).run().await.unwrap();

    let ids: Vec<&str> = outcome
        .records
        .iter()
        .filter_map(|r| r.id.as_deref())
        .collect();
    assert_eq!(ids, vec!["SHARED1", "ONLY1", "ONLY2"]);
}

#[tokio::test]
async fn test_target_count_stops_pagination() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/monitors"))
        .and(query_param("page", "3"))
        .respond_with(html(page_of(3, 8)))
        .expect(0)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, 2, html(page_of(2, 8))).await;
    mount_page(&mock_server, 1, html(page_of(1, 8))).await;

    let config = crawler_config(&mock_server.uri(), 10, 5);
    let outcome = instant_coordinator(&config).run().await.unwrap();

    assert_eq!(outcome.records.len(), 10);
    assert_eq!(outcome.summary.pages_processed, 2);
}

#[tokio::test]
async fn test_failed_middle_page_is_tolerated() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/monitors"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, 3, html(page_of(3, 2))).await;
    mount_page(&mock_server, 1, html(page_of(1, 2))).await;

    let config = crawler_config(&mock_server.uri(), 20, 3);
    let outcome = instant_coordinator(&config).run().await.unwrap();

    assert_eq!(outcome.records.len(), 4);
    assert_eq!(outcome.summary.pages_processed, 2);
    assert_eq!(outcome.summary.errors, 1);
}

#[tokio::test]
async fn test_sweep_persists_run_and_summary() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 2, html(page_of(2, 2))).await;
    mount_page(&mock_server, 1, html(page_of(1, 3))).await;

    let dir = tempdir().unwrap();
    let db_path = dir.path().join("sweep.db");
    let summary_path = dir.path().join("summary.json");

    let mut storage = SqliteStorage::new(&db_path).unwrap();
    let run_id = storage.create_run("test-hash", &mock_server.uri()).unwrap();
    let shared: SharedStorage = Arc::new(Mutex::new(storage));
    let database = SqliteOutputHandler::new(shared, run_id);
    let summary_writer = MultiSummaryWriter::new()
        .with(database.clone())
        .with(JsonSummaryWriter::new(&summary_path));

    let config = crawler_config(&mock_server.uri(), 20, 2);
    let summary = instant_coordinator(&config)
        .run_into(&database, &summary_writer)
        .await
        .unwrap();
    assert_eq!(summary.products_extracted, 5);

    let storage = SqliteStorage::new(&db_path).unwrap();
    let run = storage.get_run(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.records_extracted, 5);
    assert_eq!(run.pages_processed, 2);
    assert_eq!(storage.count_products(Some(run_id)).unwrap(), 5);

    let products = storage.get_products(run_id).unwrap();
    assert_eq!(products[0].product_id.as_deref(), Some("MON1X1"));
    assert_eq!(products[0].price, Some(7499));

    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary_path).unwrap()).unwrap();
    assert_eq!(document["productsExtracted"], 5);
    assert_eq!(document["pagesProcessed"], 2);
    assert_eq!(document["success"], true);
}

#[tokio::test]
async fn test_first_page_failure_marks_run_failed() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, ResponseTemplate::new(404)).await;

    let dir = tempdir().unwrap();
    let db_path = dir.path().join("sweep.db");
    let summary_path = dir.path().join("summary.json");

    let mut storage = SqliteStorage::new(&db_path).unwrap();
    let run_id = storage.create_run("test-hash", &mock_server.uri()).unwrap();
    let shared: SharedStorage = Arc::new(Mutex::new(storage));
    let database = SqliteOutputHandler::new(shared, run_id);
    let summary_writer = MultiSummaryWriter::new()
        .with(database.clone())
        .with(JsonSummaryWriter::new(&summary_path));

    let config = crawler_config(&mock_server.uri(), 20, 5);
    let result = instant_coordinator(&config)
        .run_into(&database, &summary_writer)
        .await;
    assert!(matches!(result, Err(SweepError::FirstPage(_))));

    let storage = SqliteStorage::new(&db_path).unwrap();
    let run = storage.get_run(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run
        .message
        .unwrap()
        .starts_with("Failed to fetch first page:"));
    assert_eq!(storage.count_products(Some(run_id)).unwrap(), 0);
    assert!(!summary_path.exists());
}

#[tokio::test]
async fn test_run_crawl_end_to_end() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, html(page_of(1, 3))).await;

    let dir = tempdir().unwrap();
    let output = OutputConfig {
        database_path: dir.path().join("sweep.db").display().to_string(),
        summary_path: dir.path().join("OUTPUT_SUMMARY.json").display().to_string(),
        records_path: Some(dir.path().join("records.jsonl").display().to_string()),
    };

    // One page keeps real pacing down to a single pre-request delay
    let config = config(crawler_config(&mock_server.uri(), 20, 1), output.clone());
    let summary = run_crawl(config, "e2e-hash").await.expect("Sweep failed");

    assert_eq!(summary.products_extracted, 3);
    assert_eq!(summary.pages_processed, 1);

    let lines = std::fs::read_to_string(&output.records_path.unwrap()).unwrap();
    assert_eq!(lines.lines().count(), 3);
    assert!(std::path::Path::new(&output.summary_path).exists());

    let storage = SqliteStorage::new(std::path::Path::new(&output.database_path)).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.config_hash, "e2e-hash");
    assert_eq!(run.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_output_failure_closes_run() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, html(page_of(1, 3))).await;

    let dir = tempdir().unwrap();
    let db_path = dir.path().join("sweep.db");

    let mut storage = SqliteStorage::new(&db_path).unwrap();
    let run_id = storage.create_run("test-hash", &mock_server.uri()).unwrap();
    let shared: SharedStorage = Arc::new(Mutex::new(storage));
    let database = SqliteOutputHandler::new(shared, run_id);

    // A directory cannot be opened as the records file
    let sink = MultiSink::new()
        .with(database.clone())
        .with(JsonLinesSink::new(dir.path()));
    let summary_writer = MultiSummaryWriter::new().with(database);

    let config = crawler_config(&mock_server.uri(), 20, 1);
    let result = instant_coordinator(&config)
        .run_into(&sink, &summary_writer)
        .await;
    assert!(matches!(result, Err(SweepError::Output(_))));

    let storage = SqliteStorage::new(&db_path).unwrap();
    let run = storage.get_run(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.finished_at.is_some());
    assert!(run.message.unwrap().starts_with("Output error:"));
}

#[tokio::test]
async fn test_summary_file_failure_reopens_completed_run_as_failed() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, 1, html(page_of(1, 2))).await;

    let dir = tempdir().unwrap();
    let db_path = dir.path().join("sweep.db");

    let mut storage = SqliteStorage::new(&db_path).unwrap();
    let run_id = storage.create_run("test-hash", &mock_server.uri()).unwrap();
    let shared: SharedStorage = Arc::new(Mutex::new(storage));
    let database = SqliteOutputHandler::new(shared, run_id);

    // The database completes the run before the summary file write fails
    let summary_writer = MultiSummaryWriter::new()
        .with(database.clone())
        .with(JsonSummaryWriter::new(dir.path()));

    let config = crawler_config(&mock_server.uri(), 20, 1);
    let result = instant_coordinator(&config)
        .run_into(&database, &summary_writer)
        .await;
    assert!(matches!(result, Err(SweepError::Output(_))));

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.get_run(run_id).unwrap().status, RunStatus::Failed);
}
