//! Crawler module for listing page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with browser-like headers and retry logic
//! - Bounded concurrency for fetch attempts
//! - Request pacing
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod limiter;
pub mod pacing;
mod retry;

pub use coordinator::{Coordinator, CrawlOutcome};
pub use fetcher::{
    build_http_client, fetch_url, stealth_headers, FetchOutcome, HttpFetcher, PageFetcher,
    USER_AGENTS,
};
pub use limiter::{ConcurrencyLimiter, LimiterError, TaskHandle};
pub use retry::{RetryContext, RetryPolicy, Retryable};

use crate::config::Config;
use crate::output::{
    JsonLinesSink, JsonSummaryWriter, MultiSink, MultiSummaryWriter, RunSummary, SharedStorage,
    SqliteOutputHandler,
};
use crate::proxy::RotatingProxies;
use crate::storage::{SqliteStorage, Storage};
use crate::SweepError;
use pacing::{Randomness, Sleeper, ThreadRandomness, TokioSleeper};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Runs a complete sweep
///
/// This is the main entry point for starting a sweep. It will:
/// 1. Open the storage layer and open a run row
/// 2. Build the HTTP fetcher and proxy rotation
/// 3. Walk the listing pages
/// 4. Store the records and close the run
/// 5. Write the summary document
///
/// # Arguments
///
/// * `config` - The resolved configuration
/// * `config_hash` - Hash of the configuration file, stored with the run
///
/// # Returns
///
/// * `Ok(RunSummary)` - Sweep completed with at least one record
/// * `Err(SweepError)` - Sweep failed; the run row carries the message
pub async fn run_crawl(config: Config, config_hash: &str) -> Result<RunSummary, SweepError> {
    let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let run_id = storage.create_run(config_hash, config.crawler.start_url.as_str())?;
    tracing::info!("Starting run {}", run_id);

    let storage: SharedStorage = Arc::new(Mutex::new(storage));
    let database = SqliteOutputHandler::new(storage, run_id);

    let mut sink = MultiSink::new().with(database.clone());
    if let Some(records_path) = &config.output.records_path {
        tracing::info!("Writing records to {}", records_path);
        sink = sink.with(JsonLinesSink::new(records_path));
    }
    let summary_writer = MultiSummaryWriter::new()
        .with(database)
        .with(JsonSummaryWriter::new(&config.output.summary_path));

    let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);
    let rng: Arc<dyn Randomness> = Arc::new(ThreadRandomness);
    let proxies = RotatingProxies::from_config(&config.proxy);
    if !proxies.is_empty() {
        tracing::info!("Rotating through {} proxies", proxies.len());
    }

    let fetcher = Arc::new(HttpFetcher::new(sleeper.clone(), rng.clone()));
    let mut coordinator = Coordinator::new(&config.crawler, fetcher)?
        .with_proxies(Arc::new(proxies))
        .with_pacing(sleeper, rng);

    coordinator.run_into(&sink, &summary_writer).await
}
