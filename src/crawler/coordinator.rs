//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the page loop that coordinates one sweep of a listing:
//! - Building page URLs and fetching them through retry and the limiter
//! - Turning listing cards into records and deduplicating them
//! - Stopping on the target count, the page budget, the runtime budget,
//!   or an empty page
//! - Handing the result set to the sinks

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::limiter::ConcurrencyLimiter;
use crate::crawler::pacing::{
    DelayRange, Randomness, Sleeper, ThreadRandomness, TokioSleeper, PAGE_DELAY,
};
use crate::crawler::retry::RetryPolicy;
use crate::extract::{ProductExtractor, ProductRecord};
use crate::output::{deliver_in_batches, RecordSink, RunFailure, RunSummary, SummaryWriter};
use crate::proxy::{DirectConnection, ProxyProvider};
use crate::state::{Admission, CrawlPhase, CrawlState};
use crate::url::PageRequest;
use crate::{FetchError, SweepError};
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Records and summary of a run that reached `Done`
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub records: Vec<ProductRecord>,
    pub summary: RunSummary,
}

/// Main crawler coordinator structure
///
/// One coordinator performs exactly one run; its [`CrawlState`] is never
/// shared with another coordinator.
pub struct Coordinator {
    start_url: Url,
    results_wanted: usize,
    max_pages: u32,
    max_runtime: Duration,
    extractor: ProductExtractor,
    fetcher: Arc<dyn PageFetcher>,
    proxies: Arc<dyn ProxyProvider>,
    limiter: ConcurrencyLimiter,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    rng: Arc<dyn Randomness>,
    page_delay: DelayRange,
    state: CrawlState,
    phase: CrawlPhase,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Pacing defaults to real sleeps and thread-local randomness, with a
    /// direct connection and the default retry policy.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fetcher` - Performs single fetch attempts
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(SweepError)` - A built-in selector failed to compile
    pub fn new(config: &CrawlerConfig, fetcher: Arc<dyn PageFetcher>) -> Result<Self, SweepError> {
        Ok(Self {
            start_url: config.start_url.clone(),
            results_wanted: config.results_wanted as usize,
            max_pages: config.max_pages.max(1),
            max_runtime: Duration::from_secs(config.max_runtime_secs),
            extractor: ProductExtractor::new(config.site_origin.clone())?,
            fetcher,
            proxies: Arc::new(DirectConnection),
            limiter: ConcurrencyLimiter::new(config.max_concurrency as usize),
            retry: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            rng: Arc::new(ThreadRandomness),
            page_delay: PAGE_DELAY,
            state: CrawlState::new(),
            phase: CrawlPhase::Idle,
        })
    }

    pub fn with_proxies(mut self, proxies: Arc<dyn ProxyProvider>) -> Self {
        self.proxies = proxies;
        self
    }

    /// Replaces the delay and randomness sources used for backoff and page delays
    pub fn with_pacing(mut self, sleeper: Arc<dyn Sleeper>, rng: Arc<dyn Randomness>) -> Self {
        self.sleeper = sleeper;
        self.rng = rng;
        self
    }

    pub fn with_page_delay(mut self, page_delay: DelayRange) -> Self {
        self.page_delay = page_delay;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    fn transition(&mut self, next: CrawlPhase) -> Result<(), SweepError> {
        if !self.phase.can_transition_to(next) {
            return Err(SweepError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::trace!("Phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Runs the page loop
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOutcome)` - At least one record was accepted
    /// * `Err(SweepError::FirstPage)` - Page 1 could not be fetched
    /// * `Err(SweepError::NoRecords)` - The run ended without any record
    pub async fn run(&mut self) -> Result<CrawlOutcome, SweepError> {
        if self.phase == CrawlPhase::Idle {
            // The runtime budget counts from here, not from construction
            self.state = CrawlState::new();
        }

        tracing::info!("Starting listing sweep");
        tracing::info!("Target: {}", self.start_url);
        tracing::info!(
            "Goals: {} products, max {} pages",
            self.results_wanted,
            self.max_pages
        );

        let mut page = 1;
        while page <= self.max_pages && !self.state.target_reached(self.results_wanted) {
            if self.state.over_budget(self.max_runtime) {
                tracing::info!(
                    "Approaching runtime budget. Stopping gracefully at {} products.",
                    self.state.accepted()
                );
                break;
            }

            self.transition(CrawlPhase::FetchingPage)?;
            let page_url = PageRequest::new(&self.start_url, page).url();
            tracing::info!("Fetching page {}: {}", page, page_url);

            let html = match self.fetch_page(page_url.as_str()).await {
                Ok(html) => {
                    self.state.record_page();
                    html
                }
                Err(err) => {
                    self.state.record_error();
                    tracing::error!("Failed to fetch page {}: {}", page, err);

                    if page == 1 {
                        self.transition(CrawlPhase::Failed)?;
                        return Err(SweepError::FirstPage(err));
                    }

                    self.transition(CrawlPhase::Evaluating)?;
                    page += 1;
                    continue;
                }
            };

            self.transition(CrawlPhase::ExtractingPage)?;
            let cards_found = self.absorb_page(&html, page);
            if cards_found == 0 {
                tracing::warn!("No products found on page {}. Stopping pagination.", page);
                break;
            }

            self.transition(CrawlPhase::Evaluating)?;
            tracing::info!(
                "Page {} complete. Total products: {}/{}",
                page,
                self.state.accepted(),
                self.results_wanted
            );

            if self.state.target_reached(self.results_wanted) {
                tracing::info!("Reached target of {} products.", self.results_wanted);
                break;
            }

            if page < self.max_pages {
                let delay = self.page_delay.sample(self.rng.as_ref());
                tracing::info!("Waiting {}ms before next page...", delay.as_millis());
                self.sleeper.sleep(delay).await;
            }

            page += 1;
        }

        let summary = self.summary();
        self.log_statistics(&summary);

        if self.state.accepted() == 0 {
            self.transition(CrawlPhase::Failed)?;
            tracing::error!("{}", SweepError::NoRecords);
            return Err(SweepError::NoRecords);
        }

        self.transition(CrawlPhase::Done)?;
        tracing::info!("Extracted {} products", summary.products_extracted);

        Ok(CrawlOutcome {
            records: self.state.records().to_vec(),
            summary,
        })
    }

    /// Runs the page loop and hands the outcome to the sinks
    ///
    /// On success every record goes to `sink` in batches and the summary to
    /// `summary_writer`. On failure nothing reaches `sink` and the failure is
    /// reported to `summary_writer`. A sink or summary error after a successful
    /// page loop is reported as a failure too, so the run is always closed.
    pub async fn run_into(
        &mut self,
        sink: &dyn RecordSink,
        summary_writer: &dyn SummaryWriter,
    ) -> Result<RunSummary, SweepError> {
        let delivered = match self.run().await {
            Ok(outcome) => Self::deliver(&outcome, sink, summary_writer),
            Err(err) => Err(err),
        };

        if let Err(err) = &delivered {
            self.report_failure(err, summary_writer);
        }
        delivered
    }

    fn deliver(
        outcome: &CrawlOutcome,
        sink: &dyn RecordSink,
        summary_writer: &dyn SummaryWriter,
    ) -> Result<RunSummary, SweepError> {
        let batches = deliver_in_batches(sink, &outcome.records)?;
        tracing::debug!(
            "Delivered {} records in {} batches",
            outcome.records.len(),
            batches
        );
        summary_writer.write_summary(&outcome.summary)?;
        Ok(outcome.summary.clone())
    }

    fn report_failure(&self, err: &SweepError, summary_writer: &dyn SummaryWriter) {
        let failure = RunFailure {
            message: err.to_string(),
            pages_processed: self.state.pages_processed,
            errors: self.state.errors,
            runtime: self.state.elapsed().as_secs_f64(),
        };
        if let Err(e) = summary_writer.record_failure(&failure) {
            tracing::warn!("Failed to record run failure: {}", e);
        }
    }

    /// Fetches one page, retrying through the limiter with a fresh proxy per attempt
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let label = format!("Fetch {}", url);

        self.retry
            .run(&label, self.sleeper.as_ref(), self.rng.as_ref(), |attempt| {
                let fetcher = Arc::clone(&self.fetcher);
                let proxy_url = self.proxies.next_url();
                let url = url.to_string();
                tracing::trace!("Attempt {} for {} via {:?}", attempt, url, proxy_url);

                let task_url = url.clone();
                let handle = self.limiter.submit(async move {
                    fetcher.fetch(&task_url, proxy_url.as_deref()).await
                });

                async move {
                    handle.await.unwrap_or_else(|e| {
                        Err(FetchError::Aborted {
                            url,
                            message: e.to_string(),
                        })
                    })
                }
            })
            .await
    }

    /// Extracts the cards of one page into the crawl state
    ///
    /// Returns the number of cards found, including those skipped.
    fn absorb_page(&mut self, html: &str, page: u32) -> usize {
        let document = Html::parse_document(html);
        let cards = self.extractor.cards(&document);
        tracing::info!("Found {} product cards on page {}", cards.len(), page);

        for card in &cards {
            if self.state.target_reached(self.results_wanted) {
                break;
            }

            match self.extractor.extract(*card) {
                Ok(record) => {
                    let id = record.id.clone();
                    match self.state.offer(record) {
                        Admission::Accepted => {}
                        Admission::Duplicate => {
                            tracing::trace!("Skipping duplicate product {:?}", id);
                        }
                        Admission::Rejected => {
                            tracing::debug!("Skipping card {:?} without title or price", id);
                        }
                    }
                }
                Err(e) => {
                    self.state.record_error();
                    tracing::warn!("Failed to extract product: {}", e);
                }
            }
        }

        cards.len()
    }

    fn summary(&self) -> RunSummary {
        RunSummary {
            products_extracted: self.state.accepted(),
            pages_processed: self.state.pages_processed,
            runtime: self.state.elapsed().as_secs_f64(),
            success: true,
            errors: self.state.errors,
        }
    }

    fn log_statistics(&self, summary: &RunSummary) {
        let rule = "=".repeat(60);
        tracing::info!("{}", rule);
        tracing::info!("LISTING SWEEP STATISTICS");
        tracing::info!("{}", rule);
        tracing::info!(
            "Products extracted: {}/{}",
            summary.products_extracted,
            self.results_wanted
        );
        tracing::info!(
            "Pages processed: {}/{}",
            summary.pages_processed,
            self.max_pages
        );
        tracing::info!("Errors: {}", summary.errors);
        tracing::info!("Runtime: {:.2}s", summary.runtime);
        tracing::info!("Speed: {:.2} products/sec", summary.records_per_second());
        tracing::info!("{}", rule);
    }
}
