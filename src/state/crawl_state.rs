use crate::extract::ProductRecord;
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// What happened to a record offered to the crawl state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Added to the result set
    Accepted,
    /// Its id was already seen earlier in this run
    Duplicate,
    /// Neither a title nor a price; ad slot or placeholder
    Rejected,
}

/// Tracks everything a single crawl run accumulates
///
/// One coordinator owns one `CrawlState` for the lifetime of a run, so several
/// runs in the same process never share seen ids or counters.
#[derive(Debug, Clone)]
pub struct CrawlState {
    /// Accepted records in discovery order
    records: Vec<ProductRecord>,

    /// Product ids seen so far, accepted or not
    seen_ids: HashSet<String>,

    /// Pages fetched successfully
    pub pages_processed: u32,

    /// Page fetch failures and card extraction failures
    pub errors: u32,

    /// When the run started
    started_at: Instant,
}

impl CrawlState {
    /// Creates an empty state starting the clock now
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            seen_ids: HashSet::new(),
            pages_processed: 0,
            errors: 0,
            started_at: Instant::now(),
        }
    }

    /// Offers an extracted record
    ///
    /// A record with an id already seen is dropped. The id is marked seen before
    /// the content check, so a later card sharing the id of a rejected
    /// placeholder is dropped as well.
    pub fn offer(&mut self, record: ProductRecord) -> Admission {
        if let Some(id) = &record.id {
            if !self.seen_ids.insert(id.clone()) {
                return Admission::Duplicate;
            }
        }

        if !record.has_minimum_content() {
            return Admission::Rejected;
        }

        self.records.push(record);
        Admission::Accepted
    }

    /// Counts one failure (page or card)
    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// Counts one successfully fetched page
    pub fn record_page(&mut self) {
        self.pages_processed += 1;
    }

    /// Number of accepted records
    pub fn accepted(&self) -> usize {
        self.records.len()
    }

    /// Returns true once `target` records have been accepted
    pub fn target_reached(&self, target: usize) -> bool {
        self.records.len() >= target
    }

    /// Accepted records in discovery order
    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    /// Wall-clock time since the run started
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Returns true if the run has been going for longer than `budget`
    pub fn over_budget(&self, budget: Duration) -> bool {
        self.elapsed() > budget
    }
}

impl Default for CrawlState {
    fn default() -> Self {
        Self::new()
    }
}
