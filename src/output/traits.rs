//! Output handler traits and types
//!
//! This module defines the sink interfaces a finished crawl hands its results
//! to, and the run summary document.

use crate::extract::ProductRecord;
use crate::storage::RunTotals;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Outcome of a successful run
///
/// Serializes to `{"productsExtracted", "pagesProcessed", "runtime", "success"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub products_extracted: usize,
    pub pages_processed: u32,
    /// Elapsed wall-clock seconds
    pub runtime: f64,
    pub success: bool,

    #[serde(skip)]
    pub errors: u32,
}

impl RunSummary {
    /// Counters in the form stored with the run
    pub fn totals(&self) -> RunTotals {
        RunTotals {
            records_extracted: self.products_extracted as u64,
            pages_processed: self.pages_processed,
            errors: self.errors,
            runtime_secs: self.runtime,
        }
    }

    /// Accepted records per second
    pub fn records_per_second(&self) -> f64 {
        if self.runtime <= 0.0 {
            return 0.0;
        }
        self.products_extracted as f64 / self.runtime
    }
}

/// Outcome of a run that produced nothing usable
#[derive(Debug, Clone, PartialEq)]
pub struct RunFailure {
    pub message: String,
    pub pages_processed: u32,
    pub errors: u32,
    pub runtime: f64,
}

impl RunFailure {
    pub fn totals(&self) -> RunTotals {
        RunTotals {
            records_extracted: 0,
            pages_processed: self.pages_processed,
            errors: self.errors,
            runtime_secs: self.runtime,
        }
    }
}

/// Append-only destination for accepted records
///
/// Called once per batch after the crawl loop ends. Implementations are not
/// expected to be idempotent.
pub trait RecordSink: Send + Sync {
    fn append(&self, batch: &[ProductRecord]) -> OutputResult<()>;
}

/// Destination for the final run outcome
pub trait SummaryWriter: Send + Sync {
    /// Persists the summary of a successful run
    fn write_summary(&self, summary: &RunSummary) -> OutputResult<()>;

    /// Records a failed run; nothing is written by default
    fn record_failure(&self, failure: &RunFailure) -> OutputResult<()> {
        let _ = failure;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RunSummary {
        RunSummary {
            products_extracted: 20,
            pages_processed: 3,
            runtime: 10.0,
            success: true,
            errors: 1,
        }
    }

    #[test]
    fn test_summary_json_keys() {
        let json = serde_json::to_value(summary()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "productsExtracted": 20,
                "pagesProcessed": 3,
                "runtime": 10.0,
                "success": true
            })
        );
    }

    #[test]
    fn test_records_per_second() {
        assert!((summary().records_per_second() - 2.0).abs() < f64::EPSILON);

        let instant = RunSummary {
            runtime: 0.0,
            ..summary()
        };
        assert_eq!(instant.records_per_second(), 0.0);
    }

    #[test]
    fn test_totals() {
        let totals = summary().totals();
        assert_eq!(totals.records_extracted, 20);
        assert_eq!(totals.errors, 1);
    }
}
