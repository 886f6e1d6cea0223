//! SQLite-based output handler implementation
//!
//! This module provides a record sink and summary writer that store a run's
//! results directly in the SQLite storage backend.

use crate::extract::ProductRecord;
use crate::output::traits::{
    OutputError, OutputResult, RecordSink, RunFailure, RunSummary, SummaryWriter,
};
use crate::storage::Storage;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared handle to a storage backend
pub type SharedStorage = Arc<Mutex<dyn Storage + Send>>;

/// SQLite-based output handler
///
/// Records go to the `products` table under `run_id`; the summary or failure
/// closes the run row.
#[derive(Clone)]
pub struct SqliteOutputHandler {
    storage: SharedStorage,
    run_id: i64,
}

impl SqliteOutputHandler {
    /// Creates a new SQLite output handler
    ///
    /// # Arguments
    ///
    /// * `storage` - The storage backend to use
    /// * `run_id` - The current run ID
    pub fn new(storage: SharedStorage, run_id: i64) -> Self {
        Self { storage, run_id }
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    fn lock(&self) -> OutputResult<MutexGuard<'_, dyn Storage + Send + 'static>> {
        self.storage
            .lock()
            .map_err(|e| OutputError::Storage(format!("Failed to lock storage: {}", e)))
    }
}

impl RecordSink for SqliteOutputHandler {
    fn append(&self, batch: &[ProductRecord]) -> OutputResult<()> {
        let mut storage = self.lock()?;

        let written = storage
            .insert_products(self.run_id, batch)
            .map_err(|e| OutputError::Storage(e.to_string()))?;

        tracing::debug!("Stored {} products for run {}", written, self.run_id);
        Ok(())
    }
}

impl SummaryWriter for SqliteOutputHandler {
    fn write_summary(&self, summary: &RunSummary) -> OutputResult<()> {
        let mut storage = self.lock()?;

        storage
            .complete_run(self.run_id, &summary.totals())
            .map_err(|e| OutputError::Storage(e.to_string()))
    }

    fn record_failure(&self, failure: &RunFailure) -> OutputResult<()> {
        let mut storage = self.lock()?;

        storage
            .fail_run(self.run_id, &failure.message, &failure.totals())
            .map_err(|e| OutputError::Storage(e.to_string()))
    }
}
