//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::extract::ProductRecord;
use crate::storage::{RunRecord, RunStatus, RunTotals, StoredProduct};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the crawler.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run in the running state
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    /// * `start_url` - First listing page of the run
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str, start_url: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run as completed and stores its totals
    fn complete_run(&mut self, run_id: i64, totals: &RunTotals) -> StorageResult<()>;

    /// Marks a run as failed, keeping the message and whatever totals it reached
    fn fail_run(&mut self, run_id: i64, message: &str, totals: &RunTotals) -> StorageResult<()>;

    /// Counts runs with the given status
    fn count_runs_by_status(&self, status: RunStatus) -> StorageResult<u64>;

    // ===== Product Management =====

    /// Appends a batch of records to a run
    ///
    /// # Returns
    ///
    /// The number of rows written
    fn insert_products(&mut self, run_id: i64, records: &[ProductRecord]) -> StorageResult<usize>;

    /// Counts stored products, for one run or across all runs
    fn count_products(&self, run_id: Option<i64>) -> StorageResult<u64>;

    /// Counts stored products that carry a parsed price
    fn count_priced_products(&self, run_id: Option<i64>) -> StorageResult<u64>;

    /// Lowest and highest stored price
    fn price_range(&self, run_id: Option<i64>) -> StorageResult<Option<(i64, i64)>>;

    /// Products of a run in insertion order
    fn get_products(&self, run_id: i64) -> StorageResult<Vec<StoredProduct>>;
}
