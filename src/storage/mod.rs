//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Run tracking with final totals and failure messages
//! - Product record persistence

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::SweepError;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(SweepError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, SweepError> {
    SqliteStorage::new(path)
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub start_url: String,
    pub status: RunStatus,
    pub records_extracted: u64,
    pub pages_processed: u32,
    pub errors: u32,
    pub runtime_secs: Option<f64>,
    pub message: Option<String>,
}

/// Final counters of a run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunTotals {
    pub records_extracted: u64,
    pub pages_processed: u32,
    pub errors: u32,
    pub runtime_secs: f64,
}

/// A product row as read back from the database
#[derive(Debug, Clone, PartialEq)]
pub struct StoredProduct {
    pub product_id: Option<String>,
    pub title: Option<String>,
    pub price: Option<i64>,
    pub rating: Option<f64>,
    pub specifications: Option<serde_json::Value>,
    pub url: Option<String>,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
