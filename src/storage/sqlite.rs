//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::extract::ProductRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus, RunTotals, StoredProduct};
use crate::SweepError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, start_url, status,
     records_extracted, pages_processed, errors, runtime_secs, message";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(SweepError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SweepError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, SweepError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        message: Option<&str>,
        totals: &RunTotals,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs
             SET status = ?1, finished_at = ?2, records_extracted = ?3, pages_processed = ?4,
                 errors = ?5, runtime_secs = ?6, message = ?7
             WHERE id = ?8",
            params![
                status.to_db_string(),
                now,
                i64::try_from(totals.records_extracted).unwrap_or(i64::MAX),
                totals.pages_processed,
                totals.errors,
                totals.runtime_secs,
                message,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        start_url: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?).unwrap_or(RunStatus::Running),
        records_extracted: u64::try_from(row.get::<_, i64>(6)?).unwrap_or(0),
        pages_processed: row.get(7)?,
        errors: row.get(8)?,
        runtime_secs: row.get(9)?,
        message: row.get(10)?,
    })
}

fn to_sql_count(value: Option<u64>) -> Option<i64> {
    value.and_then(|v| i64::try_from(v).ok())
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str, start_url: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, start_url, status) VALUES (?1, ?2, ?3, ?4)",
            params![now, config_hash, start_url, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let query = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&query, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let query = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        let run = self.conn.query_row(&query, [], run_from_row).optional()?;
        Ok(run)
    }

    fn complete_run(&mut self, run_id: i64, totals: &RunTotals) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Completed, None, totals)
    }

    fn fail_run(&mut self, run_id: i64, message: &str, totals: &RunTotals) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Failed, Some(message), totals)
    }

    fn count_runs_by_status(&self, status: RunStatus) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM runs WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Product Management =====

    fn insert_products(&mut self, run_id: i64, records: &[ProductRecord]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO products (
                    run_id, product_id, title, price, price_text, original_price,
                    original_price_text, discount_percent, discount_text, rating, rating_count,
                    review_count, specifications, image_url, url, fetched_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            )?;

            for record in records {
                let specifications = record
                    .specifications
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;

                stmt.execute(params![
                    run_id,
                    record.id,
                    record.title,
                    record.price,
                    record.price_text,
                    record.original_price,
                    record.original_price_text,
                    record.discount_percent,
                    record.discount_text,
                    record.rating,
                    to_sql_count(record.rating_count),
                    to_sql_count(record.review_count),
                    specifications,
                    record.image_url,
                    record.url,
                    record.fetched_at.to_rfc3339(),
                ])?;
            }
        }
        tx.commit()?;

        Ok(records.len())
    }

    fn count_products(&self, run_id: Option<i64>) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM products WHERE ?1 IS NULL OR run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_priced_products(&self, run_id: Option<i64>) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM products WHERE price IS NOT NULL AND (?1 IS NULL OR run_id = ?1)",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn price_range(&self, run_id: Option<i64>) -> StorageResult<Option<(i64, i64)>> {
        let (min, max): (Option<i64>, Option<i64>) = self.conn.query_row(
            "SELECT MIN(price), MAX(price) FROM products WHERE ?1 IS NULL OR run_id = ?1",
            params![run_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(min.zip(max))
    }

    fn get_products(&self, run_id: i64) -> StorageResult<Vec<StoredProduct>> {
        let mut stmt = self.conn.prepare(
            "SELECT product_id, title, price, rating, specifications, url
             FROM products WHERE run_id = ?1 ORDER BY id",
        )?;

        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(product_id, title, price, rating, specs, url)| {
                let specifications = specs
                    .map(|json| serde_json::from_str(&json))
                    .transpose()
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                Ok(StoredProduct {
                    product_id,
                    title,
                    price,
                    rating,
                    specifications,
                    url,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::fields::parse_specification_items;

    fn product(id: &str, price: Option<i64>) -> ProductRecord {
        ProductRecord {
            id: Some(id.to_string()),
            title: Some(format!("Monitor {}", id)),
            price,
            price_text: price.map(|p| format!("₹{}", p)),
            original_price: None,
            original_price_text: None,
            discount_percent: Some(12),
            discount_text: Some("12% off".to_string()),
            rating: Some(4.2),
            rating_count: Some(1021),
            review_count: None,
            specifications: parse_specification_items(["Panel: IPS", "60 Hz"]),
            image_url: None,
            url: Some(format!("https://shop.example/p/{}", id)),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_in_memory() {
        let storage = SqliteStorage::new_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_create_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage
            .create_run("test_hash", "https://shop.example/list")
            .unwrap();
        assert!(run_id > 0);

        let run = storage.get_run(run_id).unwrap();
        assert_eq!(run.status, RunStatus::Running);
        assert_eq!(run.start_url, "https://shop.example/list");
        assert!(run.finished_at.is_none());
    }

    #[test]
    fn test_complete_run_stores_totals() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash", "https://shop.example/").unwrap();

        let totals = RunTotals {
            records_extracted: 20,
            pages_processed: 3,
            errors: 1,
            runtime_secs: 12.5,
        };
        storage.complete_run(run_id, &totals).unwrap();

        let run = storage.get_latest_run().unwrap().unwrap();
        assert_eq!(run.id, run_id);
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.records_extracted, 20);
        assert_eq!(run.pages_processed, 3);
        assert_eq!(run.errors, 1);
        assert_eq!(run.runtime_secs, Some(12.5));
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_fail_run_keeps_message() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash", "https://shop.example/").unwrap();

        storage
            .fail_run(run_id, "Failed to fetch first page", &RunTotals::default())
            .unwrap();

        let run = storage.get_run(run_id).unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.message.as_deref(), Some("Failed to fetch first page"));
        assert_eq!(storage.count_runs_by_status(RunStatus::Failed).unwrap(), 1);
    }

    #[test]
    fn test_finish_unknown_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let result = storage.complete_run(99, &RunTotals::default());
        assert!(matches!(result, Err(StorageError::RunNotFound(99))));
        assert!(matches!(storage.get_run(99), Err(StorageError::RunNotFound(99))));
    }

    #[test]
    fn test_insert_and_read_products() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash", "https://shop.example/").unwrap();

        let records = vec![product("A", Some(7499)), product("B", None), product("C", Some(12999))];
        assert_eq!(storage.insert_products(run_id, &records).unwrap(), 3);

        assert_eq!(storage.count_products(Some(run_id)).unwrap(), 3);
        assert_eq!(storage.count_products(None).unwrap(), 3);
        assert_eq!(storage.count_priced_products(Some(run_id)).unwrap(), 2);
        assert_eq!(storage.price_range(None).unwrap(), Some((7499, 12999)));

        let stored = storage.get_products(run_id).unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[0].product_id.as_deref(), Some("A"));
        assert_eq!(
            stored[0].specifications,
            Some(serde_json::json!({"Panel": "IPS", "spec_2": "60 Hz"}))
        );
    }

    #[test]
    fn test_price_range_empty() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        assert_eq!(storage.price_range(None).unwrap(), None);
        assert_eq!(storage.count_products(None).unwrap(), 0);
    }
}
