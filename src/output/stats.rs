//! Statistics generation from the sweep database
//!
//! This module provides functionality for extracting and displaying
//! run and product statistics from the storage layer.

use crate::storage::{RunRecord, RunStatus, Storage};
use crate::SweepError;

/// Database-wide statistics
#[derive(Debug, Clone)]
pub struct SweepStatistics {
    /// Runs by final status
    pub completed_runs: u64,
    pub failed_runs: u64,
    pub running_runs: u64,

    /// Products stored across all runs
    pub total_products: u64,

    /// Products with a parsed price
    pub priced_products: u64,

    /// Lowest and highest stored price
    pub price_range: Option<(i64, i64)>,

    /// The most recent run, if any
    pub latest_run: Option<RunRecord>,
}

impl SweepStatistics {
    pub fn total_runs(&self) -> u64 {
        self.completed_runs + self.failed_runs + self.running_runs
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(SweepStatistics)` - Successfully loaded statistics
/// * `Err(SweepError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<SweepStatistics, SweepError> {
    Ok(SweepStatistics {
        completed_runs: storage.count_runs_by_status(RunStatus::Completed)?,
        failed_runs: storage.count_runs_by_status(RunStatus::Failed)?,
        running_runs: storage.count_runs_by_status(RunStatus::Running)?,
        total_products: storage.count_products(None)?,
        priced_products: storage.count_priced_products(None)?,
        price_range: storage.price_range(None)?,
        latest_run: storage.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &SweepStatistics) {
    println!("=== Sweep Statistics ===\n");

    println!("Runs:");
    println!("  Total: {}", stats.total_runs());
    println!("  Completed: {}", stats.completed_runs);
    println!("  Failed: {}", stats.failed_runs);
    if stats.running_runs > 0 {
        println!("  Unfinished: {}", stats.running_runs);
    }
    println!();

    println!("Products:");
    println!("  Stored: {}", stats.total_products);
    let priced_share = if stats.total_products > 0 {
        (stats.priced_products as f64 / stats.total_products as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "  With price: {} ({:.1}%)",
        stats.priced_products, priced_share
    );
    if let Some((min, max)) = stats.price_range {
        println!("  Price range: {} - {}", min, max);
    }
    println!();

    if let Some(run) = &stats.latest_run {
        println!("Latest Run (#{}):", run.id);
        println!("  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("  Finished: {}", finished);
        }
        println!("  Status: {}", run.status.to_db_string());
        println!("  Start URL: {}", run.start_url);
        println!("  Products extracted: {}", run.records_extracted);
        println!("  Pages processed: {}", run.pages_processed);
        println!("  Errors: {}", run.errors);
        if let Some(runtime) = run.runtime_secs {
            println!("  Runtime: {:.2}s", runtime);
        }
        if let Some(message) = &run.message {
            println!("  Message: {}", message);
        }
    }
}
