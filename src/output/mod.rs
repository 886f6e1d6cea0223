//! Output module for delivering crawl results
//!
//! This module handles:
//! - Record sinks (SQLite, JSON Lines) fed in fixed-size batches
//! - The run summary document
//! - Recording and printing sweep statistics

mod json;
mod sqlite_output;
pub mod stats;
mod traits;

pub use json::{JsonLinesSink, JsonSummaryWriter};
pub use sqlite_output::{SharedStorage, SqliteOutputHandler};
pub use stats::{load_statistics, print_statistics, SweepStatistics};
pub use traits::{
    OutputError, OutputResult, RecordSink, RunFailure, RunSummary, SummaryWriter,
};

use crate::extract::ProductRecord;

/// Maximum number of records per sink call
pub const SINK_BATCH_SIZE: usize = 50;

/// Hands `records` to `sink` in batches of [`SINK_BATCH_SIZE`]
///
/// # Returns
///
/// * `Ok(usize)` - Number of batches delivered
/// * `Err(OutputError)` - The first failing batch; later batches are not sent
pub fn deliver_in_batches(sink: &dyn RecordSink, records: &[ProductRecord]) -> OutputResult<usize> {
    let mut batches = 0;
    for batch in records.chunks(SINK_BATCH_SIZE) {
        sink.append(batch)?;
        batches += 1;
    }
    Ok(batches)
}

/// Forwards every batch to several sinks in order
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn RecordSink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl RecordSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl RecordSink for MultiSink {
    fn append(&self, batch: &[ProductRecord]) -> OutputResult<()> {
        for sink in &self.sinks {
            sink.append(batch)?;
        }
        Ok(())
    }
}

/// Forwards the run outcome to several writers in order
#[derive(Default)]
pub struct MultiSummaryWriter {
    writers: Vec<Box<dyn SummaryWriter>>,
}

impl MultiSummaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, writer: impl SummaryWriter + 'static) -> Self {
        self.writers.push(Box::new(writer));
        self
    }
}

impl SummaryWriter for MultiSummaryWriter {
    fn write_summary(&self, summary: &RunSummary) -> OutputResult<()> {
        for writer in &self.writers {
            writer.write_summary(summary)?;
        }
        Ok(())
    }

    fn record_failure(&self, failure: &RunFailure) -> OutputResult<()> {
        for writer in &self.writers {
            writer.record_failure(failure)?;
        }
        Ok(())
    }
}
