//! JSON file outputs
//!
//! - `JsonLinesSink` appends one JSON object per record
//! - `JsonSummaryWriter` writes the run summary document

use crate::extract::ProductRecord;
use crate::output::traits::{OutputError, OutputResult, RecordSink, RunSummary, SummaryWriter};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appends records to a JSON Lines file
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonLinesSink {
    fn append(&self, batch: &[ProductRecord]) -> OutputResult<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);

        for record in batch {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }

        writer
            .flush()
            .map_err(|e| OutputError::Write(format!("{}: {}", self.path.display(), e)))
    }
}

/// Writes the summary of a successful run as pretty-printed JSON
#[derive(Debug, Clone)]
pub struct JsonSummaryWriter {
    path: PathBuf,
}

impl JsonSummaryWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SummaryWriter for JsonSummaryWriter {
    fn write_summary(&self, summary: &RunSummary) -> OutputResult<()> {
        let json = serde_json::to_string_pretty(summary)?;

        let mut file = File::create(&self.path)?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;

        Ok(())
    }
}
