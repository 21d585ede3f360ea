//! JSONL-backed response sink.
//!
//! Offline/local alternative to the HTTP sink: one JSON record per line,
//! append-only, matching the sink contract's never-mutate guarantee.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::ResponseSink;
use crate::domain::ResponseRecord;
use crate::error::Result;

/// Append-only JSONL file of submitted responses.
#[derive(Debug)]
pub struct JsonlResponseSink {
    path: PathBuf,
}

impl JsonlResponseSink {
    /// Create a sink writing to the given file, creating parent
    /// directories as needed.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    /// Read every record appended so far.
    pub fn read_all(&self) -> Result<Vec<ResponseRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = fs::File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}

#[async_trait]
impl ResponseSink for JsonlResponseSink {
    async fn append(&self, record: ResponseRecord) -> Result<()> {
        let line = serde_json::to_string(&record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}
