//! Structured logging for a simulation run.
//!
//! Every allocator decision (malloc, free, split, coalesce) can optionally
//! be streamed to a JSONL file via `--log`, one [`DecisionEntry`] per line,
//! for offline inspection or diffing between two runs.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Malloc,
    Free,
    Split,
    Coalesce,
    NewSegment,
}

/// One decision the allocator made during replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionEntry {
    pub tick: u64,
    pub decision: Decision,
    pub segment_id: u64,
    pub start: u64,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl DecisionEntry {
    pub fn new(tick: u64, decision: Decision, segment_id: u64, start: u64, size: u64) -> Self {
        Self { tick, decision, segment_id, start, size, id: None, detail: None }
    }

    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Writes [`DecisionEntry`] records to a file as JSONL.
pub struct DecisionLog {
    writer: std::io::BufWriter<std::fs::File>,
}

impl DecisionLog {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self { writer: std::io::BufWriter::new(file) })
    }

    pub fn record(&mut self, entry: &DecisionEntry) -> std::io::Result<()> {
        let line = serde_json::to_string(entry).map_err(std::io::Error::other)?;
        writeln!(self.writer, "{line}")
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}
