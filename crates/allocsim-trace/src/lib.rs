//! Trace ingestion for the allocator simulator.
//!
//! Normalizes either of two source formats into the `Vec<EventRecord>` the
//! replay driver in `allocsim-core` consumes: the upstream liveness-pair
//! format (a size list plus a liveness log) and a JSON Lines format for
//! traces authored directly.

#![deny(unsafe_code)]

mod error;
mod jsonl;
mod liveness;

pub use allocsim_core::EventRecord;
pub use error::{Result, TraceError};

/// Selects which source format [`load`] expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// The upstream two-file liveness-pair format.
    LivenessPair,
    /// One JSON object per line.
    JsonLines,
}

/// Parses a liveness-pair trace from its two file contents.
pub fn load_liveness_pair(size_list: &str, liveness: &str) -> Result<Vec<EventRecord>> {
    liveness::parse(size_list, liveness)
}

/// Parses a JSON Lines trace from its single file content.
pub fn load_jsonl(content: &str) -> Result<Vec<EventRecord>> {
    jsonl::parse(content)
}
