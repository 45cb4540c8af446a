//! JSON Lines trace format: one record per line, `{"id", "size_bytes",
//! "born", "die"}`. A more convenient input format than the upstream
//! liveness-pair files for traces authored or generated directly in Rust.

use allocsim_core::EventRecord;
use serde::Deserialize;

use crate::error::{Result, TraceError};

#[derive(Debug, Deserialize)]
struct RawRecord {
    id: u64,
    size_bytes: i64,
    born: u64,
    die: u64,
}

/// Parses `content` as newline-delimited JSON records into the normalized
/// event sequence. Blank lines are skipped.
pub fn parse(content: &str) -> Result<Vec<EventRecord>> {
    let mut events = Vec::new();
    let mut seen = std::collections::BTreeSet::new();

    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let raw: RawRecord = serde_json::from_str(line).map_err(|e| TraceError::Unparsable {
            path: "<jsonl>".to_string(),
            line: line_no + 1,
            content: e.to_string(),
        })?;

        if raw.size_bytes <= 0 {
            return Err(TraceError::NonPositiveSize { id: raw.id, size: raw.size_bytes });
        }
        if raw.born > raw.die {
            return Err(TraceError::BornAfterDie { id: raw.id, born: raw.born, die: raw.die });
        }
        if !seen.insert(raw.id) {
            return Err(TraceError::DuplicateId { id: raw.id });
        }
        events.push(EventRecord {
            id: raw.id,
            size: raw.size_bytes as u64,
            born: raw.born,
            die: raw.die,
        });
    }

    Ok(events)
}
