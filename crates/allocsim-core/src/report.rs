//! Final report: the counters a replay run produces, plus the size-string
//! formatting rule used to render them for humans.

use serde::Serialize;

use crate::block::Liveness;
use crate::engine::Allocator;
use crate::replay::ReplayReport;

/// A single block, flattened for reporting (no handle/index machinery).
#[derive(Debug, Clone, Serialize)]
pub struct BlockSnapshot {
    pub start: u64,
    pub end: u64,
    pub free: bool,
}

/// A single segment, flattened for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentSnapshot {
    pub segment_id: u64,
    pub capacity: u64,
    pub blocks: Vec<BlockSnapshot>,
}

/// The final report emitted after a replay run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub segment_count: u64,
    pub max_reserved_size_bytes: u64,
    /// Present only when the caller asked for `--dump-segments`.
    pub segments: Option<Vec<SegmentSnapshot>>,
}

impl Report {
    pub fn from_replay(replay: ReplayReport) -> Self {
        Self {
            segment_count: replay.segment_count as u64,
            max_reserved_size_bytes: replay.max_reserved_size_bytes,
            segments: None,
        }
    }

    /// Builds a report including a full snapshot of the allocator's segment
    /// table, for `--dump-segments`.
    pub fn with_segments(allocator: &Allocator) -> Self {
        let segments = allocator
            .segments()
            .iter()
            .map(|segment| SegmentSnapshot {
                segment_id: segment.id,
                capacity: segment.capacity,
                blocks: segment
                    .blocks()
                    .map(|block| BlockSnapshot {
                        start: block.start,
                        end: block.end,
                        free: matches!(block.liveness, Liveness::Free),
                    })
                    .collect(),
            })
            .collect();
        Self {
            segment_count: allocator.segment_count() as u64,
            max_reserved_size_bytes: allocator.max_reserved_size(),
            segments: Some(segments),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("[Allocator report]\n");
        out.push_str(&format!("Number of large segments: {}\n", self.segment_count));
        out.push_str(&format!(
            "Max reserved size: {} B ({})\n",
            self.max_reserved_size_bytes,
            format_size(self.max_reserved_size_bytes)
        ));
        if let Some(segments) = &self.segments {
            for segment in segments {
                out.push_str(&format!(
                    "  segment {} (capacity {}):\n",
                    segment.segment_id, segment.capacity
                ));
                for block in &segment.blocks {
                    let state = if block.free { "free" } else { "live" };
                    out.push_str(&format!(
                        "    [{}, {}) {}\n",
                        block.start, block.end, state
                    ));
                }
            }
        }
        out
    }
}

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;

/// Renders a byte count using binary units: `< 1 KiB` as bytes, `< 1 MiB`
/// as KiB, `< 1 GiB` as MiB, else GiB — each non-byte case with 2 decimals.
pub fn format_size(size: u64) -> String {
    let bytes = size as f64;
    if size < 1024 {
        format!("{size} B")
    } else if bytes < MIB {
        format!("{:.2} KiB", bytes / KIB)
    } else if bytes < GIB {
        format!("{:.2} MiB", bytes / MIB)
    } else {
        format!("{:.2} GiB", bytes / GIB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_bytes_below_one_kib() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
    }

    #[test]
    fn formats_kib_below_one_mib() {
        assert_eq!(format_size(1024), "1.00 KiB");
        assert_eq!(format_size(1536), "1.50 KiB");
    }

    #[test]
    fn formats_mib_below_one_gib() {
        assert_eq!(format_size(1024 * 1024), "1.00 MiB");
        assert_eq!(format_size(20 * 1024 * 1024), "20.00 MiB");
    }

    #[test]
    fn formats_gib_at_and_above_one_gib() {
        assert_eq!(format_size(1024 * 1024 * 1024), "1.00 GiB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.00 GiB");
    }
}
