//! Error types for the allocator engine.
//!
//! Two families, matching the two failure classes in the design: recoverable
//! conditions the caller may continue past, and invariant violations that
//! indicate a bug in the simulator itself and must halt the run.

use thiserror::Error;

/// Coordinates of the block involved in a failed operation, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockCoords {
    pub segment_id: u64,
    pub start: u64,
    pub size: u64,
}

impl std::fmt::Display for BlockCoords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "segment={} start={} size={}",
            self.segment_id, self.start, self.size
        )
    }
}

/// Errors raised by [`crate::engine::Allocator`].
///
/// `OutOfMemory` is the only recoverable variant: the caller may inspect it
/// and continue. Every other variant is a core invariant violation and the
/// caller (the replay driver, and ultimately the CLI) must treat it as fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocError {
    /// The size policy would exceed a configured reservation cap. Unreachable
    /// under the default configuration, where no cap is set.
    #[error("out of memory: cannot reserve {requested} more bytes")]
    OutOfMemory { requested: u64 },

    /// `free` was asked to locate a block that does not exist in the segment.
    #[error("invariant violation: block not found at {0}")]
    BlockNotFound(BlockCoords),

    /// `free` was asked to free a block whose liveness is already `Free`.
    #[error("invariant violation: double free at {0}")]
    BlockAlreadyFree(BlockCoords),

    /// The pool index has no descriptor matching a free block in the segment
    /// table, or vice versa. Can only happen if a prior operation updated one
    /// without the other.
    #[error("invariant violation: pool/segment-table disagreement at {0}")]
    PoolDescriptorMissing(BlockCoords),

    /// A segment's blocks no longer tile `[0, capacity)` without gaps or
    /// overlaps after an operation.
    #[error("invariant violation: tiling broken in segment {segment_id}: {detail}")]
    TilingViolation { segment_id: u64, detail: String },
}

impl AllocError {
    /// True for every variant except [`AllocError::OutOfMemory`] — the
    /// variants that indicate a bug in the simulator rather than an
    /// expected, recoverable condition.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AllocError::OutOfMemory { .. })
    }
}

pub type Result<T> = std::result::Result<T, AllocError>;
