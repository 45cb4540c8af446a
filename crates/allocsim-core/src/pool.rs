//! Block pool index: a searchable multiset of currently-free `(segment_id,
//! size)` descriptors, used for best-fit lookup.
//!
//! Backed by an ordered multimap keyed by size (`BTreeMap<size, BTreeMap<segment_id,
//! count>>`) rather than the plain vector the original source sorts on every
//! query: `find_fit` becomes an O(log n) range lookup instead of a full sort.

use std::collections::BTreeMap;

use crate::error::{AllocError, BlockCoords, Result};

#[derive(Debug, Default)]
pub struct BlockPoolIndex {
    /// size -> segment_id -> number of free blocks of that size in that segment.
    by_size: BTreeMap<u64, BTreeMap<u64, u32>>,
    len: usize,
}

impl BlockPoolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Adds a free-block descriptor.
    pub fn insert(&mut self, segment_id: u64, size: u64) {
        *self.by_size.entry(size).or_default().entry(segment_id).or_insert(0) += 1;
        self.len += 1;
    }

    /// Removes exactly one descriptor matching `(segment_id, size)`.
    ///
    /// This is a core invariant violation if no such descriptor exists: it
    /// means a previous operation updated the segment table without pairing
    /// the matching pool update.
    pub fn remove(&mut self, segment_id: u64, size: u64) -> Result<()> {
        let coords = BlockCoords { segment_id, start: 0, size };
        let by_segment = self.by_size.get_mut(&size).ok_or(AllocError::PoolDescriptorMissing(coords))?;
        let count = by_segment.get_mut(&segment_id).ok_or(AllocError::PoolDescriptorMissing(coords))?;
        *count -= 1;
        if *count == 0 {
            by_segment.remove(&segment_id);
        }
        if by_segment.is_empty() {
            self.by_size.remove(&size);
        }
        self.len -= 1;
        Ok(())
    }

    /// Returns the descriptor with the smallest `size_found >= size`.
    ///
    /// Ties on size are broken by smallest `segment_id` — this
    /// implementation's documented, deterministic tie-break rule (§4.2 of
    /// the design document).
    pub fn find_fit(&self, size: u64) -> Option<(u64, u64)> {
        let (&size_found, by_segment) = self.by_size.range(size..).next()?;
        let (&segment_id, _) = by_segment.iter().next()?;
        Some((segment_id, size_found))
    }

    /// Every free-block descriptor, expanded out of its per-size/per-segment
    /// counts, for consistency checks against the segment table. Not a
    /// query real callers need — `find_fit` is the public surface — so this
    /// stays crate-private.
    pub(crate) fn multiset(&self) -> Vec<(u64, u64)> {
        let mut out = Vec::new();
        for (&size, by_segment) in &self.by_size {
            for (&segment_id, &count) in by_segment {
                for _ in 0..count {
                    out.push((segment_id, size));
                }
            }
        }
        out
    }
}
