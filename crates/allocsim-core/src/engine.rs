//! The allocator engine: `malloc` and `free` over the segment table and the
//! block pool index, with the split/coalesce rules from the design.

use crate::block::{Block, Liveness};
use crate::error::{AllocError, BlockCoords, Result};
use crate::pool::BlockPoolIndex;
use crate::segment::SegmentTable;
use crate::size_policy::{SizePolicy, K_LARGE_BUFFER};

/// Coordinates returned by a successful `malloc`: where the block lives and
/// how large it actually is (which may be larger than requested if the hit
/// was not split).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub segment_id: u64,
    pub start: u64,
    pub size: u64,
    /// Whether the hit block was split to produce this allocation, i.e. a
    /// free remainder was carved off and reinserted into the pool.
    pub split: bool,
    /// The size of the block that was actually found or reserved, before
    /// any split: equal to `size` unless `split` is set, in which case the
    /// remainder left in the pool is `found_size - size`.
    pub found_size: u64,
}

/// What `free` did with the target block's neighbors, for callers (such as
/// the CLI's decision log) that want to distinguish a plain free from one
/// that triggered coalescing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeOutcome {
    /// Neither neighbor was free; the block was simply marked free.
    NoCoalesce,
    /// Merged with a free predecessor only.
    CoalescedPredecessor,
    /// Merged with a free successor only.
    CoalescedSuccessor,
    /// Merged with both a free predecessor and a free successor.
    CoalescedBoth,
}

/// Owns the segment table, the block pool index, and the running counters
/// for a single simulation. Single-threaded and non-blocking by design: no
/// internal locking, since nothing shares an instance (§5).
pub struct Allocator {
    segments: SegmentTable,
    pool: BlockPoolIndex,
    policy: SizePolicy,
    max_reserved_size: u64,
    /// Optional cap on total reservation, for the (currently unreachable)
    /// OOM branch. `None` under the default configuration.
    max_reserved_bytes: Option<u64>,
}

impl Allocator {
    pub fn new(policy: SizePolicy) -> Self {
        Self {
            segments: SegmentTable::new(),
            pool: BlockPoolIndex::new(),
            policy,
            max_reserved_size: 0,
            max_reserved_bytes: None,
        }
    }

    /// Builds an allocator that refuses to reserve more than `cap` bytes
    /// total, exercising the OOM branch that is otherwise dead code.
    pub fn with_reservation_cap(policy: SizePolicy, cap: u64) -> Self {
        let mut allocator = Self::new(policy);
        allocator.max_reserved_bytes = Some(cap);
        allocator
    }

    pub fn max_reserved_size(&self) -> u64 {
        self.max_reserved_size
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &SegmentTable {
        &self.segments
    }

    /// Allocates `size` bytes, to be freed at tick `die`. Returns the
    /// segment, start offset, effective (possibly inflated) size, and
    /// whether the hit was split (with the pre-split `found_size`).
    pub fn malloc(&mut self, size: u64, die: u64) -> Result<Allocation> {
        let (segment_id, start, found_size) = match self.pool.find_fit(size) {
            Some((segment_id, found_size)) => {
                let start = self.first_free_block_with_size(segment_id, found_size)?;
                self.pool.remove(segment_id, found_size)?;
                self.segments.set_liveness(segment_id, start, Liveness::Live { die })?;
                (segment_id, start, found_size)
            }
            None => {
                let alloc_size = self.policy.allocation_size(size);
                if let Some(cap) = self.max_reserved_bytes {
                    if self.max_reserved_size + alloc_size > cap {
                        return Err(AllocError::OutOfMemory { requested: alloc_size });
                    }
                }
                let segment_id = self.segments.create_segment(alloc_size, Liveness::Live { die });
                self.max_reserved_size += alloc_size;
                (segment_id, 0, alloc_size)
            }
        };

        let split = should_split(size, found_size);
        let effective_size = if split {
            self.split(segment_id, start, size, found_size, die)?;
            size
        } else {
            found_size
        };

        Ok(Allocation { segment_id, start, size: effective_size, split, found_size })
    }

    /// Frees the block at `(segment_id, start, size)`, coalescing with any
    /// free neighbors.
    pub fn free(&mut self, segment_id: u64, start: u64, size: u64) -> Result<FreeOutcome> {
        let coords = BlockCoords { segment_id, start, size };
        let target = self.segments.find_block(segment_id, start, size)?;
        if target.is_free() {
            return Err(AllocError::BlockAlreadyFree(coords));
        }
        let end = start + size;

        let predecessor = self.segments.find_predecessor_free(segment_id, start);
        let successor = self.segments.find_successor_free(segment_id, end);

        let (new_start, new_end) = match (predecessor, successor) {
            (Some(p), Some(s)) => {
                self.pool.remove(segment_id, p.size())?;
                self.pool.remove(segment_id, s.size())?;
                (p.start, s.end)
            }
            (Some(p), None) => {
                self.pool.remove(segment_id, p.size())?;
                (p.start, end)
            }
            (None, Some(s)) => {
                self.pool.remove(segment_id, s.size())?;
                (start, s.end)
            }
            (None, None) => (start, end),
        };

        let mut remove_starts = vec![start];
        if let Some(p) = predecessor {
            remove_starts.push(p.start);
        }
        if let Some(s) = successor {
            remove_starts.push(s.start);
        }
        let merged = Block::new(new_start, new_end, Liveness::Free);
        self.segments.replace(segment_id, &remove_starts, std::slice::from_ref(&merged))?;
        self.pool.insert(segment_id, merged.size());

        Ok(match (predecessor, successor) {
            (Some(_), Some(_)) => FreeOutcome::CoalescedBoth,
            (Some(_), None) => FreeOutcome::CoalescedPredecessor,
            (None, Some(_)) => FreeOutcome::CoalescedSuccessor,
            (None, None) => FreeOutcome::NoCoalesce,
        })
    }

    /// Splits the hit block at `start` in `segment_id`: shrinks it to
    /// `[start, start+size)` (keeping its live liveness), and inserts the
    /// free remainder `[start+size, start+found_size)` into the pool.
    fn split(&mut self, segment_id: u64, start: u64, size: u64, found_size: u64, die: u64) -> Result<()> {
        let live_part = Block::new(start, start + size, Liveness::Live { die });
        let remainder = Block::new(start + size, start + found_size, Liveness::Free);
        self.segments.replace(segment_id, &[start], &[live_part, remainder])?;
        self.pool.insert(segment_id, remainder.size());
        Ok(())
    }

    /// Finds the free block of exactly `size` in `segment_id` with the
    /// smallest `start` — the pool index only tracks `(segment_id, size)`
    /// pairs, so the exact block is resolved against the segment table.
    ///
    /// A `None` here means the pool index and segment table disagree about
    /// which blocks are free, which is a core invariant violation (§4.2):
    /// it surfaces as [`AllocError::PoolDescriptorMissing`] rather than a
    /// panic, so the caller halts the same way every other invariant
    /// violation does.
    fn first_free_block_with_size(&self, segment_id: u64, size: u64) -> Result<u64> {
        self.segments
            .get(segment_id)
            .and_then(|segment| {
                segment
                    .blocks()
                    .find(|block| block.is_free() && block.size() == size)
                    .map(|block| block.start)
            })
            .ok_or(AllocError::PoolDescriptorMissing(BlockCoords { segment_id, start: 0, size }))
    }

    /// Re-derives every invariant from §8 of the design document and
    /// returns the first violation found, if any. Exercised directly by
    /// tests (not gated to debug builds), per the error-handling design.
    pub fn check_invariants(&self) -> Result<()> {
        let mut pool_multiset: std::collections::BTreeMap<(u64, u64), i64> = std::collections::BTreeMap::new();
        for segment in self.segments.iter() {
            segment.check_tiling()?;
            segment.check_no_adjacent_free()?;
            for block in segment.blocks() {
                if block.is_free() {
                    *pool_multiset.entry((segment.id, block.size())).or_insert(0) += 1;
                }
            }
        }
        for (segment_id, size) in self.pool.multiset() {
            let slot = pool_multiset.entry((segment_id, size)).or_insert(0);
            *slot -= 1;
        }
        if pool_multiset.values().any(|&count| count != 0) {
            return Err(AllocError::TilingViolation {
                segment_id: 0,
                detail: "pool index and segment table free-block multisets disagree".to_string(),
            });
        }
        Ok(())
    }
}

/// `found_size - size > kLargeBuffer`. Strict inequality: a remainder of
/// exactly `kLargeBuffer` does not trigger a split.
fn should_split(size: u64, found_size: u64) -> bool {
    found_size - size > K_LARGE_BUFFER
}
