//! Segment table: the authoritative record of every reserved segment and the
//! blocks tiling it.

use std::collections::BTreeMap;

use crate::block::{Block, Liveness};
use crate::error::{AllocError, BlockCoords, Result};

/// A single device reservation, fixed `capacity`, tiled by blocks with no
/// gaps and no overlaps. Blocks are keyed by `start` in a `BTreeMap` so
/// neighbor queries (`find_predecessor_free` / `find_successor_free`) are
/// O(log n) instead of a linear scan over a `Vec`, per the re-architecture
/// notes in the design document.
#[derive(Debug, Clone)]
pub struct Segment {
    pub id: u64,
    pub capacity: u64,
    blocks: BTreeMap<u64, Block>,
}

impl Segment {
    fn new(id: u64, capacity: u64, initial_liveness: Liveness) -> Self {
        let mut blocks = BTreeMap::new();
        blocks.insert(0, Block::new(0, capacity, initial_liveness));
        Self { id, capacity, blocks }
    }

    /// Iterates blocks in ascending `start` order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Checks the tiling invariant: blocks sorted by `start` cover
    /// `[0, capacity)` exactly, with no gaps and no overlaps.
    pub fn check_tiling(&self) -> Result<()> {
        let mut expected_start = 0u64;
        for block in self.blocks.values() {
            if block.start != expected_start {
                return Err(AllocError::TilingViolation {
                    segment_id: self.id,
                    detail: format!(
                        "expected block starting at {expected_start}, found one starting at {}",
                        block.start
                    ),
                });
            }
            expected_start = block.end;
        }
        if expected_start != self.capacity {
            return Err(AllocError::TilingViolation {
                segment_id: self.id,
                detail: format!(
                    "blocks cover up to {expected_start}, expected capacity {}",
                    self.capacity
                ),
            });
        }
        Ok(())
    }

    /// Checks that no two adjacent blocks are both free (invariant 3).
    pub fn check_no_adjacent_free(&self) -> Result<()> {
        let mut prev_free: Option<u64> = None;
        for block in self.blocks.values() {
            if block.is_free() {
                if let Some(prev_end) = prev_free {
                    if prev_end == block.start {
                        return Err(AllocError::TilingViolation {
                            segment_id: self.id,
                            detail: format!(
                                "two adjacent free blocks meeting at {}",
                                block.start
                            ),
                        });
                    }
                }
                prev_free = Some(block.end);
            } else {
                prev_free = None;
            }
        }
        Ok(())
    }
}

/// The segment table: owns every segment ever reserved. Segments are never
/// removed, matching the no-release model of the simulated device.
#[derive(Debug, Default)]
pub struct SegmentTable {
    segments: BTreeMap<u64, Segment>,
    next_id: u64,
}

impl SegmentTable {
    pub fn new() -> Self {
        Self { segments: BTreeMap::new(), next_id: 1 }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    pub fn get(&self, segment_id: u64) -> Option<&Segment> {
        self.segments.get(&segment_id)
    }

    /// Appends a new segment containing a single block `[0, capacity)` with
    /// the given liveness, and returns the assigned id.
    pub fn create_segment(&mut self, capacity: u64, initial_liveness: Liveness) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.segments.insert(id, Segment::new(id, capacity, initial_liveness));
        id
    }

    /// Locates the unique block whose `start` and `size` match.
    pub fn find_block(&self, segment_id: u64, start: u64, size: u64) -> Result<Block> {
        let coords = BlockCoords { segment_id, start, size };
        let segment = self.segments.get(&segment_id).ok_or(AllocError::BlockNotFound(coords))?;
        let block = segment.blocks.get(&start).ok_or(AllocError::BlockNotFound(coords))?;
        if block.size() != size {
            return Err(AllocError::BlockNotFound(coords));
        }
        Ok(*block)
    }

    /// The free block (if any) whose `end == start`, i.e. the block
    /// immediately preceding `start` in this segment.
    pub fn find_predecessor_free(&self, segment_id: u64, start: u64) -> Option<Block> {
        let segment = self.segments.get(&segment_id)?;
        let (_, candidate) = segment.blocks.range(..start).next_back()?;
        (candidate.end == start && candidate.is_free()).then_some(*candidate)
    }

    /// The free block (if any) whose `start == end`, i.e. the block
    /// immediately following `end` in this segment.
    pub fn find_successor_free(&self, segment_id: u64, end: u64) -> Option<Block> {
        let segment = self.segments.get(&segment_id)?;
        let candidate = segment.blocks.get(&end)?;
        candidate.is_free().then_some(*candidate)
    }

    pub fn set_liveness(&mut self, segment_id: u64, start: u64, liveness: Liveness) -> Result<()> {
        let segment = self
            .segments
            .get_mut(&segment_id)
            .ok_or(AllocError::BlockNotFound(BlockCoords { segment_id, start, size: 0 }))?;
        let block = segment
            .blocks
            .get_mut(&start)
            .ok_or(AllocError::BlockNotFound(BlockCoords { segment_id, start, size: 0 }))?;
        block.liveness = liveness;
        Ok(())
    }

    /// Removes the blocks at `remove_starts` from `segment_id` and inserts
    /// `new_blocks` in their place. Callers are responsible for passing a
    /// set that preserves the tiling invariant; this is checked by the
    /// caller via [`Segment::check_tiling`] after the substitution, not
    /// here, so that a single `malloc`/`free` call can batch several
    /// substitutions before re-validating.
    pub fn replace(&mut self, segment_id: u64, remove_starts: &[u64], new_blocks: &[Block]) -> Result<()> {
        let segment = self.segments.get_mut(&segment_id).ok_or(AllocError::BlockNotFound(
            BlockCoords { segment_id, start: 0, size: 0 },
        ))?;
        for start in remove_starts {
            segment.blocks.remove(start);
        }
        for block in new_blocks {
            segment.blocks.insert(block.start, *block);
        }
        Ok(())
    }
}
