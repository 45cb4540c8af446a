//! Caching large-block allocator simulator.
//!
//! Replays a trace of large-block allocation/free events against a
//! simulated caching allocator that partitions reserved memory into
//! segments and sub-blocks, to measure the peak reserved memory and segment
//! count a chosen allocation policy produces. Once reserved from the
//! (simulated) device, memory is never returned during a run: freed blocks
//! are cached, coalesced with free neighbors, and reused when a later
//! request fits.
//!
//! Trace ingestion and CLI/report framing live in sibling crates
//! (`allocsim-trace`, `allocsim-cli`); this crate is the core simulator
//! only — segment/block bookkeeping, best-fit selection, split/coalesce,
//! and the replay driver.

#![deny(unsafe_code)]

mod block;
mod engine;
mod error;
mod pool;
mod replay;
mod report;
mod segment;
mod size_policy;

pub use block::{Block, Liveness};
pub use engine::{Allocation, Allocator, FreeOutcome};
pub use error::{AllocError, BlockCoords, Result};
pub use pool::BlockPoolIndex;
pub use replay::{replay, replay_into, EventRecord, ReplayReport};
pub use report::{format_size, BlockSnapshot, Report, SegmentSnapshot};
pub use segment::{Segment, SegmentTable};
pub use size_policy::{SizePolicy, K_LARGE_BUFFER, K_ROUND_LARGE, K_SMALL_SIZE};
