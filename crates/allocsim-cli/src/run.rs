//! Drives a normalized event sequence through an [`Allocator`], optionally
//! emitting a [`DecisionLog`] entry for every malloc, free, split, and
//! coalesce along the way.
//!
//! This mirrors `allocsim_core::replay_into`'s tick ordering (births before
//! deaths within a tick) rather than reusing it directly, because the core
//! replay driver has no logging hook and stays that way: instrumentation is
//! a CLI concern, not a simulator one. A birth logs `NewSegment` or `Malloc`
//! depending on whether a fresh segment had to be reserved, followed by a
//! `Split` entry if the hit block was split to satisfy the request. A death
//! logs `Free` if neither neighbor was free, or `Coalesce` (with a detail
//! string naming which neighbor(s) merged) otherwise.

use std::collections::BTreeMap;
use std::path::Path;

use allocsim_core::{Allocator, EventRecord, FreeOutcome, Report, ReplayReport, SizePolicy};

use crate::decision_log::{Decision, DecisionEntry, DecisionLog};
use crate::error::{CliError, Result};

pub struct RunOutcome {
    pub allocator: Allocator,
}

pub fn run(
    events: &[EventRecord],
    policy: SizePolicy,
    log_path: Option<&Path>,
) -> Result<RunOutcome> {
    let mut allocator = Allocator::new(policy);
    let mut log = match log_path {
        Some(path) => Some(DecisionLog::create(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?),
        None => None,
    };

    if events.is_empty() {
        return Ok(RunOutcome { allocator });
    }

    let offset = events.iter().map(|e| e.born).min().unwrap();
    let horizon = events.iter().map(|e| e.die).max().unwrap() - offset;

    let mut born_at: BTreeMap<u64, Vec<&EventRecord>> = BTreeMap::new();
    let mut dying_at: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
    for event in events {
        born_at.entry(event.born - offset).or_default().push(event);
        dying_at.entry(event.die - offset).or_default().push(event.id);
    }
    for ids in born_at.values_mut() {
        ids.sort_by_key(|e| e.id);
    }
    for ids in dying_at.values_mut() {
        ids.sort();
    }

    let mut coords: BTreeMap<u64, (u64, u64, u64)> = BTreeMap::new();
    let segments_before = |allocator: &Allocator| allocator.segment_count();

    for tick in 0..=horizon {
        if let Some(births) = born_at.get(&tick) {
            for event in births {
                let before = segments_before(&allocator);
                let allocation = allocator.malloc(event.size, event.die - offset)?;
                coords.insert(event.id, (allocation.segment_id, allocation.start, allocation.size));
                if let Some(log) = log.as_mut() {
                    let decision = if allocator.segment_count() > before {
                        Decision::NewSegment
                    } else {
                        Decision::Malloc
                    };
                    let entry = DecisionEntry::new(
                        tick,
                        decision,
                        allocation.segment_id,
                        allocation.start,
                        allocation.size,
                    )
                    .with_id(event.id);
                    log.record(&entry).map_err(|source| CliError::Io {
                        path: Path::new("<log>").to_path_buf(),
                        source,
                    })?;

                    if allocation.split {
                        let remainder_start = allocation.start + allocation.size;
                        let remainder_size = allocation.found_size - allocation.size;
                        let split_entry = DecisionEntry::new(
                            tick,
                            Decision::Split,
                            allocation.segment_id,
                            remainder_start,
                            remainder_size,
                        )
                        .with_id(event.id)
                        .with_detail(format!(
                            "carved a free remainder off the block hit for id {}",
                            event.id
                        ));
                        log.record(&split_entry).map_err(|source| CliError::Io {
                            path: Path::new("<log>").to_path_buf(),
                            source,
                        })?;
                    }
                }
            }
        }
        if let Some(deaths) = dying_at.get(&tick) {
            for id in deaths {
                if let Some((segment_id, start, size)) = coords.remove(id) {
                    let outcome = allocator.free(segment_id, start, size)?;
                    if let Some(log) = log.as_mut() {
                        let (decision, detail) = match outcome {
                            FreeOutcome::NoCoalesce => (Decision::Free, None),
                            FreeOutcome::CoalescedPredecessor => {
                                (Decision::Coalesce, Some("merged with a free predecessor"))
                            }
                            FreeOutcome::CoalescedSuccessor => {
                                (Decision::Coalesce, Some("merged with a free successor"))
                            }
                            FreeOutcome::CoalescedBoth => (
                                Decision::Coalesce,
                                Some("merged with a free predecessor and successor"),
                            ),
                        };
                        let mut entry = DecisionEntry::new(tick, decision, segment_id, start, size).with_id(*id);
                        if let Some(detail) = detail {
                            entry = entry.with_detail(detail);
                        }
                        log.record(&entry).map_err(|source| CliError::Io {
                            path: Path::new("<log>").to_path_buf(),
                            source,
                        })?;
                    }
                }
            }
        }
    }

    if let Some(log) = log.as_mut() {
        log.flush().map_err(|source| CliError::Io { path: Path::new("<log>").to_path_buf(), source })?;
    }

    Ok(RunOutcome { allocator })
}

pub fn build_report(outcome: &RunOutcome, with_segments: bool) -> Report {
    if with_segments {
        Report::with_segments(&outcome.allocator)
    } else {
        Report::from_replay(ReplayReport {
            segment_count: outcome.allocator.segment_count(),
            max_reserved_size_bytes: outcome.allocator.max_reserved_size(),
        })
    }
}
