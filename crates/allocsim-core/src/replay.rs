//! Replay driver: walks a normalized event sequence in tick order, issuing
//! `malloc` at birth and `free` at death.

use std::collections::BTreeMap;

use crate::engine::Allocator;
use crate::error::Result;
use crate::size_policy::SizePolicy;

/// One entry of the pre-built event sequence the core consumes. Trace
/// ingestion (a separate, ambient crate) is responsible for producing this
/// from whatever source format it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRecord {
    pub id: u64,
    pub size: u64,
    pub born: u64,
    pub die: u64,
}

/// Final counters produced by a replay run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayReport {
    pub segment_count: usize,
    pub max_reserved_size_bytes: u64,
}

/// Replays `events` against a fresh [`Allocator`] configured with `policy`.
///
/// `events` need not be sorted; this function sorts by `born` internally.
/// Timestamps are normalized so the earliest birth is tick 0, per §4.5.
pub fn replay(events: &[EventRecord], policy: SizePolicy) -> Result<ReplayReport> {
    let mut allocator = Allocator::new(policy);
    replay_into(&mut allocator, events)?;
    Ok(ReplayReport {
        segment_count: allocator.segment_count(),
        max_reserved_size_bytes: allocator.max_reserved_size(),
    })
}

/// Like [`replay`], but drives a caller-supplied allocator and exposes it
/// afterwards (e.g. for `--dump-segments` reporting or property tests that
/// want to inspect the final state).
pub fn replay_into(allocator: &mut Allocator, events: &[EventRecord]) -> Result<()> {
    if events.is_empty() {
        return Ok(());
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
    for tick in 0..=horizon {
        if let Some(births) = born_at.get(&tick) {
            for event in births {
                let allocation = allocator.malloc(event.size, event.die - offset)?;
                coords.insert(event.id, (allocation.segment_id, allocation.start, allocation.size));
            }
        }
        if let Some(deaths) = dying_at.get(&tick) {
            for id in deaths {
                if let Some((segment_id, start, size)) = coords.remove(id) {
                    allocator.free(segment_id, start, size)?;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size_policy::K_LARGE_BUFFER;

    const U: u64 = K_LARGE_BUFFER;

    fn event(id: u64, size: u64, born: u64, die: u64) -> EventRecord {
        EventRecord { id, size, born, die }
    }

    #[test]
    fn replaying_the_same_trace_twice_is_deterministic() {
        let events = vec![
            event(1, 5 * U, 0, 10),
            event(2, U, 11, 20),
            event(3, 2 * U, 5, 15),
        ];
        let a = replay(&events, SizePolicy::GlobalMax(5 * U)).unwrap();
        let b = replay(&events, SizePolicy::GlobalMax(5 * U)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn births_are_processed_before_deaths_at_the_same_tick() {
        // id 1 dies at the same tick id 2 is born; id 2 must not be able to
        // reuse id 1's block until the next tick, because the birth at this
        // tick runs first and only then does id 1's death free its block.
        let events = vec![event(1, U, 0, 5), event(2, U, 5, 10)];
        let report = replay(&events, SizePolicy::GlobalMax(U)).unwrap();
        // Both ids needed a live block simultaneously at tick 5 (2 born,
        // 1 not yet freed), so two segments must have been reserved.
        assert_eq!(report.segment_count, 2);
        assert_eq!(report.max_reserved_size_bytes, 2 * U);
    }

    #[test]
    fn offset_normalization_ignores_absolute_timestamps() {
        let events = vec![event(1, U, 1_000_000, 1_000_010)];
        let report = replay(&events, SizePolicy::GlobalMax(U)).unwrap();
        assert_eq!(report.segment_count, 1);
        assert_eq!(report.max_reserved_size_bytes, U);
    }

    #[test]
    fn empty_trace_yields_empty_report() {
        let report = replay(&[], SizePolicy::RoundLarge).unwrap();
        assert_eq!(report.segment_count, 0);
        assert_eq!(report.max_reserved_size_bytes, 0);
    }
}
