//! The original liveness-pair trace format: a size list (`id size` per
//! line) and a liveness log (`id (time, op)+` per line), the two files the
//! upstream allocator-trace tool produces. Only ids whose size exceeds
//! `K_LARGE_BUFFER` are kept, matching the upstream filter.

use std::collections::BTreeMap;

use allocsim_core::{EventRecord, K_LARGE_BUFFER};
use regex::Regex;

use crate::error::{Result, TraceError};

/// Extracts every integer in `line` (ignoring any fractional part, as the
/// upstream format only ever emits whole numbers with an optional unused
/// decimal point).
fn numbers(line: &str) -> Vec<i64> {
    static PATTERN: &str = r"\d+\.?\d*";
    let re = Regex::new(PATTERN).expect("static regex is valid");
    re.find_iter(line)
        .filter_map(|m| m.as_str().split('.').next().and_then(|s| s.parse::<i64>().ok()))
        .collect()
}

/// Parses `submemory_size_list.txt` content into `id -> size_bytes`,
/// filtered to sizes strictly greater than [`K_LARGE_BUFFER`].
pub fn parse_size_list(content: &str) -> Result<BTreeMap<u64, u64>> {
    let mut sizes = BTreeMap::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let nums = numbers(line);
        if nums.len() < 2 {
            return Err(TraceError::Unparsable {
                path: "submemory_size_list.txt".to_string(),
                line: line_no + 1,
                content: line.to_string(),
            });
        }
        let id = nums[0];
        let size = nums[1];
        if id < 0 {
            return Err(TraceError::Unparsable {
                path: "submemory_size_list.txt".to_string(),
                line: line_no + 1,
                content: line.to_string(),
            });
        }
        if size <= 0 {
            return Err(TraceError::NonPositiveSize { id: id as u64, size });
        }
        if (size as u64) > K_LARGE_BUFFER {
            if sizes.insert(id as u64, size as u64).is_some() {
                return Err(TraceError::DuplicateId { id: id as u64 });
            }
        }
    }
    Ok(sizes)
}

/// Parses `submemory_liveness.txt` content, keeping only the ids present in
/// `large_ids`, and derives `(born, die)` from the first and last
/// timestamps mentioned for each id.
pub fn parse_liveness(content: &str, large_ids: &BTreeMap<u64, u64>) -> Result<Vec<EventRecord>> {
    let mut events = Vec::new();
    let mut seen = BTreeMap::new();

    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let nums = numbers(line);
        if nums.is_empty() {
            return Err(TraceError::Unparsable {
                path: "submemory_liveness.txt".to_string(),
                line: line_no + 1,
                content: line.to_string(),
            });
        }
        let id = nums[0];
        if id < 0 {
            return Err(TraceError::Unparsable {
                path: "submemory_liveness.txt".to_string(),
                line: line_no + 1,
                content: line.to_string(),
            });
        }
        let id = id as u64;
        let Some(&size) = large_ids.get(&id) else {
            continue;
        };

        let timestamps: Vec<i64> = nums[1..].iter().step_by(2).copied().collect();
        if timestamps.is_empty() {
            return Err(TraceError::Unparsable {
                path: "submemory_liveness.txt".to_string(),
                line: line_no + 1,
                content: line.to_string(),
            });
        }
        let born = *timestamps.first().unwrap();
        let die = *timestamps.last().unwrap();
        if born < 0 || die < 0 {
            return Err(TraceError::Unparsable {
                path: "submemory_liveness.txt".to_string(),
                line: line_no + 1,
                content: line.to_string(),
            });
        }
        let (born, die) = (born as u64, die as u64);
        if born > die {
            return Err(TraceError::BornAfterDie { id, born, die });
        }
        if seen.insert(id, ()).is_some() {
            return Err(TraceError::DuplicateId { id });
        }
        events.push(EventRecord { id, size, born, die });
    }

    for &id in large_ids.keys() {
        if !seen.contains_key(&id) {
            return Err(TraceError::MissingLiveness { id });
        }
    }

    Ok(events)
}

/// Parses both files together into the normalized event sequence.
pub fn parse(size_list: &str, liveness: &str) -> Result<Vec<EventRecord>> {
    let sizes = parse_size_list(size_list)?;
    parse_liveness(liveness, &sizes)
}
