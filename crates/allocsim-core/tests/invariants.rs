//! Property-based invariant checks: randomized malloc/free sequences must
//! never violate tiling, index consistency, or reservation monotonicity
//! (§8 of the design document).

use allocsim_core::{Allocator, SizePolicy, K_LARGE_BUFFER};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Malloc { size: u64, die: u64 },
    FreeMostRecent,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1u64..=4, 0u64..1000).prop_map(|(mult, die)| Op::Malloc {
            size: mult * (K_LARGE_BUFFER / 4),
            die,
        }),
        1 => Just(Op::FreeMostRecent),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn random_malloc_free_sequences_preserve_invariants(
        ops in proptest::collection::vec(op_strategy(), 1..80),
        policy_pick in 0u8..3,
    ) {
        let policy = match policy_pick {
            0 => SizePolicy::RoundLarge,
            1 => SizePolicy::NextPowerOfTwo,
            _ => SizePolicy::GlobalMax(4 * K_LARGE_BUFFER),
        };
        let mut allocator = Allocator::new(policy);
        let mut live: Vec<(u64, u64, u64)> = Vec::new();
        let mut high_water = 0u64;

        for op in ops {
            match op {
                Op::Malloc { size, die } => {
                    let size = size.max(1);
                    let allocation = allocator.malloc(size, die).unwrap();
                    live.push((allocation.segment_id, allocation.start, allocation.size));
                }
                Op::FreeMostRecent => {
                    if let Some((segment_id, start, size)) = live.pop() {
                        allocator.free(segment_id, start, size).unwrap();
                    }
                }
            }
            allocator.check_invariants().unwrap();
            prop_assert!(allocator.max_reserved_size() >= high_water);
            high_water = allocator.max_reserved_size();
        }
    }
}
