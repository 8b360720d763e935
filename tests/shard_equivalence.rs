/*!
 * Shard Index Equivalence Tests
 *
 * Reference, direct and streaming calculations must agree everywhere
 */

use mutex_pool::shard::NARROW_DIVISOR_LIMIT;
use mutex_pool::{shard_index, shard_index_direct, shard_index_reference, HashAlgorithm, ShardStrategy};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::num::NonZeroU64;

const KEYS: [&str; 2] = [std::env::consts::OS, std::env::consts::ARCH];

fn nz(n: u64) -> NonZeroU64 {
    NonZeroU64::new(n).unwrap()
}

fn divisor() -> impl Strategy<Value = NonZeroU64> {
    prop_oneof![
        (1u64..=512).prop_map(nz),
        (1u64..=u32::MAX as u64).prop_map(nz),
        ((NARROW_DIVISOR_LIMIT - 1024)..=(NARROW_DIVISOR_LIMIT + 1024)).prop_map(nz),
        (1u64..=u64::MAX).prop_map(nz),
    ]
}

proptest! {
    #[test]
    fn prop_strategies_agree(bytes in prop::collection::vec(any::<u8>(), 0..96), n in divisor()) {
        let reference = shard_index_reference(&bytes, n);
        prop_assert_eq!(reference, shard_index_direct(&bytes, n));
        prop_assert_eq!(reference, shard_index(&bytes, n));
    }

    #[test]
    fn prop_in_range(bytes in prop::collection::vec(any::<u8>(), 0..96), n in divisor()) {
        prop_assert!(shard_index(&bytes, n) < n.get());
    }

    #[test]
    fn prop_deterministic(bytes in prop::collection::vec(any::<u8>(), 0..96), n in divisor()) {
        for strategy in ShardStrategy::ALL {
            prop_assert_eq!(strategy.compute(&bytes, n), strategy.compute(&bytes, n));
        }
    }

    #[test]
    fn prop_empty_is_zero(n in divisor()) {
        prop_assert_eq!(shard_index(&[], n), 0);
    }
}

#[test]
fn test_every_digest_agrees() {
    let size = nz(u32::MAX as u64);
    for algorithm in HashAlgorithm::ALL {
        for key in KEYS {
            let digest = algorithm.digest(key.as_bytes());
            let x = shard_index_reference(&digest, size);
            let y = shard_index_direct(&digest, size);
            let z = shard_index(&digest, size);
            assert_eq!(x, y, "{algorithm}:{key} reference != direct");
            assert_eq!(x, z, "{algorithm}:{key} reference != streaming");
        }
    }
}

#[test]
fn test_every_digest_agrees_small_divisor() {
    let size = nz(112);
    for algorithm in HashAlgorithm::ALL {
        for key in KEYS {
            let digest = algorithm.digest(key.as_bytes());
            let results: Vec<u64> = ShardStrategy::ALL
                .iter()
                .map(|s| s.compute(&digest, size))
                .collect();
            assert!(
                results.windows(2).all(|w| w[0] == w[1]),
                "{algorithm}:{key} -> {results:?}"
            );
        }
    }
}

#[test]
fn test_sweep_covers_fnv_family() {
    let fnv = [
        HashAlgorithm::Fnv32,
        HashAlgorithm::Fnv32a,
        HashAlgorithm::Fnv64,
        HashAlgorithm::Fnv64a,
        HashAlgorithm::Fnv128,
        HashAlgorithm::Fnv128a,
    ];
    for algorithm in fnv {
        assert!(HashAlgorithm::ALL.contains(&algorithm), "{algorithm} missing");
    }

    // 128-bit digests cross the u64 accumulator under a divisor above 2^56
    let wide = nz(NARROW_DIVISOR_LIMIT + 1);
    for algorithm in fnv {
        for key in KEYS {
            let digest = algorithm.digest(key.as_bytes());
            assert_eq!(
                shard_index_reference(&digest, wide),
                shard_index(&digest, wide),
                "{algorithm}:{key}"
            );
        }
    }
}

#[test]
fn test_overflow_boundary_all_ones() {
    // Worst case for the accumulator: every byte 0xFF, divisor near 2^56
    for len in [1, 7, 8, 9, 16, 32, 64, 128] {
        let bytes = vec![0xFFu8; len];
        for n in [
            NARROW_DIVISOR_LIMIT - 1,
            NARROW_DIVISOR_LIMIT,
            NARROW_DIVISOR_LIMIT + 1,
            (1 << 60) + 7,
            u64::MAX,
        ] {
            assert_eq!(
                shard_index(&bytes, nz(n)),
                shard_index_reference(&bytes, nz(n)),
                "len={len} n={n}"
            );
        }
    }
}

#[test]
fn test_eight_bytes_below_u64_max() {
    // Eight 0xFF bytes is u64::MAX itself
    let bytes = [0xFFu8; 8];
    assert_eq!(shard_index(&bytes, nz(u64::MAX)), 0);
    assert_eq!(shard_index(&bytes, nz(u64::MAX - 1)), 1);
}

#[test]
fn test_scenario_keys_identity() {
    let n = nz(3);
    for key in ["test", "another"] {
        assert_eq!(
            shard_index_reference(key.as_bytes(), n),
            shard_index(key.as_bytes(), n),
            "{key}"
        );
    }
    assert_eq!(shard_index(b"test", n), 1);
    assert_eq!(shard_index(b"another", n), 0);
}
