/*!
 * Content Hashing
 *
 * Fingerprint digests for shard selection. Every call builds its own digest
 * state, so one hasher can be shared by any number of resolving threads
 * without a lock around it.
 */

use crate::core::errors::PoolError;
use ahash::RandomState;
use const_fnv1a_hash::{fnv1a_hash_128, fnv1a_hash_32, fnv1a_hash_64};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Deterministic content hash used to spread fingerprints across shards
///
/// The digest is handed to a callback instead of returned so implementations
/// can keep it on the stack (fixed-width digests) or pass the input through
/// untouched (identity) without allocating.
///
/// Implementations must return the same digest for the same input on every
/// call and from every thread. Collision resistance is not required.
pub trait ContentHash: Send + Sync {
    /// Hash `input` and pass the digest to `f`
    fn digest_with<R>(&self, input: &[u8], f: impl FnOnce(&[u8]) -> R) -> R;

    /// Get hash name for debugging
    fn name(&self) -> &'static str {
        "custom"
    }
}

impl<H: ContentHash + ?Sized> ContentHash for &H {
    #[inline]
    fn digest_with<R>(&self, input: &[u8], f: impl FnOnce(&[u8]) -> R) -> R {
        (**self).digest_with(input, f)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Pass-through hash: the fingerprint itself is the digest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity;

impl ContentHash for Identity {
    #[inline(always)]
    fn digest_with<R>(&self, input: &[u8], f: impl FnOnce(&[u8]) -> R) -> R {
        f(input)
    }

    fn name(&self) -> &'static str {
        "identity"
    }
}

/// Adapter turning any pure function into a [`ContentHash`]
///
/// ```ignore
/// let pool = MutexPool::new(64, HashFn(|b: &[u8]| sha2::Sha384::digest(b)))?;
/// ```
#[derive(Clone, Copy)]
pub struct HashFn<F>(pub F);

impl<F, O> ContentHash for HashFn<F>
where
    F: Fn(&[u8]) -> O + Send + Sync,
    O: AsRef<[u8]>,
{
    #[inline]
    fn digest_with<R>(&self, input: &[u8], f: impl FnOnce(&[u8]) -> R) -> R {
        let digest = (self.0)(input);
        f(digest.as_ref())
    }
}

impl<F> fmt::Debug for HashFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashFn(..)")
    }
}

/// Fixed seeds so AHash digests are reproducible for a given build
const AHASH_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

static AHASH_STATE: OnceLock<RandomState> = OnceLock::new();

#[inline]
fn ahash_state() -> &'static RandomState {
    AHASH_STATE.get_or_init(|| {
        let [k0, k1, k2, k3] = AHASH_SEEDS;
        RandomState::with_seeds(k0, k1, k2, k3)
    })
}

// FNV-1 (multiply, then xor); the FNV-1a variants come from const-fnv1a-hash
macro_rules! fnv1 {
    ($name:ident, $ty:ty, $basis:expr, $prime:expr) => {
        #[inline]
        fn $name(bytes: &[u8]) -> $ty {
            bytes.iter().fold($basis, |hash: $ty, &byte| {
                hash.wrapping_mul($prime) ^ <$ty>::from(byte)
            })
        }
    };
}

fnv1!(fnv1_hash_32, u32, 0x811c_9dc5, 0x0100_0193);
fnv1!(fnv1_hash_64, u64, 0xcbf2_9ce4_8422_2325, 0x0000_0100_0000_01b3);
fnv1!(
    fnv1_hash_128,
    u128,
    0x6c62_272e_07bb_0142_62b8_2175_6295_c58d,
    0x0000_0000_0100_0000_0000_0000_0000_013b
);

/// Built-in hash algorithms (enum dispatch, no vtable)
///
/// # Performance
///
/// - **AHash / Crc32**: non-cryptographic, fastest, 8 / 4 byte digests
/// - **Fnv\***: FNV-1 and FNV-1a, 4 / 8 / 16 byte big-endian digests
/// - **Md5 / Sha1**: 16 / 20 byte digests
/// - **Sha256 / Sha512**: 32 / 64 byte digests, slowest to hash and to shard
///
/// AHash output depends on the CPU features the binary was compiled for, so
/// its shard assignment is only stable within one build. The other
/// algorithms are stable everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// No re-hash; shard the raw fingerprint
    Identity,
    Md5,
    Sha1,
    Sha256,
    Sha512,
    Crc32,
    Fnv32,
    Fnv32a,
    Fnv64,
    Fnv64a,
    Fnv128,
    Fnv128a,
    #[default]
    #[serde(rename = "ahash")]
    AHash,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 13] = [
        Self::Identity,
        Self::Md5,
        Self::Sha1,
        Self::Sha256,
        Self::Sha512,
        Self::Crc32,
        Self::Fnv32,
        Self::Fnv32a,
        Self::Fnv64,
        Self::Fnv64a,
        Self::Fnv128,
        Self::Fnv128a,
        Self::AHash,
    ];

    /// Digest width in bytes, `None` for identity (input-sized)
    pub const fn digest_len(self) -> Option<usize> {
        match self {
            Self::Identity => None,
            Self::Md5 => Some(16),
            Self::Sha1 => Some(20),
            Self::Sha256 => Some(32),
            Self::Sha512 => Some(64),
            Self::Crc32 | Self::Fnv32 | Self::Fnv32a => Some(4),
            Self::Fnv64 | Self::Fnv64a | Self::AHash => Some(8),
            Self::Fnv128 | Self::Fnv128a => Some(16),
        }
    }

    /// Hash into an owned buffer (diagnostics and tests; not the hot path)
    pub fn digest(self, input: &[u8]) -> Vec<u8> {
        self.digest_with(input, <[u8]>::to_vec)
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Crc32 => "crc32",
            Self::Fnv32 => "fnv32",
            Self::Fnv32a => "fnv32a",
            Self::Fnv64 => "fnv64",
            Self::Fnv64a => "fnv64a",
            Self::Fnv128 => "fnv128",
            Self::Fnv128a => "fnv128a",
            Self::AHash => "ahash",
        }
    }
}

impl ContentHash for HashAlgorithm {
    #[inline]
    fn digest_with<R>(&self, input: &[u8], f: impl FnOnce(&[u8]) -> R) -> R {
        match self {
            Self::Identity => f(input),
            Self::Md5 => f(&md5::compute(input).0),
            Self::Sha1 => f(Sha1::digest(input).as_slice()),
            Self::Sha256 => f(Sha256::digest(input).as_slice()),
            Self::Sha512 => f(Sha512::digest(input).as_slice()),
            Self::Crc32 => f(&crc32fast::hash(input).to_be_bytes()),
            Self::Fnv32 => f(&fnv1_hash_32(input).to_be_bytes()),
            Self::Fnv32a => f(&fnv1a_hash_32(input, None).to_be_bytes()),
            Self::Fnv64 => f(&fnv1_hash_64(input).to_be_bytes()),
            Self::Fnv64a => f(&fnv1a_hash_64(input, None).to_be_bytes()),
            Self::Fnv128 => f(&fnv1_hash_128(input).to_be_bytes()),
            Self::Fnv128a => f(&fnv1a_hash_128(input, None).to_be_bytes()),
            Self::AHash => f(&ahash_state().hash_one(input).to_be_bytes()),
        }
    }

    fn name(&self) -> &'static str {
        self.label()
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HashAlgorithm {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.label() == normalized)
            .ok_or(PoolError::UnknownHash(normalized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_lengths() {
        for algorithm in HashAlgorithm::ALL {
            let digest = algorithm.digest(b"darwin");
            match algorithm.digest_len() {
                Some(len) => assert_eq!(digest.len(), len, "{algorithm}"),
                None => assert_eq!(digest, b"darwin"),
            }
        }
    }

    #[test]
    fn test_known_digests() {
        assert_eq!(
            hex::encode(HashAlgorithm::Md5.digest(b"")),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(
            hex::encode(HashAlgorithm::Sha1.digest(b"abc")),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            hex::encode(HashAlgorithm::Crc32.digest(b"123456789")),
            "cbf43926"
        );
    }

    #[test]
    fn test_fnv_digests() {
        let cases = [
            (HashAlgorithm::Fnv32, "050c5d7e", "31f0b262"),
            (HashAlgorithm::Fnv32a, "e40c292c", "bf9cf968"),
            (HashAlgorithm::Fnv64, "af63bd4c8601b7be", "340d8765a4dda9c2"),
            (HashAlgorithm::Fnv64a, "af63dc4c8601ec8c", "85944171f73967e8"),
            (
                HashAlgorithm::Fnv128,
                "d228cb69101a8caf78912b704e4a141e",
                "7896bfea9c3c64bf6dc58353d2c293aa",
            ),
            (
                HashAlgorithm::Fnv128a,
                "d228cb696f1a8caf78912b704e4a8964",
                "343e1662793c64bf6f0d3597ba446f18",
            ),
        ];
        for (algorithm, a, foobar) in cases {
            assert_eq!(hex::encode(algorithm.digest(b"a")), a, "{algorithm}");
            assert_eq!(hex::encode(algorithm.digest(b"foobar")), foobar, "{algorithm}");
        }
    }

    #[test]
    fn test_fnv_empty_is_offset_basis() {
        assert_eq!(hex::encode(HashAlgorithm::Fnv32.digest(b"")), "811c9dc5");
        assert_eq!(hex::encode(HashAlgorithm::Fnv32a.digest(b"")), "811c9dc5");
        assert_eq!(
            hex::encode(HashAlgorithm::Fnv128a.digest(b"")),
            "6c62272e07bb014262b821756295c58d"
        );
    }

    #[test]
    fn test_labels_round_trip() {
        for algorithm in HashAlgorithm::ALL {
            assert_eq!(algorithm.to_string().parse::<HashAlgorithm>(), Ok(algorithm));
            let json = serde_json::to_string(&algorithm).unwrap();
            assert_eq!(json, format!("\"{algorithm}\""));
        }
    }

    #[test]
    fn test_deterministic() {
        for algorithm in HashAlgorithm::ALL {
            assert_eq!(algorithm.digest(b"amd64"), algorithm.digest(b"amd64"));
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!("SHA256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!(" ahash ".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::AHash);
        assert_eq!("FNV64a".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Fnv64a);
        assert_eq!(
            "whirlpool".parse::<HashAlgorithm>(),
            Err(PoolError::UnknownHash("whirlpool".to_string()))
        );
    }

    #[test]
    fn test_hash_fn_adapter() {
        let reversed = HashFn(|b: &[u8]| b.iter().rev().copied().collect::<Vec<u8>>());
        assert_eq!(reversed.digest_with(b"abc", <[u8]>::to_vec), b"cba");
        assert_eq!(reversed.name(), "custom");
    }

    #[test]
    fn test_identity() {
        assert_eq!(Identity.digest_with(b"key", <[u8]>::len), 3);
        assert_eq!(Identity.name(), "identity");
    }
}
