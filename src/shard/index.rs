/*!
 * Shard Index Calculation
 *
 * Maps a byte string to `[0, n)` by reading it as a big-endian unsigned
 * integer and reducing it modulo `n`.
 */

use num_bigint::BigUint;
use std::num::NonZeroU64;

/// Largest divisor the narrow (all-u64) streaming path accepts.
///
/// With `r < n` and `m < n`, `r + 255 * m < 256 * n`, which fits in u64
/// only while `n <= 2^56`.
pub const NARROW_DIVISOR_LIMIT: u64 = 1 << 56;

/// Reference strategy: textual big-integer round trip
///
/// Hex-encodes the input, parses it back as an arbitrary-precision integer
/// and reduces it. Slow and allocating; kept as the ground truth the other
/// strategies are checked against.
///
/// # Panics
///
/// If the hex encoding fails to parse, which cannot happen for any byte input.
pub fn shard_index_reference(bytes: &[u8], n: NonZeroU64) -> u64 {
    let encoded = hex::encode(bytes);
    let value = if encoded.is_empty() {
        BigUint::default()
    } else {
        BigUint::parse_bytes(encoded.as_bytes(), 16)
            .unwrap_or_else(|| panic!("invalid hex fingerprint: {encoded}"))
    };
    reduce(&value, n)
}

/// Direct strategy: big integer built from the raw bytes
pub fn shard_index_direct(bytes: &[u8], n: NonZeroU64) -> u64 {
    reduce(&BigUint::from_bytes_be(bytes), n)
}

#[inline]
fn reduce(value: &BigUint, n: NonZeroU64) -> u64 {
    let rem = value % n.get();
    rem.iter_u64_digits().next().unwrap_or(0)
}

/// Streaming strategy (production path)
///
/// Horner's rule over modular arithmetic, least-significant byte first:
/// `r = (r + b * m) mod n`, `m = (m * 256) mod n`. No allocation.
///
/// # Performance
///
/// - One multiply and two reductions per byte
/// - Divisors above [`NARROW_DIVISOR_LIMIT`] switch to u128 accumulators
#[inline]
pub fn shard_index(bytes: &[u8], n: NonZeroU64) -> u64 {
    let n = n.get();
    if n <= NARROW_DIVISOR_LIMIT {
        streaming_narrow(bytes, n)
    } else {
        streaming_wide(bytes, n)
    }
}

#[inline(always)]
fn streaming_narrow(bytes: &[u8], n: u64) -> u64 {
    let mut r = 0u64;
    let mut m = 1 % n;
    for &b in bytes.iter().rev() {
        // 256^k has become a multiple of n; higher bytes contribute nothing
        if m == 0 {
            break;
        }
        r = (r + u64::from(b) * m) % n;
        m = (m << 8) % n;
    }
    r
}

#[inline(always)]
fn streaming_wide(bytes: &[u8], n: u64) -> u64 {
    let n = u128::from(n);
    let mut r = 0u128;
    let mut m = 1u128 % n;
    for &b in bytes.iter().rev() {
        if m == 0 {
            break;
        }
        r = (r + u128::from(b) * m) % n;
        m = (m << 8) % n;
    }
    // r < n <= u64::MAX
    r as u64
}
