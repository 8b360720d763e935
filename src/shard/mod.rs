/*!
 * Shard Index Calculator
 *
 * Deterministic mapping of byte strings onto `[0, n)`:
 * - Reference: hex text parsed into an arbitrary-precision integer
 * - Direct: arbitrary-precision integer from raw bytes
 * - Streaming: fixed-width Horner reduction (production path)
 *
 * # Invariant
 *
 * All three strategies return the same index for the same `(bytes, n)`.
 * The big-integer forms exist as oracles for that property; only the
 * streaming form runs on the pool's hot path.
 */

mod index;
mod strategy;

pub use index::{shard_index, shard_index_direct, shard_index_reference, NARROW_DIVISOR_LIMIT};
pub use strategy::ShardStrategy;
