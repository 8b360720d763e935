/*!
 * Shard Strategy Selection
 *
 * Enum dispatch over the three interchangeable index calculations
 */

use super::index::{shard_index, shard_index_direct, shard_index_reference};
use crate::core::errors::PoolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

/// Shard index calculation strategy
///
/// All strategies return identical indices for identical input; they differ
/// only in cost. [`ShardStrategy::Streaming`] is the one pools use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardStrategy {
    /// Hex text round trip through an arbitrary-precision integer
    Reference,
    /// Arbitrary-precision integer from raw bytes
    Direct,
    /// Fixed-width Horner reduction, allocation-free
    #[default]
    Streaming,
}

impl ShardStrategy {
    /// Every strategy, cheapest last
    pub const ALL: [ShardStrategy; 3] = [Self::Reference, Self::Direct, Self::Streaming];

    /// Compute the shard index of `bytes` among `n` shards
    #[inline]
    pub fn compute(self, bytes: &[u8], n: NonZeroU64) -> u64 {
        match self {
            Self::Reference => shard_index_reference(bytes, n),
            Self::Direct => shard_index_direct(bytes, n),
            Self::Streaming => shard_index(bytes, n),
        }
    }

    /// Whether the strategy allocates per call
    pub const fn allocates(self) -> bool {
        !matches!(self, Self::Streaming)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::Direct => "direct",
            Self::Streaming => "streaming",
        }
    }
}

impl fmt::Display for ShardStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShardStrategy {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reference" | "naive" => Ok(Self::Reference),
            "direct" | "simple" => Ok(Self::Direct),
            "streaming" | "fast" => Ok(Self::Streaming),
            other => Err(PoolError::UnknownStrategy(other.to_string())),
        }
    }
}
