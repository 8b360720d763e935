/*!
 * Pool Capacity Planning
 *
 * CPU-topology-aware default capacity for mutex pools. More shards mean
 * fewer unrelated keys colliding on one lock (collision odds ~1/capacity)
 * at the cost of one cache line per shard.
 */

use std::sync::OnceLock;
use tracing::{info, warn};

/// Lower bound for recommended capacities
pub const MIN_RECOMMENDED_CAPACITY: usize = 8;

/// Upper bound for recommended capacities
pub const MAX_RECOMMENDED_CAPACITY: usize = 512;

static CPU_COUNT: OnceLock<usize> = OnceLock::new();

/// Detected hardware parallelism, computed once per process
pub fn cpu_count() -> usize {
    *CPU_COUNT.get_or_init(|| {
        let count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or_else(|_| {
                warn!("Failed to detect CPU count, defaulting to 8");
                8
            });
        info!(cpu_count = count, "Mutex pool capacity planner initialized");
        count
    })
}

/// Expected key contention for a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkloadProfile {
    /// Many threads hammering many keys: 4x CPU shards
    HighContention,
    /// 2x CPU shards
    #[default]
    MediumContention,
    /// Occasional locking: 1x CPU shards
    LowContention,
}

impl WorkloadProfile {
    const fn multiplier(self) -> usize {
        match self {
            Self::HighContention => 4,
            Self::MediumContention => 2,
            Self::LowContention => 1,
        }
    }
}

/// Recommended pool capacity for `profile` on this machine
///
/// Always within `MIN_RECOMMENDED_CAPACITY..=MAX_RECOMMENDED_CAPACITY`.
pub fn recommended_capacity(profile: WorkloadProfile) -> usize {
    capacity_for(cpu_count(), profile)
}

fn capacity_for(cpus: usize, profile: WorkloadProfile) -> usize {
    cpus.saturating_mul(profile.multiplier())
        .clamp(MIN_RECOMMENDED_CAPACITY, MAX_RECOMMENDED_CAPACITY)
}
