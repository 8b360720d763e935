/*!
 * Mutex Pool Library
 *
 * Fixed-capacity pool of mutexes addressed by arbitrary keys through
 * deterministic sharding
 */

pub mod core;
pub mod monitoring;
pub mod pool;
pub mod shard;

// Re-exports
pub use crate::core::errors::{AcquireError, AcquireResult, PoolError, PoolResult};
pub use monitoring::init_tracing;
pub use pool::{
    recommended_capacity, CancelToken, CancellableLocker, ContentHash, HashAlgorithm, HashFn,
    Identity, Locker, MutexPool, PoolConfig, ShardGuard, ShardLock, WorkloadProfile,
};
pub use shard::{shard_index, shard_index_direct, shard_index_reference, ShardStrategy};
