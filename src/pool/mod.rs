/*!
 * Mutex Pool
 *
 * Fixed-capacity lock pool addressed by arbitrary keys:
 * - Content hashing of fingerprints (`hash`)
 * - Shard locks with blocking and cancellable acquire (`lock`)
 * - Key-to-lock resolution (`mutex_pool`)
 * - Configuration and CPU-aware capacity defaults (`config`, `capacity`)
 *
 * # Concurrency
 *
 * Resolution takes `&self`, performs only hashing and arithmetic, and never
 * blocks. Only acquiring the returned lock can wait.
 */

mod capacity;
mod config;
mod hash;
mod lock;
mod mutex_pool;

pub use capacity::{
    cpu_count, recommended_capacity, WorkloadProfile, MAX_RECOMMENDED_CAPACITY,
    MIN_RECOMMENDED_CAPACITY,
};
pub use config::{PoolConfig, ENV_CAPACITY, ENV_HASH, ENV_POLL_INTERVAL_US};
pub use hash::{ContentHash, HashAlgorithm, HashFn, Identity};
pub use lock::{
    CancelToken, CancellableLocker, Locker, ShardGuard, ShardLock, DEFAULT_POLL_INTERVAL,
    MAX_POLL_INTERVAL, MIN_POLL_INTERVAL,
};
pub use mutex_pool::MutexPool;
