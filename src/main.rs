/*!
 * Mutex Pool CLI
 *
 * Inspect shard assignment and exercise a pool under contention:
 * - `shard`: show where keys land under every strategy
 * - `contend`: hammer a pool from many threads and report per-shard load
 */

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use mutex_pool::monitoring::span_operation;
use mutex_pool::{
    init_tracing, ContentHash, HashAlgorithm, Locker, MutexPool, PoolConfig, ShardStrategy,
};
use std::num::NonZeroU64;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{info, instrument, warn};

#[derive(Parser, Debug)]
#[command(name = "mutex-pool", version, about = "Key-sharded mutex pool toolkit")]
struct Cli {
    /// JSON pool configuration (MUTEX_POOL_* environment variables still apply)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Number of locks in the pool
    #[arg(long, global = true)]
    capacity: Option<usize>,

    /// Content hash: identity, md5, sha1, sha256, sha512, crc32, fnv32[a], fnv64[a], fnv128[a], ahash
    #[arg(long, global = true)]
    hash: Option<HashAlgorithm>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the shard index of each key under every strategy
    Shard {
        /// Keys to resolve
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Run a multi-threaded contention demo against one pool
    Contend {
        #[arg(long, default_value_t = 8)]
        threads: usize,
        /// Distinct keys cycled through by every thread
        #[arg(long, default_value_t = 64)]
        keys: usize,
        /// Lock acquisitions per thread
        #[arg(long, default_value_t = 10_000)]
        iterations: usize,
    },
}

fn load_config(cli: &Cli) -> Result<PoolConfig> {
    let base = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path).into_diagnostic()?;
            PoolConfig::from_json(&json)?
        }
        None => PoolConfig::default(),
    };
    let mut config = base.with_env_overrides()?;
    if let Some(capacity) = cli.capacity {
        config.capacity = capacity;
    }
    if let Some(hash) = cli.hash {
        config.hash = hash;
    }
    config.validate()?;
    Ok(config)
}

#[instrument(skip_all, fields(keys = keys.len()))]
fn run_shard(config: &PoolConfig, keys: &[String]) -> Result<()> {
    let pool = MutexPool::from_config(config)?;
    let shards = NonZeroU64::new(pool.capacity() as u64)
        .ok_or(mutex_pool::PoolError::InvalidCapacity(pool.capacity()))?;

    println!(
        "capacity={} hash={}",
        pool.capacity(),
        pool.hasher().name()
    );
    for key in keys {
        let digest = config.hash.digest(key.as_bytes());
        let indices: Vec<u64> = ShardStrategy::ALL
            .iter()
            .map(|strategy| strategy.compute(&digest, shards))
            .collect();
        let agree = indices.windows(2).all(|w| w[0] == w[1]);
        if !agree {
            warn!(key = %key, ?indices, "Shard strategies disagree");
        }

        println!(
            "{key}\tdigest={}\treference={}\tdirect={}\tstreaming={}\tpool={}\tagree={agree}",
            hex::encode(&digest),
            indices[0],
            indices[1],
            indices[2],
            pool.shard_of_key(key),
        );
    }
    Ok(())
}

#[instrument(skip(config), fields(capacity = config.capacity, hash = %config.hash))]
fn run_contend(config: &PoolConfig, threads: usize, keys: usize, iterations: usize) -> Result<()> {
    let pool = MutexPool::from_config(config)?;
    let keys: Vec<String> = (0..keys.max(1)).map(|i| format!("key-{i}")).collect();

    let acquisitions: Vec<AtomicU64> = (0..pool.capacity()).map(|_| AtomicU64::new(0)).collect();
    let holders: Vec<AtomicUsize> = (0..pool.capacity()).map(|_| AtomicUsize::new(0)).collect();
    let violations = AtomicU64::new(0);

    let op = span_operation("contend");
    let _entered = op.span().enter();
    info!(
        threads,
        keys = keys.len(),
        iterations,
        capacity = pool.capacity(),
        hash = %config.hash,
        "Starting contention run"
    );

    let start = Instant::now();
    std::thread::scope(|scope| {
        for t in 0..threads.max(1) {
            let (pool, keys, acquisitions, holders, violations) =
                (&pool, &keys, &acquisitions, &holders, &violations);
            scope.spawn(move || {
                for i in 0..iterations {
                    let key = &keys[(t + i) % keys.len()];
                    let shard = pool.shard_of_key(key);
                    let _guard = pool.by_key(key).acquire();

                    if holders[shard].fetch_add(1, Ordering::AcqRel) != 0 {
                        violations.fetch_add(1, Ordering::Relaxed);
                    }
                    acquisitions[shard].fetch_add(1, Ordering::Relaxed);
                    holders[shard].fetch_sub(1, Ordering::AcqRel);
                }
            });
        }
    });
    let elapsed = start.elapsed();

    let violations = violations.load(Ordering::Relaxed);
    op.record_result(violations == 0);

    for (shard, count) in acquisitions.iter().enumerate() {
        println!("shard {shard:>4}: {}", count.load(Ordering::Relaxed));
    }
    let total: u64 = acquisitions.iter().map(|c| c.load(Ordering::Relaxed)).sum();
    println!(
        "total={total} elapsed={:.3}ms violations={violations}",
        elapsed.as_secs_f64() * 1000.0
    );

    if violations > 0 {
        warn!(violations, "Mutual exclusion violated");
        return Err(miette::miette!("{violations} mutual exclusion violations"));
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Command::Shard { keys } => run_shard(&config, keys),
        Command::Contend {
            threads,
            keys,
            iterations,
        } => run_contend(&config, *threads, *keys, *iterations),
    }
}
