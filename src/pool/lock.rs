/*!
 * Shard Locks
 *
 * The lock handed out by a pool and the two capabilities callers use on it:
 * - `Locker`: plain blocking acquire / release
 * - `CancellableLocker`: acquire that gives up on a deadline or cancel signal
 *
 * Cancellation is layered on top of the blocking lock, so code that never
 * cancels pays nothing for it.
 */

use crate::core::errors::{AcquireError, AcquireResult};
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default slice a cancellable acquire waits before re-checking its token
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Bounds on the poll interval; a cancel is noticed within one slice
pub const MIN_POLL_INTERVAL: Duration = Duration::from_micros(1);
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Blocking mutual exclusion
///
/// Release happens when the returned guard is dropped.
pub trait Locker: Send + Sync {
    type Guard<'a>
    where
        Self: 'a;

    /// Block until the lock is free, then hold it
    fn acquire(&self) -> Self::Guard<'_>;

    /// Take the lock only if nobody holds it
    fn try_acquire(&self) -> Option<Self::Guard<'_>>;

    /// Whether some caller currently holds the lock (racy, diagnostics only)
    fn is_locked(&self) -> bool;
}

/// Acquisition that can be abandoned
///
/// On `Err` the lock is not held and there is nothing to release.
pub trait CancellableLocker: Locker {
    /// Wait until `deadline` at the latest
    fn acquire_until(&self, deadline: Instant) -> AcquireResult<Self::Guard<'_>>;

    /// Wait for at most `timeout`
    fn acquire_for(&self, timeout: Duration) -> AcquireResult<Self::Guard<'_>> {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.acquire_until(deadline),
            // Unrepresentable deadline: effectively no timeout
            None => Ok(self.acquire()),
        }
    }

    /// Wait until acquired, the token is cancelled, or its deadline passes
    fn acquire_cancellable(&self, token: &CancelToken) -> AcquireResult<Self::Guard<'_>>;
}

/// One lock slot of a pool
///
/// Padded to its own cache line so neighbouring shards don't share one.
#[repr(align(64))]
#[derive(Default)]
pub struct ShardLock {
    mutex: Mutex<()>,
}

impl ShardLock {
    pub fn new() -> Self {
        Self {
            mutex: Mutex::new(()),
        }
    }

    /// Acquire without a guard, for callers pairing acquire/release by hand
    ///
    /// Must be matched by exactly one [`ShardLock::release`].
    pub fn acquire_raw(&self) {
        std::mem::forget(self.mutex.lock());
    }

    /// Release a lock taken with [`ShardLock::acquire_raw`]
    ///
    /// # Safety
    ///
    /// The calling context must hold the lock through `acquire_raw` (or a
    /// forgotten guard). Releasing a lock that is not held, or that is held
    /// through a live guard, is undefined behaviour.
    pub unsafe fn release(&self) {
        self.mutex.force_unlock();
    }
}

impl fmt::Debug for ShardLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardLock")
            .field("locked", &self.mutex.is_locked())
            .finish()
    }
}

/// RAII hold on a [`ShardLock`]; dropping it releases the lock
#[must_use = "if unused the lock is released immediately"]
pub struct ShardGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl ShardGuard<'_> {
    /// Release explicitly (same as dropping)
    #[inline]
    pub fn release(self) {}
}

impl fmt::Debug for ShardGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ShardGuard")
    }
}

impl Locker for ShardLock {
    type Guard<'a> = ShardGuard<'a>;

    #[inline]
    fn acquire(&self) -> ShardGuard<'_> {
        ShardGuard {
            _guard: self.mutex.lock(),
        }
    }

    #[inline]
    fn try_acquire(&self) -> Option<ShardGuard<'_>> {
        self.mutex.try_lock().map(|guard| ShardGuard { _guard: guard })
    }

    #[inline]
    fn is_locked(&self) -> bool {
        self.mutex.is_locked()
    }
}

impl CancellableLocker for ShardLock {
    fn acquire_until(&self, deadline: Instant) -> AcquireResult<ShardGuard<'_>> {
        match self.mutex.try_lock_until(deadline) {
            Some(guard) => Ok(ShardGuard { _guard: guard }),
            None => {
                debug!("Shard lock acquisition deadline exceeded");
                Err(AcquireError::DeadlineExceeded)
            }
        }
    }

    fn acquire_cancellable(&self, token: &CancelToken) -> AcquireResult<ShardGuard<'_>> {
        loop {
            if token.is_cancelled() {
                debug!("Shard lock acquisition cancelled");
                return Err(AcquireError::Cancelled);
            }

            if let Some(guard) = self.mutex.try_lock() {
                return Ok(ShardGuard { _guard: guard });
            }

            let now = Instant::now();
            if token.deadline().is_some_and(|deadline| deadline <= now) {
                debug!("Shard lock acquisition deadline exceeded");
                return Err(AcquireError::DeadlineExceeded);
            }
            let slice = token.poll_interval().min(MAX_POLL_INTERVAL);
            let slice_end = match (now.checked_add(slice), token.deadline()) {
                (Some(end), Some(deadline)) => end.min(deadline),
                (Some(end), None) => end,
                (None, Some(deadline)) => deadline,
                (None, None) => now,
            };

            if let Some(guard) = self.mutex.try_lock_until(slice_end) {
                return Ok(ShardGuard { _guard: guard });
            }
        }
    }
}

/// Cancellation signal for [`CancellableLocker::acquire_cancellable`]
///
/// Clones share the cancel flag; deadlines are per clone, so a child made
/// with [`CancelToken::with_deadline`] can expire while its parent lives on,
/// but cancelling either cancels both.
#[derive(Debug, Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
    poll_interval: Duration,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::with_poll_interval(DEFAULT_POLL_INTERVAL)
    }

    /// Token whose waiters re-check it every `poll_interval`
    ///
    /// Clamped to `MIN_POLL_INTERVAL..=MAX_POLL_INTERVAL`.
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: None,
            poll_interval: poll_interval.clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL),
        }
    }

    /// Child token that additionally expires at `deadline`
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline: Some(self.deadline.map_or(deadline, |d| d.min(deadline))),
            poll_interval: self.poll_interval,
        }
    }

    /// Child token that additionally expires after `timeout`
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.clone(),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[inline]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
