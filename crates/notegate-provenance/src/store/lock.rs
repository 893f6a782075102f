//! Session lock artifacts
//!
//! The lock is a separate file next to the read set. It guards the
//! read-modify-write of the set and carries no data.

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Bounded retry schedule for lock acquisition
///
/// Attempt `n` (zero based) is followed by a sleep of
/// `backoff_step_ms * (n + 1)` unless it was the last attempt. Schedules
/// read from configuration go through [`LockRetryPolicy::bounded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockRetryPolicy {
    /// Lock attempts before the unlocked fallback
    pub max_attempts: u32,
    /// Linear backoff unit in milliseconds
    pub backoff_step_ms: u64,
}

impl LockRetryPolicy {
    /// Most attempts a bounded schedule makes
    pub const MAX_ATTEMPTS: u32 = 64;
    /// Most total sleep a bounded schedule spends before the fallback
    pub const MAX_BUDGET: Duration = Duration::from_secs(1);

    /// Sleep after the zero-based `attempt`
    #[inline]
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_step_ms.saturating_mul(u64::from(attempt) + 1))
    }

    /// Worst-case time spent sleeping before the fallback runs
    #[must_use]
    pub fn total_budget(&self) -> Duration {
        let sleeps = u64::from(self.max_attempts.saturating_sub(1));
        let units = sleeps.saturating_mul(sleeps + 1) / 2;
        Duration::from_millis(self.backoff_step_ms.saturating_mul(units))
    }

    /// This schedule cut down to at most [`Self::MAX_ATTEMPTS`] attempts and
    /// [`Self::MAX_BUDGET`] of sleep, keeping at least one attempt
    #[must_use]
    pub fn bounded(self) -> Self {
        let max_step = u64::try_from(Self::MAX_BUDGET.as_millis()).unwrap_or(u64::MAX);
        let mut policy = Self {
            max_attempts: self.max_attempts.clamp(1, Self::MAX_ATTEMPTS),
            backoff_step_ms: self.backoff_step_ms.min(max_step),
        };
        while policy.max_attempts > 1 && policy.total_budget() > Self::MAX_BUDGET {
            policy.max_attempts -= 1;
        }
        policy
    }

    /// No sleeping between attempts
    #[inline]
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff_step_ms: 0,
        }
    }
}

impl Default for LockRetryPolicy {
    /// 5 attempts, sleeping 50, 100, 150, 200 ms in between
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_step_ms: 50,
        }
    }
}

/// Held exclusive lock; released on drop
pub struct LockGuard {
    file: File,
    path: PathBuf,
}

impl LockGuard {
    /// Path of the lock artifact
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard").field("path", &self.path).finish_non_exhaustive()
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::debug!(path = %self.path.display(), error = %err, "lock release failed");
        }
    }
}

/// Acquires the per-session lock
///
/// One attempt per call. Retrying and backoff belong to the caller.
pub trait LockProvider: Send + Sync + fmt::Debug {
    /// `Ok(Some(_))` when acquired, `Ok(None)` when another holder has it
    ///
    /// # Errors
    /// Returns the IO error if the lock artifact cannot be opened or locked.
    fn try_acquire(&self, lock_path: &Path) -> io::Result<Option<LockGuard>>;
}

/// Advisory OS file lock (`flock` / `LockFileEx`) via `fs2`
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLockProvider;

impl LockProvider for FileLockProvider {
    fn try_acquire(&self, lock_path: &Path) -> io::Result<Option<LockGuard>> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(lock_path)?;

        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => Ok(Some(LockGuard {
                file,
                path: lock_path.to_path_buf(),
            })),
            Err(err) if is_contended(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// Lock provider that never acquires
///
/// Forces every `record_read` onto the unlocked fallback path.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysContended;

impl LockProvider for AlwaysContended {
    fn try_acquire(&self, _lock_path: &Path) -> io::Result<Option<LockGuard>> {
        Ok(None)
    }
}
