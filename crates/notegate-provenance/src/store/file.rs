//! Disk-backed session read store
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/<key>.json   JSON array of normalized paths (the read set)
//! <root>/<key>.lock   lock artifact, guards read-modify-write of the set
//! ```
//!
//! `<key>` is [`SessionId::file_key`].
//!
//! Writes go through a temp file in the same directory followed by a rename,
//! so a concurrent reader sees either the old set or the new one.

use super::lock::{FileLockProvider, LockProvider, LockRetryPolicy};
use super::{count_record, ReadProvenance, RecordOutcome};
use crate::error::StoreError;
use crate::evidence::Evidence;
use crate::path::CanonicalPath;
use crate::session::SessionId;
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

/// Read provenance persisted as one JSON file per session
#[derive(Debug, Clone)]
pub struct FileReadStore {
    root: PathBuf,
    retry: LockRetryPolicy,
    locks: Arc<dyn LockProvider>,
}

impl FileReadStore {
    /// Subdirectory of the state directory holding read sets
    pub const DIR_NAME: &'static str = "reads";

    /// Store under `<state_dir>/reads`
    #[must_use]
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self::at(state_dir.as_ref().join(Self::DIR_NAME))
    }

    /// Store rooted exactly at `root`
    #[must_use]
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            retry: LockRetryPolicy::default(),
            locks: Arc::new(FileLockProvider),
        }
    }

    /// With lock retry policy
    #[inline]
    #[must_use]
    pub fn with_retry_policy(mut self, retry: LockRetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// With lock provider
    #[inline]
    #[must_use]
    pub fn with_lock_provider(mut self, locks: Arc<dyn LockProvider>) -> Self {
        self.locks = locks;
        self
    }

    /// Directory holding the read sets
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of a session's read set
    #[must_use]
    pub fn set_path(&self, session: &SessionId) -> PathBuf {
        self.root.join(format!("{}.json", session.file_key()))
    }

    /// Location of a session's lock artifact
    #[must_use]
    pub fn lock_path(&self, session: &SessionId) -> PathBuf {
        self.root.join(format!("{}.lock", session.file_key()))
    }

    /// Load a session's read set
    ///
    /// A missing set is empty.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if the set exists but cannot be read and
    /// [`StoreError::Corrupt`] if it does not decode.
    pub fn load(&self, session: &SessionId) -> Result<BTreeSet<String>, StoreError> {
        let path = self.set_path(session);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(err) => return Err(StoreError::io(path, err)),
        };
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt { path, source })
    }

    /// Every path recorded for the session; empty when unreadable
    #[must_use]
    pub fn paths(&self, session: &SessionId) -> BTreeSet<String> {
        self.load_or_empty(session)
    }

    fn load_or_empty(&self, session: &SessionId) -> BTreeSet<String> {
        self.load(session).unwrap_or_else(|err| {
            tracing::warn!(session = %session, error = %err, "discarding unreadable read set");
            BTreeSet::new()
        })
    }

    fn persist(&self, session: &SessionId, reads: &BTreeSet<String>) -> Result<(), StoreError> {
        let target = self.set_path(session);
        let mut staged =
            tempfile::NamedTempFile::new_in(&self.root).map_err(|err| StoreError::io(&self.root, err))?;

        serde_json::to_writer(&mut staged, reads).map_err(|source| StoreError::Encode {
            path: target.clone(),
            source,
        })?;
        staged
            .flush()
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|err| StoreError::io(staged.path(), err))?;
        staged
            .persist(&target)
            .map_err(|err| StoreError::io(&target, err.error))?;
        Ok(())
    }

    /// Load, insert, persist. Callers decide whether the lock is held.
    fn insert(&self, session: &SessionId, key: String) -> Result<(), StoreError> {
        let mut reads = self.load_or_empty(session);
        if reads.insert(key) {
            self.persist(session, &reads)?;
        }
        Ok(())
    }

    /// Best-effort write used once lock retries are exhausted
    ///
    /// Two writers racing here can each load the old set and one rename can
    /// drop the other's insertion. The loss only ever removes evidence.
    fn insert_unlocked(&self, session: &SessionId, key: String) -> Result<(), StoreError> {
        tracing::warn!(
            session = %session,
            attempts = self.retry.max_attempts,
            "session lock unavailable, recording read without lock"
        );
        self.insert(session, key)
    }

    fn try_record(&self, session: &SessionId, path: &CanonicalPath) -> Result<RecordOutcome, StoreError> {
        fs::create_dir_all(&self.root).map_err(|err| StoreError::io(&self.root, err))?;
        let lock_path = self.lock_path(session);

        for attempt in 0..self.retry.max_attempts {
            match self.locks.try_acquire(&lock_path) {
                Ok(Some(guard)) => {
                    self.insert(session, path.key())?;
                    drop(guard);
                    return Ok(RecordOutcome::Locked);
                }
                Ok(None) => {
                    tracing::debug!(session = %session, attempt, "session lock contended");
                }
                Err(err) => {
                    tracing::debug!(session = %session, attempt, error = %err, "session lock failed");
                }
            }

            if attempt + 1 < self.retry.max_attempts {
                thread::sleep(self.retry.backoff_for(attempt));
            }
        }

        self.insert_unlocked(session, path.key())?;
        Ok(RecordOutcome::Unlocked)
    }
}

impl ReadProvenance for FileReadStore {
    fn record_read(&self, session: &SessionId, path: &CanonicalPath) -> RecordOutcome {
        let outcome = self.try_record(session, path).unwrap_or_else(|err| {
            tracing::warn!(session = %session, path = %path, error = %err, "read not recorded");
            RecordOutcome::Failed
        });
        count_record(outcome);
        outcome
    }

    fn lookup(&self, session: &SessionId, path: &CanonicalPath) -> Evidence {
        match self.load(session) {
            Ok(reads) if reads.contains(&path.key()) => Evidence::Found,
            Ok(_) => Evidence::Absent,
            Err(err) => {
                tracing::warn!(session = %session, error = %err, "read set unavailable");
                Evidence::Unavailable
            }
        }
    }
}
