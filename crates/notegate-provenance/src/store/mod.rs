//! Session-scoped read provenance store
//!
//! [`ReadProvenance`] is the narrow seam the gate pipeline depends on. The
//! production implementation is [`FileReadStore`]; [`MemoryReadStore`] backs
//! tests and embedders that do not need durability.

mod file;
mod lock;
mod memory;

pub use file::FileReadStore;
pub use lock::{AlwaysContended, FileLockProvider, LockGuard, LockProvider, LockRetryPolicy};
pub use memory::MemoryReadStore;

use crate::evidence::{Evidence, ProvenanceQuery, ProvenanceSource};
use crate::path::CanonicalPath;
use crate::session::SessionId;
use std::fmt;
use std::sync::Arc;

/// How a `record_read` call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordOutcome {
    /// Recorded under the session lock
    Locked,
    /// Recorded by the unlocked fallback after lock retries ran out
    Unlocked,
    /// Nothing to record (filtered out before reaching the store)
    Skipped,
    /// Recording failed; the read itself is unaffected
    Failed,
}

impl RecordOutcome {
    /// Label for logs and metrics
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }

    /// True when the path is now in the session's set
    #[inline]
    #[must_use]
    pub fn is_recorded(self) -> bool {
        matches!(self, Self::Locked | Self::Unlocked)
    }
}

impl fmt::Display for RecordOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable, per-session set of paths that were read
///
/// Membership is monotonic: nothing in this interface removes a path.
/// Both operations are total. Implementations swallow their own failures.
pub trait ReadProvenance: Send + Sync + fmt::Debug {
    /// Add `path` to the session's set; idempotent and safe to call
    /// concurrently, including for the same session
    fn record_read(&self, session: &SessionId, path: &CanonicalPath) -> RecordOutcome;

    /// Tri-state lookup; [`Evidence::Unavailable`] when the set cannot be read
    fn lookup(&self, session: &SessionId, path: &CanonicalPath) -> Evidence;

    /// Pure membership check
    fn has_read(&self, session: &SessionId, path: &CanonicalPath) -> bool {
        self.lookup(session, path).is_found()
    }
}

/// Adapts a [`ReadProvenance`] store into a [`ProvenanceSource`]
#[derive(Debug, Clone)]
pub struct StoreSource {
    store: Arc<dyn ReadProvenance>,
}

impl StoreSource {
    /// Wrap a shared store
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn ReadProvenance>) -> Self {
        Self { store }
    }
}

impl ProvenanceSource for StoreSource {
    fn name(&self) -> &'static str {
        "session-store"
    }

    fn lookup(&self, query: &ProvenanceQuery) -> Evidence {
        match &query.session {
            Some(session) => self.store.lookup(session, &query.target),
            None => Evidence::Unavailable,
        }
    }
}

pub(crate) fn count_record(outcome: RecordOutcome) {
    metrics::counter!("notegate_read_records_total", "outcome" => outcome.as_str()).increment(1);
}
