//! In-process read store

use super::{count_record, ReadProvenance, RecordOutcome};
use crate::evidence::Evidence;
use crate::path::CanonicalPath;
use crate::session::SessionId;
use dashmap::DashMap;
use std::collections::BTreeSet;

/// Read provenance held in memory for the life of the process
///
/// Sessions are sharded by [`DashMap`], so concurrent records for different
/// sessions do not contend and records for one session serialize on its
/// shard.
#[derive(Debug, Default)]
pub struct MemoryReadStore {
    sessions: DashMap<SessionId, BTreeSet<CanonicalPath>>,
}

impl MemoryReadStore {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of paths recorded for `session`
    #[must_use]
    pub fn len(&self, session: &SessionId) -> usize {
        self.sessions.get(session).map_or(0, |reads| reads.len())
    }

    /// Number of sessions with at least one read
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl ReadProvenance for MemoryReadStore {
    fn record_read(&self, session: &SessionId, path: &CanonicalPath) -> RecordOutcome {
        self.sessions
            .entry(session.clone())
            .or_default()
            .insert(path.clone());
        count_record(RecordOutcome::Locked);
        RecordOutcome::Locked
    }

    fn lookup(&self, session: &SessionId, path: &CanonicalPath) -> Evidence {
        match self.sessions.get(session) {
            Some(reads) if reads.contains(path) => Evidence::Found,
            _ => Evidence::Absent,
        }
    }
}
