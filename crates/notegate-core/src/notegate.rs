//! NoteGate facade
//!
//! Owns the configuration, the path normalizer, the injected read store and
//! the gate pipeline. Both public operations are total.

use crate::config::GateConfig;
use crate::gate::GateContext;
use crate::pipeline::GatePipeline;
use crate::scope::ScopeFilter;
use crate::types::{GateId, GateVerdict, MutationRequest};
use notegate_provenance::{
    CanonicalPath, FileReadStore, HistoryScanner, LockProvider, PathNormalizer, ProvenanceChain,
    ReadProvenance, RecordOutcome, SessionId, StoreSource,
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Pre-mutation authorization for one process
pub struct NoteGate {
    config: GateConfig,
    normalizer: PathNormalizer,
    scope: ScopeFilter,
    store: Arc<dyn ReadProvenance>,
    pipeline: GatePipeline,
}

impl NoteGate {
    /// Gate with the file-backed store and the current directory as base
    #[must_use]
    pub fn new(config: GateConfig) -> Self {
        Self::builder(config).build()
    }

    /// Builder for a customised gate
    #[must_use]
    pub fn builder(config: GateConfig) -> NoteGateBuilder {
        NoteGateBuilder::new(config)
    }

    /// Effective configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Normalizer used for targets and read records
    #[inline]
    #[must_use]
    pub fn normalizer(&self) -> &PathNormalizer {
        &self.normalizer
    }

    /// Injected read store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ReadProvenance> {
        &self.store
    }

    /// Decide whether a mutation may proceed
    ///
    /// Empty and out-of-scope targets are allowed by the scope stage. The
    /// scope check runs on the lexical absolute path, then again on the
    /// normalized path so a symlink into a reserved directory is caught.
    #[must_use]
    pub fn evaluate(&self, request: &MutationRequest) -> GateVerdict {
        let verdict = self.decide(request);
        metrics::counter!(
            "notegate_verdicts_total",
            "decision" => verdict.decision.as_str(),
            "gate" => verdict.gate_id.as_str()
        )
        .increment(1);
        tracing::debug!(
            operation = %request.operation,
            path = %request.target_path,
            decision = %verdict.decision,
            gate = %verdict.gate_id,
            "mutation evaluated"
        );
        verdict
    }

    fn decide(&self, request: &MutationRequest) -> GateVerdict {
        let Some(target) = self.scoped_target(&request.target_path) else {
            return GateVerdict::allow(GateId::Scope);
        };

        let session = parse_session(&request.session_id);
        let history = request
            .history_ref
            .as_deref()
            .filter(|history| !history.as_os_str().is_empty())
            .map(|history| self.normalizer.absolute(history));

        let ctx = GateContext::new(request, &target)
            .with_session(session.as_ref())
            .with_history(history.as_deref());
        self.pipeline.evaluate(&ctx)
    }

    /// Record that `session_id` read `raw_path`
    ///
    /// Skipped for empty paths, empty sessions, out-of-scope targets and
    /// paths where neither the spelled nor the resolved name carries a
    /// governed extension. Never fails.
    pub fn record_read(&self, session_id: &str, raw_path: &str) -> RecordOutcome {
        let Some(session) = parse_session(session_id) else {
            tracing::debug!(path = raw_path, "read not recorded: no session");
            return RecordOutcome::Skipped;
        };
        let Some(target) = self.scoped_target(raw_path) else {
            return RecordOutcome::Skipped;
        };
        let governed = self.config.is_governed(Path::new(raw_path)) || self.config.is_governed(target.as_path());
        if !governed {
            return RecordOutcome::Skipped;
        }

        self.store.record_read(&session, &target)
    }

    /// Whether the store holds a read of `raw_path` by `session_id`
    #[must_use]
    pub fn has_read(&self, session_id: &str, raw_path: &str) -> bool {
        let Some(session) = parse_session(session_id) else {
            return false;
        };
        if raw_path.trim().is_empty() {
            return false;
        }
        self.store.has_read(&session, &self.normalizer.normalize(raw_path))
    }

    /// Normalized target, or `None` when empty or out of scope
    fn scoped_target(&self, raw_path: &str) -> Option<CanonicalPath> {
        if raw_path.trim().is_empty() {
            return None;
        }
        if !self.scope.in_scope(&self.normalizer.absolute(raw_path)) {
            tracing::debug!(path = raw_path, "out of scope");
            return None;
        }

        let target = self.normalizer.normalize(raw_path);
        if !self.scope.in_scope(target.as_path()) {
            tracing::debug!(path = raw_path, resolved = %target, "resolves out of scope");
            return None;
        }
        Some(target)
    }
}

impl fmt::Debug for NoteGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoteGate")
            .field("base", &self.normalizer.base())
            .field("scope", &self.scope)
            .field("store", &self.store)
            .field("pipeline", &self.pipeline.gate_ids())
            .finish_non_exhaustive()
    }
}

/// `None` for the empty token; any other token is an opaque session id
fn parse_session(raw: &str) -> Option<SessionId> {
    SessionId::parse(raw).ok()
}

/// Builder for [`NoteGate`]
#[derive(Debug)]
pub struct NoteGateBuilder {
    config: GateConfig,
    base_dir: Option<PathBuf>,
    store: Option<Arc<dyn ReadProvenance>>,
    lock_provider: Option<Arc<dyn LockProvider>>,
}

impl NoteGateBuilder {
    /// Builder starting from `config`
    #[must_use]
    pub fn new(config: GateConfig) -> Self {
        Self {
            config,
            base_dir: None,
            store: None,
            lock_provider: None,
        }
    }

    /// Resolve relative paths against `base_dir` instead of the current directory
    #[inline]
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Use `store` instead of the file-backed store under the state directory
    #[inline]
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn ReadProvenance>) -> Self {
        self.store = Some(store);
        self
    }

    /// Lock provider for the default file-backed store
    #[inline]
    #[must_use]
    pub fn with_lock_provider(mut self, locks: Arc<dyn LockProvider>) -> Self {
        self.lock_provider = Some(locks);
        self
    }

    /// Assemble the gate
    #[must_use]
    pub fn build(self) -> NoteGate {
        let normalizer = self
            .base_dir
            .as_deref()
            .map_or_else(PathNormalizer::from_current_dir, |base| PathNormalizer::new(absolute_base(base)));

        let config = self.config;
        let store: Arc<dyn ReadProvenance> = match self.store {
            Some(store) => store,
            None => {
                let mut store = FileReadStore::new(&config.state_dir).with_retry_policy(config.lock.bounded());
                if let Some(locks) = self.lock_provider {
                    store = store.with_lock_provider(locks);
                }
                Arc::new(store)
            }
        };

        let chain = ProvenanceChain::new()
            .with_source(Arc::new(HistoryScanner::new(normalizer.clone())))
            .with_source(Arc::new(StoreSource::new(Arc::clone(&store))));

        tracing::debug!(
            base = %normalizer.base().display(),
            state_dir = %config.state_dir.display(),
            sources = ?chain.names().collect::<Vec<_>>(),
            "notegate ready"
        );

        NoteGate {
            scope: ScopeFilter::from_config(&config),
            pipeline: GatePipeline::new(&config, chain),
            store,
            normalizer,
            config,
        }
    }
}

/// A relative base is taken relative to the current directory
fn absolute_base(base: &Path) -> PathBuf {
    if base.is_absolute() {
        base.to_path_buf()
    } else {
        PathNormalizer::from_current_dir().absolute(base)
    }
}
