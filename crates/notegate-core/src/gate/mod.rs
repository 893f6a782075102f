//! Gates
//!
//! Each gate inspects a request and either lets it continue to the next gate
//! or stops evaluation with a verdict. A gate that fails internally is
//! replaced by its [`Gate::fail_closed`] verdict.

mod confirmation;
mod existence;
mod read_before_write;

pub use confirmation::ConfirmationGate;
pub use existence::ExistenceGate;
pub use read_before_write::ReadBeforeWriteGate;

use crate::error::GateError;
use crate::types::{GateId, GateVerdict, MutationRequest};
use notegate_provenance::{CanonicalPath, SessionId};
use std::fmt;
use std::path::Path;

/// Everything a gate may look at for one request
#[derive(Debug, Clone, Copy)]
pub struct GateContext<'a> {
    /// The request as received
    pub request: &'a MutationRequest,
    /// Normalized target
    pub target: &'a CanonicalPath,
    /// Session; `None` when the token is empty
    pub session: Option<&'a SessionId>,
    /// History location resolved against the base directory
    pub history: Option<&'a Path>,
}

impl<'a> GateContext<'a> {
    /// Context without session or history
    #[must_use]
    pub fn new(request: &'a MutationRequest, target: &'a CanonicalPath) -> Self {
        Self {
            request,
            target,
            session: None,
            history: None,
        }
    }

    /// With session
    #[inline]
    #[must_use]
    pub fn with_session(mut self, session: Option<&'a SessionId>) -> Self {
        self.session = session;
        self
    }

    /// With history
    #[inline]
    #[must_use]
    pub fn with_history(mut self, history: Option<&'a Path>) -> Self {
        self.history = history;
        self
    }

    /// Lowercased extension of the path as the request spelled it
    #[must_use]
    pub fn requested_extension(&self) -> Option<String> {
        Path::new(&self.request.target_path)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }

    /// File name as requested, with the resolved name appended when a link
    /// points somewhere else
    #[must_use]
    pub fn target_label(&self) -> String {
        let resolved = self.target.display_name();
        match Path::new(&self.request.target_path).file_name() {
            Some(requested) if requested.to_string_lossy() != resolved => {
                format!("{} (resolves to {resolved})", requested.to_string_lossy())
            }
            _ => resolved,
        }
    }
}

/// What a gate decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Hand the request to the next gate
    Continue,
    /// Terminal verdict
    Stop(GateVerdict),
}

/// One stage of the pipeline
pub trait Gate: Send + Sync + fmt::Debug {
    /// Identifier reported in verdicts
    fn id(&self) -> GateId;

    /// Inspect the request
    ///
    /// # Errors
    /// Returns [`GateError`] when the gate cannot reach a decision.
    fn check(&self, ctx: &GateContext<'_>) -> Result<GateOutcome, GateError>;

    /// Verdict used when [`Gate::check`] fails
    fn fail_closed(&self, ctx: &GateContext<'_>, error: &GateError) -> GateVerdict {
        GateVerdict::deny(
            self.id(),
            format!(
                "Cannot verify {} of '{}': {error}",
                self.id(),
                ctx.target_label()
            ),
        )
    }
}

/// Whether the target exists, distinguishing "no" from "cannot tell"
pub(crate) fn target_exists(target: &CanonicalPath) -> Result<bool, GateError> {
    target
        .as_path()
        .try_exists()
        .map_err(|source| GateError::Existence {
            path: target.as_path().to_path_buf(),
            source,
        })
}
