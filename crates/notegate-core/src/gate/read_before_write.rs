//! Read-before-write gate
//!
//! Applies to governed files that already hold content: every edit-in-place,
//! and create-or-replace over an existing target. Creating a new file needs
//! no prior read. A target is governed when either the requested name or the
//! resolved name carries a governed extension, so a link cannot change which
//! rules apply.

use super::{target_exists, Gate, GateContext, GateOutcome};
use crate::config::normalize_extension;
use crate::error::GateError;
use crate::types::{GateId, GateVerdict, Operation};
use notegate_provenance::{Evidence, ProvenanceChain, ProvenanceQuery};

/// Denies changes to governed files the session has not read
#[derive(Debug, Clone)]
pub struct ReadBeforeWriteGate {
    extensions: Vec<String>,
    chain: ProvenanceChain,
}

impl ReadBeforeWriteGate {
    /// Gate over `extensions`, consulting `chain` for evidence
    #[must_use]
    pub fn new<I, S>(extensions: I, chain: ProvenanceChain) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| normalize_extension(ext.as_ref()))
                .collect(),
            chain,
        }
    }

    /// Provenance chain consulted by this gate
    #[inline]
    #[must_use]
    pub fn chain(&self) -> &ProvenanceChain {
        &self.chain
    }

    fn governs(&self, ext: Option<String>) -> bool {
        ext.is_some_and(|ext| self.extensions.iter().any(|governed| *governed == ext))
    }

    fn applies(&self, ctx: &GateContext<'_>) -> Result<bool, GateError> {
        if !self.governs(ctx.requested_extension()) && !self.governs(ctx.target.extension()) {
            return Ok(false);
        }

        match ctx.request.operation {
            Operation::EditInPlace => Ok(true),
            Operation::CreateOrReplace => target_exists(ctx.target),
        }
    }

    fn deny(&self, ctx: &GateContext<'_>) -> GateVerdict {
        GateVerdict::deny(
            self.id(),
            format!(
                "Must read '{}' before {}. This prevents overwriting content you haven't reviewed.",
                ctx.target_label(),
                ctx.request.operation.gerund()
            ),
        )
    }
}

impl Gate for ReadBeforeWriteGate {
    fn id(&self) -> GateId {
        GateId::ReadBeforeWrite
    }

    fn check(&self, ctx: &GateContext<'_>) -> Result<GateOutcome, GateError> {
        if !self.applies(ctx)? {
            return Ok(GateOutcome::Continue);
        }

        let Some(session) = ctx.session else {
            tracing::debug!(path = %ctx.target, "no session, no read evidence");
            return Ok(GateOutcome::Stop(self.deny(ctx)));
        };

        let query = ProvenanceQuery::new(ctx.target.clone())
            .with_session(Some(session.clone()))
            .with_history(ctx.history.map(std::path::Path::to_path_buf));

        match self.chain.lookup(&query) {
            Evidence::Found => Ok(GateOutcome::Continue),
            evidence => {
                tracing::debug!(
                    path = %ctx.target,
                    session = %session,
                    evidence = %evidence,
                    "no read evidence"
                );
                Ok(GateOutcome::Stop(self.deny(ctx)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixed_chain, MockSource};
    use crate::types::MutationRequest;
    use notegate_provenance::{CanonicalPath, SessionId};
    use std::sync::Arc;

    fn existing(dir: &tempfile::TempDir, name: &str) -> CanonicalPath {
        let path = dir.path().join(name);
        std::fs::write(&path, "# note").unwrap();
        CanonicalPath::from_canonical(path)
    }

    fn stop_reason(outcome: GateOutcome) -> String {
        match outcome {
            GateOutcome::Stop(verdict) => verdict.reason.unwrap_or_default(),
            GateOutcome::Continue => panic!("expected a verdict"),
        }
    }

    #[test]
    fn edit_without_evidence_is_denied() {
        let dir = tempfile::tempdir().unwrap();
        let target = existing(&dir, "a.md");
        let session = SessionId::parse("s1").unwrap();
        let request = MutationRequest::edit_in_place("a.md");
        let gate = ReadBeforeWriteGate::new(["md"], fixed_chain(Evidence::Absent));

        let ctx = GateContext::new(&request, &target).with_session(Some(&session));
        assert_eq!(
            stop_reason(gate.check(&ctx).unwrap()),
            "Must read 'a.md' before editing. This prevents overwriting content you haven't reviewed."
        );
    }

    #[test]
    fn evidence_lets_edit_continue() {
        let dir = tempfile::tempdir().unwrap();
        let target = existing(&dir, "a.md");
        let session = SessionId::parse("s1").unwrap();
        let request = MutationRequest::edit_in_place("a.md");
        let gate = ReadBeforeWriteGate::new(["md"], fixed_chain(Evidence::Found));

        let ctx = GateContext::new(&request, &target).with_session(Some(&session));
        assert_eq!(gate.check(&ctx).unwrap(), GateOutcome::Continue);
    }

    #[test]
    fn overwrite_of_existing_file_requires_read() {
        let dir = tempfile::tempdir().unwrap();
        let target = existing(&dir, "a.md");
        let session = SessionId::parse("s1").unwrap();
        let request = MutationRequest::create_or_replace("a.md");
        let gate = ReadBeforeWriteGate::new(["md"], fixed_chain(Evidence::Unavailable));

        let ctx = GateContext::new(&request, &target).with_session(Some(&session));
        assert!(stop_reason(gate.check(&ctx).unwrap()).contains("before overwriting"));
    }

    #[test]
    fn new_file_and_ungoverned_file_skip_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = MockSource::new();
        source.expect_name().return_const("mock");
        source.expect_lookup().never();
        let gate = ReadBeforeWriteGate::new(
            [".MD"],
            ProvenanceChain::new().with_source(Arc::new(source)),
        );
        let session = SessionId::parse("s1").unwrap();

        let fresh = CanonicalPath::from_canonical(dir.path().join("new.md"));
        let create = MutationRequest::create_or_replace("new.md");
        let ctx = GateContext::new(&create, &fresh).with_session(Some(&session));
        assert_eq!(gate.check(&ctx).unwrap(), GateOutcome::Continue);

        let script = existing(&dir, "tool.py");
        let edit = MutationRequest::edit_in_place("tool.py");
        let ctx = GateContext::new(&edit, &script).with_session(Some(&session));
        assert_eq!(gate.check(&ctx).unwrap(), GateOutcome::Continue);
    }

    #[test]
    fn missing_session_fails_closed_without_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let target = existing(&dir, "a.md");
        let mut source = MockSource::new();
        source.expect_name().return_const("mock");
        source.expect_lookup().never();
        let gate = ReadBeforeWriteGate::new(["md"], ProvenanceChain::new().with_source(Arc::new(source)));
        let request = MutationRequest::edit_in_place("a.md");

        let outcome = gate.check(&GateContext::new(&request, &target)).unwrap();
        assert!(matches!(outcome, GateOutcome::Stop(verdict) if verdict.is_deny()));
    }

    #[test]
    fn link_is_governed_by_either_name() {
        let dir = tempfile::tempdir().unwrap();
        let script = existing(&dir, "tool.py");
        let note = existing(&dir, "a.md");
        let session = SessionId::parse("s1").unwrap();
        let gate = ReadBeforeWriteGate::new(["md"], fixed_chain(Evidence::Absent));

        let md_to_py = MutationRequest::edit_in_place("link.md");
        let ctx = GateContext::new(&md_to_py, &script).with_session(Some(&session));
        assert_eq!(
            stop_reason(gate.check(&ctx).unwrap()),
            "Must read 'link.md (resolves to tool.py)' before editing. \
             This prevents overwriting content you haven't reviewed."
        );

        let txt_to_md = MutationRequest::edit_in_place("alias.txt");
        let ctx = GateContext::new(&txt_to_md, &note).with_session(Some(&session));
        assert!(stop_reason(gate.check(&ctx).unwrap()).starts_with("Must read 'alias.txt (resolves to a.md)'"));
    }
}
