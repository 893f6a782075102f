//! Subcommand implementations
//!
//! Hook commands never fail: undecodable input and internal errors degrade
//! to "no output" so the orchestrator falls back to its default behaviour.

use crate::hook::{HookInput, HookOutput};
use notegate_core::{GateConfig, GateVerdict, MutationRequest, NoteGate, Operation, RecordOutcome};
use std::path::{Path, PathBuf};

/// Configuration resolved for a working directory
#[must_use]
pub fn load_config(explicit: Option<&Path>, cwd: Option<&Path>) -> GateConfig {
    GateConfig::resolve(explicit, &start_dir(cwd))
}

/// Gate rooted at `cwd` (or the current directory)
#[must_use]
pub fn build_gate(explicit: Option<&Path>, cwd: Option<&Path>) -> NoteGate {
    let start = start_dir(cwd);
    NoteGate::builder(GateConfig::resolve(explicit, &start))
        .with_base_dir(start)
        .build()
}

fn start_dir(cwd: Option<&Path>) -> PathBuf {
    cwd.filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `pre-mutation`: evaluate a pending write or edit
#[must_use]
pub fn pre_mutation(payload: &[u8], config: Option<&Path>) -> Option<HookOutput> {
    let input = match HookInput::parse(payload) {
        Ok(input) => input,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring hook payload");
            return None;
        }
    };
    let request = input.mutation_request()?;

    let gate = build_gate(config, input.cwd.as_deref());
    HookOutput::for_verdict(&gate.evaluate(&request))
}

/// `record-read`: record a completed read
pub fn record_read(payload: &[u8], config: Option<&Path>) -> RecordOutcome {
    let input = match HookInput::parse(payload) {
        Ok(input) => input,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring hook payload");
            return RecordOutcome::Skipped;
        }
    };
    if !input.is_read() {
        return RecordOutcome::Skipped;
    }

    let gate = build_gate(config, input.cwd.as_deref());
    let outcome = gate.record_read(&input.session_id, &input.tool_input.file_path);
    tracing::debug!(path = %input.tool_input.file_path, outcome = %outcome, "read instrumented");
    outcome
}

/// Arguments of the `evaluate` subcommand
#[derive(Debug, Clone)]
pub struct EvaluateArgs {
    /// Operation kind
    pub operation: Operation,
    /// Target path
    pub path: String,
    /// Session identifier
    pub session: Option<String>,
    /// History file
    pub history: Option<PathBuf>,
}

/// `evaluate`: run the pipeline for one request given on the command line
#[must_use]
pub fn evaluate(args: EvaluateArgs, config: Option<&Path>) -> GateVerdict {
    let mut request = MutationRequest::new(args.operation, args.path);
    if let Some(session) = args.session {
        request = request.with_session(session);
    }
    if let Some(history) = args.history {
        request = request.with_history(history);
    }
    build_gate(config, None).evaluate(&request)
}

/// Parse the `--op` value
#[must_use]
pub fn parse_operation(raw: &str) -> Option<Operation> {
    match raw {
        "create" | "write" | "create_or_replace" => Some(Operation::CreateOrReplace),
        "edit" | "edit_in_place" => Some(Operation::EditInPlace),
        _ => None,
    }
}
