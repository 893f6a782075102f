//! Hook protocol
//!
//! One JSON object arrives on stdin per invocation; at most one JSON object
//! goes back on stdout.
//!
//! ```text
//! in:  {"tool_name":"Edit","tool_input":{"file_path":"notes/a.md"},
//!       "session_id":"s1","transcript_path":"/t/s1.jsonl","cwd":"/vault"}
//! out: {"hookSpecificOutput":{"hookEventName":"PreToolUse",
//!       "permissionDecision":"deny","permissionDecisionReason":"..."}}
//! ```

use anyhow::Context;
use notegate_core::{Decision, GateId, GateVerdict, MutationRequest, Operation};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tool name of the read the instrumentation records
pub const READ_TOOL: &str = "Read";

/// Event name answered by the pre-mutation hook
pub const PRE_TOOL_USE: &str = "PreToolUse";

/// Hook payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HookInput {
    /// Orchestrator tool about to run or just run
    #[serde(default)]
    pub tool_name: String,
    /// Tool arguments
    #[serde(default)]
    pub tool_input: ToolInput,
    /// Session identifier
    #[serde(default)]
    pub session_id: String,
    /// Session history (JSON lines)
    #[serde(default)]
    pub transcript_path: Option<PathBuf>,
    /// Working directory relative paths resolve against
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

/// Tool arguments the gates care about
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ToolInput {
    /// Target file
    #[serde(default)]
    pub file_path: String,
    /// New content for whole-file writes
    #[serde(default)]
    pub content: Option<String>,
}

impl HookInput {
    /// Decode a payload
    ///
    /// # Errors
    /// Fails when the bytes are not a hook payload.
    pub fn parse(bytes: &[u8]) -> anyhow::Result<Self> {
        serde_json::from_slice(bytes).context("decoding hook payload")
    }

    /// Mutation request for a write or edit with a target
    #[must_use]
    pub fn mutation_request(&self) -> Option<MutationRequest> {
        let operation = Operation::from_tool_name(&self.tool_name)?;
        if self.tool_input.file_path.trim().is_empty() {
            return None;
        }

        let mut request =
            MutationRequest::new(operation, self.tool_input.file_path.clone()).with_session(self.session_id.clone());
        request.history_ref = self.transcript_path.clone();
        request.content = self.tool_input.content.clone();
        Some(request)
    }

    /// Whether this payload reports a read
    #[must_use]
    pub fn is_read(&self) -> bool {
        self.tool_name == READ_TOOL
    }
}

/// Hook response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookOutput {
    /// Event-specific payload
    pub hook_specific_output: HookSpecificOutput,
}

/// Permission decision for a pending tool use
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSpecificOutput {
    /// Always [`PRE_TOOL_USE`]
    pub hook_event_name: &'static str,
    /// allow, ask or deny
    pub permission_decision: Decision,
    /// Shown to the agent and the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_decision_reason: Option<String>,
}

impl HookOutput {
    /// Response for a verdict; `None` for out-of-scope allows, which stay silent
    #[must_use]
    pub fn for_verdict(verdict: &GateVerdict) -> Option<Self> {
        if verdict.decision == Decision::Allow && verdict.gate_id == GateId::Scope {
            return None;
        }
        Some(Self {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: PRE_TOOL_USE,
                permission_decision: verdict.decision,
                permission_decision_reason: verdict.reason.clone(),
            },
        })
    }
}
