//! Request and verdict types
//!
//! A [`MutationRequest`] goes in, exactly one [`GateVerdict`] comes out.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of mutation being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Write a whole file, creating it or replacing it
    CreateOrReplace,
    /// Apply a partial change to an existing file
    EditInPlace,
}

impl Operation {
    /// Map an orchestrator tool name onto an operation
    #[must_use]
    pub fn from_tool_name(name: &str) -> Option<Self> {
        match name {
            "Write" => Some(Self::CreateOrReplace),
            "Edit" => Some(Self::EditInPlace),
            _ => None,
        }
    }

    /// Orchestrator tool name carrying this operation
    #[must_use]
    pub fn tool_name(self) -> &'static str {
        match self {
            Self::CreateOrReplace => "Write",
            Self::EditInPlace => "Edit",
        }
    }

    /// Stable snake_case name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateOrReplace => "create_or_replace",
            Self::EditInPlace => "edit_in_place",
        }
    }

    /// What the operation does to an existing file, as a gerund
    #[must_use]
    pub fn gerund(self) -> &'static str {
        match self {
            Self::CreateOrReplace => "overwriting",
            Self::EditInPlace => "editing",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed mutation of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRequest {
    /// Operation kind
    pub operation: Operation,
    /// Target path as the caller spelled it
    pub target_path: String,
    /// Opaque session identifier; empty when unknown
    #[serde(default)]
    pub session_id: String,
    /// Location of the session's interaction history
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_ref: Option<PathBuf>,
    /// New content for create-or-replace; not inspected by the gates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl MutationRequest {
    /// Request with no session, history or content
    #[must_use]
    pub fn new(operation: Operation, target_path: impl Into<String>) -> Self {
        Self {
            operation,
            target_path: target_path.into(),
            session_id: String::new(),
            history_ref: None,
            content: None,
        }
    }

    /// Create-or-replace request
    #[inline]
    #[must_use]
    pub fn create_or_replace(target_path: impl Into<String>) -> Self {
        Self::new(Operation::CreateOrReplace, target_path)
    }

    /// Edit-in-place request
    #[inline]
    #[must_use]
    pub fn edit_in_place(target_path: impl Into<String>) -> Self {
        Self::new(Operation::EditInPlace, target_path)
    }

    /// With session identifier
    #[inline]
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// With history location
    #[inline]
    #[must_use]
    pub fn with_history(mut self, history_ref: impl Into<PathBuf>) -> Self {
        self.history_ref = Some(history_ref.into());
        self
    }

    /// With new content
    #[inline]
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Whether the target path is blank
    #[must_use]
    pub fn has_target(&self) -> bool {
        !self.target_path.trim().is_empty()
    }
}

/// Authorization outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Proceed without prompting
    Allow,
    /// Proceed only after explicit confirmation
    Ask,
    /// Refuse
    Deny,
}

impl Decision {
    /// Lowercase name used on the wire
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Ask => "ask",
            Self::Deny => "deny",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage that produced a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateId {
    /// Scope filter (out-of-scope or empty target)
    Scope,
    /// Target must exist for edit-in-place
    Existence,
    /// Target must have been read before it is changed
    ReadBeforeWrite,
    /// Explicit confirmation
    Confirmation,
}

impl GateId {
    /// Stable snake_case name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scope => "scope",
            Self::Existence => "existence",
            Self::ReadBeforeWrite => "read_before_write",
            Self::Confirmation => "confirmation",
        }
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateVerdict {
    /// Decision
    pub decision: Decision,
    /// Human-readable reason; present for ask and deny
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Gate that terminated evaluation
    pub gate_id: GateId,
}

impl GateVerdict {
    /// Allow without reason
    #[must_use]
    pub fn allow(gate_id: GateId) -> Self {
        Self {
            decision: Decision::Allow,
            reason: None,
            gate_id,
        }
    }

    /// Ask with reason
    #[must_use]
    pub fn ask(gate_id: GateId, reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Ask,
            reason: Some(reason.into()),
            gate_id,
        }
    }

    /// Deny with reason
    #[must_use]
    pub fn deny(gate_id: GateId, reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Deny,
            reason: Some(reason.into()),
            gate_id,
        }
    }

    /// Whether the mutation may proceed without prompting
    #[inline]
    #[must_use]
    pub fn is_allow(&self) -> bool {
        self.decision == Decision::Allow
    }

    /// Whether the mutation was refused
    #[inline]
    #[must_use]
    pub fn is_deny(&self) -> bool {
        self.decision == Decision::Deny
    }
}
