//! Scope filter
//!
//! Paths under a reserved directory belong to the orchestrator's own
//! machinery and bypass every gate.

use crate::config::GateConfig;
use notegate_provenance::lexical_clean;
use std::ffi::{OsStr, OsString};
use std::path::{Component, Path};

/// Decides whether a path is subject to the gates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFilter {
    reserved: Vec<OsString>,
}

impl ScopeFilter {
    /// Filter with the given reserved directory names
    #[must_use]
    pub fn new<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            reserved: reserved.into_iter().map(Into::into).collect(),
        }
    }

    /// Filter using the configured reserved directories
    #[must_use]
    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(config.reserved_dirs.iter().map(String::as_str))
    }

    /// Reserved directory names
    pub fn reserved(&self) -> impl Iterator<Item = &OsStr> + '_ {
        self.reserved.iter().map(OsString::as_os_str)
    }

    /// Whether `path` is subject to the gates
    ///
    /// Matches whole components of the lexically cleaned path, so
    /// `notes/.claude-ideas.md` stays in scope while `a/.claude/b.md` and
    /// `a/x/../.claude/b.md` do not. An empty path is out of scope.
    #[must_use]
    pub fn in_scope(&self, path: &Path) -> bool {
        if path.as_os_str().is_empty() {
            return false;
        }
        !lexical_clean(path).components().any(|component| match component {
            Component::Normal(name) => self.is_reserved(name),
            _ => false,
        })
    }

    fn is_reserved(&self, name: &OsStr) -> bool {
        self.reserved.iter().any(|reserved| reserved == name)
    }
}

impl Default for ScopeFilter {
    fn default() -> Self {
        Self::from_config(&GateConfig::default())
    }
}
