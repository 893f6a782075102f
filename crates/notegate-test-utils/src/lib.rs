//! Testing utilities for notegate workspace
//!
//! Shared fixtures: a throwaway vault with a separate state directory,
//! history writers, and unique session ids.

#![allow(missing_docs)]

use notegate_core::{GateConfig, NoteGate};
use notegate_provenance::LockRetryPolicy;
use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Notes created in every [`TempVault`]
pub const SEED_NOTES: &[&str] = &[
    "existing.md",
    "notes/a.md",
    "notes/b.md",
    "daily-notes/2025-01-01.md",
    "scripts/tool.py",
];

/// Temporary vault directory with its own state directory
#[derive(Debug)]
pub struct TempVault {
    dir: TempDir,
    state: TempDir,
}

impl TempVault {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        for note in SEED_NOTES {
            let path = dir.path().join(note);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, format!("# {note}\n")).unwrap();
        }
        fs::create_dir_all(dir.path().join(".claude/hooks")).unwrap();
        fs::write(dir.path().join(".claude/hooks/notes.md"), "# internal\n").unwrap();

        Self {
            dir,
            state: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_dir(&self) -> &Path {
        self.state.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    /// Default config pointed at this vault's state directory
    pub fn config(&self) -> GateConfig {
        GateConfig::new()
            .with_state_dir(self.state_dir())
            .with_lock_policy(LockRetryPolicy {
                max_attempts: 50,
                backoff_step_ms: 1,
            })
    }

    /// File-backed gate rooted at the vault
    pub fn gate(&self) -> NoteGate {
        NoteGate::builder(self.config()).with_base_dir(self.root()).build()
    }

    /// History file inside the vault's state directory
    pub fn history(&self, session: &str, events: &[Value]) -> PathBuf {
        let path = self.state_dir().join(format!("{session}.jsonl"));
        write_history(&path, events);
        path
    }
}

impl Default for TempVault {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `events` as line-delimited JSON
pub fn write_history(path: &Path, events: &[Value]) {
    let mut file = fs::File::create(path).unwrap();
    for event in events {
        writeln!(file, "{event}").unwrap();
    }
}

/// Top-level read event
pub fn read_event(file_path: impl AsRef<Path>) -> Value {
    json!({
        "type": "tool_use",
        "name": "Read",
        "input": { "file_path": file_path.as_ref().to_string_lossy() },
    })
}

/// Assistant entry carrying a nested read event
pub fn assistant_read(file_path: impl AsRef<Path>) -> Value {
    json!({
        "type": "assistant",
        "message": { "content": [read_event(file_path)] },
    })
}

/// Some non-read event
pub fn user_message(text: &str) -> Value {
    json!({ "type": "user", "message": { "content": text } })
}

/// Fresh session id
pub fn session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
