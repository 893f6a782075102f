//! Interaction history scanning
//!
//! The history is a JSON-lines file. A read shows up either as a top-level
//! tool-use entry or nested inside an assistant message:
//!
//! ```text
//! {"type":"tool_use","name":"Read","input":{"file_path":"notes/a.md"}}
//! {"type":"assistant","message":{"content":[{"type":"tool_use","name":"Read","input":{"file_path":"notes/a.md"}}]}}
//! ```
//!
//! Lines that fail to parse are skipped. A history that cannot be opened
//! yields no evidence.

use crate::error::HistoryError;
use crate::evidence::{Evidence, ProvenanceQuery, ProvenanceSource};
use crate::path::{CanonicalPath, PathNormalizer};
use serde_json::Value;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const TOOL_USE: &str = "tool_use";
const READ_TOOL: &str = "Read";

/// One relevant entry of the interaction history
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEvent {
    /// A read of `file_path`, as spelled by the agent
    Read {
        /// Raw path of the read
        file_path: String,
    },
}

impl HistoryEvent {
    /// Extract every read event from one decoded history line
    #[must_use]
    pub fn from_value(value: &Value) -> Vec<Self> {
        let mut events: Vec<Self> = read_path(value)
            .map(|file_path| Self::Read { file_path })
            .into_iter()
            .collect();

        if let Some(content) = value
            .get("message")
            .and_then(|message| message.get("content"))
            .and_then(Value::as_array)
        {
            events.extend(
                content
                    .iter()
                    .filter_map(read_path)
                    .map(|file_path| Self::Read { file_path }),
            );
        }

        events
    }

    /// Decode one history line
    ///
    /// # Errors
    /// Returns the decode error for a line that is not JSON.
    pub fn parse_line(line: &[u8]) -> Result<Vec<Self>, serde_json::Error> {
        let value: Value = serde_json::from_slice(line)?;
        Ok(Self::from_value(&value))
    }
}

fn read_path(value: &Value) -> Option<String> {
    if value.get("type")?.as_str()? != TOOL_USE || value.get("name")?.as_str()? != READ_TOOL {
        return None;
    }
    value
        .get("input")?
        .get("file_path")?
        .as_str()
        .filter(|path| !path.is_empty())
        .map(str::to_string)
}

/// Finds prior reads of a target in a session history
#[derive(Debug, Clone, Default)]
pub struct HistoryScanner {
    normalizer: PathNormalizer,
}

impl HistoryScanner {
    /// Scanner that normalizes history paths with `normalizer`
    #[inline]
    #[must_use]
    pub fn new(normalizer: PathNormalizer) -> Self {
        Self { normalizer }
    }

    /// Scan `history` for a read of `target`
    ///
    /// # Errors
    /// Returns [`HistoryError::Unreadable`] if the history cannot be opened.
    /// Undecodable lines and read errors part-way through are not errors; the
    /// scan reports what it saw up to that point.
    pub fn scan(&self, history: &Path, target: &CanonicalPath) -> Result<bool, HistoryError> {
        let file = File::open(history).map_err(|source| HistoryError::Unreadable {
            path: history.to_path_buf(),
            source,
        })?;

        let target_key = target.key();
        let mut checked: HashSet<String> = HashSet::new();
        let mut skipped = 0usize;

        for (index, line) in BufReader::new(file).split(b'\n').enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    tracing::warn!(
                        history = %history.display(),
                        line = index + 1,
                        error = %err,
                        "history read interrupted"
                    );
                    break;
                }
            };
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let Ok(events) = HistoryEvent::parse_line(&line) else {
                skipped += 1;
                continue;
            };

            for HistoryEvent::Read { file_path } in events {
                if file_path == target_key {
                    return Ok(true);
                }
                if !checked.insert(file_path.clone()) {
                    continue;
                }
                if self.normalizer.normalize(&file_path) == *target {
                    return Ok(true);
                }
            }
        }

        if skipped > 0 {
            tracing::debug!(history = %history.display(), skipped, "skipped malformed history lines");
        }
        Ok(false)
    }

    /// Total form of [`HistoryScanner::scan`]: any failure means no evidence
    #[must_use]
    pub fn was_previously_read(&self, history: Option<&Path>, target: &CanonicalPath) -> bool {
        self.evidence(history, target).is_found()
    }

    fn evidence(&self, history: Option<&Path>, target: &CanonicalPath) -> Evidence {
        let Some(history) = history.filter(|path| !path.as_os_str().is_empty()) else {
            return Evidence::Unavailable;
        };

        match self.scan(history, target) {
            Ok(true) => Evidence::Found,
            Ok(false) => Evidence::Absent,
            Err(err) => {
                tracing::warn!(error = %err, "history unavailable, relying on other provenance");
                Evidence::Unavailable
            }
        }
    }
}

impl ProvenanceSource for HistoryScanner {
    fn name(&self) -> &'static str {
        "history"
    }

    fn lookup(&self, query: &ProvenanceQuery) -> Evidence {
        self.evidence(query.history.as_deref(), &query.target)
    }
}
