//! Gate configuration
//!
//! Defaults are compiled in; a `.notegate.json` file overrides any subset of
//! fields. Missing fields keep their defaults.
//!
//! ```json
//! {
//!   "governed_extensions": ["md", "markdown"],
//!   "reserved_dirs": [".claude", ".notegate"],
//!   "lock": { "max_attempts": 8 }
//! }
//! ```

use crate::error::{ConfigError, ConfigResult};
use notegate_provenance::LockRetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up by [`GateConfig::discover`]
pub const CONFIG_FILE_NAME: &str = ".notegate.json";

/// Environment variable overriding the default state directory
pub const STATE_DIR_ENV: &str = "NOTEGATE_STATE_DIR";

/// Resolved configuration for one gate process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Extensions subject to read-before-write and to read recording
    /// (case-insensitive, leading dot optional)
    pub governed_extensions: Vec<String>,
    /// Directory names whose contents are out of scope for every gate
    pub reserved_dirs: Vec<String>,
    /// Folders the note conventions treat as protected; carried for
    /// collaborators, not consulted by the gates
    pub protected_folders: Vec<String>,
    /// Root of durable state (the session read sets live in `reads/`)
    pub state_dir: PathBuf,
    /// Lock acquisition schedule for the read store
    pub lock: LockRetryPolicy,
}

impl GateConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config file over the defaults
    ///
    /// The lock schedule is cut down to [`LockRetryPolicy::bounded`].
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Json`] if it does not decode.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| ConfigError::io_error(path, err))?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        let lock = config.lock.bounded();
        if lock != config.lock {
            tracing::warn!(
                path = %path.display(),
                max_attempts = lock.max_attempts,
                backoff_step_ms = lock.backoff_step_ms,
                "lock schedule exceeds its budget, bounded"
            );
        }
        Ok(Self { lock, ..config })
    }

    /// Nearest `.notegate.json` in `start` or one of its ancestors
    #[must_use]
    pub fn discover(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Explicit file, else discovered file, else defaults
    ///
    /// An unreadable or invalid file is logged and replaced by defaults; the
    /// gate has to keep running without configuration.
    #[must_use]
    pub fn resolve(explicit: Option<&Path>, start: &Path) -> Self {
        let Some(path) = explicit.map(Path::to_path_buf).or_else(|| Self::discover(start)) else {
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded gate config");
                config
            }
            Err(err) => {
                tracing::warn!(error = %err, "using default gate config");
                Self::default()
            }
        }
    }

    /// With state directory
    #[inline]
    #[must_use]
    pub fn with_state_dir(mut self, state_dir: impl Into<PathBuf>) -> Self {
        self.state_dir = state_dir.into();
        self
    }

    /// With governed extensions
    #[must_use]
    pub fn with_governed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.governed_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// With reserved directory names
    #[must_use]
    pub fn with_reserved_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// With lock retry policy, bounded
    #[inline]
    #[must_use]
    pub fn with_lock_policy(mut self, lock: LockRetryPolicy) -> Self {
        self.lock = lock.bounded();
        self
    }

    /// Governed extensions, lowercased and without a leading dot
    pub fn normalized_extensions(&self) -> impl Iterator<Item = String> + '_ {
        self.governed_extensions.iter().map(|ext| normalize_extension(ext))
    }

    /// Whether `path` carries a governed extension
    #[must_use]
    pub fn is_governed(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| self.normalized_extensions().any(|governed| governed == ext))
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            governed_extensions: vec!["md".to_string()],
            reserved_dirs: vec![".claude".to_string()],
            protected_folders: vec![".obsidian".to_string(), ".git".to_string(), ".claude".to_string()],
            state_dir: default_state_dir(),
            lock: LockRetryPolicy::default(),
        }
    }
}

/// `$NOTEGATE_STATE_DIR`, else `$HOME/.claude`, else `.claude`
#[must_use]
pub fn default_state_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(STATE_DIR_ENV).filter(|dir| !dir.is_empty()) {
        return PathBuf::from(dir);
    }
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|home| !home.is_empty())
        .map_or_else(|| PathBuf::from(".claude"), |home| PathBuf::from(home).join(".claude"))
}

pub(crate) fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = GateConfig::new();
        assert_eq!(config.governed_extensions, vec!["md"]);
        assert_eq!(config.reserved_dirs, vec![".claude"]);
        assert_eq!(config.lock, LockRetryPolicy::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{"governed_extensions": [".MD", "markdown"], "lock": {"max_attempts": 2}}"#)
            .unwrap();

        let config = GateConfig::load(&path).unwrap();
        assert_eq!(config.governed_extensions, vec![".MD", "markdown"]);
        assert_eq!(config.reserved_dirs, vec![".claude"]);
        assert_eq!(config.lock.max_attempts, 2);
        assert_eq!(config.lock.backoff_step_ms, 50);
    }

    #[test]
    fn oversized_lock_schedule_is_bounded_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{"lock": {"max_attempts": 100000, "backoff_step_ms": 60000}}"#).unwrap();

        let config = GateConfig::load(&path).unwrap();
        assert_eq!(config.lock, LockRetryPolicy { max_attempts: 2, backoff_step_ms: 1000 });
        assert_eq!(config.lock.total_budget(), LockRetryPolicy::MAX_BUDGET);

        let manual = GateConfig::new().with_lock_policy(LockRetryPolicy::immediate(u32::MAX));
        assert_eq!(manual.lock.max_attempts, LockRetryPolicy::MAX_ATTEMPTS);
    }

    #[test]
    fn invalid_file_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ nope").unwrap();

        assert!(matches!(GateConfig::load(&path), Err(ConfigError::Json { .. })));
    }

    #[test]
    fn resolve_falls_back_to_defaults_on_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ nope").unwrap();

        let config = GateConfig::resolve(Some(&path), dir.path());
        assert_eq!(config.governed_extensions, GateConfig::default().governed_extensions);
    }

    #[test]
    fn discover_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("notes/daily");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{"reserved_dirs": [".internal"]}"#).unwrap();

        let found = GateConfig::discover(&nested).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILE_NAME));
        assert_eq!(GateConfig::resolve(None, &nested).reserved_dirs, vec![".internal"]);
    }

    #[test]
    fn governed_extension_matching() {
        let config = GateConfig::new().with_governed_extensions([".MD", "markdown"]);
        assert!(config.is_governed(Path::new("/vault/a.md")));
        assert!(config.is_governed(Path::new("/vault/A.Md")));
        assert!(config.is_governed(Path::new("notes/b.markdown")));
        assert!(!config.is_governed(Path::new("script.py")));
        assert!(!config.is_governed(Path::new("README")));
    }
}
