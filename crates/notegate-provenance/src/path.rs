//! Path normalization
//!
//! Provides [`PathNormalizer`], which turns a raw file reference into a
//! [`CanonicalPath`] so that a read of `./notes/a.md` and a write of
//! `notes/a.md` (or of a symlink to it) compare equal.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Absolute, symlink-resolved path used as a provenance key
///
/// Resolution is best effort: when the file (or part of its parent chain)
/// does not exist, the unresolvable tail is appended lexically. An
/// under-resolved key can only cause an extra denial, never a missed one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalPath(PathBuf);

impl CanonicalPath {
    /// Wrap an already canonical path
    #[inline]
    #[must_use]
    pub fn from_canonical(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Borrow as a filesystem path
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// String form stored in the session read set
    #[inline]
    #[must_use]
    pub fn key(&self) -> String {
        self.0.to_string_lossy().into_owned()
    }

    /// Final component, for messages shown to a human
    #[must_use]
    pub fn display_name(&self) -> String {
        self.0
            .file_name()
            .map_or_else(|| self.key(), |name| name.to_string_lossy().into_owned())
    }

    /// Lowercased extension without the dot
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.0
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }
}

impl Display for CanonicalPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for CanonicalPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Resolves raw paths against a base directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNormalizer {
    base: PathBuf,
}

impl PathNormalizer {
    /// Normalizer resolving relative paths against `base`
    #[inline]
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Normalizer resolving against the process working directory
    ///
    /// Falls back to the filesystem root if the working directory is gone.
    #[must_use]
    pub fn from_current_dir() -> Self {
        let base = std::env::current_dir().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "working directory unavailable, resolving against root");
            PathBuf::from(std::path::MAIN_SEPARATOR_STR)
        });
        Self::new(base)
    }

    /// Base directory for relative paths
    #[inline]
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Absolute, lexically cleaned form without touching the filesystem
    #[must_use]
    pub fn absolute(&self, raw: impl AsRef<Path>) -> PathBuf {
        lexical_clean(&self.join(raw.as_ref()))
    }

    /// Canonicalize `raw`, resolving symlinks where the filesystem allows
    #[must_use]
    pub fn normalize(&self, raw: impl AsRef<Path>) -> CanonicalPath {
        let joined = self.join(raw.as_ref());

        if let Ok(resolved) = fs::canonicalize(&joined) {
            return CanonicalPath(resolved);
        }

        let cleaned = lexical_clean(&joined);
        CanonicalPath(resolve_existing_prefix(&cleaned).unwrap_or(cleaned))
    }

    fn join(&self, raw: &Path) -> PathBuf {
        if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            self.base.join(raw)
        }
    }
}

impl Default for PathNormalizer {
    fn default() -> Self {
        Self::from_current_dir()
    }
}

/// Canonicalize the deepest existing ancestor and re-append the rest
fn resolve_existing_prefix(path: &Path) -> Option<PathBuf> {
    let mut tail: Vec<OsString> = Vec::new();
    let mut cursor = path;

    while let Some(parent) = cursor.parent() {
        tail.push(cursor.file_name()?.to_os_string());
        cursor = parent;

        if let Ok(mut resolved) = fs::canonicalize(cursor) {
            for segment in tail.iter().rev() {
                resolved.push(segment);
            }
            return Some(resolved);
        }
    }

    None
}

/// Remove `.` segments and fold `..` into its parent, purely lexically
///
/// A `..` directly under the root is dropped; leading `..` segments of a
/// relative path are kept.
#[must_use]
pub fn lexical_clean(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}
