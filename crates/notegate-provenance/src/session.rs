//! Session identifiers
//!
//! A session id is an opaque, non-empty token. It is never joined onto a
//! directory as given: [`SessionId::file_key`] derives the name of the
//! on-disk read set.
//!
//! ```text
//! "3f2a9c1e-8b7d"    ──► 3f2a9c1e-8b7d
//! "c2Vzc2lvbg=="     ──► _<sha256 hex>
//! "../evil"          ──► _<sha256 hex>
//! ```

use crate::error::StoreError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Tokens usable verbatim as a file stem; hashed keys start with `_` and
/// never match.
static PLAIN_KEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,127}$").expect("session key pattern is valid")
});

/// Opaque token identifying one work session
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Accept a raw session token
    ///
    /// # Errors
    /// Returns [`StoreError::EmptySessionId`] for an empty token. Any other
    /// token is accepted.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        if raw.is_empty() {
            return Err(StoreError::EmptySessionId);
        }
        Ok(Self(raw.to_string()))
    }

    /// Borrow the token
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File stem of this session's store artifacts
    ///
    /// Plain tokens (alphanumeric start, then `[A-Za-z0-9._-]`, at most 128
    /// chars) are used as they are. Everything else becomes `_` followed by
    /// the hex SHA-256 of the token, which is always a single safe path
    /// component.
    #[must_use]
    pub fn file_key(&self) -> String {
        if PLAIN_KEY_PATTERN.is_match(&self.0) {
            return self.0.clone();
        }
        format!("_{}", hex::encode(Sha256::digest(self.0.as_bytes())))
    }
}

impl FromStr for SessionId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
