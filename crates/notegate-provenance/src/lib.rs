//! notegate read provenance
//!
//! Evidence that a work session has read a file before it tries to mutate it.
//!
//! Two independent sources feed the read-before-write gate:
//!
//! - **History**: the session's line-delimited interaction history, scanned by
//!   [`HistoryScanner`]. It can be truncated or summarized at any time, so a
//!   missing event proves nothing.
//! - **Session store**: a durable, per-session set of normalized paths
//!   ([`FileReadStore`]) written after every successful read. It survives
//!   history truncation and process restarts.
//!
//! Both sit behind [`ProvenanceSource`] and are combined by a
//! [`ProvenanceChain`], which reports [`Evidence::Found`] as soon as any source
//! does.
//!
//! # Architecture
//!
//! ```text
//! read hook ──► PathNormalizer ──► ReadProvenance::record_read ──► <state>/reads/<session>.json
//!                                        (lock, retry, fallback)
//!
//! gate ──► ProvenanceChain ──► HistoryScanner   (transcript.jsonl)
//!                         └──► StoreSource      (<state>/reads/<session>.json)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use notegate_provenance::{FileReadStore, PathNormalizer, ReadProvenance, SessionId};
//!
//! let normalizer = PathNormalizer::from_current_dir();
//! let store = FileReadStore::new("/tmp/notegate-state");
//! let session = SessionId::parse("s1")?;
//! let target = normalizer.normalize("notes/a.md");
//!
//! store.record_read(&session, &target);
//! assert!(store.has_read(&session, &target));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod evidence;
pub mod history;
pub mod path;
pub mod session;
pub mod store;

pub use error::{HistoryError, StoreError};
pub use evidence::{Evidence, ProvenanceChain, ProvenanceQuery, ProvenanceSource};
pub use history::{HistoryEvent, HistoryScanner};
pub use path::{lexical_clean, CanonicalPath, PathNormalizer};
pub use session::SessionId;
pub use store::{
    AlwaysContended, FileLockProvider, FileReadStore, LockGuard, LockProvider, LockRetryPolicy,
    MemoryReadStore, ReadProvenance, RecordOutcome, StoreSource,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
