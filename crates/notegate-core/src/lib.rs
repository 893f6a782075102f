//! notegate core
//!
//! Pre-mutation authorization for governed note files. Every proposed file
//! mutation is evaluated into exactly one [`GateVerdict`]: allow, ask, or
//! deny, with the gate that decided it.
//!
//! # Architecture
//!
//! ```text
//! MutationRequest
//!       │
//!       ▼
//! ScopeFilter ── reserved dir / empty path ──► allow (scope)
//!       │
//!       ▼
//! PathNormalizer ──► CanonicalPath
//!       │
//!       ▼
//! GatePipeline
//!   1. ExistenceGate         edit of a missing file       ──► deny
//!   2. ReadBeforeWriteGate   governed file not yet read   ──► deny
//!                              └── ProvenanceChain: history, then session store
//!   3. ConfirmationGate      everything else              ──► ask
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use notegate_core::{GateConfig, MutationRequest, NoteGate};
//!
//! let gate = NoteGate::builder(GateConfig::new())
//!     .with_base_dir("/vault")
//!     .build();
//!
//! gate.record_read("s1", "notes/a.md");
//! let verdict = gate.evaluate(&MutationRequest::edit_in_place("notes/a.md").with_session("s1"));
//! assert_eq!(verdict.decision, notegate_core::Decision::Ask);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod gate;
pub mod notegate;
pub mod pipeline;
pub mod scope;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::{default_state_dir, GateConfig, CONFIG_FILE_NAME, STATE_DIR_ENV};
pub use error::{ConfigError, ConfigResult, GateError};
pub use gate::{ConfirmationGate, ExistenceGate, Gate, GateContext, GateOutcome, ReadBeforeWriteGate};
pub use notegate::{NoteGate, NoteGateBuilder};
pub use pipeline::GatePipeline;
pub use scope::ScopeFilter;
pub use types::{Decision, GateId, GateVerdict, MutationRequest, Operation};

pub use notegate_provenance::RecordOutcome;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
