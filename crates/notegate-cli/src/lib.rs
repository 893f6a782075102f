//! notegate hook binary support
//!
//! The `notegate` binary is invoked once per orchestrator hook event:
//!
//! ```text
//! PreToolUse  (Write|Edit) ──► notegate pre-mutation ──► allow (silent) | ask | deny
//! PostToolUse (Read)       ──► notegate record-read  ──► <state>/reads/<session>.json
//! ```

#![warn(missing_docs)]

pub mod commands;
pub mod hook;
pub mod logging;

pub use hook::{HookInput, HookOutput, HookSpecificOutput, ToolInput};
