//! Existence gate: edits need something to edit

use super::{target_exists, Gate, GateContext, GateOutcome};
use crate::error::GateError;
use crate::types::{GateId, GateVerdict, Operation};

/// Denies edit-in-place of a target that does not exist
#[derive(Debug, Clone, Copy, Default)]
pub struct ExistenceGate;

impl Gate for ExistenceGate {
    fn id(&self) -> GateId {
        GateId::Existence
    }

    fn check(&self, ctx: &GateContext<'_>) -> Result<GateOutcome, GateError> {
        if ctx.request.operation != Operation::EditInPlace || target_exists(ctx.target)? {
            return Ok(GateOutcome::Continue);
        }

        Ok(GateOutcome::Stop(GateVerdict::deny(
            self.id(),
            format!(
                "File does not exist: {}. Use {} to create new files.",
                ctx.request.target_path,
                Operation::CreateOrReplace.tool_name()
            ),
        )))
    }
}
