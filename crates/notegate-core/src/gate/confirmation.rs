//! Confirmation gate

use super::{Gate, GateContext, GateOutcome};
use crate::error::GateError;
use crate::types::{GateId, GateVerdict};

/// Asks for confirmation of every request that reaches it
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfirmationGate;

impl Gate for ConfirmationGate {
    fn id(&self) -> GateId {
        GateId::Confirmation
    }

    fn check(&self, ctx: &GateContext<'_>) -> Result<GateOutcome, GateError> {
        Ok(GateOutcome::Stop(GateVerdict::ask(
            self.id(),
            format!(
                "Confirm {} to {}?",
                ctx.request.operation.tool_name(),
                ctx.target_label()
            ),
        )))
    }
}
