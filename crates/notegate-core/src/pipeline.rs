//! Gate pipeline
//!
//! Gates run in a fixed order; the first one that stops evaluation decides.
//!
//! ```text
//! request ──► Existence ──► ReadBeforeWrite ──► Confirmation ──► verdict
//!                │                │                  │
//!                └── deny         └── deny           └── ask
//! ```

use crate::config::GateConfig;
use crate::gate::{ConfirmationGate, ExistenceGate, Gate, GateContext, GateOutcome, ReadBeforeWriteGate};
use crate::types::{GateId, GateVerdict};
use notegate_provenance::ProvenanceChain;

/// Ordered list of gates
#[derive(Debug)]
pub struct GatePipeline {
    gates: Vec<Box<dyn Gate>>,
}

impl GatePipeline {
    /// Standard pipeline: existence, read-before-write, confirmation
    #[must_use]
    pub fn new(config: &GateConfig, chain: ProvenanceChain) -> Self {
        Self::from_gates(vec![
            Box::new(ExistenceGate),
            Box::new(ReadBeforeWriteGate::new(&config.governed_extensions, chain)),
            Box::new(ConfirmationGate),
        ])
    }

    /// Pipeline over an explicit gate list
    #[must_use]
    pub fn from_gates(gates: Vec<Box<dyn Gate>>) -> Self {
        Self { gates }
    }

    /// Gate identifiers in evaluation order
    #[must_use]
    pub fn gate_ids(&self) -> Vec<GateId> {
        self.gates.iter().map(|gate| gate.id()).collect()
    }

    /// Run the gates over one request
    ///
    /// Total: a gate error becomes that gate's fail-closed verdict. If every
    /// gate lets the request through, the result is allow from the last gate.
    #[must_use]
    pub fn evaluate(&self, ctx: &GateContext<'_>) -> GateVerdict {
        for gate in &self.gates {
            match gate.check(ctx) {
                Ok(GateOutcome::Continue) => {}
                Ok(GateOutcome::Stop(verdict)) => return verdict,
                Err(err) => {
                    tracing::warn!(gate = %gate.id(), path = %ctx.target, error = %err, "gate failed, closing");
                    return gate.fail_closed(ctx, &err);
                }
            }
        }

        GateVerdict::allow(self.gates.last().map_or(GateId::Scope, |gate| gate.id()))
    }
}
