//! Disclosure assembly.
//!
//! [`DisclosureBuilder::build`] is pure: it reads the request and its
//! simulation result and either returns the [`Disclosure`] a human must see or
//! refuses.

use avagate_core::error::{GateError, GateResult};
use avagate_core::types::{Disclosure, RequestKind, SimulationResult, TransactionRequest};

/// Builds disclosures from simulated requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisclosureBuilder;

impl DisclosureBuilder {
    /// Create a builder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Build the disclosure for `request`.
    ///
    /// The disclosure always carries target, function, arguments, declared
    /// value, gas estimate and chain id; approval requests also embed their
    /// [`ApprovalDisclosure`](avagate_core::types::ApprovalDisclosure).
    ///
    /// # Errors
    ///
    /// - [`GateError::IncompleteSimulation`] if `simulation` is not a success
    /// - [`GateError::MissingApprovalDisclosure`] for an approval request
    ///   without its approval facts
    pub fn build(
        &self,
        request: &TransactionRequest,
        simulation: &SimulationResult,
    ) -> GateResult<Disclosure> {
        if !simulation.is_success() {
            return Err(GateError::incomplete_simulation(request.id().clone()));
        }
        if request.kind() == RequestKind::Approval && request.approval().is_none() {
            return Err(GateError::missing_approval_disclosure(request.id().clone()));
        }
        Ok(Disclosure::new(request, simulation.gas_estimate))
    }
}
