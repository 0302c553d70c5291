//! Mandatory pre-submission simulation.
//!
//! The [`SimulationGate`] calls an external [`Simulator`] at most once per
//! request id and records the verdict. Anything the simulator cannot vouch for
//! is recorded as a failure.
//!
//! # Fail-closed rules
//!
//! 1. **Transport error** - recorded as `Failure` with the error text as reason
//! 2. **Reported failure** - recorded as `Failure` with the simulator's reason
//! 3. **Success with zero gas** - ambiguous, recorded as `Failure`
//! 4. **Success with gas** - recorded as `Success`
//!
//! # Single write
//!
//! The slot for a request id is reserved before the simulator is called. A
//! concurrent call for the same id fails with `DuplicateInFlight`; a later
//! call fails with `AlreadySimulated` and never reaches the simulator.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use avagate_core::error::{GateError, GateResult};
use avagate_core::interfaces::Simulator;
use avagate_core::types::{RequestId, SimulationResult, TransactionRequest};

const UNKNOWN_FAILURE: &str = "simulator reported failure without a reason";
const ZERO_GAS: &str = "simulator reported success with a zero gas estimate";

#[derive(Debug, Clone)]
enum Slot {
    Running,
    Recorded(SimulationResult),
}

/// Records exactly one simulation result per request id.
///
/// # Thread Safety
///
/// `SimulationGate` is `Send + Sync`; the simulator is called without the
/// internal lock held.
#[derive(Debug, Default)]
pub struct SimulationGate {
    slots: Mutex<HashMap<RequestId, Slot>>,
}

impl SimulationGate {
    /// Create an empty gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate `request` and record the result.
    ///
    /// A failed simulation is still `Ok`: the returned result carries the
    /// failure, and it is the result recorded for the id.
    ///
    /// # Errors
    ///
    /// - [`GateError::AlreadySimulated`] if a result is already recorded
    /// - [`GateError::DuplicateInFlight`] if another simulation of the same id
    ///   is running
    pub fn simulate(
        &self,
        request: &TransactionRequest,
        simulator: &dyn Simulator,
    ) -> GateResult<SimulationResult> {
        let id = request.id();
        self.reserve(id)?;

        tracing::debug!(request_id = %id, chain_id = request.chain().chain_id(), "calling simulator");
        let result = match simulator.simulate(request) {
            Ok(report) if report.success && report.gas_estimate == 0 => {
                SimulationResult::failure(ZERO_GAS, 0)
            }
            Ok(report) if report.success => SimulationResult::success(report.gas_estimate),
            Ok(report) => SimulationResult::failure(
                report.reason.unwrap_or_else(|| UNKNOWN_FAILURE.to_string()),
                report.gas_estimate,
            ),
            Err(e) => SimulationResult::failure(e.to_string(), 0),
        };

        if let Some(reason) = &result.failure_reason {
            tracing::warn!(request_id = %id, reason = %reason, "simulation failed");
        } else {
            tracing::info!(request_id = %id, gas_estimate = result.gas_estimate, "simulation succeeded");
        }

        self.lock().insert(id.clone(), Slot::Recorded(result.clone()));
        Ok(result)
    }

    /// The recorded result for `id`, if the simulation has completed.
    #[must_use]
    pub fn result_for(&self, id: &RequestId) -> Option<SimulationResult> {
        match self.lock().get(id) {
            Some(Slot::Recorded(result)) => Some(result.clone()),
            _ => None,
        }
    }

    /// Returns `true` if `id` has been simulated or is being simulated.
    #[must_use]
    pub fn has_seen(&self, id: &RequestId) -> bool {
        self.lock().contains_key(id)
    }

    fn reserve(&self, id: &RequestId) -> GateResult<()> {
        let mut slots = self.lock();
        match slots.get(id) {
            Some(Slot::Recorded(_)) => Err(GateError::already_simulated(id.clone())),
            Some(Slot::Running) => Err(GateError::duplicate_in_flight(id.clone())),
            None => {
                slots.insert(id.clone(), Slot::Running);
                Ok(())
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RequestId, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Tests
// ============================================================================
