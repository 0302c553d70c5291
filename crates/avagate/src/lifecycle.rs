//! Per-request transaction lifecycle.
//!
//! A [`TransactionLifecycle`] walks one request through
//!
//! ```text
//! Idle -> ChainValidated -> Simulated -> Disclosed -> Confirmed
//!      -> Signed -> Submitted -> Monitoring -> Succeeded | Failed
//! ```
//!
//! with `Aborted` reachable from every state before `Signed`. Each step is an
//! explicit call; nothing advances the machine on its own.
//!
//! # Errors
//!
//! Every failure is returned as a [`LifecycleError`] carrying the request id,
//! the state the call was made in, and the underlying [`GateError`].
//!
//! - Out-of-order calls fail with `InvalidTransition` and change nothing.
//! - Any other error ends the request: `Aborted` before `Signed`, `Failed`
//!   from `Signed` on.
//! - While waiting for a receipt the transaction may still land, so a failed
//!   wait (or a wrong handle passed to [`monitor`](TransactionLifecycle::monitor))
//!   leaves the machine in `Monitoring` and `monitor` can be called again.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use avagate_chain::{Capability, EndpointApproval};
use avagate_core::error::{CollaboratorError, GateError, LifecycleError};
use avagate_core::interfaces::{
    Broadcaster, HumanPrompt, Receipt, ReceiptStatus, SignedPayload, Simulator, Signer, TxHash,
};
use avagate_core::types::{
    ChainContext, ConfirmationRecord, Disclosure, LifecycleOperation, LifecycleState,
    OperationKind, RequestId, SimulationResult, TransactionRequest,
};
use avagate_policy::PromotionEvidence;

use crate::audit::{AuditLogger, LifecycleTransition};
use crate::gate::Components;
use crate::inflight::InFlightClaim;
use crate::logging::redact_sensitive;

/// Summary of a finished lifecycle.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleReport {
    /// The request id.
    pub request_id: RequestId,
    /// Target chain id.
    pub chain_id: u64,
    /// `Succeeded`, `Failed` or `Aborted`.
    pub final_state: LifecycleState,
    /// Gas estimate from simulation, if it succeeded.
    pub gas_estimate: Option<u64>,
    /// When the human confirmed, if they did.
    pub confirmed_at: Option<DateTime<Utc>>,
    /// Hash of the submitted transaction.
    pub tx_hash: Option<TxHash>,
    /// The receipt, once observed.
    pub receipt: Option<Receipt>,
    /// Why the request did not succeed.
    pub failure_reason: Option<String>,
}

/// Returned by [`TransactionLifecycle::finish`] for a lifecycle that has not
/// reached a terminal state.
#[derive(Debug)]
pub struct Unfinished {
    /// The lifecycle, unchanged.
    pub lifecycle: Box<TransactionLifecycle>,
    /// The `InvalidTransition` error.
    pub error: LifecycleError,
}

/// The state machine for one request.
///
/// Created by [`SafetyGate::begin`](crate::gate::SafetyGate::begin), which
/// claims the request id for as long as the lifecycle lives.
pub struct TransactionLifecycle {
    request: TransactionRequest,
    state: LifecycleState,
    components: Arc<Components>,
    audit: Option<Arc<AuditLogger>>,
    span: tracing::Span,
    chain: Option<ChainContext>,
    simulation: Option<SimulationResult>,
    disclosure: Option<Disclosure>,
    confirmation: Option<ConfirmationRecord>,
    signed: Option<SignedPayload>,
    tx_hash: Option<TxHash>,
    receipt: Option<Receipt>,
    failure_reason: Option<String>,
    _claim: InFlightClaim,
}

impl TransactionLifecycle {
    pub(crate) fn new(
        request: TransactionRequest,
        components: Arc<Components>,
        audit: Option<Arc<AuditLogger>>,
        claim: InFlightClaim,
    ) -> Self {
        let span = tracing::info_span!(
            "lifecycle",
            request_id = %request.id(),
            chain_id = request.chain().chain_id()
        );
        span.in_scope(|| tracing::info!(kind = %request.kind(), "lifecycle started"));
        Self {
            request,
            state: LifecycleState::Idle,
            components,
            audit,
            span,
            chain: None,
            simulation: None,
            disclosure: None,
            confirmation: None,
            signed: None,
            tx_hash: None,
            receipt: None,
            failure_reason: None,
            _claim: claim,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The request being processed.
    #[must_use]
    pub const fn request(&self) -> &TransactionRequest {
        &self.request
    }

    /// The request id.
    #[must_use]
    pub const fn id(&self) -> &RequestId {
        self.request.id()
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// The recorded simulation result.
    #[must_use]
    pub const fn simulation(&self) -> Option<&SimulationResult> {
        self.simulation.as_ref()
    }

    /// The disclosure, once built.
    #[must_use]
    pub const fn disclosure(&self) -> Option<&Disclosure> {
        self.disclosure.as_ref()
    }

    /// The confirmation, once recorded.
    #[must_use]
    pub const fn confirmation(&self) -> Option<&ConfirmationRecord> {
        self.confirmation.as_ref()
    }

    /// The submitted transaction hash.
    #[must_use]
    pub const fn tx_hash(&self) -> Option<&TxHash> {
        self.tx_hash.as_ref()
    }

    /// Why the request ended without success.
    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// `Idle -> ChainValidated`.
    ///
    /// # Errors
    ///
    /// `UnsupportedChain` aborts the request.
    pub fn validate_chain(&mut self) -> Result<LifecycleState, LifecycleError> {
        let _entered = self.span.clone().entered();
        let op = LifecycleOperation::ValidateChain;
        self.expect_state(op, &[LifecycleState::Idle])?;

        let chain_id = self.request.chain().chain_id();
        match self.components.registry.validate(chain_id) {
            Ok(chain) => Ok(self.accept_chain(chain)),
            Err(e) => Err(self.fail(op, e)),
        }
    }

    /// `Idle -> ChainValidated`, also checking the RPC endpoint that will
    /// serve the request.
    ///
    /// # Errors
    ///
    /// `UnsupportedChain` or `UntrustedEndpoint` aborts the request.
    pub fn validate_chain_via(
        &mut self,
        endpoint: &str,
        approval: Option<&EndpointApproval>,
    ) -> Result<LifecycleState, LifecycleError> {
        let _entered = self.span.clone().entered();
        let op = LifecycleOperation::ValidateChain;
        self.expect_state(op, &[LifecycleState::Idle])?;

        if let Some(approval) = approval {
            tracing::debug!(
                endpoint,
                token = %redact_sensitive(&approval.token),
                "endpoint approval supplied"
            );
        }

        let chain_id = self.request.chain().chain_id();
        match self
            .components
            .registry
            .validate_endpoint(chain_id, endpoint, approval)
        {
            Ok(chain) => Ok(self.accept_chain(chain)),
            Err(e) => Err(self.fail(op, e)),
        }
    }

    /// `ChainValidated -> Simulated`.
    ///
    /// # Errors
    ///
    /// Aborts the request on `CapabilityViolation` (the handle must be a read
    /// handle for this chain), `AlreadySimulated`, or `SimulationFailure`
    /// carrying the simulator's reason.
    pub fn simulate(
        &mut self,
        read_cap: &Capability<'_>,
        simulator: &dyn Simulator,
    ) -> Result<LifecycleState, LifecycleError> {
        let _entered = self.span.clone().entered();
        let op = LifecycleOperation::Simulate;
        self.expect_state(op, &[LifecycleState::ChainValidated])?;

        if let Err(e) = self.authorize(read_cap, OperationKind::Simulate) {
            return Err(self.fail(op, e));
        }

        let result = match self.components.simulations.simulate(&self.request, simulator) {
            Ok(result) => result,
            Err(e) => return Err(self.fail(op, e)),
        };

        if let Some(reason) = result.failure_reason.clone() {
            self.simulation = Some(result);
            let err = GateError::simulation_failure(self.id().clone(), reason);
            return Err(self.fail(op, err));
        }

        let gas = result.gas_estimate;
        self.simulation = Some(result);
        Ok(self.advance(LifecycleState::Simulated, op, Some(format!("gas_estimate={gas}"))))
    }

    /// `Simulated -> Disclosed`. Returns the disclosure to show the human.
    ///
    /// # Errors
    ///
    /// `IncompleteSimulation` or `MissingApprovalDisclosure` aborts the request.
    pub fn disclose(&mut self) -> Result<&Disclosure, LifecycleError> {
        let _entered = self.span.clone().entered();
        let op = LifecycleOperation::Disclose;
        self.expect_state(op, &[LifecycleState::Simulated])?;

        let built = match &self.simulation {
            Some(simulation) => self.components.disclosures.build(&self.request, simulation),
            None => Err(GateError::incomplete_simulation(self.id().clone())),
        };

        match built {
            Ok(disclosure) => {
                let digest = hex::encode(disclosure.digest());
                self.advance(LifecycleState::Disclosed, op, Some(format!("digest={digest}")));
                Ok(self.disclosure.insert(disclosure))
            }
            Err(e) => Err(self.fail(op, e)),
        }
    }

    /// `Disclosed -> Confirmed`, asking `prompt` for the acknowledgement.
    ///
    /// A prompt error counts as a decline.
    ///
    /// # Errors
    ///
    /// `ConfirmationDenied` aborts the request.
    pub fn confirm(&mut self, prompt: &dyn HumanPrompt) -> Result<LifecycleState, LifecycleError> {
        let _entered = self.span.clone().entered();
        let op = LifecycleOperation::Confirm;
        self.expect_state(op, &[LifecycleState::Disclosed])?;

        let answer = match &self.disclosure {
            Some(disclosure) => {
                tracing::debug!("presenting disclosure");
                prompt.present(disclosure)
            }
            None => Ok(false),
        };

        match answer {
            Ok(ack) => self.record(op, ack),
            Err(e) => {
                tracing::warn!(error = %e, "prompt failed; treating as decline");
                if let Some(disclosure) = &self.disclosure {
                    // Registers the decline so this id can never be confirmed.
                    let _ = self
                        .components
                        .confirmations
                        .record(self.request.id(), disclosure, false);
                }
                let err = GateError::confirmation_denied(
                    self.id().clone(),
                    format!("prompt failed: {e}"),
                );
                Err(self.fail(op, err))
            }
        }
    }

    /// `Disclosed -> Confirmed` with an acknowledgement obtained by the caller.
    ///
    /// # Errors
    ///
    /// `ConfirmationDenied` (including `user_ack == false`) or
    /// `DuplicateConfirmation` aborts the request.
    pub fn record_confirmation(&mut self, user_ack: bool) -> Result<LifecycleState, LifecycleError> {
        let _entered = self.span.clone().entered();
        let op = LifecycleOperation::Confirm;
        self.expect_state(op, &[LifecycleState::Disclosed])?;
        self.record(op, user_ack)
    }

    /// Evaluate the mainnet promotion guard without signing. A no-op on
    /// testnet.
    ///
    /// # Errors
    ///
    /// `PromotionBlocked` aborts the request.
    pub fn check_promotion(
        &mut self,
        evidence: &PromotionEvidence,
        explicit_mainnet_ack: bool,
    ) -> Result<LifecycleState, LifecycleError> {
        let _entered = self.span.clone().entered();
        let op = LifecycleOperation::CheckPromotion;
        self.expect_state(op, &[LifecycleState::Confirmed])?;

        match self
            .components
            .promotion
            .require_promotion(&self.request, evidence, explicit_mainnet_ack)
        {
            Ok(()) => {
                tracing::debug!("promotion check passed");
                Ok(self.state)
            }
            Err(e) => Err(self.fail(op, e)),
        }
    }

    /// `Confirmed -> Signed`.
    ///
    /// Re-evaluates the promotion guard, then asks `signer` to sign the
    /// confirmed disclosure and accepts the payload only if the disclosed
    /// bytes it echoes equal the confirmed disclosure byte-for-byte.
    ///
    /// # Errors
    ///
    /// Aborts the request on `CapabilityViolation`, `PromotionBlocked`,
    /// `SignatureMismatch`, or a signer failure.
    pub fn sign(
        &mut self,
        write_cap: &Capability<'_>,
        signer: &dyn Signer,
        evidence: &PromotionEvidence,
        explicit_mainnet_ack: bool,
    ) -> Result<LifecycleState, LifecycleError> {
        let _entered = self.span.clone().entered();
        let op = LifecycleOperation::Sign;
        self.expect_state(op, &[LifecycleState::Confirmed])?;

        if let Err(e) = self.authorize(write_cap, OperationKind::Sign) {
            return Err(self.fail(op, e));
        }
        if let Err(e) =
            self.components
                .promotion
                .require_promotion(&self.request, evidence, explicit_mainnet_ack)
        {
            return Err(self.fail(op, e));
        }

        let id = self.id().clone();
        let Some(disclosure) = self.confirmed_disclosure() else {
            let err = GateError::confirmation_denied(id, "no confirmation on record");
            return Err(self.fail(op, err));
        };

        tracing::debug!("requesting signature");
        let signed = match signer.sign(disclosure) {
            Ok(signed) => signed,
            Err(e) => return Err(self.fail(op, GateError::collaborator(id, e))),
        };

        if signed.disclosed.as_slice() != disclosure.canonical_bytes() {
            tracing::warn!("signer committed to different fields than were confirmed");
            return Err(self.fail(op, GateError::signature_mismatch(id)));
        }

        let preview = redact_sensitive(&hex::encode(&signed.payload));
        tracing::debug!(payload = %preview, "signature accepted");
        self.signed = Some(signed);
        Ok(self.advance(LifecycleState::Signed, op, None))
    }

    /// `Signed -> Submitted`.
    ///
    /// # Errors
    ///
    /// `CapabilityViolation` or a broadcaster rejection fails the request.
    pub fn broadcast(
        &mut self,
        write_cap: &Capability<'_>,
        broadcaster: &dyn Broadcaster,
    ) -> Result<LifecycleState, LifecycleError> {
        let _entered = self.span.clone().entered();
        let op = LifecycleOperation::Broadcast;
        self.expect_state(op, &[LifecycleState::Signed])?;

        if let Err(e) = self.authorize(write_cap, OperationKind::Broadcast) {
            return Err(self.fail(op, e));
        }

        let submitted = match &self.signed {
            Some(signed) => {
                tracing::debug!("submitting signed payload");
                broadcaster.submit(signed)
            }
            None => Err(CollaboratorError::rejected("no signed payload")),
        };

        match submitted {
            Ok(tx_hash) => {
                self.tx_hash = Some(tx_hash);
                Ok(self.advance(LifecycleState::Submitted, op, Some(tx_hash.to_string())))
            }
            Err(e) => {
                let err = GateError::collaborator(self.id().clone(), e);
                Err(self.fail(op, err))
            }
        }
    }

    /// `Submitted -> Monitoring -> Succeeded | Failed`.
    ///
    /// # Errors
    ///
    /// A `CapabilityViolation` or receipt-wait failure leaves the machine in
    /// `Monitoring`; call again with a read handle to keep waiting.
    pub fn monitor(
        &mut self,
        read_cap: &Capability<'_>,
        broadcaster: &dyn Broadcaster,
    ) -> Result<LifecycleState, LifecycleError> {
        let _entered = self.span.clone().entered();
        let op = LifecycleOperation::Monitor;
        let from = self.expect_state(op, &[LifecycleState::Submitted, LifecycleState::Monitoring])?;

        if let Err(e) = self.authorize(read_cap, OperationKind::QueryReceipt) {
            return Err(self.error(from, e));
        }

        let Some(tx_hash) = self.tx_hash else {
            let err = GateError::collaborator(
                self.id().clone(),
                CollaboratorError::rejected("no transaction hash"),
            );
            return Err(self.fail(op, err));
        };

        if from == LifecycleState::Submitted {
            self.advance(LifecycleState::Monitoring, op, None);
        }

        tracing::debug!(%tx_hash, "waiting for receipt");
        let receipt = match broadcaster.wait_for_receipt(&tx_hash) {
            Ok(receipt) if receipt.tx_hash == tx_hash => receipt,
            Ok(receipt) => {
                let err = GateError::collaborator(
                    self.id().clone(),
                    CollaboratorError::rejected(format!(
                        "receipt is for {}, expected {tx_hash}",
                        receipt.tx_hash
                    )),
                );
                return Err(self.error(LifecycleState::Monitoring, err));
            }
            Err(e) => {
                tracing::warn!(error = %e, "receipt not available yet");
                let err = GateError::collaborator(self.id().clone(), e);
                return Err(self.error(LifecycleState::Monitoring, err));
            }
        };

        let detail = format!("block={} gas_used={}", receipt.block_number, receipt.gas_used);
        let to = match &receipt.status {
            ReceiptStatus::Success => LifecycleState::Succeeded,
            ReceiptStatus::Reverted { reason } => {
                self.failure_reason = Some(format!(
                    "reverted: {}",
                    reason.as_deref().unwrap_or("no reason given")
                ));
                LifecycleState::Failed
            }
        };
        self.receipt = Some(receipt);
        Ok(self.advance(to, op, Some(detail)))
    }

    /// Abandon the request. Only possible before `Signed`.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` from `Signed` onwards or from a terminal state.
    pub fn abort(&mut self, reason: &str) -> Result<LifecycleState, LifecycleError> {
        let _entered = self.span.clone().entered();
        let op = LifecycleOperation::Abort;
        if !self.state.can_abort() {
            return Err(self.reject(op));
        }
        tracing::warn!(reason, "lifecycle aborted by caller");
        self.failure_reason = Some(reason.to_string());
        Ok(self.advance(LifecycleState::Aborted, op, Some(reason.to_string())))
    }

    /// Report a terminal lifecycle and release its request id.
    ///
    /// # Errors
    ///
    /// Returns the lifecycle with an `InvalidTransition` error if it has not
    /// reached `Succeeded`, `Failed` or `Aborted`.
    pub fn finish(self) -> Result<LifecycleReport, Unfinished> {
        if !self.state.is_terminal() {
            let error = self.reject(LifecycleOperation::Finish);
            return Err(Unfinished {
                lifecycle: Box::new(self),
                error,
            });
        }

        self.span.in_scope(|| {
            tracing::info!(state = %self.state, "lifecycle finished");
        });

        Ok(LifecycleReport {
            request_id: self.request.id().clone(),
            chain_id: self.request.chain().chain_id(),
            final_state: self.state,
            gas_estimate: self
                .simulation
                .as_ref()
                .filter(|s| s.is_success())
                .map(|s| s.gas_estimate),
            confirmed_at: self.confirmation.as_ref().map(ConfirmationRecord::confirmed_at),
            tx_hash: self.tx_hash,
            receipt: self.receipt,
            failure_reason: self.failure_reason,
        })
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn expect_state(
        &self,
        op: LifecycleOperation,
        allowed: &[LifecycleState],
    ) -> Result<LifecycleState, LifecycleError> {
        if allowed.contains(&self.state) {
            Ok(self.state)
        } else {
            Err(self.reject(op))
        }
    }

    fn reject(&self, op: LifecycleOperation) -> LifecycleError {
        tracing::warn!(state = %self.state, operation = %op, "out-of-order operation refused");
        self.error(
            self.state,
            GateError::invalid_transition(self.id().clone(), self.state, op),
        )
    }

    fn error(&self, state: LifecycleState, error: GateError) -> LifecycleError {
        LifecycleError::new(self.id().clone(), state, error)
    }

    fn authorize(&self, cap: &Capability<'_>, kind: OperationKind) -> Result<(), GateError> {
        let chain = self.chain.as_ref().unwrap_or_else(|| self.request.chain());
        self.components.capabilities.authorize_on(cap, kind, chain)
    }

    fn accept_chain(&mut self, chain: ChainContext) -> LifecycleState {
        let label = chain.label();
        self.chain = Some(chain);
        self.advance(
            LifecycleState::ChainValidated,
            LifecycleOperation::ValidateChain,
            Some(label.to_string()),
        )
    }

    fn record(&mut self, op: LifecycleOperation, user_ack: bool) -> Result<LifecycleState, LifecycleError> {
        let recorded = match &self.disclosure {
            Some(disclosure) => self
                .components
                .confirmations
                .record(self.request.id(), disclosure, user_ack),
            None => Err(GateError::confirmation_denied(
                self.id().clone(),
                "nothing was disclosed",
            )),
        };

        match recorded {
            Ok(record) => {
                self.confirmation = Some(record);
                Ok(self.advance(LifecycleState::Confirmed, op, None))
            }
            Err(e) => Err(self.fail(op, e)),
        }
    }

    // The disclosure as confirmed, provided the ledger still holds the same digest.
    fn confirmed_disclosure(&self) -> Option<&Disclosure> {
        let disclosed = self.confirmation.as_ref()?.disclosed();
        self.components
            .confirmations
            .matches(disclosed)
            .then_some(disclosed)
    }

    fn advance(
        &mut self,
        to: LifecycleState,
        op: LifecycleOperation,
        detail: Option<String>,
    ) -> LifecycleState {
        let from = self.state;
        self.state = to;
        tracing::info!(from = %from, state = %to, operation = %op, "lifecycle transition");
        self.audit(from, to, op, detail);
        to
    }

    // Ends the request for every error except the rejection-only ones.
    fn fail(&mut self, op: LifecycleOperation, error: GateError) -> LifecycleError {
        let from = self.state;
        if !error.is_rejection_only() && !from.is_terminal() {
            let to = if from.can_abort() {
                LifecycleState::Aborted
            } else {
                LifecycleState::Failed
            };
            tracing::warn!(code = error.code(), error = %error, "lifecycle ended by error");
            self.failure_reason = Some(error.to_string());
            self.advance(to, op, Some(error.code().to_string()));
        }
        self.error(from, error)
    }

    fn audit(
        &self,
        from: LifecycleState,
        to: LifecycleState,
        operation: LifecycleOperation,
        detail: Option<String>,
    ) {
        let Some(audit) = &self.audit else {
            return;
        };
        let transition = LifecycleTransition {
            request_id: self.id().clone(),
            chain_id: self.request.chain().chain_id(),
            from,
            to,
            operation,
            detail,
        };
        if let Err(e) = audit.record(transition) {
            tracing::error!(error = %e, "failed to write audit entry");
        }
    }
}

impl std::fmt::Debug for TransactionLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionLifecycle")
            .field("request_id", self.id())
            .field("chain_id", &self.request.chain().chain_id())
            .field("state", &self.state)
            .field("tx_hash", &self.tx_hash)
            .finish_non_exhaustive()
    }
}
