//! End-to-end tests for the full lifecycle.
//!
//! These tests drive a request from `Idle` to a terminal state:
//! - Happy paths on Fuji and mainnet
//! - Confirmation declines and prompt failures
//! - Signer mismatches and refusals
//! - Abort rules and out-of-order calls
//! - Request id ownership

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::doc_markdown,
    dead_code
)]

use avagate::{PromotionEvidence, SafetyGate};
use avagate_core::error::GateError;
use avagate_core::types::{LifecycleOperation, LifecycleState, Role};

use crate::common::{
    drive_to_confirmed, fuji_request, mainnet_request, EchoSigner, MockBroadcaster, MockPrompt,
    MockSimulator, RefusingSigner, TamperingSigner, TX_HASH,
};

const FULL_EVIDENCE: PromotionEvidence = PromotionEvidence::new(true, true);

// ============================================================================
// Happy Paths
// ============================================================================

#[test]
fn test_mainnet_flow_with_full_evidence_succeeds() {
    let gate = SafetyGate::new();
    let request = mainnet_request();
    let session = gate.open_session(*request.chain()).unwrap();
    let read = session.grant(Role::Read);
    let write = session.grant(Role::Write);
    let prompt = MockPrompt::accepting();
    let signer = EchoSigner::default();
    let broadcaster = MockBroadcaster::succeeding();

    let mut lifecycle = gate.begin(request).unwrap();
    assert_eq!(lifecycle.validate_chain().unwrap(), LifecycleState::ChainValidated);
    assert_eq!(
        lifecycle
            .simulate(&read, &MockSimulator::succeeding(65_000))
            .unwrap(),
        LifecycleState::Simulated
    );

    let disclosure = lifecycle.disclose().unwrap().clone();
    assert_eq!(disclosure.chain_id(), 43114);
    assert_eq!(disclosure.gas_estimate(), 65_000);
    assert_eq!(disclosure.function_name(), "deposit");

    assert_eq!(lifecycle.confirm(&prompt).unwrap(), LifecycleState::Confirmed);
    assert_eq!(prompt.shown(), vec![disclosure]);

    assert_eq!(
        lifecycle.check_promotion(&FULL_EVIDENCE, true).unwrap(),
        LifecycleState::Confirmed
    );
    assert_eq!(
        lifecycle.sign(&write, &signer, &FULL_EVIDENCE, true).unwrap(),
        LifecycleState::Signed
    );
    assert_eq!(
        lifecycle.broadcast(&write, &broadcaster).unwrap(),
        LifecycleState::Submitted
    );
    assert_eq!(lifecycle.tx_hash(), Some(&TX_HASH));
    assert_eq!(
        lifecycle.monitor(&read, &broadcaster).unwrap(),
        LifecycleState::Succeeded
    );

    let id = lifecycle.id().clone();
    let report = lifecycle.finish().unwrap();
    assert_eq!(report.request_id, id);
    assert_eq!(report.chain_id, 43114);
    assert_eq!(report.final_state, LifecycleState::Succeeded);
    assert_eq!(report.gas_estimate, Some(65_000));
    assert!(report.confirmed_at.is_some());
    assert_eq!(report.tx_hash, Some(TX_HASH));
    assert!(report.receipt.unwrap().is_success());
    assert!(report.failure_reason.is_none());

    assert_eq!(signer.signed(), 1);
    assert_eq!(broadcaster.submitted(), 1);
    assert!(!gate.in_flight().is_in_flight(&id));
}

#[test]
fn test_fuji_flow_needs_no_promotion_evidence() {
    let gate = SafetyGate::new();
    let request = fuji_request();
    let session = gate.open_session(*request.chain()).unwrap();
    let read = session.grant(Role::Read);
    let write = session.grant(Role::Write);
    let broadcaster = MockBroadcaster::succeeding();

    let mut lifecycle = gate.begin(request).unwrap();
    drive_to_confirmed(&gate, &mut lifecycle);

    lifecycle
        .sign(&write, &EchoSigner::default(), &PromotionEvidence::default(), false)
        .unwrap();
    lifecycle.broadcast(&write, &broadcaster).unwrap();
    lifecycle.monitor(&read, &broadcaster).unwrap();

    let report = lifecycle.finish().unwrap();
    assert_eq!(report.final_state, LifecycleState::Succeeded);
}

#[test]
fn test_report_serializes_for_callers() {
    let gate = SafetyGate::new();
    let mut lifecycle = gate.begin(fuji_request()).unwrap();
    lifecycle.abort("operator cancelled").unwrap();

    let report = lifecycle.finish().unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["final_state"], "aborted");
    assert_eq!(json["failure_reason"], "operator cancelled");
    assert_eq!(json["chain_id"], 43113);
}

// ============================================================================
// Confirmation
// ============================================================================

#[test]
fn test_declined_confirmation_aborts() {
    let gate = SafetyGate::new();
    let request = fuji_request();
    let session = gate.open_session(*request.chain()).unwrap();
    let read = session.grant(Role::Read);

    let mut lifecycle = gate.begin(request).unwrap();
    lifecycle.validate_chain().unwrap();
    lifecycle
        .simulate(&read, &MockSimulator::succeeding(30_000))
        .unwrap();
    lifecycle.disclose().unwrap();

    let err = lifecycle.confirm(&MockPrompt::declining()).unwrap_err();
    assert!(matches!(err.error, GateError::ConfirmationDenied { .. }));
    assert_eq!(lifecycle.state(), LifecycleState::Aborted);
    assert!(lifecycle.confirmation().is_none());
    assert!(!gate.confirmations().is_confirmed(lifecycle.id()));
}

#[test]
fn test_prompt_failure_counts_as_decline() {
    let gate = SafetyGate::new();
    let request = fuji_request();
    let session = gate.open_session(*request.chain()).unwrap();
    let read = session.grant(Role::Read);

    let mut lifecycle = gate.begin(request).unwrap();
    lifecycle.validate_chain().unwrap();
    lifecycle
        .simulate(&read, &MockSimulator::succeeding(30_000))
        .unwrap();
    lifecycle.disclose().unwrap();

    let err = lifecycle.confirm(&MockPrompt::broken()).unwrap_err();
    assert_eq!(err.code(), "confirmation_denied");
    assert!(err.to_string().contains("terminal closed"));
    assert_eq!(lifecycle.state(), LifecycleState::Aborted);
}

#[test]
fn test_declined_request_cannot_be_retried_under_same_id() {
    let gate = SafetyGate::new();
    let request = fuji_request();
    let session = gate.open_session(*request.chain()).unwrap();
    let read = session.grant(Role::Read);

    let mut first = gate.begin(request.clone()).unwrap();
    first.validate_chain().unwrap();
    first
        .simulate(&read, &MockSimulator::succeeding(30_000))
        .unwrap();
    first.disclose().unwrap();
    first.record_confirmation(false).unwrap_err();
    first.finish().unwrap();

    let mut second = gate.begin(request).unwrap();
    second.validate_chain().unwrap();
    let err = second
        .simulate(&read, &MockSimulator::succeeding(30_000))
        .unwrap_err();
    assert_eq!(err.code(), "already_simulated");
    assert_eq!(second.state(), LifecycleState::Aborted);
}

#[test]
fn test_confirmation_before_disclosure_is_invalid() {
    let gate = SafetyGate::new();
    let mut lifecycle = gate.begin(fuji_request()).unwrap();
    lifecycle.validate_chain().unwrap();

    let err = lifecycle.record_confirmation(true).unwrap_err();
    assert!(matches!(
        err.error,
        GateError::InvalidTransition {
            from: LifecycleState::ChainValidated,
            operation: LifecycleOperation::Confirm,
            ..
        }
    ));
    assert_eq!(lifecycle.state(), LifecycleState::ChainValidated);
    assert!(!gate.confirmations().is_confirmed(lifecycle.id()));
}

// ============================================================================
// Signing
// ============================================================================

#[test]
fn test_signer_committing_to_other_fields_aborts() {
    let gate = SafetyGate::new();
    let request = fuji_request();
    let session = gate.open_session(*request.chain()).unwrap();
    let write = session.grant(Role::Write);

    let mut lifecycle = gate.begin(request).unwrap();
    drive_to_confirmed(&gate, &mut lifecycle);

    let err = lifecycle
        .sign(&write, &TamperingSigner, &PromotionEvidence::default(), false)
        .unwrap_err();

    assert!(matches!(err.error, GateError::SignatureMismatch { .. }));
    assert_eq!(err.state, LifecycleState::Confirmed);
    assert_eq!(lifecycle.state(), LifecycleState::Aborted);
}

#[test]
fn test_wallet_refusal_aborts() {
    let gate = SafetyGate::new();
    let request = fuji_request();
    let session = gate.open_session(*request.chain()).unwrap();
    let write = session.grant(Role::Write);

    let mut lifecycle = gate.begin(request).unwrap();
    drive_to_confirmed(&gate, &mut lifecycle);

    let err = lifecycle
        .sign(&write, &RefusingSigner, &PromotionEvidence::default(), false)
        .unwrap_err();
    assert_eq!(err.code(), "collaborator");
    assert!(err.to_string().contains("user rejected in wallet"));
    assert_eq!(lifecycle.state(), LifecycleState::Aborted);
}

#[test]
fn test_sign_before_confirmation_changes_nothing() {
    let gate = SafetyGate::new();
    let request = fuji_request();
    let session = gate.open_session(*request.chain()).unwrap();
    let read = session.grant(Role::Read);
    let write = session.grant(Role::Write);
    let signer = EchoSigner::default();

    let mut lifecycle = gate.begin(request).unwrap();
    lifecycle.validate_chain().unwrap();
    lifecycle
        .simulate(&read, &MockSimulator::succeeding(30_000))
        .unwrap();
    lifecycle.disclose().unwrap();

    let err = lifecycle
        .sign(&write, &signer, &PromotionEvidence::default(), false)
        .unwrap_err();
    assert_eq!(err.code(), "invalid_transition");
    assert_eq!(lifecycle.state(), LifecycleState::Disclosed);
    assert_eq!(signer.signed(), 0);

    // The request can still be confirmed afterwards.
    lifecycle.record_confirmation(true).unwrap();
    assert_eq!(lifecycle.state(), LifecycleState::Confirmed);
}

// ============================================================================
// Broadcast
// ============================================================================

#[test]
fn test_rejected_broadcast_fails_the_request() {
    let gate = SafetyGate::new();
    let request = fuji_request();
    let session = gate.open_session(*request.chain()).unwrap();
    let write = session.grant(Role::Write);

    let mut lifecycle = gate.begin(request).unwrap();
    drive_to_confirmed(&gate, &mut lifecycle);
    lifecycle
        .sign(&write, &EchoSigner::default(), &PromotionEvidence::default(), false)
        .unwrap();

    let err = lifecycle
        .broadcast(&write, &MockBroadcaster::rejecting())
        .unwrap_err();
    assert_eq!(err.state, LifecycleState::Signed);
    assert!(err.to_string().contains("nonce too low"));
    assert_eq!(lifecycle.state(), LifecycleState::Failed);
    assert!(lifecycle.tx_hash().is_none());
}

// ============================================================================
// Abort
// ============================================================================

#[test]
fn test_abort_before_signing() {
    let gate = SafetyGate::new();
    let mut lifecycle = gate.begin(fuji_request()).unwrap();
    drive_to_confirmed(&gate, &mut lifecycle);

    assert_eq!(
        lifecycle.abort("changed my mind").unwrap(),
        LifecycleState::Aborted
    );
    assert_eq!(lifecycle.failure_reason(), Some("changed my mind"));
}

#[test]
fn test_abort_after_signing_is_refused() {
    let gate = SafetyGate::new();
    let request = fuji_request();
    let session = gate.open_session(*request.chain()).unwrap();
    let write = session.grant(Role::Write);

    let mut lifecycle = gate.begin(request).unwrap();
    drive_to_confirmed(&gate, &mut lifecycle);
    lifecycle
        .sign(&write, &EchoSigner::default(), &PromotionEvidence::default(), false)
        .unwrap();

    let err = lifecycle.abort("too late").unwrap_err();
    assert!(matches!(
        err.error,
        GateError::InvalidTransition {
            from: LifecycleState::Signed,
            operation: LifecycleOperation::Abort,
            ..
        }
    ));
    assert_eq!(lifecycle.state(), LifecycleState::Signed);
}

#[test]
fn test_abort_twice_is_refused() {
    let gate = SafetyGate::new();
    let mut lifecycle = gate.begin(fuji_request()).unwrap();
    lifecycle.abort("first").unwrap();

    let err = lifecycle.abort("second").unwrap_err();
    assert_eq!(err.code(), "invalid_transition");
    assert_eq!(lifecycle.failure_reason(), Some("first"));
}

// ============================================================================
// Request Ownership
// ============================================================================

#[test]
fn test_unfinished_lifecycle_is_handed_back() {
    let gate = SafetyGate::new();
    let mut lifecycle = gate.begin(fuji_request()).unwrap();
    lifecycle.validate_chain().unwrap();
    let id = lifecycle.id().clone();

    let unfinished = lifecycle.finish().unwrap_err();
    assert_eq!(unfinished.error.code(), "invalid_transition");
    assert_eq!(unfinished.lifecycle.state(), LifecycleState::ChainValidated);
    assert!(gate.in_flight().is_in_flight(&id));

    let mut lifecycle = *unfinished.lifecycle;
    lifecycle.abort("done testing").unwrap();
    lifecycle.finish().unwrap();
    assert!(!gate.in_flight().is_in_flight(&id));
}

#[test]
fn test_same_request_cannot_run_twice_concurrently() {
    let gate = SafetyGate::new();
    let request = fuji_request();

    let lifecycle = gate.begin(request.clone()).unwrap();
    let err = gate.begin(request.clone()).unwrap_err();
    assert!(matches!(err, GateError::DuplicateInFlight { .. }));

    // The live lifecycle is untouched.
    assert_eq!(lifecycle.state(), LifecycleState::Idle);
    drop(lifecycle);
    assert!(gate.begin(request).is_ok());
}
