//! Integration tests for read/write capability separation.
//!
//! - Read handles never sign or broadcast
//! - Write handles never simulate or query receipts
//! - Handles are bound to one guard and one network

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::doc_markdown,
    dead_code
)]

use avagate::{PromotionEvidence, SafetyGate};
use avagate_core::error::GateError;
use avagate_core::types::{LifecycleState, OperationKind, Role};
use proptest::prelude::*;

use crate::common::{
    call_request, drive_to_confirmed, fuji_request, mainnet_request, EchoSigner,
    MockBroadcaster, MockSimulator,
};

// ============================================================================
// Role Separation
// ============================================================================

#[test]
fn test_read_handle_cannot_sign() {
    let gate = SafetyGate::new();
    let request = fuji_request();
    let session = gate.open_session(*request.chain()).unwrap();
    let read = session.grant(Role::Read);
    let signer = EchoSigner::default();

    let mut lifecycle = gate.begin(request).unwrap();
    drive_to_confirmed(&gate, &mut lifecycle);

    let err = lifecycle
        .sign(&read, &signer, &PromotionEvidence::default(), false)
        .unwrap_err();

    assert!(matches!(
        err.error,
        GateError::CapabilityViolation {
            role: Role::Read,
            operation: OperationKind::Sign,
            ..
        }
    ));
    assert_eq!(lifecycle.state(), LifecycleState::Aborted);
    assert_eq!(signer.signed(), 0);
}

#[test]
fn test_write_handle_cannot_simulate() {
    let gate = SafetyGate::new();
    let request = fuji_request();
    let session = gate.open_session(*request.chain()).unwrap();
    let write = session.grant(Role::Write);
    let simulator = MockSimulator::succeeding(21_000);

    let mut lifecycle = gate.begin(request).unwrap();
    lifecycle.validate_chain().unwrap();
    let err = lifecycle.simulate(&write, &simulator).unwrap_err();

    assert!(matches!(
        err.error,
        GateError::CapabilityViolation {
            role: Role::Write,
            operation: OperationKind::Simulate,
            ..
        }
    ));
    assert_eq!(lifecycle.state(), LifecycleState::Aborted);
    assert_eq!(simulator.calls(), 0);
}

#[test]
fn test_read_handle_cannot_broadcast() {
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

    let err = lifecycle.broadcast(&read, &broadcaster).unwrap_err();
    assert_eq!(err.code(), "capability_violation");
    assert_eq!(lifecycle.state(), LifecycleState::Failed);
    assert_eq!(broadcaster.submitted(), 0);
}

#[test]
fn test_write_handle_cannot_monitor() {
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

    let err = lifecycle.monitor(&write, &broadcaster).unwrap_err();
    assert_eq!(err.code(), "capability_violation");
    assert_eq!(lifecycle.state(), LifecycleState::Submitted);

    // The submitted transaction can still be watched with the right handle.
    assert_eq!(
        lifecycle.monitor(&read, &broadcaster).unwrap(),
        LifecycleState::Succeeded
    );
}

// ============================================================================
// Handle Scope
// ============================================================================

#[test]
fn test_handle_for_other_network_is_refused() {
    let gate = SafetyGate::new();
    let mainnet_session = gate.open_session(*mainnet_request().chain()).unwrap();
    let read = mainnet_session.grant(Role::Read);

    let mut lifecycle = gate.begin(fuji_request()).unwrap();
    lifecycle.validate_chain().unwrap();
    let err = lifecycle
        .simulate(&read, &MockSimulator::succeeding(21_000))
        .unwrap_err();

    assert!(
        matches!(&err.error, GateError::CapabilityViolation { reason, .. } if reason.contains("43114"))
    );
    assert_eq!(lifecycle.state(), LifecycleState::Aborted);
}

#[test]
fn test_handle_from_other_gate_is_refused() {
    let gate = SafetyGate::new();
    let other = SafetyGate::new();
    let request = fuji_request();
    let session = other.open_session(*request.chain()).unwrap();
    let read = session.grant(Role::Read);

    let mut lifecycle = gate.begin(request).unwrap();
    lifecycle.validate_chain().unwrap();
    let err = lifecycle
        .simulate(&read, &MockSimulator::succeeding(21_000))
        .unwrap_err();

    assert!(
        matches!(&err.error, GateError::CapabilityViolation { reason, .. } if reason.contains("different guard"))
    );
}

#[test]
fn test_sessions_for_unsupported_chains_are_refused() {
    let gate = SafetyGate::new();
    let err = gate.open_session(*call_request(10).chain()).unwrap_err();
    assert!(matches!(err, GateError::UnsupportedChain { chain_id: 10 }));
}

#[test]
fn test_handles_are_counted_until_dropped() {
    let gate = SafetyGate::new();
    let session = gate.open_session(*fuji_request().chain()).unwrap();

    let read = session.grant(Role::Read);
    let write = session.grant(Role::Write);
    assert_eq!(gate.capabilities().live_handles(Role::Read, 43113), 1);
    assert_eq!(gate.capabilities().live_handles(Role::Write, 43113), 1);

    drop(write);
    assert_eq!(gate.capabilities().live_handles(Role::Write, 43113), 0);
    assert_eq!(gate.capabilities().live_handles(Role::Read, 43113), 1);
    drop(read);
    session.close();
    assert_eq!(gate.capabilities().live_handles(Role::Read, 43113), 0);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_read_handle_never_signs(
        mainnet in any::<bool>(),
        testnet_validated in any::<bool>(),
        fork_tested in any::<bool>(),
        ack in any::<bool>(),
    ) {
        let gate = SafetyGate::new();
        let request = if mainnet { mainnet_request() } else { fuji_request() };
        let session = gate.open_session(*request.chain()).unwrap();
        let read = session.grant(Role::Read);
        let signer = EchoSigner::default();
        let evidence = PromotionEvidence::new(testnet_validated, fork_tested);

        let mut lifecycle = gate.begin(request).unwrap();
        drive_to_confirmed(&gate, &mut lifecycle);

        let err = lifecycle.sign(&read, &signer, &evidence, ack).unwrap_err();

        prop_assert_eq!(err.code(), "capability_violation");
        prop_assert_eq!(lifecycle.state(), LifecycleState::Aborted);
        prop_assert_eq!(signer.signed(), 0);
    }
}
