//! Integration tests for batches of approvals.
//!
//! Every member of a batch is its own lifecycle and needs its own
//! confirmation; acknowledging some members never carries over to the rest.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::doc_markdown,
    dead_code
)]

use alloy_primitives::U256;
use avagate::{PromotionEvidence, SafetyGate};
use avagate_core::error::GateError;
use avagate_core::types::{ApprovalRisk, LifecycleOperation, LifecycleState, Role};
use proptest::prelude::*;

use crate::common::{fuji_approval, EchoSigner, MockBroadcaster, MockSimulator};

fn approvals(count: u8) -> Vec<avagate_core::types::TransactionRequest> {
    (0..count)
        .map(|i| fuji_approval(0xb0 + i, U256::from(1_000_u64 * (u64::from(i) + 1))))
        .collect()
}

// ============================================================================
// Partial Acknowledgement
// ============================================================================

#[test]
fn test_third_approval_stays_disclosed_without_ack() {
    let gate = SafetyGate::new();
    let requests = approvals(3);
    let session = gate.open_session(*requests[0].chain()).unwrap();
    let read = session.grant(Role::Read);
    let write = session.grant(Role::Write);
    let simulator = MockSimulator::succeeding(46_000);
    let signer = EchoSigner::default();
    let broadcaster = MockBroadcaster::succeeding();

    let mut batch = gate.begin_batch(requests).unwrap();
    let ids = batch.ids();

    for id in &ids {
        let lifecycle = batch.get_mut(id).unwrap();
        lifecycle.validate_chain().unwrap();
        lifecycle.simulate(&read, &simulator).unwrap();
        let disclosure = lifecycle.disclose().unwrap();
        assert!(disclosure.approval().is_some());
    }

    // The human acknowledges the first two only.
    for id in &ids[..2] {
        let lifecycle = batch.get_mut(id).unwrap();
        lifecycle.record_confirmation(true).unwrap();
        lifecycle
            .sign(&write, &signer, &PromotionEvidence::default(), false)
            .unwrap();
    }

    let third = batch.get_mut(&ids[2]).unwrap();
    assert_eq!(third.state(), LifecycleState::Disclosed);
    assert!(!gate.confirmations().is_confirmed(&ids[2]));

    let err = third
        .sign(&write, &signer, &PromotionEvidence::default(), false)
        .unwrap_err();
    assert!(matches!(
        err.error,
        GateError::InvalidTransition {
            from: LifecycleState::Disclosed,
            operation: LifecycleOperation::Sign,
            ..
        }
    ));

    let err = third.broadcast(&write, &broadcaster).unwrap_err();
    assert!(matches!(
        err.error,
        GateError::InvalidTransition {
            operation: LifecycleOperation::Broadcast,
            ..
        }
    ));
    assert_eq!(third.state(), LifecycleState::Disclosed);

    assert_eq!(signer.signed(), 2);
    assert_eq!(broadcaster.submitted(), 0);

    let states: Vec<_> = batch.states().into_iter().map(|(_, s)| s).collect();
    assert_eq!(
        states,
        vec![
            LifecycleState::Signed,
            LifecycleState::Signed,
            LifecycleState::Disclosed
        ]
    );
}

#[test]
fn test_unlimited_approval_is_flagged_in_disclosure() {
    let gate = SafetyGate::new();
    let requests = vec![
        fuji_approval(0xc1, U256::MAX),
        fuji_approval(0xc2, U256::from(5_000_u64)),
    ];
    let session = gate.open_session(*requests[0].chain()).unwrap();
    let read = session.grant(Role::Read);
    let simulator = MockSimulator::succeeding(46_000);

    let mut batch = gate.begin_batch(requests).unwrap();
    let mut risks = Vec::new();
    for id in batch.ids() {
        let lifecycle = batch.get_mut(&id).unwrap();
        lifecycle.validate_chain().unwrap();
        lifecycle.simulate(&read, &simulator).unwrap();
        risks.push(lifecycle.disclose().unwrap().approval().unwrap().risk());
    }

    assert_eq!(risks, vec![ApprovalRisk::Infinite, ApprovalRisk::Finite]);
}

#[test]
fn test_batch_members_release_ids_independently() {
    let gate = SafetyGate::new();
    let batch = gate.begin_batch(approvals(2)).unwrap();
    assert_eq!(gate.in_flight().len(), 2);

    let mut lifecycles = batch.into_lifecycles();
    let mut first = lifecycles.remove(0);
    first.abort("not needed").unwrap();
    first.finish().unwrap();

    assert_eq!(gate.in_flight().len(), 1);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_only_acknowledged_members_are_confirmed(
        acks in prop::collection::vec(any::<bool>(), 1..6)
    ) {
        let gate = SafetyGate::new();
        let requests = approvals(u8::try_from(acks.len()).unwrap());
        let session = gate.open_session(*requests[0].chain()).unwrap();
        let read = session.grant(Role::Read);
        let simulator = MockSimulator::succeeding(46_000);

        let mut batch = gate.begin_batch(requests).unwrap();
        let ids = batch.ids();

        for (id, ack) in ids.iter().zip(&acks) {
            let lifecycle = batch.get_mut(id).unwrap();
            lifecycle.validate_chain().unwrap();
            lifecycle.simulate(&read, &simulator).unwrap();
            lifecycle.disclose().unwrap();
            if *ack {
                lifecycle.record_confirmation(true).unwrap();
            }
        }

        for (id, ack) in ids.iter().zip(&acks) {
            prop_assert_eq!(gate.confirmations().is_confirmed(id), *ack);
            let expected = if *ack { LifecycleState::Confirmed } else { LifecycleState::Disclosed };
            prop_assert_eq!(batch.get(id).unwrap().state(), expected);
        }
    }
}
