//! # Test Utilities for `avagate`
//!
//! Mock collaborators and request helpers shared by the integration tests.
//!
//! ## Mocks
//!
//! - [`MockSimulator`] - Scripted simulation outcome, counts calls
//! - [`EchoSigner`] - Signs whatever it is shown and echoes the disclosed bytes
//! - [`TamperingSigner`] - Commits to different fields than it was shown
//! - [`MockBroadcaster`] - Fixed transaction hash and scripted receipts
//! - [`MockPrompt`] - Fixed answer to every disclosure
//!
//! ## Proptest Strategies
//!
//! - [`non_avalanche_chain_id`] - Chain ids outside the allow-list
//! - [`address`] - Arbitrary 20-byte addresses

#![allow(dead_code)]
// Allow expect() in test utilities since panicking on setup failures is acceptable in tests
#![allow(clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use alloy_primitives::{Address, B256, U256};
use proptest::prelude::*;
use tempfile::TempDir;

use avagate::{AuditLogger, SafetyGate, TransactionLifecycle};
use avagate_core::error::CollaboratorError;
use avagate_core::interfaces::{
    Broadcaster, HumanPrompt, Receipt, ReceiptStatus, SignedPayload, SimulationReport, Simulator,
    Signer, TxHash,
};
use avagate_core::types::{
    ChainContext, Disclosure, LifecycleState, Role, TransactionRequest, AVALANCHE_FUJI_CHAIN_ID,
    AVALANCHE_MAINNET_CHAIN_ID,
};

/// Hash every [`MockBroadcaster`] returns from `submit`.
pub const TX_HASH: TxHash = B256::repeat_byte(0x5a);

// ============================================================================
// Requests
// ============================================================================

/// A plain contract call on `chain_id`.
pub fn call_request(chain_id: u64) -> TransactionRequest {
    TransactionRequest::builder(
        Address::repeat_byte(0x42),
        "deposit",
        ChainContext::classify(chain_id),
    )
    .args(vec![serde_json::json!("1000")])
    .value(U256::from(1_000_u64))
    .build()
}

/// A contract call on Fuji.
pub fn fuji_request() -> TransactionRequest {
    call_request(AVALANCHE_FUJI_CHAIN_ID)
}

/// A contract call on Avalanche mainnet.
pub fn mainnet_request() -> TransactionRequest {
    call_request(AVALANCHE_MAINNET_CHAIN_ID)
}

/// An ERC-20 approval on Fuji for a distinct spender.
pub fn fuji_approval(spender_byte: u8, amount: U256) -> TransactionRequest {
    TransactionRequest::approval(
        Address::repeat_byte(0xaa),
        Address::repeat_byte(spender_byte),
        amount,
        ChainContext::classify(AVALANCHE_FUJI_CHAIN_ID),
    )
}

/// A gate writing its audit trail under a fresh temporary directory.
///
/// Keep the returned [`TempDir`] alive for the duration of the test.
pub fn audited_gate() -> (SafetyGate, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let logger = AuditLogger::new(dir.path(), &[7u8; 32]).expect("failed to open audit log");
    (SafetyGate::new().with_audit(logger), dir)
}

/// Walk `lifecycle` from `Idle` to `Confirmed` with cooperative collaborators.
pub fn drive_to_confirmed(gate: &SafetyGate, lifecycle: &mut TransactionLifecycle) {
    let session = gate
        .open_session(*lifecycle.request().chain())
        .expect("failed to open session");
    let read = session.grant(Role::Read);

    lifecycle.validate_chain().expect("chain validation failed");
    lifecycle
        .simulate(&read, &MockSimulator::succeeding(52_000))
        .expect("simulation failed");
    lifecycle.disclose().expect("disclosure failed");
    let state = lifecycle
        .confirm(&MockPrompt::accepting())
        .expect("confirmation failed");
    assert_eq!(state, LifecycleState::Confirmed);
}

// ============================================================================
// Mock Simulator
// ============================================================================

/// Scripted simulator.
pub struct MockSimulator {
    outcome: Result<SimulationReport, CollaboratorError>,
    calls: AtomicU32,
}

impl MockSimulator {
    /// Every simulation succeeds with `gas`.
    pub fn succeeding(gas: u64) -> Self {
        Self::with(Ok(SimulationReport::success(gas)))
    }

    /// Every simulation reports failure with `reason`.
    pub fn failing(reason: &str) -> Self {
        Self::with(Ok(SimulationReport::failure(reason)))
    }

    /// The simulator cannot be reached.
    pub fn unreachable() -> Self {
        Self::with(Err(CollaboratorError::transport("connection refused")))
    }

    fn with(outcome: Result<SimulationReport, CollaboratorError>) -> Self {
        Self {
            outcome,
            calls: AtomicU32::new(0),
        }
    }

    /// Number of simulations performed.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Simulator for MockSimulator {
    fn simulate(&self, _request: &TransactionRequest) -> Result<SimulationReport, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

// ============================================================================
// Mock Signers
// ============================================================================

/// Signs exactly what it is shown.
#[derive(Default)]
pub struct EchoSigner {
    signed: AtomicU32,
}

impl EchoSigner {
    /// Number of signatures produced.
    pub fn signed(&self) -> u32 {
        self.signed.load(Ordering::SeqCst)
    }
}

impl Signer for EchoSigner {
    fn sign(&self, disclosure: &Disclosure) -> Result<SignedPayload, CollaboratorError> {
        self.signed.fetch_add(1, Ordering::SeqCst);
        Ok(SignedPayload {
            disclosed: disclosure.canonical_bytes().to_vec(),
            payload: vec![0xf8, 0x6b, 0x80],
        })
    }
}

/// Signs a transaction with a different amount than was disclosed.
pub struct TamperingSigner;

impl Signer for TamperingSigner {
    fn sign(&self, disclosure: &Disclosure) -> Result<SignedPayload, CollaboratorError> {
        let mut disclosed = disclosure.canonical_bytes().to_vec();
        disclosed.extend_from_slice(b";value=999999");
        Ok(SignedPayload {
            disclosed,
            payload: vec![0xf8, 0x6b, 0x81],
        })
    }
}

/// The wallet refuses to sign.
pub struct RefusingSigner;

impl Signer for RefusingSigner {
    fn sign(&self, _disclosure: &Disclosure) -> Result<SignedPayload, CollaboratorError> {
        Err(CollaboratorError::rejected("user rejected in wallet"))
    }
}

// ============================================================================
// Mock Broadcaster
// ============================================================================

/// Returns [`TX_HASH`] on submit and replays scripted receipt answers.
///
/// Once the script runs out every wait returns `final_status`.
pub struct MockBroadcaster {
    final_status: ReceiptStatus,
    script: Mutex<VecDeque<Result<Receipt, CollaboratorError>>>,
    reject_submit: bool,
    submitted: AtomicU32,
}

impl MockBroadcaster {
    /// Every receipt reports success.
    pub fn succeeding() -> Self {
        Self::with_status(ReceiptStatus::Success)
    }

    /// Every receipt reports a revert.
    pub fn reverting(reason: &str) -> Self {
        Self::with_status(ReceiptStatus::Reverted {
            reason: Some(reason.to_string()),
        })
    }

    /// The network rejects every payload.
    pub fn rejecting() -> Self {
        Self {
            reject_submit: true,
            ..Self::succeeding()
        }
    }

    fn with_status(final_status: ReceiptStatus) -> Self {
        Self {
            final_status,
            script: Mutex::new(VecDeque::new()),
            reject_submit: false,
            submitted: AtomicU32::new(0),
        }
    }

    /// The next `count` receipt waits time out.
    pub fn timing_out(self, count: usize) -> Self {
        {
            let mut script = self.script.lock().expect("script lock");
            for _ in 0..count {
                script.push_back(Err(CollaboratorError::transport("receipt wait timed out")));
            }
        }
        self
    }

    /// The next receipt wait returns a receipt for an unrelated transaction.
    pub fn with_foreign_receipt(self) -> Self {
        self.script
            .lock()
            .expect("script lock")
            .push_back(Ok(receipt(B256::repeat_byte(0x01), ReceiptStatus::Success)));
        self
    }

    /// Number of payloads submitted.
    pub fn submitted(&self) -> u32 {
        self.submitted.load(Ordering::SeqCst)
    }
}

impl Broadcaster for MockBroadcaster {
    fn submit(&self, _payload: &SignedPayload) -> Result<TxHash, CollaboratorError> {
        if self.reject_submit {
            return Err(CollaboratorError::rejected("nonce too low"));
        }
        self.submitted.fetch_add(1, Ordering::SeqCst);
        Ok(TX_HASH)
    }

    fn wait_for_receipt(&self, tx_hash: &TxHash) -> Result<Receipt, CollaboratorError> {
        let scripted = self.script.lock().expect("script lock").pop_front();
        scripted.unwrap_or_else(|| Ok(receipt(*tx_hash, self.final_status.clone())))
    }
}

fn receipt(tx_hash: TxHash, status: ReceiptStatus) -> Receipt {
    Receipt {
        tx_hash,
        status,
        block_number: 41_000_000,
        gas_used: 45_000,
    }
}

// ============================================================================
// Mock Prompt
// ============================================================================

/// Gives the same answer to every disclosure.
pub struct MockPrompt {
    answer: Result<bool, CollaboratorError>,
    shown: Mutex<Vec<Disclosure>>,
}

impl MockPrompt {
    /// Always acknowledges.
    pub fn accepting() -> Self {
        Self::with(Ok(true))
    }

    /// Always declines.
    pub fn declining() -> Self {
        Self::with(Ok(false))
    }

    /// No answer can be obtained.
    pub fn broken() -> Self {
        Self::with(Err(CollaboratorError::transport("terminal closed")))
    }

    fn with(answer: Result<bool, CollaboratorError>) -> Self {
        Self {
            answer,
            shown: Mutex::new(Vec::new()),
        }
    }

    /// Disclosures presented so far.
    pub fn shown(&self) -> Vec<Disclosure> {
        self.shown.lock().expect("shown lock").clone()
    }
}

impl HumanPrompt for MockPrompt {
    fn present(&self, disclosure: &Disclosure) -> Result<bool, CollaboratorError> {
        self.shown
            .lock()
            .expect("shown lock")
            .push(disclosure.clone());
        self.answer.clone()
    }
}

// ============================================================================
// Proptest Strategies
// ============================================================================

/// Chain ids that are neither Avalanche mainnet nor Fuji.
pub fn non_avalanche_chain_id() -> impl Strategy<Value = u64> {
    any::<u64>().prop_filter("allow-listed chain id", |id| {
        *id != AVALANCHE_MAINNET_CHAIN_ID && *id != AVALANCHE_FUJI_CHAIN_ID
    })
}

/// Arbitrary addresses.
pub fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::from)
}
