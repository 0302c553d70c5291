//! Traits for the external collaborators the gate drives.
//!
//! The gate never implements simulation, signing, transport or user
//! interaction itself. It consumes them through these narrow traits:
//!
//! 1. [`Simulator`] - dry-runs a request against current chain state
//! 2. [`HumanPrompt`] - shows a [`Disclosure`] to a person and returns their answer
//! 3. [`Signer`] - external wallet software; returns an opaque signed payload
//! 4. [`Broadcaster`] - submits the payload and reports the receipt
//!
//! Every call is a synchronous step taken by the caller's thread. The gate
//! never calls a collaborator from a background task.
//!
//! # Thread Safety
//!
//! All traits require `Send + Sync` so one implementation can serve
//! lifecycles on several threads.

use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;
use crate::types::{Disclosure, TransactionRequest};

/// Transaction hash returned by the broadcaster.
pub type TxHash = alloy_primitives::B256;

/// What the simulator reported for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Whether execution would succeed.
    pub success: bool,
    /// Estimated gas units.
    pub gas_estimate: u64,
    /// Revert reason or other explanation.
    pub reason: Option<String>,
}

impl SimulationReport {
    /// A successful report.
    #[must_use]
    pub const fn success(gas_estimate: u64) -> Self {
        Self {
            success: true,
            gas_estimate,
            reason: None,
        }
    }

    /// A failed report.
    #[must_use]
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            gas_estimate: 0,
            reason: Some(reason.into()),
        }
    }
}

/// Opaque output of the external signer.
///
/// `disclosed` must echo [`Disclosure::canonical_bytes`] of the disclosure the
/// signer was shown; the lifecycle compares the two byte-for-byte before
/// accepting the signature. `payload` is never interpreted by the gate.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedPayload {
    /// The disclosed fields the signer committed to.
    pub disclosed: Vec<u8>,
    /// The signed transaction, ready for broadcast.
    pub payload: Vec<u8>,
}

impl std::fmt::Debug for SignedPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedPayload")
            .field("disclosed_len", &self.disclosed.len())
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

/// On-chain execution status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    /// Executed successfully.
    Success,
    /// Included but reverted.
    Reverted {
        /// Revert reason, if the node decoded one.
        reason: Option<String>,
    },
}

/// Receipt for an included transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// The transaction hash.
    pub tx_hash: TxHash,
    /// Execution status.
    pub status: ReceiptStatus,
    /// Block the transaction was included in.
    pub block_number: u64,
    /// Gas actually used.
    pub gas_used: u64,
}

impl Receipt {
    /// Returns `true` if the transaction executed successfully.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, ReceiptStatus::Success)
    }
}

/// Dry-runs requests against current chain state.
pub trait Simulator: Send + Sync {
    /// Simulate `request`.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] if the node could not be reached or gave
    /// an ambiguous answer. The gate treats this as a failed simulation.
    fn simulate(&self, request: &TransactionRequest) -> Result<SimulationReport, CollaboratorError>;
}

/// External wallet software. Never exposes key material.
pub trait Signer: Send + Sync {
    /// Sign the transaction described by `disclosure`.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] if the wallet refused or failed.
    fn sign(&self, disclosure: &Disclosure) -> Result<SignedPayload, CollaboratorError>;
}

/// Submits signed payloads and reports their receipts.
pub trait Broadcaster: Send + Sync {
    /// Submit a signed payload.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] if the network rejected the payload.
    fn submit(&self, payload: &SignedPayload) -> Result<TxHash, CollaboratorError>;

    /// Block until the receipt for `tx_hash` is available.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] if the receipt could not be fetched.
    fn wait_for_receipt(&self, tx_hash: &TxHash) -> Result<Receipt, CollaboratorError>;
}

/// Presents a disclosure to a person.
///
/// Implementations receive their wording from
/// [`PromptConfig`](crate::config::PromptConfig); the gate only consumes the answer.
pub trait HumanPrompt: Send + Sync {
    /// Show `disclosure` and return whether the person acknowledged it.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] if no answer could be obtained. The gate
    /// treats this as a decline.
    fn present(&self, disclosure: &Disclosure) -> Result<bool, CollaboratorError>;
}
