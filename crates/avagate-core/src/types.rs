//! Core types for the `avagate` transaction-safety gate.
//!
//! This module provides the data model shared by every gate component:
//!
//! - [`ChainContext`] - A classified network identifier (mainnet, testnet or rejected)
//! - [`TransactionRequest`] - An immutable write-intent
//! - [`SimulationResult`] - The single simulation verdict for a request
//! - [`ApprovalDisclosure`] - Token allowance facts for approval requests
//! - [`Disclosure`] - The facts a human must see before confirming
//! - [`ConfirmationRecord`] - Proof of one explicit acknowledgement
//! - [`LifecycleState`] - States of the per-request state machine
//!
//! # Examples
//!
//! ```
//! use avagate_core::types::{ChainContext, RequestKind, TransactionRequest};
//! use avagate_core::{Address, U256};
//!
//! let chain = ChainContext::classify(43113);
//! let request = TransactionRequest::builder(Address::repeat_byte(0x11), "deposit", chain)
//!     .value(U256::from(1_000u64))
//!     .build();
//!
//! assert_eq!(request.kind(), RequestKind::Call);
//! assert_eq!(request.declared_value(), U256::from(1_000u64));
//! ```

use std::fmt;
use std::fmt::Write as _;

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Chain id of the Avalanche C-Chain mainnet.
pub const AVALANCHE_MAINNET_CHAIN_ID: u64 = 43114;

/// Chain id of the Avalanche Fuji C-Chain testnet.
pub const AVALANCHE_FUJI_CHAIN_ID: u64 = 43113;

// ============================================================================
// ChainContext
// ============================================================================

/// Risk classification of a network identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkLabel {
    /// The production network. Transactions are irreversible and carry real value.
    Mainnet,
    /// The public test network.
    Testnet,
    /// Any identifier outside the allow-list.
    Rejected,
}

impl NetworkLabel {
    /// Returns the lowercase name used in logs and disclosures.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for NetworkLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified network identifier.
///
/// The only constructor is [`ChainContext::classify`], so
/// `allowlisted == (chain_id ∈ {43114, 43113})` holds for every value.
/// A `Rejected` context can be inspected but is refused by every gate stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChainContext {
    chain_id: u64,
    label: NetworkLabel,
    allowlisted: bool,
}

impl ChainContext {
    /// Classify a raw chain id against the fixed allow-list.
    ///
    /// # Examples
    ///
    /// ```
    /// use avagate_core::types::{ChainContext, NetworkLabel};
    ///
    /// assert_eq!(ChainContext::classify(43114).label(), NetworkLabel::Mainnet);
    /// assert_eq!(ChainContext::classify(43113).label(), NetworkLabel::Testnet);
    /// assert!(!ChainContext::classify(137).is_allowlisted());
    /// ```
    #[must_use]
    pub const fn classify(chain_id: u64) -> Self {
        let label = match chain_id {
            AVALANCHE_MAINNET_CHAIN_ID => NetworkLabel::Mainnet,
            AVALANCHE_FUJI_CHAIN_ID => NetworkLabel::Testnet,
            _ => NetworkLabel::Rejected,
        };
        Self {
            chain_id,
            label,
            allowlisted: !matches!(label, NetworkLabel::Rejected),
        }
    }

    /// The raw chain id.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// The network classification.
    #[must_use]
    pub const fn label(&self) -> NetworkLabel {
        self.label
    }

    /// Returns `true` if the chain id is on the allow-list.
    #[must_use]
    pub const fn is_allowlisted(&self) -> bool {
        self.allowlisted
    }

    /// Returns `true` for the production network.
    #[must_use]
    pub const fn is_mainnet(&self) -> bool {
        matches!(self.label, NetworkLabel::Mainnet)
    }
}

impl fmt::Display for ChainContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.chain_id, self.label)
    }
}

// ============================================================================
// Capabilities
// ============================================================================

/// The role a capability handle is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May only answer read queries.
    Read,
    /// May only perform state-mutating operations.
    Write,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// An operation performed through a capability handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Dry-run execution against current chain state.
    Simulate,
    /// Arbitrary state query (balances, allowances, nonces).
    QueryState,
    /// Receipt lookup for a submitted transaction.
    QueryReceipt,
    /// Requesting a signature from the external signer.
    Sign,
    /// Handing a signed payload to the network.
    Broadcast,
}

impl OperationKind {
    /// Returns `true` if the operation mutates chain state.
    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Sign | Self::Broadcast)
    }

    /// The role a handle must carry to perform this operation.
    #[must_use]
    pub const fn required_role(self) -> Role {
        if self.is_write() {
            Role::Write
        } else {
            Role::Read
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Simulate => "simulate",
            Self::QueryState => "query_state",
            Self::QueryReceipt => "query_receipt",
            Self::Sign => "sign",
            Self::Broadcast => "broadcast",
        };
        f.write_str(name)
    }
}

// ============================================================================
// RequestId
// ============================================================================

/// Unique token identifying one transaction request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an id supplied by the caller.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Approval disclosure
// ============================================================================

/// The allowance amount granted by an approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAmount {
    /// A bounded allowance in the token's smallest unit.
    Finite(U256),
    /// An unbounded allowance.
    Infinite,
}

impl ApprovalAmount {
    /// Interpret a raw on-chain allowance value.
    ///
    /// `U256::MAX` is the conventional encoding of an unlimited allowance.
    #[must_use]
    pub fn from_raw(amount: U256) -> Self {
        if amount == U256::MAX {
            Self::Infinite
        } else {
            Self::Finite(amount)
        }
    }
}

impl fmt::Display for ApprovalAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(amount) => write!(f, "{amount}"),
            Self::Infinite => f.write_str("infinite"),
        }
    }
}

/// Risk class of an approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalRisk {
    /// The spender can move at most the approved amount.
    Finite,
    /// The spender can move the holder's entire balance, now and in the future.
    Infinite,
}

impl fmt::Display for ApprovalRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite => f.write_str("finite"),
            Self::Infinite => f.write_str("infinite"),
        }
    }
}

/// Facts about a token allowance that must be disclosed before an approval
/// request can be confirmed.
///
/// The risk class is derived from the amount, so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalDisclosure {
    token: Address,
    spender: Address,
    amount: ApprovalAmount,
    risk: ApprovalRisk,
}

impl ApprovalDisclosure {
    /// Create an approval disclosure.
    #[must_use]
    pub const fn new(token: Address, spender: Address, amount: ApprovalAmount) -> Self {
        let risk = match amount {
            ApprovalAmount::Finite(_) => ApprovalRisk::Finite,
            ApprovalAmount::Infinite => ApprovalRisk::Infinite,
        };
        Self {
            token,
            spender,
            amount,
            risk,
        }
    }

    /// The token contract being approved.
    #[must_use]
    pub const fn token(&self) -> Address {
        self.token
    }

    /// The address allowed to spend.
    #[must_use]
    pub const fn spender(&self) -> Address {
        self.spender
    }

    /// The approved amount.
    #[must_use]
    pub const fn amount(&self) -> ApprovalAmount {
        self.amount
    }

    /// The risk class.
    #[must_use]
    pub const fn risk(&self) -> ApprovalRisk {
        self.risk
    }
}

// ============================================================================
// TransactionRequest
// ============================================================================

/// Whether a request is a plain contract call or a token approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Any state-mutating call.
    Call,
    /// A token allowance grant; requires an [`ApprovalDisclosure`].
    Approval,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call => f.write_str("call"),
            Self::Approval => f.write_str("approval"),
        }
    }
}

/// A write-intent submitted to the gate.
///
/// Requests are immutable after construction. The simulation result and the
/// confirmation record are attached to the lifecycle driving the request,
/// never to the request value itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
    id: RequestId,
    target: Address,
    function_name: String,
    args: Vec<serde_json::Value>,
    declared_value: U256,
    chain: ChainContext,
    kind: RequestKind,
    approval: Option<ApprovalDisclosure>,
}

impl TransactionRequest {
    /// Start building a [`RequestKind::Call`] request with a fresh id.
    #[must_use]
    pub fn builder(
        target: Address,
        function_name: impl Into<String>,
        chain: ChainContext,
    ) -> TransactionRequestBuilder {
        TransactionRequestBuilder::new(target, function_name, chain)
    }

    /// Build an ERC-20 `approve(spender, amount)` request with its disclosure attached.
    ///
    /// # Examples
    ///
    /// ```
    /// use avagate_core::types::{ApprovalRisk, ChainContext, RequestKind, TransactionRequest};
    /// use avagate_core::{Address, U256};
    ///
    /// let request = TransactionRequest::approval(
    ///     Address::repeat_byte(0xaa),
    ///     Address::repeat_byte(0xbb),
    ///     U256::MAX,
    ///     ChainContext::classify(43113),
    /// );
    ///
    /// assert_eq!(request.kind(), RequestKind::Approval);
    /// assert_eq!(request.approval().map(|a| a.risk()), Some(ApprovalRisk::Infinite));
    /// ```
    #[must_use]
    pub fn approval(token: Address, spender: Address, amount: U256, chain: ChainContext) -> Self {
        let disclosure = ApprovalDisclosure::new(token, spender, ApprovalAmount::from_raw(amount));
        Self::builder(token, "approve", chain)
            .kind(RequestKind::Approval)
            .args(vec![
                serde_json::Value::String(spender.to_string()),
                serde_json::Value::String(amount.to_string()),
            ])
            .approval_disclosure(disclosure)
            .build()
    }

    /// The request id.
    #[must_use]
    pub const fn id(&self) -> &RequestId {
        &self.id
    }

    /// The contract or account the transaction is sent to.
    #[must_use]
    pub const fn target(&self) -> Address {
        self.target
    }

    /// The function being invoked.
    #[must_use]
    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// Call arguments, in order.
    #[must_use]
    pub fn args(&self) -> &[serde_json::Value] {
        &self.args
    }

    /// Native value attached to the call, in wei.
    #[must_use]
    pub const fn declared_value(&self) -> U256 {
        self.declared_value
    }

    /// The network the request targets.
    #[must_use]
    pub const fn chain(&self) -> &ChainContext {
        &self.chain
    }

    /// Call or approval.
    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        self.kind
    }

    /// The approval disclosure, if one was attached.
    #[must_use]
    pub const fn approval(&self) -> Option<&ApprovalDisclosure> {
        self.approval.as_ref()
    }
}

/// Builder for [`TransactionRequest`].
#[derive(Debug, Clone)]
pub struct TransactionRequestBuilder {
    request: TransactionRequest,
}

impl TransactionRequestBuilder {
    fn new(target: Address, function_name: impl Into<String>, chain: ChainContext) -> Self {
        Self {
            request: TransactionRequest {
                id: RequestId::new(),
                target,
                function_name: function_name.into(),
                args: Vec::new(),
                declared_value: U256::ZERO,
                chain,
                kind: RequestKind::Call,
                approval: None,
            },
        }
    }

    /// Use a caller-supplied id instead of a generated one.
    #[must_use]
    pub fn id(mut self, id: RequestId) -> Self {
        self.request.id = id;
        self
    }

    /// Set the call arguments.
    #[must_use]
    pub fn args(mut self, args: Vec<serde_json::Value>) -> Self {
        self.request.args = args;
        self
    }

    /// Set the native value in wei.
    #[must_use]
    pub const fn value(mut self, value: U256) -> Self {
        self.request.declared_value = value;
        self
    }

    /// Set the request kind.
    #[must_use]
    pub const fn kind(mut self, kind: RequestKind) -> Self {
        self.request.kind = kind;
        self
    }

    /// Attach an approval disclosure.
    #[must_use]
    pub fn approval_disclosure(mut self, disclosure: ApprovalDisclosure) -> Self {
        self.request.approval = Some(disclosure);
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> TransactionRequest {
        self.request
    }
}

// ============================================================================
// SimulationResult
// ============================================================================

/// Verdict of a pre-submission simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationOutcome {
    /// The transaction would execute successfully.
    Success,
    /// The transaction would revert, or the simulator could not tell.
    Failure,
}

/// The single simulation result recorded for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Success or failure.
    pub outcome: SimulationOutcome,
    /// Estimated gas units.
    pub gas_estimate: u64,
    /// Why the simulation failed, when it did.
    pub failure_reason: Option<String>,
}

impl SimulationResult {
    /// A successful simulation.
    #[must_use]
    pub const fn success(gas_estimate: u64) -> Self {
        Self {
            outcome: SimulationOutcome::Success,
            gas_estimate,
            failure_reason: None,
        }
    }

    /// A failed simulation.
    #[must_use]
    pub fn failure(reason: impl Into<String>, gas_estimate: u64) -> Self {
        Self {
            outcome: SimulationOutcome::Failure,
            gas_estimate,
            failure_reason: Some(reason.into()),
        }
    }

    /// Returns `true` if the outcome is [`SimulationOutcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, SimulationOutcome::Success)
    }
}

// ============================================================================
// Disclosure
// ============================================================================

/// The facts a human must see before confirming a transaction.
///
/// The canonical byte encoding is fixed at construction. Signers echo it back
/// with the signed payload, and the lifecycle compares the two byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Disclosure {
    request_id: RequestId,
    chain_id: u64,
    network: NetworkLabel,
    target: Address,
    function_name: String,
    args: Vec<serde_json::Value>,
    declared_value: U256,
    gas_estimate: u64,
    approval: Option<ApprovalDisclosure>,
    #[serde(skip)]
    canonical: Vec<u8>,
}

impl Disclosure {
    /// Snapshot the disclosed fields of a request.
    ///
    /// This does not check the simulation outcome or the approval
    /// requirement; `avagate-policy`'s disclosure builder does.
    #[must_use]
    pub fn new(request: &TransactionRequest, gas_estimate: u64) -> Self {
        let mut disclosure = Self {
            request_id: request.id().clone(),
            chain_id: request.chain().chain_id(),
            network: request.chain().label(),
            target: request.target(),
            function_name: request.function_name().to_string(),
            args: request.args().to_vec(),
            declared_value: request.declared_value(),
            gas_estimate,
            approval: request.approval().cloned(),
            canonical: Vec::new(),
        };
        disclosure.canonical = disclosure.encode_canonical().into_bytes();
        disclosure
    }

    /// The request this disclosure belongs to.
    #[must_use]
    pub const fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// The target chain id.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// The target network classification.
    #[must_use]
    pub const fn network(&self) -> NetworkLabel {
        self.network
    }

    /// The target address.
    #[must_use]
    pub const fn target(&self) -> Address {
        self.target
    }

    /// The function being invoked.
    #[must_use]
    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// Call arguments.
    #[must_use]
    pub fn args(&self) -> &[serde_json::Value] {
        &self.args
    }

    /// Native value in wei.
    #[must_use]
    pub const fn declared_value(&self) -> U256 {
        self.declared_value
    }

    /// Simulated gas estimate.
    #[must_use]
    pub const fn gas_estimate(&self) -> u64 {
        self.gas_estimate
    }

    /// Approval facts, for approval requests.
    #[must_use]
    pub const fn approval(&self) -> Option<&ApprovalDisclosure> {
        self.approval.as_ref()
    }

    /// The canonical encoding of the disclosed fields.
    #[must_use]
    pub fn canonical_bytes(&self) -> &[u8] {
        &self.canonical
    }

    /// SHA-256 of [`Self::canonical_bytes`].
    #[must_use]
    pub fn digest(&self) -> [u8; 32] {
        Sha256::digest(&self.canonical).into()
    }

    /// Render the disclosure for a human prompt, framed by the configured text.
    #[must_use]
    pub fn render(&self, prompt: &crate::config::PromptConfig) -> String {
        let mut out = String::new();
        if !prompt.preamble.is_empty() {
            let _ = writeln!(out, "{}", prompt.preamble);
            out.push('\n');
        }
        let _ = write!(out, "{self}");
        if !prompt.decline_hint.is_empty() {
            out.push('\n');
            let _ = writeln!(out, "{}", prompt.decline_hint);
        }
        out
    }

    // One `key=value` line per field, in a fixed order.
    fn encode_canonical(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "request_id={}", self.request_id);
        let _ = writeln!(out, "chain_id={}", self.chain_id);
        let _ = writeln!(out, "network={}", self.network);
        let _ = writeln!(out, "target={}", self.target);
        let _ = writeln!(out, "function={}", self.function_name);
        let _ = writeln!(
            out,
            "args={}",
            serde_json::Value::Array(self.args.clone())
        );
        let _ = writeln!(out, "value={}", self.declared_value);
        let _ = writeln!(out, "gas_estimate={}", self.gas_estimate);
        if let Some(approval) = &self.approval {
            let _ = writeln!(out, "approval.token={}", approval.token());
            let _ = writeln!(out, "approval.spender={}", approval.spender());
            let _ = writeln!(out, "approval.amount={}", approval.amount());
            let _ = writeln!(out, "approval.risk={}", approval.risk());
        }
        out
    }
}

impl fmt::Display for Disclosure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Request:      {}", self.request_id)?;
        writeln!(f, "Network:      {} (chain id {})", self.network, self.chain_id)?;
        writeln!(f, "Target:       {}", self.target)?;
        writeln!(f, "Function:     {}", self.function_name)?;
        if !self.args.is_empty() {
            writeln!(f, "Arguments:    {}", serde_json::Value::Array(self.args.clone()))?;
        }
        writeln!(f, "Value (wei):  {}", self.declared_value)?;
        writeln!(f, "Gas estimate: {}", self.gas_estimate)?;
        if let Some(approval) = &self.approval {
            writeln!(f, "Approval:")?;
            writeln!(f, "  Token:      {}", approval.token())?;
            writeln!(f, "  Spender:    {}", approval.spender())?;
            writeln!(f, "  Amount:     {}", approval.amount())?;
            writeln!(f, "  Risk:       {}", approval.risk())?;
            if approval.risk() == ApprovalRisk::Infinite {
                writeln!(
                    f,
                    "  WARNING: the spender may transfer your entire token balance at any time."
                )?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// ConfirmationRecord
// ============================================================================

/// Proof that a human explicitly acknowledged one disclosure.
///
/// Records are neither `Clone` nor constructible for a disclosure that
/// belongs to a different request.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct ConfirmationRecord {
    request_id: RequestId,
    disclosed: Disclosure,
    confirmed_at: DateTime<Utc>,
}

impl ConfirmationRecord {
    /// Create a record for `disclosure`, or `None` if the disclosure belongs
    /// to a different request.
    #[must_use]
    pub fn new(
        request_id: &RequestId,
        disclosure: &Disclosure,
        confirmed_at: DateTime<Utc>,
    ) -> Option<Self> {
        if disclosure.request_id() != request_id {
            return None;
        }
        Some(Self {
            request_id: request_id.clone(),
            disclosed: disclosure.clone(),
            confirmed_at,
        })
    }

    /// The confirmed request.
    #[must_use]
    pub const fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// The disclosure snapshot the human saw.
    #[must_use]
    pub const fn disclosed(&self) -> &Disclosure {
        &self.disclosed
    }

    /// When the acknowledgement was recorded.
    #[must_use]
    pub const fn confirmed_at(&self) -> DateTime<Utc> {
        self.confirmed_at
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

/// States of the per-request state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Created, nothing checked yet.
    Idle,
    /// The chain id is on the allow-list.
    ChainValidated,
    /// Simulation succeeded.
    Simulated,
    /// The disclosure was built.
    Disclosed,
    /// A human acknowledged the disclosure.
    Confirmed,
    /// The external signer returned a payload matching the disclosure.
    Signed,
    /// The signed payload was handed to the network.
    Submitted,
    /// Waiting for a receipt.
    Monitoring,
    /// Included and executed successfully.
    Succeeded,
    /// Included and reverted, or rejected after signing.
    Failed,
    /// Stopped before signing.
    Aborted,
}

impl LifecycleState {
    /// Returns `true` for `Succeeded`, `Failed` and `Aborted`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Aborted)
    }

    /// Returns `true` while the request can still be abandoned.
    ///
    /// Once signed, the payload is outside the gate's control.
    #[must_use]
    pub const fn can_abort(self) -> bool {
        matches!(
            self,
            Self::Idle | Self::ChainValidated | Self::Simulated | Self::Disclosed | Self::Confirmed
        )
    }

    /// The snake_case name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ChainValidated => "chain_validated",
            Self::Simulated => "simulated",
            Self::Disclosed => "disclosed",
            Self::Confirmed => "confirmed",
            Self::Signed => "signed",
            Self::Submitted => "submitted",
            Self::Monitoring => "monitoring",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations a caller can request of a lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleOperation {
    /// Check the chain id against the allow-list.
    ValidateChain,
    /// Run the pre-submission simulation.
    Simulate,
    /// Build the disclosure.
    Disclose,
    /// Record the human acknowledgement.
    Confirm,
    /// Evaluate the mainnet promotion guard.
    CheckPromotion,
    /// Obtain the external signature.
    Sign,
    /// Submit the signed payload.
    Broadcast,
    /// Wait for the receipt.
    Monitor,
    /// Abandon the request.
    Abort,
    /// Report a terminal lifecycle.
    Finish,
}

impl fmt::Display for LifecycleOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ValidateChain => "validate_chain",
            Self::Simulate => "simulate",
            Self::Disclose => "disclose",
            Self::Confirm => "confirm",
            Self::CheckPromotion => "check_promotion",
            Self::Sign => "sign",
            Self::Broadcast => "broadcast",
            Self::Monitor => "monitor",
            Self::Abort => "abort",
            Self::Finish => "finish",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Tests
// ============================================================================
