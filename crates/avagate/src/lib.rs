//! # avagate
//!
//! Transaction-safety gate for Avalanche C-Chain write intents.
//!
//! Every write intent passes through one [`TransactionLifecycle`] before a
//! signature is requested and before a signed payload is broadcast:
//!
//! 1. the chain id must be Avalanche mainnet (43114) or Fuji (43113)
//! 2. the transaction is simulated, and any failure ends the request
//! 3. a disclosure is built, including approval risk for `approve` calls
//! 4. a human confirms that one disclosure, for that one request
//! 5. mainnet requests need testnet and fork evidence plus an explicit ack
//! 6. an external signer signs exactly the confirmed fields
//! 7. an external broadcaster submits it and the receipt decides the outcome
//!
//! Signing, transport and the human prompt are collaborators injected through
//! the traits in [`avagate_core::interfaces`]; the gate never holds keys.
//!
//! ## Modules
//!
//! - [`gate`] - [`SafetyGate`], the shared components and batch helper
//! - [`lifecycle`] - The per-request state machine
//! - [`inflight`] - One live lifecycle per request id
//! - [`audit`] - HMAC-chained audit trail of transitions
//! - [`logging`] - `tracing` subscriber setup and redaction
//!
//! ## Example
//!
//! ```
//! use avagate::SafetyGate;
//! use avagate_core::types::{ChainContext, LifecycleState, TransactionRequest};
//! use avagate_core::Address;
//!
//! let gate = SafetyGate::new();
//! let request = TransactionRequest::builder(Address::ZERO, "deposit", ChainContext::classify(1))
//!     .build();
//!
//! let mut lifecycle = gate.begin(request).expect("fresh id");
//! let err = lifecycle.validate_chain().unwrap_err();
//! assert_eq!(err.code(), "unsupported_chain");
//! assert_eq!(lifecycle.state(), LifecycleState::Aborted);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod audit;
pub mod gate;
pub mod inflight;
pub mod lifecycle;
pub mod logging;

pub use audit::{AuditEntry, AuditError, AuditLogger, LifecycleTransition, VerifyResult};
pub use gate::{Batch, GateInitError, SafetyGate};
pub use inflight::{InFlightClaim, InFlightRegistry};
pub use lifecycle::{LifecycleReport, TransactionLifecycle, Unfinished};
pub use logging::{
    init_logging, redact_sensitive, verbosity_to_level, LogConfig, LogError, LogFormat, LogGuard,
    LogLevel,
};

pub use avagate_chain::{Capability, CapabilityGuard, ChainRegistry, EndpointApproval, Session};
pub use avagate_policy::PromotionEvidence;
