//! Error types for the `avagate` transaction-safety gate.
//!
//! This module provides the error taxonomy for every failure mode of the gate:
//!
//! - [`GateError`] - A refused or failed gate step, carrying its context
//! - [`LifecycleError`] - A [`GateError`] bound to the request id and state it occurred in
//! - [`CollaboratorError`] - Failures reported by external simulators, signers,
//!   broadcasters and prompts
//! - [`ConfigError`] - Configuration failures
//!
//! None of these errors triggers a retry. Recovery means building a fresh
//! `TransactionRequest`, which forces a fresh simulation and confirmation.
//!
//! # Example
//!
//! ```rust
//! use avagate_core::error::GateError;
//! use avagate_core::types::RequestId;
//!
//! let id = RequestId::from_string("req-7");
//! let err = GateError::simulation_failure(id, "insufficient funds");
//!
//! assert_eq!(err.code(), "simulation_failure");
//! assert!(err.to_string().contains("insufficient funds"));
//! ```

use crate::types::{LifecycleOperation, LifecycleState, OperationKind, RequestId, Role};

// ============================================================================
// GateError
// ============================================================================

/// Errors raised by the gate components.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// The chain id is not on the allow-list.
    #[error("unsupported chain: {chain_id} is not an allow-listed network")]
    UnsupportedChain {
        /// The rejected chain id.
        chain_id: u64,
    },

    /// The RPC endpoint is not trusted and no out-of-band approval was supplied.
    #[error("untrusted endpoint for chain {chain_id}: {endpoint}")]
    UntrustedEndpoint {
        /// The chain the endpoint claims to serve.
        chain_id: u64,
        /// The endpoint URL.
        endpoint: String,
    },

    /// A capability handle was used outside its role or scope.
    #[error("capability violation: {role} handle cannot {operation} ({reason})")]
    CapabilityViolation {
        /// Role of the handle that was used.
        role: Role,
        /// The attempted operation.
        operation: OperationKind,
        /// Why the use was refused.
        reason: String,
    },

    /// The request already has a simulation result.
    #[error("request {request_id} was already simulated")]
    AlreadySimulated {
        /// The request id.
        request_id: RequestId,
    },

    /// The simulation reported failure.
    #[error("simulation failed for request {request_id}: {reason}")]
    SimulationFailure {
        /// The request id.
        request_id: RequestId,
        /// Reason reported by the simulator (or the transport error).
        reason: String,
    },

    /// A disclosure was requested for a request whose simulation did not succeed.
    #[error("request {request_id} has no successful simulation")]
    IncompleteSimulation {
        /// The request id.
        request_id: RequestId,
    },

    /// An approval request is missing its approval disclosure.
    #[error("approval request {request_id} is missing its approval disclosure")]
    MissingApprovalDisclosure {
        /// The request id.
        request_id: RequestId,
    },

    /// The human did not acknowledge the disclosure.
    #[error("confirmation denied for request {request_id}: {reason}")]
    ConfirmationDenied {
        /// The request id.
        request_id: RequestId,
        /// Why no confirmation was recorded.
        reason: String,
    },

    /// A confirmation already exists for the request.
    #[error("request {request_id} is already confirmed")]
    DuplicateConfirmation {
        /// The request id.
        request_id: RequestId,
    },

    /// Mainnet promotion evidence is incomplete.
    #[error("mainnet promotion blocked for request {request_id}: missing {}", .missing.join(", "))]
    PromotionBlocked {
        /// The request id.
        request_id: RequestId,
        /// Names of the conditions that were not met.
        missing: Vec<String>,
    },

    /// The operation is not permitted in the current state.
    #[error("invalid transition for request {request_id}: cannot {operation} from {from}")]
    InvalidTransition {
        /// The request id.
        request_id: RequestId,
        /// The state the lifecycle was in.
        from: LifecycleState,
        /// The refused operation.
        operation: LifecycleOperation,
    },

    /// Another lifecycle already owns this request id.
    #[error("request {request_id} already has a lifecycle in flight")]
    DuplicateInFlight {
        /// The request id.
        request_id: RequestId,
    },

    /// The signer returned a payload for different disclosed fields.
    #[error("signed payload for request {request_id} does not match the confirmed disclosure")]
    SignatureMismatch {
        /// The request id.
        request_id: RequestId,
    },

    /// An external collaborator failed.
    #[error("collaborator failed for request {request_id}: {source}")]
    Collaborator {
        /// The request id.
        request_id: RequestId,
        /// The collaborator's error.
        #[source]
        source: CollaboratorError,
    },
}

impl GateError {
    /// Create an `UnsupportedChain` error.
    #[must_use]
    pub const fn unsupported_chain(chain_id: u64) -> Self {
        Self::UnsupportedChain { chain_id }
    }

    /// Create an `UntrustedEndpoint` error.
    #[must_use]
    pub fn untrusted_endpoint(chain_id: u64, endpoint: impl Into<String>) -> Self {
        Self::UntrustedEndpoint {
            chain_id,
            endpoint: endpoint.into(),
        }
    }

    /// Create a `CapabilityViolation` error.
    #[must_use]
    pub fn capability_violation(
        role: Role,
        operation: OperationKind,
        reason: impl Into<String>,
    ) -> Self {
        Self::CapabilityViolation {
            role,
            operation,
            reason: reason.into(),
        }
    }

    /// Create an `AlreadySimulated` error.
    #[must_use]
    pub const fn already_simulated(request_id: RequestId) -> Self {
        Self::AlreadySimulated { request_id }
    }

    /// Create a `SimulationFailure` error.
    #[must_use]
    pub fn simulation_failure(request_id: RequestId, reason: impl Into<String>) -> Self {
        Self::SimulationFailure {
            request_id,
            reason: reason.into(),
        }
    }

    /// Create an `IncompleteSimulation` error.
    #[must_use]
    pub const fn incomplete_simulation(request_id: RequestId) -> Self {
        Self::IncompleteSimulation { request_id }
    }

    /// Create a `MissingApprovalDisclosure` error.
    #[must_use]
    pub const fn missing_approval_disclosure(request_id: RequestId) -> Self {
        Self::MissingApprovalDisclosure { request_id }
    }

    /// Create a `ConfirmationDenied` error.
    #[must_use]
    pub fn confirmation_denied(request_id: RequestId, reason: impl Into<String>) -> Self {
        Self::ConfirmationDenied {
            request_id,
            reason: reason.into(),
        }
    }

    /// Create a `DuplicateConfirmation` error.
    #[must_use]
    pub const fn duplicate_confirmation(request_id: RequestId) -> Self {
        Self::DuplicateConfirmation { request_id }
    }

    /// Create a `PromotionBlocked` error.
    #[must_use]
    pub const fn promotion_blocked(request_id: RequestId, missing: Vec<String>) -> Self {
        Self::PromotionBlocked {
            request_id,
            missing,
        }
    }

    /// Create an `InvalidTransition` error.
    #[must_use]
    pub const fn invalid_transition(
        request_id: RequestId,
        from: LifecycleState,
        operation: LifecycleOperation,
    ) -> Self {
        Self::InvalidTransition {
            request_id,
            from,
            operation,
        }
    }

    /// Create a `DuplicateInFlight` error.
    #[must_use]
    pub const fn duplicate_in_flight(request_id: RequestId) -> Self {
        Self::DuplicateInFlight { request_id }
    }

    /// Create a `SignatureMismatch` error.
    #[must_use]
    pub const fn signature_mismatch(request_id: RequestId) -> Self {
        Self::SignatureMismatch { request_id }
    }

    /// Create a `Collaborator` error.
    #[must_use]
    pub const fn collaborator(request_id: RequestId, source: CollaboratorError) -> Self {
        Self::Collaborator { request_id, source }
    }

    /// A stable snake_case code for the error kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedChain { .. } => "unsupported_chain",
            Self::UntrustedEndpoint { .. } => "untrusted_endpoint",
            Self::CapabilityViolation { .. } => "capability_violation",
            Self::AlreadySimulated { .. } => "already_simulated",
            Self::SimulationFailure { .. } => "simulation_failure",
            Self::IncompleteSimulation { .. } => "incomplete_simulation",
            Self::MissingApprovalDisclosure { .. } => "missing_approval_disclosure",
            Self::ConfirmationDenied { .. } => "confirmation_denied",
            Self::DuplicateConfirmation { .. } => "duplicate_confirmation",
            Self::PromotionBlocked { .. } => "promotion_blocked",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::DuplicateInFlight { .. } => "duplicate_in_flight",
            Self::SignatureMismatch { .. } => "signature_mismatch",
            Self::Collaborator { .. } => "collaborator",
        }
    }

    /// The request the error concerns, when it concerns one.
    #[must_use]
    pub const fn request_id(&self) -> Option<&RequestId> {
        match self {
            Self::UnsupportedChain { .. }
            | Self::UntrustedEndpoint { .. }
            | Self::CapabilityViolation { .. } => None,
            Self::AlreadySimulated { request_id }
            | Self::SimulationFailure { request_id, .. }
            | Self::IncompleteSimulation { request_id }
            | Self::MissingApprovalDisclosure { request_id }
            | Self::ConfirmationDenied { request_id, .. }
            | Self::DuplicateConfirmation { request_id }
            | Self::PromotionBlocked { request_id, .. }
            | Self::InvalidTransition { request_id, .. }
            | Self::DuplicateInFlight { request_id }
            | Self::SignatureMismatch { request_id }
            | Self::Collaborator { request_id, .. } => Some(request_id),
        }
    }

    /// Returns `true` if the error rejects a call without touching the
    /// lifecycle it was issued against.
    ///
    /// Out-of-order calls and id collisions are caller mistakes; every other
    /// error is terminal for the request.
    #[must_use]
    pub const fn is_rejection_only(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransition { .. } | Self::DuplicateInFlight { .. }
        )
    }
}

// ============================================================================
// LifecycleError
// ============================================================================

/// A gate error bound to the request and the state it occurred in.
#[derive(Debug, thiserror::Error)]
#[error("request {request_id} failed in state {state}: {error}")]
pub struct LifecycleError {
    /// The request id.
    pub request_id: RequestId,
    /// The lifecycle state when the error occurred.
    pub state: LifecycleState,
    /// The underlying error.
    #[source]
    pub error: GateError,
}

impl LifecycleError {
    /// Bind an error to a request and state.
    #[must_use]
    pub const fn new(request_id: RequestId, state: LifecycleState, error: GateError) -> Self {
        Self {
            request_id,
            state,
            error,
        }
    }

    /// The underlying error's code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.error.code()
    }
}

// ============================================================================
// CollaboratorError
// ============================================================================

/// Errors reported by external collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    /// The collaborator could not be reached or answered ambiguously.
    #[error("transport error: {context}")]
    Transport {
        /// Transport details.
        context: String,
    },

    /// The collaborator refused the request.
    #[error("rejected: {context}")]
    Rejected {
        /// Why it was refused.
        context: String,
    },
}

impl CollaboratorError {
    /// Create a `Transport` error.
    #[must_use]
    pub fn transport(context: impl Into<String>) -> Self {
        Self::Transport {
            context: context.into(),
        }
    }

    /// Create a `Rejected` error.
    #[must_use]
    pub fn rejected(context: impl Into<String>) -> Self {
        Self::Rejected {
            context: context.into(),
        }
    }
}

// ============================================================================
// ConfigError
// ============================================================================

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Failed to parse the configuration file.
    #[error("failed to parse configuration: {context}")]
    ParseFailed {
        /// Context about the parsing failure.
        context: String,
    },

    /// A configuration value is invalid.
    #[error("invalid value for {field}: {value}")]
    InvalidValue {
        /// The field name with the invalid value.
        field: String,
        /// The invalid value.
        value: String,
    },

    /// The home directory could not be determined.
    #[error("could not determine home directory")]
    NoHomeDirectory,

    /// File system I/O error.
    #[error("{context}: {source}")]
    Io {
        /// What was being done.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create a `FileNotFound` error.
    #[must_use]
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a `ParseFailed` error.
    #[must_use]
    pub fn parse_failed(context: impl Into<String>) -> Self {
        Self::ParseFailed {
            context: context.into(),
        }
    }

    /// Create an `InvalidValue` error.
    #[must_use]
    pub fn invalid_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a `NoHomeDirectory` error.
    #[must_use]
    pub const fn no_home_directory() -> Self {
        Self::NoHomeDirectory
    }

    /// Create an `Io` error.
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

// ============================================================================
// Result type aliases
// ============================================================================

/// A `Result` type alias for gate component operations.
pub type GateResult<T> = std::result::Result<T, GateError>;

/// A `Result` type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// ============================================================================
// Unit Tests
// ============================================================================
