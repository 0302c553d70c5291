//! # avagate-core
//!
//! Core types, traits, and error definitions for the `avagate` transaction-safety gate.
//!
//! ## Internal Crate Warning
//!
//! **This crate is an internal implementation detail of `avagate`.**
//!
//! The API is **unstable** and may change without notice between any versions.
//! Depend on the `avagate` crate instead.
//!
//! This crate provides the foundational types shared across all `avagate` crates:
//!
//! ## Modules
//!
//! - [`error`] - The gate error taxonomy and result aliases
//! - [`types`] - Core data types ([`ChainContext`], [`TransactionRequest`], [`Disclosure`], ...)
//! - [`interfaces`] - Traits for the external simulator, signer, broadcaster and human prompt
//! - [`config`] - Configuration types
//! - [`config_loader`] - Loading and saving `~/.avagate/config.toml`
//!
//! ## Example
//!
//! ```rust
//! use avagate_core::{ChainContext, GateError, NetworkLabel};
//!
//! let fuji = ChainContext::classify(43113);
//! assert_eq!(fuji.label(), NetworkLabel::Testnet);
//! assert!(fuji.is_allowlisted());
//!
//! let ethereum = ChainContext::classify(1);
//! assert_eq!(ethereum.label(), NetworkLabel::Rejected);
//!
//! let err = GateError::unsupported_chain(1);
//! assert_eq!(err.code(), "unsupported_chain");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod config_loader;
pub mod error;
pub mod interfaces;
pub mod types;

// Re-export commonly used error types at crate root for convenience
pub use error::{CollaboratorError, ConfigError, GateError, GateResult, LifecycleError};

// Re-export config types at crate root for convenience
pub use config::{
    AuditConfig, ChainsConfig, Config, ConfigBuilder, LoggingConfig, NetworkEndpoints,
    PromptConfig,
};

// Re-export config loader types at crate root for convenience
pub use config_loader::{expand_path, load_config, ConfigLoader};

// Re-export core types at crate root for convenience
pub use types::{
    ApprovalAmount, ApprovalDisclosure, ApprovalRisk, ChainContext, ConfirmationRecord,
    Disclosure, LifecycleOperation, LifecycleState, NetworkLabel, OperationKind, RequestId,
    RequestKind, Role, SimulationOutcome, SimulationResult, TransactionRequest,
    TransactionRequestBuilder, AVALANCHE_FUJI_CHAIN_ID, AVALANCHE_MAINNET_CHAIN_ID,
};

// Re-export collaborator traits at crate root for convenience
pub use interfaces::{
    Broadcaster, HumanPrompt, Receipt, ReceiptStatus, SignedPayload, Signer, SimulationReport,
    Simulator, TxHash,
};

// Re-export primitives used throughout the public API
pub use alloy_primitives::{Address, U256};
