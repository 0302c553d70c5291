//! # avagate-chain
//!
//! Network validation and capability separation for the `avagate`
//! transaction-safety gate.
//!
//! ## Internal Crate Warning
//!
//! **This crate is an internal implementation detail of `avagate`.**
//! The API is **unstable**; depend on the `avagate` crate instead.
//!
//! ## Modules
//!
//! - [`registry`] - The fixed network allow-list, per-network metadata and
//!   endpoint trust
//! - [`capability`] - Read/write capability handles and the guard that checks them
//!
//! ## Example
//!
//! ```
//! use avagate_chain::{CapabilityGuard, ChainRegistry};
//! use avagate_core::types::{OperationKind, Role};
//!
//! let registry = ChainRegistry::new();
//! let guard = CapabilityGuard::new();
//!
//! let chain = registry.validate(43113).expect("fuji is allow-listed");
//! let session = guard.open_session(chain).expect("session");
//! let reader = session.grant(Role::Read);
//!
//! assert!(guard.authorize(&reader, OperationKind::Simulate).is_ok());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod capability;
pub mod registry;

pub use capability::{Capability, CapabilityGuard, Session};
pub use registry::{ChainRegistry, EndpointApproval, NetworkInfo};
