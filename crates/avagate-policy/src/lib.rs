//! # avagate-policy
//!
//! The checks every write intent must pass before a signature is requested.
//!
//! ## Internal Crate Warning
//!
//! **This crate is an internal implementation detail of `avagate`.**
//! The API is **unstable**; depend on the `avagate` crate instead.
//!
//! ## Modules
//!
//! - [`simulation`] - Single-write pre-submission simulation
//! - [`disclosure`] - Disclosure assembly from simulated requests
//! - [`confirmation`] - Per-request human confirmation ledger
//! - [`promotion`] - Testnet-to-mainnet promotion guard
//!
//! Each component is `Send + Sync` and keeps its own state; the orchestration
//! lives in `avagate::lifecycle`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod confirmation;
pub mod disclosure;
pub mod promotion;
pub mod simulation;

pub use confirmation::ConfirmationLedger;
pub use disclosure::DisclosureBuilder;
pub use promotion::{PromotionCheck, PromotionCondition, PromotionEvidence, PromotionGuard};
pub use simulation::SimulationGate;
