//! Testnet-to-mainnet promotion control.
//!
//! Mainnet requests need three things before they may be signed: the flow was
//! validated on testnet, it was exercised against a mainnet fork, and the
//! human explicitly acknowledged that this is mainnet. Testnet requests are
//! not subject to the guard.
//!
//! # Example
//!
//! ```
//! use avagate_core::types::{ChainContext, TransactionRequest};
//! use avagate_core::Address;
//! use avagate_policy::{PromotionEvidence, PromotionGuard};
//!
//! let guard = PromotionGuard::new();
//! let request = TransactionRequest::builder(
//!     Address::ZERO,
//!     "deposit",
//!     ChainContext::classify(43114),
//! )
//! .build();
//!
//! let evidence = PromotionEvidence::new(true, true);
//! assert!(guard.authorize_promotion(&request, &evidence, true));
//! assert!(!guard.authorize_promotion(&request, &evidence, false));
//! ```

use std::fmt;

use avagate_core::error::{GateError, GateResult};
use avagate_core::types::TransactionRequest;

/// Evidence that a flow was exercised before mainnet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PromotionEvidence {
    /// The same flow completed on testnet.
    pub testnet_validated: bool,
    /// The flow was run against a mainnet fork.
    pub fork_tested: bool,
}

impl PromotionEvidence {
    /// Create evidence.
    #[must_use]
    pub const fn new(testnet_validated: bool, fork_tested: bool) -> Self {
        Self {
            testnet_validated,
            fork_tested,
        }
    }
}

/// A promotion precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromotionCondition {
    /// [`PromotionEvidence::testnet_validated`].
    TestnetValidated,
    /// [`PromotionEvidence::fork_tested`].
    ForkTested,
    /// The human acknowledged the mainnet target.
    ExplicitMainnetAck,
}

impl PromotionCondition {
    /// Stable name of the condition.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TestnetValidated => "testnet_validated",
            Self::ForkTested => "fork_tested",
            Self::ExplicitMainnetAck => "explicit_mainnet_ack",
        }
    }
}

impl fmt::Display for PromotionCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionCheck {
    /// The request does not target mainnet.
    NotRequired,
    /// Every condition holds.
    Authorized,
    /// Some conditions are missing.
    Blocked {
        /// The unmet conditions, in a fixed order.
        missing: Vec<PromotionCondition>,
    },
}

impl PromotionCheck {
    /// Returns `true` unless the check is [`PromotionCheck::Blocked`].
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        !matches!(self, Self::Blocked { .. })
    }
}

/// Gates mainnet requests on promotion evidence.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromotionGuard;

impl PromotionGuard {
    /// Create a guard.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Evaluate the guard for `request`.
    #[must_use]
    pub fn evaluate(
        &self,
        request: &TransactionRequest,
        evidence: &PromotionEvidence,
        explicit_mainnet_ack: bool,
    ) -> PromotionCheck {
        if !request.chain().is_mainnet() {
            return PromotionCheck::NotRequired;
        }

        let missing: Vec<_> = [
            (evidence.testnet_validated, PromotionCondition::TestnetValidated),
            (evidence.fork_tested, PromotionCondition::ForkTested),
            (explicit_mainnet_ack, PromotionCondition::ExplicitMainnetAck),
        ]
        .into_iter()
        .filter_map(|(met, condition)| (!met).then_some(condition))
        .collect();

        if missing.is_empty() {
            PromotionCheck::Authorized
        } else {
            PromotionCheck::Blocked { missing }
        }
    }

    /// Returns `true` if `request` may proceed to signing.
    #[must_use]
    pub fn authorize_promotion(
        &self,
        request: &TransactionRequest,
        evidence: &PromotionEvidence,
        explicit_mainnet_ack: bool,
    ) -> bool {
        self.evaluate(request, evidence, explicit_mainnet_ack)
            .is_allowed()
    }

    /// Like [`authorize_promotion`](Self::authorize_promotion), as a `Result`.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::PromotionBlocked`] naming every unmet condition.
    pub fn require_promotion(
        &self,
        request: &TransactionRequest,
        evidence: &PromotionEvidence,
        explicit_mainnet_ack: bool,
    ) -> GateResult<()> {
        match self.evaluate(request, evidence, explicit_mainnet_ack) {
            PromotionCheck::NotRequired | PromotionCheck::Authorized => Ok(()),
            PromotionCheck::Blocked { missing } => {
                tracing::warn!(
                    request_id = %request.id(),
                    missing = ?missing,
                    "mainnet promotion blocked"
                );
                Err(GateError::promotion_blocked(
                    request.id().clone(),
                    missing.iter().map(ToString::to_string).collect(),
                ))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
