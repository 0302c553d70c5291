//! The gate that owns the shared components.
//!
//! A [`SafetyGate`] is built once and shared by every lifecycle it starts.
//! It is cheap to clone; clones share the same registry, capability guard,
//! simulation records, confirmation ledger and in-flight set.
//!
//! # Example
//!
//! ```
//! use avagate::gate::SafetyGate;
//! use avagate_core::types::{ChainContext, LifecycleState, TransactionRequest};
//! use avagate_core::Address;
//!
//! let gate = SafetyGate::new();
//! let request = TransactionRequest::builder(
//!     Address::repeat_byte(0x11),
//!     "deposit",
//!     ChainContext::classify(43113),
//! )
//! .build();
//!
//! let mut lifecycle = gate.begin(request).expect("fresh id");
//! assert_eq!(lifecycle.validate_chain().expect("fuji"), LifecycleState::ChainValidated);
//! ```

use std::sync::Arc;

use avagate_chain::{CapabilityGuard, ChainRegistry, Session};
use avagate_core::config::{Config, PromptConfig};
use avagate_core::config_loader::expand_path;
use avagate_core::error::{ConfigError, GateResult};
use avagate_core::types::{ChainContext, LifecycleState, RequestId, TransactionRequest};
use avagate_policy::{ConfirmationLedger, DisclosureBuilder, PromotionGuard, SimulationGate};

use crate::audit::{AuditError, AuditLogger};
use crate::inflight::InFlightRegistry;
use crate::lifecycle::TransactionLifecycle;

/// Errors building a gate from configuration.
#[derive(Debug, thiserror::Error)]
pub enum GateInitError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The audit trail could not be opened.
    #[error(transparent)]
    Audit(#[from] AuditError),
}

/// Components shared by every lifecycle of one gate.
#[derive(Debug, Default)]
pub(crate) struct Components {
    pub(crate) registry: ChainRegistry,
    pub(crate) capabilities: CapabilityGuard,
    pub(crate) simulations: SimulationGate,
    pub(crate) disclosures: DisclosureBuilder,
    pub(crate) confirmations: ConfirmationLedger,
    pub(crate) promotion: PromotionGuard,
    pub(crate) in_flight: InFlightRegistry,
}

/// Entry point: validates nothing itself, but hands out lifecycles wired to
/// the shared components.
#[derive(Debug, Clone, Default)]
pub struct SafetyGate {
    components: Arc<Components>,
    audit: Option<Arc<AuditLogger>>,
    prompt: Arc<PromptConfig>,
}

impl SafetyGate {
    /// A gate with default endpoints and prompt text, without an audit trail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A gate built from configuration.
    ///
    /// Opens the audit trail (creating its key on first use) when
    /// `config.audit.enabled` is set.
    ///
    /// # Errors
    ///
    /// Returns [`GateInitError::Config`] for an invalid configuration and
    /// [`GateInitError::Audit`] if the audit trail cannot be opened.
    pub fn from_config(config: &Config) -> Result<Self, GateInitError> {
        config.validate()?;

        let components = Components {
            registry: ChainRegistry::from_config(&config.chains),
            ..Components::default()
        };

        let audit = if config.audit.enabled {
            let dir = expand_path(&config.audit.directory)?;
            Some(Arc::new(AuditLogger::open_or_create(&dir)?))
        } else {
            None
        };

        tracing::info!(
            audit = audit.is_some(),
            chains = ?components.registry.supported_chain_ids(),
            "safety gate ready"
        );

        Ok(Self {
            components: Arc::new(components),
            audit,
            prompt: Arc::new(config.prompt.clone()),
        })
    }

    /// Record every transition of lifecycles started from this gate.
    ///
    /// Lifecycles already started keep their previous setting.
    #[must_use]
    pub fn with_audit(mut self, logger: AuditLogger) -> Self {
        self.audit = Some(Arc::new(logger));
        self
    }

    /// Start a lifecycle for `request`, claiming its id.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::DuplicateInFlight`](avagate_core::error::GateError::DuplicateInFlight)
    /// if a lifecycle for the same id is still alive.
    pub fn begin(&self, request: TransactionRequest) -> GateResult<TransactionLifecycle> {
        let claim = self.components.in_flight.claim(request.id())?;
        Ok(TransactionLifecycle::new(
            request,
            Arc::clone(&self.components),
            self.audit.clone(),
            claim,
        ))
    }

    /// Start one lifecycle per request.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateInFlight` if any id is already in flight or repeated
    /// within `requests`; no lifecycle is kept in that case.
    pub fn begin_batch(&self, requests: Vec<TransactionRequest>) -> GateResult<Batch> {
        let lifecycles = requests
            .into_iter()
            .map(|request| self.begin(request))
            .collect::<GateResult<Vec<_>>>()?;
        Ok(Batch { lifecycles })
    }

    /// Open a capability session for `chain`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedChain` if `chain` is not allow-listed.
    pub fn open_session(&self, chain: ChainContext) -> GateResult<Session> {
        self.components.capabilities.open_session(chain)
    }

    /// The network allow-list.
    #[must_use]
    pub fn registry(&self) -> &ChainRegistry {
        &self.components.registry
    }

    /// The capability guard lifecycles check handles against.
    #[must_use]
    pub fn capabilities(&self) -> &CapabilityGuard {
        &self.components.capabilities
    }

    /// The simulation records.
    #[must_use]
    pub fn simulations(&self) -> &SimulationGate {
        &self.components.simulations
    }

    /// The confirmation ledger.
    #[must_use]
    pub fn confirmations(&self) -> &ConfirmationLedger {
        &self.components.confirmations
    }

    /// Ids with a live lifecycle.
    #[must_use]
    pub fn in_flight(&self) -> &InFlightRegistry {
        &self.components.in_flight
    }

    /// Wording for [`HumanPrompt`](avagate_core::interfaces::HumanPrompt)
    /// implementations.
    #[must_use]
    pub fn prompt(&self) -> &PromptConfig {
        &self.prompt
    }

    /// The audit trail, if enabled.
    #[must_use]
    pub fn audit(&self) -> Option<&AuditLogger> {
        self.audit.as_deref()
    }
}

/// Independent lifecycles for several requests.
///
/// Members are only reachable one at a time by id; every member needs its own
/// confirmation.
#[derive(Debug)]
pub struct Batch {
    lifecycles: Vec<TransactionLifecycle>,
}

impl Batch {
    /// The lifecycle for `id`.
    #[must_use]
    pub fn get(&self, id: &RequestId) -> Option<&TransactionLifecycle> {
        self.lifecycles.iter().find(|l| l.id() == id)
    }

    /// The lifecycle for `id`, mutably.
    pub fn get_mut(&mut self, id: &RequestId) -> Option<&mut TransactionLifecycle> {
        self.lifecycles.iter_mut().find(|l| l.id() == id)
    }

    /// Member ids in submission order.
    #[must_use]
    pub fn ids(&self) -> Vec<RequestId> {
        self.lifecycles.iter().map(|l| l.id().clone()).collect()
    }

    /// Current state of every member, in submission order.
    #[must_use]
    pub fn states(&self) -> Vec<(RequestId, LifecycleState)> {
        self.lifecycles
            .iter()
            .map(|l| (l.id().clone(), l.state()))
            .collect()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lifecycles.len()
    }

    /// Returns `true` for an empty batch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lifecycles.is_empty()
    }

    /// Split into individual lifecycles.
    #[must_use]
    pub fn into_lifecycles(self) -> Vec<TransactionLifecycle> {
        self.lifecycles
    }
}
