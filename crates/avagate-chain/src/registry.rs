//! Network allow-list and per-network metadata.
//!
//! This module provides the [`ChainRegistry`] that validates chain ids and RPC
//! endpoints before any request enters the gate.
//!
//! # Design
//!
//! The registry is:
//! - **Fixed**: only Avalanche C-Chain mainnet (43114) and Fuji (43113) exist;
//!   configuration can add trusted endpoints but never networks
//! - **Terminal on rejection**: an unsupported id fails with no retry path
//! - **Thread-safe**: `Arc` internally, read-only after construction
//!
//! # Example
//!
//! ```
//! use avagate_chain::ChainRegistry;
//!
//! let registry = ChainRegistry::new();
//!
//! let fuji = registry.validate(43113).expect("fuji is allow-listed");
//! assert!(!fuji.is_mainnet());
//!
//! assert!(registry.validate(1).is_err());
//! assert_eq!(registry.supported_chain_ids(), vec![43113, 43114]);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use avagate_core::config::{ChainsConfig, NetworkEndpoints};
use avagate_core::error::{GateError, GateResult};
use avagate_core::types::{
    ChainContext, NetworkLabel, AVALANCHE_FUJI_CHAIN_ID, AVALANCHE_MAINNET_CHAIN_ID,
};

/// Static facts about an allow-listed network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    /// The chain id.
    pub chain_id: u64,
    /// Mainnet or testnet.
    pub label: NetworkLabel,
    /// Human-readable network name.
    pub name: &'static str,
    /// Symbol of the native currency.
    pub native_symbol: &'static str,
    /// Block explorer base URL.
    pub explorer_url: &'static str,
    /// RPC endpoints trusted without further approval.
    pub trusted_endpoints: Vec<String>,
}

impl NetworkInfo {
    fn mainnet(endpoints: &NetworkEndpoints) -> Self {
        Self {
            chain_id: AVALANCHE_MAINNET_CHAIN_ID,
            label: NetworkLabel::Mainnet,
            name: "Avalanche C-Chain",
            native_symbol: "AVAX",
            explorer_url: "https://snowtrace.io",
            trusted_endpoints: normalize_all(&endpoints.rpc_endpoints),
        }
    }

    fn testnet(endpoints: &NetworkEndpoints) -> Self {
        Self {
            chain_id: AVALANCHE_FUJI_CHAIN_ID,
            label: NetworkLabel::Testnet,
            name: "Avalanche Fuji Testnet",
            native_symbol: "AVAX",
            explorer_url: "https://testnet.snowtrace.io",
            trusted_endpoints: normalize_all(&endpoints.rpc_endpoints),
        }
    }

    /// Returns `true` if `endpoint` is trusted for this network.
    #[must_use]
    pub fn trusts(&self, endpoint: &str) -> bool {
        let endpoint = normalize(endpoint);
        self.trusted_endpoints.iter().any(|e| e == endpoint)
    }
}

/// Out-of-band approval for an endpoint the registry does not trust.
///
/// An approval only counts when it names the exact endpoint, carries a
/// non-empty token, and records that the risks of a custom endpoint were
/// disclosed to the person granting it.
#[derive(Clone, PartialEq, Eq)]
pub struct EndpointApproval {
    /// The endpoint being approved.
    pub endpoint: String,
    /// Opaque approval token issued out of band.
    pub token: String,
    /// The person granting the approval saw the custom-endpoint risk disclosure.
    pub risk_disclosed: bool,
}

impl EndpointApproval {
    /// Create an approval.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>, risk_disclosed: bool) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            risk_disclosed,
        }
    }

    fn covers(&self, endpoint: &str) -> bool {
        self.risk_disclosed
            && !self.token.trim().is_empty()
            && normalize(&self.endpoint) == normalize(endpoint)
    }
}

impl std::fmt::Debug for EndpointApproval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointApproval")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("risk_disclosed", &self.risk_disclosed)
            .finish()
    }
}

/// Registry of allow-listed networks.
#[derive(Clone)]
pub struct ChainRegistry {
    networks: Arc<BTreeMap<u64, NetworkInfo>>,
}

impl ChainRegistry {
    /// Create a registry with the default public endpoints.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&ChainsConfig::default())
    }

    /// Create a registry trusting the configured endpoints.
    #[must_use]
    pub fn from_config(config: &ChainsConfig) -> Self {
        let mut networks = BTreeMap::new();
        networks.insert(AVALANCHE_MAINNET_CHAIN_ID, NetworkInfo::mainnet(&config.mainnet));
        networks.insert(AVALANCHE_FUJI_CHAIN_ID, NetworkInfo::testnet(&config.testnet));
        Self {
            networks: Arc::new(networks),
        }
    }

    /// Validate a chain id.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::UnsupportedChain`] if the id is not allow-listed.
    /// This is final; the registry has no retry or fallback path.
    pub fn validate(&self, chain_id: u64) -> GateResult<ChainContext> {
        let context = ChainContext::classify(chain_id);
        if !context.is_allowlisted() || !self.networks.contains_key(&chain_id) {
            tracing::warn!(chain_id, "rejected unsupported chain");
            return Err(GateError::unsupported_chain(chain_id));
        }
        tracing::debug!(chain_id, label = %context.label(), "chain validated");
        Ok(context)
    }

    /// Validate a chain id together with the RPC endpoint that will serve it.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::UnsupportedChain`] for ids outside the allow-list,
    /// and [`GateError::UntrustedEndpoint`] for an endpoint that is neither
    /// trusted nor covered by `approval`.
    ///
    /// # Example
    ///
    /// ```
    /// use avagate_chain::{ChainRegistry, EndpointApproval};
    ///
    /// let registry = ChainRegistry::new();
    /// let custom = "https://my-node.example.org/ext/bc/C/rpc";
    ///
    /// assert!(registry.validate_endpoint(43113, custom, None).is_err());
    ///
    /// let approval = EndpointApproval::new(custom, "ticket-8812", true);
    /// assert!(registry.validate_endpoint(43113, custom, Some(&approval)).is_ok());
    /// ```
    pub fn validate_endpoint(
        &self,
        chain_id: u64,
        endpoint: &str,
        approval: Option<&EndpointApproval>,
    ) -> GateResult<ChainContext> {
        let context = self.validate(chain_id)?;
        let trusted = self
            .networks
            .get(&chain_id)
            .is_some_and(|network| network.trusts(endpoint));

        if trusted {
            return Ok(context);
        }

        match approval {
            Some(approval) if approval.covers(endpoint) => {
                tracing::warn!(
                    chain_id,
                    endpoint,
                    "using custom endpoint under out-of-band approval"
                );
                Ok(context)
            }
            _ => {
                tracing::warn!(chain_id, endpoint, "rejected untrusted endpoint");
                Err(GateError::untrusted_endpoint(chain_id, endpoint))
            }
        }
    }

    /// Metadata for an allow-listed network.
    #[must_use]
    pub fn network(&self, chain_id: u64) -> Option<&NetworkInfo> {
        self.networks.get(&chain_id)
    }

    /// The allow-listed chain ids, ascending.
    #[must_use]
    pub fn supported_chain_ids(&self) -> Vec<u64> {
        self.networks.keys().copied().collect()
    }

    /// Check if a chain id is allow-listed.
    #[must_use]
    pub fn supports(&self, chain_id: u64) -> bool {
        self.networks.contains_key(&chain_id)
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChainRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainRegistry")
            .field("chains", &self.supported_chain_ids())
            .finish()
    }
}

fn normalize(endpoint: &str) -> &str {
    endpoint.trim().trim_end_matches('/')
}

fn normalize_all(endpoints: &[String]) -> Vec<String> {
    endpoints.iter().map(|e| normalize(e).to_string()).collect()
}

// ============================================================================
// Tests
// ============================================================================
