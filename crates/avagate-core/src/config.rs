//! Configuration types for the `avagate` transaction-safety gate.
//!
//! Configuration is stored in TOML format at `~/.avagate/config.toml`.
//!
//! Nothing here can widen the network allow-list or switch off simulation,
//! confirmation or promotion checks. Configuration only supplies trusted RPC
//! endpoints for the two allow-listed networks, prompt wording, logging and
//! the audit trail location.
//!
//! # Examples
//!
//! ```
//! use avagate_core::config::Config;
//!
//! let config = Config::default();
//! assert_eq!(config.logging.level, "info");
//! assert!(config.audit.enabled);
//!
//! let toml_str = Config::default_toml();
//! let parsed: Config = toml::from_str(&toml_str).expect("valid TOML");
//! assert_eq!(parsed, config);
//! ```
//!
//! # Default TOML Output
//!
//! ```toml
//! [chains.mainnet]
//! rpc_endpoints = ["https://api.avax.network/ext/bc/C/rpc"]
//!
//! [chains.testnet]
//! rpc_endpoints = ["https://api.avax-test.network/ext/bc/C/rpc"]
//!
//! [prompt]
//! preamble = "Review the transaction below before confirming."
//! decline_hint = "Declining aborts this request; a new request is required to retry."
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//!
//! [audit]
//! enabled = true
//! directory = "~/.avagate/audit"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Public RPC endpoint of the Avalanche C-Chain mainnet.
pub const DEFAULT_MAINNET_RPC: &str = "https://api.avax.network/ext/bc/C/rpc";

/// Public RPC endpoint of the Avalanche Fuji C-Chain testnet.
pub const DEFAULT_TESTNET_RPC: &str = "https://api.avax-test.network/ext/bc/C/rpc";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Trusted endpoints per network.
    #[serde(default)]
    pub chains: ChainsConfig,

    /// Wording handed to human prompt implementations.
    #[serde(default)]
    pub prompt: PromptConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Audit trail settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Trusted RPC endpoints for the allow-listed networks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainsConfig {
    /// Avalanche C-Chain mainnet (43114).
    #[serde(default = "NetworkEndpoints::mainnet")]
    pub mainnet: NetworkEndpoints,

    /// Avalanche Fuji testnet (43113).
    #[serde(default = "NetworkEndpoints::testnet")]
    pub testnet: NetworkEndpoints,
}

impl Default for ChainsConfig {
    fn default() -> Self {
        Self {
            mainnet: NetworkEndpoints::mainnet(),
            testnet: NetworkEndpoints::testnet(),
        }
    }
}

/// Endpoints trusted for one network.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkEndpoints {
    /// RPC URLs (`https://` or `wss://`).
    #[serde(default)]
    pub rpc_endpoints: Vec<String>,
}

impl NetworkEndpoints {
    fn mainnet() -> Self {
        Self {
            rpc_endpoints: vec![DEFAULT_MAINNET_RPC.to_string()],
        }
    }

    fn testnet() -> Self {
        Self {
            rpc_endpoints: vec![DEFAULT_TESTNET_RPC.to_string()],
        }
    }
}

fn default_preamble() -> String {
    "Review the transaction below before confirming.".to_string()
}

fn default_decline_hint() -> String {
    "Declining aborts this request; a new request is required to retry.".to_string()
}

/// Wording used when a disclosure is shown to a person.
///
/// This is immutable presentation data for [`HumanPrompt`] implementations;
/// it never influences gate decisions.
///
/// [`HumanPrompt`]: crate::interfaces::HumanPrompt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptConfig {
    /// Shown above the disclosure.
    #[serde(default = "default_preamble")]
    pub preamble: String,

    /// Shown below the disclosure.
    #[serde(default = "default_decline_hint")]
    pub decline_hint: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            preamble: default_preamble(),
            decline_hint: default_decline_hint(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// One of `pretty`, `json`, `compact`.
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional log file; supports `~` expansion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

const fn default_audit_enabled() -> bool {
    true
}

fn default_audit_dir() -> String {
    "~/.avagate/audit".to_string()
}

/// Audit trail settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditConfig {
    /// Record lifecycle transitions to the audit log.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,

    /// Directory holding the audit log and its HMAC key; supports `~` expansion.
    #[serde(default = "default_audit_dir")]
    pub directory: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            directory: default_audit_dir(),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 3] = ["pretty", "json", "compact"];

impl Config {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if an endpoint is not an
    /// `https://` or `wss://` URL, the log level or format is unknown, or the
    /// audit directory is empty while auditing is enabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use avagate_core::config::Config;
    ///
    /// let mut config = Config::default();
    /// assert!(config.validate().is_ok());
    ///
    /// config.chains.mainnet.rpc_endpoints.push("http://127.0.0.1:9650".to_string());
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, endpoints) in [
            ("chains.mainnet.rpc_endpoints", &self.chains.mainnet),
            ("chains.testnet.rpc_endpoints", &self.chains.testnet),
        ] {
            for endpoint in &endpoints.rpc_endpoints {
                if !(endpoint.starts_with("https://") || endpoint.starts_with("wss://")) {
                    return Err(ConfigError::invalid_value(field, endpoint.as_str()));
                }
            }
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                self.logging.level.as_str(),
            ));
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.format",
                self.logging.format.as_str(),
            ));
        }

        if self.audit.enabled && self.audit.directory.is_empty() {
            return Err(ConfigError::invalid_value("audit.directory", "<empty>"));
        }

        Ok(())
    }

    /// Generates the default configuration as a TOML string.
    #[must_use]
    pub fn default_toml() -> String {
        format!(
            r#"[chains.mainnet]
rpc_endpoints = ["{DEFAULT_MAINNET_RPC}"]

[chains.testnet]
rpc_endpoints = ["{DEFAULT_TESTNET_RPC}"]

[prompt]
preamble = "{}"
decline_hint = "{}"

[logging]
level = "info"
format = "pretty"
# file = "~/.avagate/avagate.log"

[audit]
enabled = true
directory = "~/.avagate/audit"
"#,
            default_preamble(),
            default_decline_hint()
        )
    }

    /// Creates a configuration builder for customizing values.
    ///
    /// # Examples
    ///
    /// ```
    /// use avagate_core::config::Config;
    ///
    /// let config = Config::builder()
    ///     .mainnet_endpoint("https://rpc.example.org/avax")
    ///     .log_level("debug")
    ///     .audit_enabled(false)
    ///     .build();
    ///
    /// assert_eq!(config.chains.mainnet.rpc_endpoints.len(), 2);
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for creating [`Config`] instances.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Creates a new configuration builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Trusts an additional mainnet endpoint.
    #[must_use]
    pub fn mainnet_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.chains.mainnet.rpc_endpoints.push(url.into());
        self
    }

    /// Trusts an additional testnet endpoint.
    #[must_use]
    pub fn testnet_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.chains.testnet.rpc_endpoints.push(url.into());
        self
    }

    /// Sets the prompt wording.
    #[must_use]
    pub fn prompt(mut self, prompt: PromptConfig) -> Self {
        self.config.prompt = prompt;
        self
    }

    /// Sets the log level.
    #[must_use]
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// Sets the log format.
    #[must_use]
    pub fn log_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    /// Enables or disables the audit trail.
    #[must_use]
    pub const fn audit_enabled(mut self, enabled: bool) -> Self {
        self.config.audit.enabled = enabled;
        self
    }

    /// Sets the audit directory.
    #[must_use]
    pub fn audit_directory(mut self, dir: impl Into<String>) -> Self {
        self.config.audit.directory = dir.into();
        self
    }

    /// Builds the final configuration.
    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }
}
