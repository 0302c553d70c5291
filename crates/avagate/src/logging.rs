//! # Logging
//!
//! Structured logging on the `tracing` ecosystem.
//!
//! Every lifecycle operation runs inside an `info_span!` named `lifecycle`
//! that carries the request id; with [`LogConfig::correlation_ids`] enabled
//! the span context is attached to every event, so one request's log lines can
//! be followed across the gate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use avagate::logging::{init_logging, LogConfig};
//!
//! let _guard = init_logging(&LogConfig::default()).expect("logging init");
//! tracing::info!("gate ready");
//! ```
//!
//! ## Sensitive Data Redaction
//!
//! ```
//! use avagate::logging::redact_sensitive;
//!
//! assert_eq!(redact_sensitive("approval-ticket-4471"), "appr***4471");
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use avagate_core::config::LoggingConfig;
use avagate_core::config_loader::expand_path;

/// Errors from logging initialization.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Failed to create the log file or its directory.
    #[error("failed to create log file: {0}")]
    FileCreation(String),
    /// Failed to install the subscriber.
    #[error("failed to initialize logging: {0}")]
    SubscriberInit(String),
    /// The configuration is invalid.
    #[error("invalid log configuration: {0}")]
    InvalidConfig(String),
}

/// Minimum severity that is logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// trace and above
    Trace,
    /// debug and above
    Debug,
    /// info and above
    #[default]
    Info,
    /// warn and above
    Warn,
    /// error only
    Error,
}

impl LogLevel {
    /// Convert to a `tracing` level.
    #[must_use]
    pub const fn as_tracing_level(self) -> Level {
        match self {
            Self::Trace => Level::TRACE,
            Self::Debug => Level::DEBUG,
            Self::Info => Level::INFO,
            Self::Warn => Level::WARN,
            Self::Error => Level::ERROR,
        }
    }

    /// The env-filter directive for this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(LogError::InvalidConfig(format!("unknown log level: {other}"))),
        }
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human-readable.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
    /// Single-line text.
    Compact,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
            Self::Compact => write!(f, "compact"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(LogError::InvalidConfig(format!("unknown log format: {other}"))),
        }
    }
}

/// Logging configuration.
///
/// # Example
///
/// ```
/// use avagate::logging::{LogConfig, LogFormat, LogLevel};
///
/// let config = LogConfig {
///     level: LogLevel::Debug,
///     format: LogFormat::Json,
///     ..Default::default()
/// };
/// assert!(config.file_path.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Minimum severity. Defaults to [`LogLevel::Info`].
    pub level: LogLevel,

    /// Output format. Defaults to [`LogFormat::Pretty`].
    pub format: LogFormat,

    /// Also write to this file, rotated daily. The directory is created if
    /// missing.
    pub file_path: Option<PathBuf>,

    /// Attach the enclosing span (and its request id) to every event.
    pub correlation_ids: bool,
}

impl LogConfig {
    /// Build from the `[logging]` section of the configuration file.
    ///
    /// Correlation ids are always on for configured logging.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`] for an unknown level or format, or
    /// a file path whose `~` cannot be expanded.
    pub fn from_settings(settings: &LoggingConfig) -> Result<Self, LogError> {
        let file_path = settings
            .file
            .as_deref()
            .map(expand_path)
            .transpose()
            .map_err(|e| LogError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            level: settings.level.parse()?,
            format: settings.format.parse()?,
            file_path,
            correlation_ids: true,
        })
    }
}

/// Keeps the non-blocking file writer alive; logs are flushed on drop.
pub struct LogGuard {
    guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

impl LogGuard {
    const fn new(guard: Option<tracing_appender::non_blocking::WorkerGuard>) -> Self {
        Self { guard }
    }
}

impl std::fmt::Debug for LogGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogGuard")
            .field("has_file_guard", &self.guard.is_some())
            .finish()
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber.
///
/// # Errors
///
/// Returns [`LogError`] if the log directory cannot be created, the file name
/// is invalid, or a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<LogGuard, LogError> {
    let filter = EnvFilter::try_new(config.level.as_str())
        .map_err(|e| LogError::InvalidConfig(e.to_string()))?;

    let (file_writer, guard) = if let Some(ref path) = config.file_path {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)
            .map_err(|e| LogError::FileCreation(format!("{}: {e}", dir.display())))?;

        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| LogError::InvalidConfig("invalid log file name".to_string()))?;

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        (Some(non_blocking), Some(guard))
    } else {
        (None, None)
    };

    let spans = config.correlation_ids;
    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);

    match config.format {
        LogFormat::Pretty => {
            layers.push(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_span_events(if spans { FmtSpan::CLOSE } else { FmtSpan::NONE })
                    .boxed(),
            );
            if let Some(writer) = file_writer {
                layers.push(
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true)
                        .boxed(),
                );
            }
        }
        LogFormat::Json => {
            layers.push(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(spans)
                    .with_span_list(spans)
                    .boxed(),
            );
            if let Some(writer) = file_writer {
                layers.push(
                    fmt::layer()
                        .json()
                        .with_writer(writer)
                        .with_target(true)
                        .with_current_span(spans)
                        .boxed(),
                );
            }
        }
        LogFormat::Compact => {
            layers.push(fmt::layer().compact().with_target(true).boxed());
            if let Some(writer) = file_writer {
                layers.push(
                    fmt::layer()
                        .compact()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true)
                        .boxed(),
                );
            }
        }
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| LogError::SubscriberInit(e.to_string()))?;

    Ok(LogGuard::new(guard))
}

/// Redact a secret for logging: first 4 and last 4 characters around `***`,
/// or just `***` for values shorter than 12 characters.
///
/// ```
/// use avagate::logging::redact_sensitive;
///
/// assert_eq!(redact_sensitive("secret"), "***");
/// assert_eq!(redact_sensitive("0xdeadbeefcafebabe"), "0xde***babe");
/// ```
#[must_use]
pub fn redact_sensitive(value: &str) -> String {
    const MIN_LENGTH_FOR_PARTIAL: usize = 12;
    const VISIBLE_CHARS: usize = 4;

    let chars: Vec<char> = value.chars().collect();
    let len = chars.len();

    if len < MIN_LENGTH_FOR_PARTIAL {
        return "***".to_string();
    }

    let prefix: String = chars.iter().take(VISIBLE_CHARS).collect();
    let suffix: String = chars.iter().skip(len - VISIBLE_CHARS).collect();

    format!("{prefix}***{suffix}")
}

/// Map `-v` flag counts to a level: 0 warn, 1 info, 2 debug, 3+ trace.
#[must_use]
pub const fn verbosity_to_level(verbosity: u8) -> LogLevel {
    match verbosity {
        0 => LogLevel::Warn,
        1 => LogLevel::Info,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    }
}
