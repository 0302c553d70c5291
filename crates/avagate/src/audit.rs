//! # Audit Trail with HMAC Chain
//!
//! Tamper-evident record of every lifecycle transition.
//!
//! Each entry carries an HMAC-SHA256 over its fields concatenated with the
//! previous entry's HMAC, so modifying, dropping or reordering any historical
//! entry breaks every HMAC after it.
//!
//! ## File layout
//!
//! ```text
//! <dir>/audit.key            32-byte key, hex-encoded
//! <dir>/logs/audit.jsonl     one JSON entry per line
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use avagate::audit::{AuditLogger, LifecycleTransition};
//! use avagate_core::types::{LifecycleOperation, LifecycleState, RequestId};
//! use std::path::Path;
//!
//! let logger = AuditLogger::open_or_create(Path::new("/var/lib/avagate/audit"))?;
//! logger.record(LifecycleTransition {
//!     request_id: RequestId::from_string("req-1"),
//!     chain_id: 43113,
//!     from: LifecycleState::Idle,
//!     to: LifecycleState::ChainValidated,
//!     operation: LifecycleOperation::ValidateChain,
//!     detail: None,
//! })?;
//!
//! assert!(logger.verify_chain()?.valid);
//! # Ok::<(), avagate::audit::AuditError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use avagate_core::types::{LifecycleOperation, LifecycleState, RequestId};

type HmacSha256 = Hmac<Sha256>;

const AUDIT_LOG_FILENAME: &str = "audit.jsonl";
const AUDIT_KEY_FILENAME: &str = "audit.key";

/// The "previous HMAC" of the first entry.
const INITIAL_HMAC: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// One line of the audit log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditEntry {
    /// Sequence number, starting at 0 with no gaps.
    pub seq: u64,
    /// RFC 3339 timestamp with millisecond precision.
    pub timestamp: String,
    /// The request whose lifecycle moved.
    pub request_id: String,
    /// Target chain id.
    pub chain_id: u64,
    /// State before the operation.
    pub from: LifecycleState,
    /// State after the operation.
    pub to: LifecycleState,
    /// The operation that caused the transition.
    pub operation: LifecycleOperation,
    /// Error code, failure reason or tx hash, when there is one.
    pub detail: Option<String>,
    /// HMAC-SHA256 over this entry and the previous HMAC.
    pub hmac: String,
}

/// A transition to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleTransition {
    /// The request whose lifecycle moved.
    pub request_id: RequestId,
    /// Target chain id.
    pub chain_id: u64,
    /// State before the operation.
    pub from: LifecycleState,
    /// State after the operation.
    pub to: LifecycleState,
    /// The operation.
    pub operation: LifecycleOperation,
    /// Optional detail.
    pub detail: Option<String>,
}

/// Result of [`AuditLogger::verify_chain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyResult {
    /// The whole chain verified.
    pub valid: bool,
    /// Entries verified before the first failure.
    pub entries_checked: u64,
    /// Sequence number of the first bad entry.
    pub first_invalid_seq: Option<u64>,
    /// What was wrong with it.
    pub error_message: Option<String>,
}

impl VerifyResult {
    const fn success(entries_checked: u64) -> Self {
        Self {
            valid: true,
            entries_checked,
            first_invalid_seq: None,
            error_message: None,
        }
    }

    fn failure(entries_checked: u64, first_invalid_seq: u64, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            entries_checked,
            first_invalid_seq: Some(first_invalid_seq),
            error_message: Some(message.into()),
        }
    }
}

/// Errors from the audit trail.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// File operation failed.
    #[error("audit I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An entry could not be (de)serialized.
    #[error("failed to serialize audit entry: {0}")]
    Serialization(String),

    /// The key file is malformed.
    #[error("invalid audit key: {0}")]
    InvalidKey(String),

    /// An existing log failed verification on open.
    #[error("audit chain broken at seq {seq}: {message}")]
    ChainBroken {
        /// First bad entry.
        seq: u64,
        /// What was wrong with it.
        message: String,
    },
}

#[derive(Debug)]
struct ChainState {
    next_seq: u64,
    last_hmac: String,
}

/// Append-only, HMAC-chained audit log.
///
/// Safe for concurrent use; appends are serialized by an internal lock so
/// sequence numbers and HMAC links always match file order.
pub struct AuditLogger {
    log_path: PathBuf,
    hmac_key: [u8; 32],
    state: Mutex<ChainState>,
}

impl AuditLogger {
    /// Open the log under `dir/logs` with `hmac_key`, verifying any existing
    /// entries.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::ChainBroken`] if an existing log does not verify
    /// under `hmac_key`, or [`AuditError::Io`] on file errors.
    pub fn new(dir: &Path, hmac_key: &[u8; 32]) -> Result<Self, AuditError> {
        let logs_dir = dir.join("logs");
        fs::create_dir_all(&logs_dir)?;
        let log_path = logs_dir.join(AUDIT_LOG_FILENAME);

        let state = Self::restore_state(&log_path, hmac_key)?;
        tracing::debug!(path = %log_path.display(), next_seq = state.next_seq, "audit log opened");

        Ok(Self {
            log_path,
            hmac_key: *hmac_key,
            state: Mutex::new(state),
        })
    }

    /// Open the log under `dir`, generating `dir/audit.key` on first use.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::InvalidKey`] for a malformed key file, otherwise
    /// the errors of [`AuditLogger::new`].
    pub fn open_or_create(dir: &Path) -> Result<Self, AuditError> {
        fs::create_dir_all(dir)?;
        let key_path = dir.join(AUDIT_KEY_FILENAME);

        let key = match fs::read(&key_path) {
            Ok(data) => parse_key(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let mut key = [0u8; 32];
                rand::rngs::OsRng.fill_bytes(&mut key);
                write_key(&key_path, &key)?;
                tracing::info!(path = %key_path.display(), "generated audit key");
                key
            }
            Err(e) => return Err(AuditError::Io(e)),
        };

        Self::new(dir, &key)
    }

    /// Append a transition.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] if the entry cannot be serialized or written.
    pub fn record(&self, transition: LifecycleTransition) -> Result<AuditEntry, AuditError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let mut entry = AuditEntry {
            seq: state.next_seq,
            timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            request_id: transition.request_id.to_string(),
            chain_id: transition.chain_id,
            from: transition.from,
            to: transition.to,
            operation: transition.operation,
            detail: transition.detail,
            hmac: String::new(),
        };
        entry.hmac = compute_hmac(&self.hmac_key, &entry, &state.last_hmac);

        let json =
            serde_json::to_string(&entry).map_err(|e| AuditError::Serialization(e.to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{json}")?;
        file.flush()?;

        state.next_seq += 1;
        state.last_hmac.clone_from(&entry.hmac);
        drop(state);

        Ok(entry)
    }

    /// Verify the whole chain from the first entry.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] if the file cannot be read or a line is not a
    /// valid entry.
    pub fn verify_chain(&self) -> Result<VerifyResult, AuditError> {
        if !self.log_path.exists() {
            return Ok(VerifyResult::success(0));
        }

        let reader = BufReader::new(File::open(&self.log_path)?);
        let mut prev_hmac = INITIAL_HMAC.to_string();
        let mut checked: u64 = 0;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let entry: AuditEntry = serde_json::from_str(&line)
                .map_err(|e| AuditError::Serialization(format!("line {}: {e}", line_num + 1)))?;

            if entry.seq != checked {
                return Ok(VerifyResult::failure(
                    checked,
                    entry.seq,
                    format!("sequence mismatch: expected {checked}, got {}", entry.seq),
                ));
            }

            if entry.hmac != compute_hmac(&self.hmac_key, &entry, &prev_hmac) {
                return Ok(VerifyResult::failure(
                    checked,
                    entry.seq,
                    "HMAC mismatch: entry may have been tampered with",
                ));
            }

            prev_hmac = entry.hmac;
            checked += 1;
        }

        Ok(VerifyResult::success(checked))
    }

    /// Path of the JSONL file.
    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    fn restore_state(log_path: &Path, hmac_key: &[u8; 32]) -> Result<ChainState, AuditError> {
        let mut state = ChainState {
            next_seq: 0,
            last_hmac: INITIAL_HMAC.to_string(),
        };
        if !log_path.exists() {
            return Ok(state);
        }

        let reader = BufReader::new(File::open(log_path)?);
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: AuditEntry = serde_json::from_str(&line)
                .map_err(|e| AuditError::Serialization(e.to_string()))?;

            if entry.seq != state.next_seq
                || entry.hmac != compute_hmac(hmac_key, &entry, &state.last_hmac)
            {
                return Err(AuditError::ChainBroken {
                    seq: entry.seq,
                    message: "verification failed while reopening the log".to_string(),
                });
            }

            state.next_seq = entry.seq + 1;
            state.last_hmac = entry.hmac;
        }
        Ok(state)
    }
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let next_seq = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_seq;
        f.debug_struct("AuditLogger")
            .field("log_path", &self.log_path)
            .field("next_seq", &next_seq)
            .finish_non_exhaustive()
    }
}

fn compute_hmac(key: &[u8; 32], entry: &AuditEntry, prev_hmac: &str) -> String {
    let data = format!(
        "{}||{}||{}||{}||{}||{}||{}||{}||{}",
        entry.seq,
        entry.timestamp,
        entry.request_id,
        entry.chain_id,
        entry.from,
        entry.to,
        entry.operation,
        entry.detail.as_deref().unwrap_or(""),
        prev_hmac
    );

    // HMAC-SHA256 accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(key)
        .unwrap_or_else(|_| unreachable!("HMAC-SHA256 accepts any key length"));
    mac.update(data.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Accepts a raw 32-byte key or 64 hex characters.
fn parse_key(data: &[u8]) -> Result<[u8; 32], AuditError> {
    if let Ok(key) = <[u8; 32]>::try_from(data) {
        return Ok(key);
    }

    let text = String::from_utf8_lossy(data);
    let bytes = hex::decode(text.trim())
        .map_err(|e| AuditError::InvalidKey(format!("invalid hex: {e}")))?;

    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
        AuditError::InvalidKey(format!(
            "key must be 32 bytes or 64 hex characters, got {} bytes",
            data.len()
        ))
    })
}

fn write_key(path: &Path, key: &[u8; 32]) -> Result<(), AuditError> {
    fs::write(path, hex::encode(key))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}
