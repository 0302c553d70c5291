//! Per-request human confirmation.
//!
//! The [`ConfirmationLedger`] holds at most one confirmation per request id.
//! Its only entry point, [`ConfirmationLedger::record`], takes exactly one id
//! and one acknowledgement; batches need one call per member.
//!
//! Declines are remembered too. A declined id can never be confirmed later;
//! retrying means building a new request, which gets a fresh simulation and a
//! fresh disclosure.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};

use avagate_core::error::{GateError, GateResult};
use avagate_core::types::{ConfirmationRecord, Disclosure, RequestId};

#[derive(Debug, Clone, Copy)]
enum Entry {
    Confirmed {
        digest: [u8; 32],
        at: DateTime<Utc>,
    },
    Declined,
}

/// One confirmation per request id, never reused.
#[derive(Debug, Default)]
pub struct ConfirmationLedger {
    entries: Mutex<HashMap<RequestId, Entry>>,
}

impl ConfirmationLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the human's answer for `request_id`.
    ///
    /// # Errors
    ///
    /// - [`GateError::ConfirmationDenied`] if `user_ack` is false, if the id
    ///   was declined before, or if `disclosure` belongs to another request
    /// - [`GateError::DuplicateConfirmation`] if the id is already confirmed
    pub fn record(
        &self,
        request_id: &RequestId,
        disclosure: &Disclosure,
        user_ack: bool,
    ) -> GateResult<ConfirmationRecord> {
        if disclosure.request_id() != request_id {
            tracing::warn!(
                request_id = %request_id,
                disclosed = %disclosure.request_id(),
                "refused confirmation for another request's disclosure"
            );
            return Err(GateError::confirmation_denied(
                request_id.clone(),
                format!("disclosure belongs to request {}", disclosure.request_id()),
            ));
        }

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(request_id) {
            Some(Entry::Confirmed { .. }) => {
                return Err(GateError::duplicate_confirmation(request_id.clone()));
            }
            Some(Entry::Declined) => {
                return Err(GateError::confirmation_denied(
                    request_id.clone(),
                    "request was declined earlier; build a new request to retry",
                ));
            }
            None => {}
        }

        if !user_ack {
            entries.insert(request_id.clone(), Entry::Declined);
            tracing::warn!(request_id = %request_id, "user declined disclosure");
            return Err(GateError::confirmation_denied(
                request_id.clone(),
                "user declined",
            ));
        }

        let confirmed_at = Utc::now();
        let record = ConfirmationRecord::new(request_id, disclosure, confirmed_at).ok_or_else(
            || GateError::confirmation_denied(request_id.clone(), "disclosure id mismatch"),
        )?;
        entries.insert(
            request_id.clone(),
            Entry::Confirmed {
                digest: disclosure.digest(),
                at: confirmed_at,
            },
        );
        tracing::info!(request_id = %request_id, "confirmation recorded");
        Ok(record)
    }

    /// Returns `true` if `request_id` has a confirmation.
    #[must_use]
    pub fn is_confirmed(&self, request_id: &RequestId) -> bool {
        matches!(self.lock_get(request_id), Some(Entry::Confirmed { .. }))
    }

    /// When `request_id` was confirmed, if it was.
    #[must_use]
    pub fn confirmed_at(&self, request_id: &RequestId) -> Option<DateTime<Utc>> {
        match self.lock_get(request_id) {
            Some(Entry::Confirmed { at, .. }) => Some(at),
            _ => None,
        }
    }

    /// Returns `true` if `disclosure` is exactly what was confirmed for its request.
    #[must_use]
    pub fn matches(&self, disclosure: &Disclosure) -> bool {
        match self.lock_get(disclosure.request_id()) {
            Some(Entry::Confirmed { digest, .. }) => digest == disclosure.digest(),
            _ => false,
        }
    }

    /// Number of confirmed requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|entry| matches!(entry, Entry::Confirmed { .. }))
            .count()
    }

    /// Returns `true` if nothing has been confirmed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_get(&self, request_id: &RequestId) -> Option<Entry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(request_id)
            .copied()
    }
}

// ============================================================================
// Tests
// ============================================================================
