//! At most one live lifecycle per request id.
//!
//! [`InFlightRegistry::claim`] hands out an [`InFlightClaim`] that releases
//! the id when dropped. The lifecycle owns its claim, so the id frees up
//! exactly when the lifecycle is finished or dropped.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use avagate_core::error::{GateError, GateResult};
use avagate_core::types::RequestId;

/// Set of request ids with a live lifecycle.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    ids: Arc<Mutex<HashSet<RequestId>>>,
}

impl InFlightRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id`.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::DuplicateInFlight`] if `id` is already claimed.
    pub fn claim(&self, id: &RequestId) -> GateResult<InFlightClaim> {
        let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
        if !ids.insert(id.clone()) {
            tracing::warn!(request_id = %id, "request already in flight");
            return Err(GateError::duplicate_in_flight(id.clone()));
        }
        Ok(InFlightClaim {
            id: id.clone(),
            ids: Arc::clone(&self.ids),
        })
    }

    /// Returns `true` if `id` is claimed.
    #[must_use]
    pub fn is_in_flight(&self, id: &RequestId) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    /// Number of claimed ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if nothing is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ownership of one in-flight request id; released on drop.
#[derive(Debug)]
pub struct InFlightClaim {
    id: RequestId,
    ids: Arc<Mutex<HashSet<RequestId>>>,
}

impl InFlightClaim {
    /// The claimed id.
    #[must_use]
    pub const fn id(&self) -> &RequestId {
        &self.id
    }
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}
