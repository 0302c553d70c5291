//! Read/write capability separation.
//!
//! A [`Capability`] is a handle restricted to one [`Role`] on one network.
//! Read handles never perform state-mutating operations, write handles never
//! answer read queries.
//!
//! # Lifetimes
//!
//! Handles are granted by a [`Session`] and borrow it, so the compiler
//! guarantees that no handle outlives its session (or the [`ChainContext`] the
//! session owns). Every grant is explicit; there is no way to turn a read
//! handle into a write handle.
//!
//! # Example
//!
//! ```
//! use avagate_chain::CapabilityGuard;
//! use avagate_core::types::{ChainContext, OperationKind, Role};
//!
//! let guard = CapabilityGuard::new();
//! let session = guard.open_session(ChainContext::classify(43113)).expect("allow-listed");
//!
//! let reader = session.grant(Role::Read);
//! assert!(guard.authorize(&reader, OperationKind::Simulate).is_ok());
//! assert!(guard.authorize(&reader, OperationKind::Sign).is_err());
//!
//! let writer = session.grant(Role::Write);
//! assert!(guard.authorize(&writer, OperationKind::Broadcast).is_ok());
//! assert!(guard.authorize(&writer, OperationKind::QueryState).is_err());
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use avagate_core::error::{GateError, GateResult};
use avagate_core::types::{ChainContext, OperationKind, Role};

/// Live-handle counts keyed by role and chain id.
#[derive(Debug, Default)]
struct GuardState {
    live: HashMap<(Role, u64), usize>,
}

#[derive(Debug, Default)]
struct GuardInner {
    next_session: AtomicU64,
    next_handle: AtomicU64,
    state: Mutex<GuardState>,
}

impl GuardInner {
    fn adjust(&self, role: Role, chain_id: u64, delta: isize) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let count = state.live.entry((role, chain_id)).or_insert(0);
        *count = count.saturating_add_signed(delta);
        if *count == 0 {
            state.live.remove(&(role, chain_id));
        }
    }
}

/// Issues sessions and checks capability use.
///
/// Cheap to clone; clones share one registry of live handles.
#[derive(Debug, Clone, Default)]
pub struct CapabilityGuard {
    inner: Arc<GuardInner>,
}

impl CapabilityGuard {
    /// Create a guard with an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session scoped to `chain`.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::UnsupportedChain`] if `chain` is not allow-listed.
    pub fn open_session(&self, chain: ChainContext) -> GateResult<Session> {
        if !chain.is_allowlisted() {
            return Err(GateError::unsupported_chain(chain.chain_id()));
        }
        let id = self.inner.next_session.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(session = id, chain_id = chain.chain_id(), "capability session opened");
        Ok(Session {
            id,
            chain,
            guard: Arc::clone(&self.inner),
        })
    }

    /// Check that `capability` may perform `operation`.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::CapabilityViolation`] if the handle's role does not
    /// match the operation, or the handle was issued by a different guard.
    pub fn authorize(&self, capability: &Capability<'_>, operation: OperationKind) -> GateResult<()> {
        if !Arc::ptr_eq(&self.inner, &capability.session.guard) {
            return Err(GateError::capability_violation(
                capability.role,
                operation,
                "handle was issued by a different guard",
            ));
        }

        match (capability.role, operation.required_role()) {
            (Role::Read, Role::Write) => {
                tracing::warn!(%operation, handle = capability.id, "read handle used for write");
                Err(GateError::capability_violation(
                    Role::Read,
                    operation,
                    "read handles never mutate state",
                ))
            }
            (Role::Write, Role::Read) => {
                tracing::warn!(%operation, handle = capability.id, "write handle used for read");
                Err(GateError::capability_violation(
                    Role::Write,
                    operation,
                    "write handles never answer read queries",
                ))
            }
            _ => Ok(()),
        }
    }

    /// Check that `capability` may perform `operation` on `chain`.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::CapabilityViolation`] for a role mismatch, a foreign
    /// handle, or a handle scoped to a different chain.
    pub fn authorize_on(
        &self,
        capability: &Capability<'_>,
        operation: OperationKind,
        chain: &ChainContext,
    ) -> GateResult<()> {
        self.authorize(capability, operation)?;
        if capability.chain() != chain {
            return Err(GateError::capability_violation(
                capability.role,
                operation,
                format!(
                    "handle is scoped to chain {}, not {}",
                    capability.chain().chain_id(),
                    chain.chain_id()
                ),
            ));
        }
        Ok(())
    }

    /// Number of live handles for `role` on `chain_id`.
    #[must_use]
    pub fn live_handles(&self, role: Role, chain_id: u64) -> usize {
        let state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.live.get(&(role, chain_id)).copied().unwrap_or(0)
    }
}

/// A capability session bound to one network.
///
/// Dropping (or [closing](Session::close)) the session ends it; handles
/// borrowed from it cannot outlive it.
#[derive(Debug)]
pub struct Session {
    id: u64,
    chain: ChainContext,
    guard: Arc<GuardInner>,
}

impl Session {
    /// Explicitly grant a handle with `role`.
    #[must_use]
    pub fn grant(&self, role: Role) -> Capability<'_> {
        let id = self.guard.next_handle.fetch_add(1, Ordering::Relaxed);
        self.guard.adjust(role, self.chain.chain_id(), 1);
        tracing::debug!(session = self.id, handle = id, %role, "capability granted");
        Capability {
            id,
            role,
            session: self,
        }
    }

    /// The network the session is scoped to.
    #[must_use]
    pub const fn chain(&self) -> &ChainContext {
        &self.chain
    }

    /// End the session.
    pub fn close(self) {
        tracing::debug!(session = self.id, "capability session closed");
    }
}

/// A handle restricted to one role on one network.
///
/// Not `Clone`: each handle is a separate explicit grant.
pub struct Capability<'s> {
    id: u64,
    role: Role,
    session: &'s Session,
}

impl Capability<'_> {
    /// The handle's role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// The network the handle is scoped to.
    #[must_use]
    pub const fn chain(&self) -> &ChainContext {
        &self.session.chain
    }
}

impl Drop for Capability<'_> {
    fn drop(&mut self) {
        self.session
            .guard
            .adjust(self.role, self.session.chain.chain_id(), -1);
    }
}

impl std::fmt::Debug for Capability<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capability")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("session", &self.session.id)
            .field("chain_id", &self.session.chain.chain_id())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
