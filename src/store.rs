//! Client-resident auth store — one observable snapshot, many subscribers.
//!
//! ARCHITECTURE
//! ============
//! The store holds a single [`AuthSnapshot`] that is replaced whole on every
//! transition, so subscribers can never observe a torn update. Subscribers
//! are callbacks keyed by a monotonically increasing id (iteration order is
//! registration order) and get a [`Subscription`] disposer back.
//!
//! `ensure_session` is single-flight: however many callers overlap before the
//! first hydration, exactly one gateway round trip happens and every caller
//! resolves to the same outcome. Followers wait on a `watch` channel the
//! leader completes; the in-flight marker is cleared on every exit path so a
//! later call can retry.
//!
//! The internal mutex is never held across an await or across a listener
//! invocation.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::watch;

use crate::identity::types::{IdentityError, User};

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Observable authentication phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// Before the first `ensure_session`/`set_user` call.
    Idle,
    /// A session resolution is in flight.
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Immutable value of the entire observable auth state at an instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub user: Option<User>,
    pub status: AuthStatus,
}

impl AuthSnapshot {
    fn committed(user: Option<User>) -> Self {
        let status = if user.is_some() { AuthStatus::Authenticated } else { AuthStatus::Unauthenticated };
        Self { user, status }
    }
}

// =============================================================================
// GATEWAY SEAM
// =============================================================================

/// The store's view of the boundary: resolve the current session, revoke it.
///
/// Production wires this to HTTP calls against the boundary endpoints; tests
/// substitute scripted implementations.
#[async_trait::async_trait]
pub trait SessionGateway: Send + Sync {
    async fn resolve_session(&self) -> Result<Option<User>, IdentityError>;
    async fn revoke_session(&self) -> Result<(), IdentityError>;
}

// =============================================================================
// STORE
// =============================================================================

type Listener = Arc<dyn Fn() + Send + Sync>;

/// `None` while the flight is unresolved; `Some(outcome)` once committed.
type FlightOutcome = Option<Option<User>>;

/// The in-flight resolution marker. Generations disambiguate flights: a
/// stale participant may only clear the marker of its own flight, never one
/// a newer leader has since started.
struct Flight {
    generation: u64,
    rx: watch::Receiver<FlightOutcome>,
}

struct Inner {
    snapshot: AuthSnapshot,
    hydrated: bool,
    next_listener: u64,
    listeners: BTreeMap<u64, Listener>,
    next_flight: u64,
    inflight: Option<Flight>,
}

fn clear_flight(inner: &mut Inner, generation: u64) {
    if inner.inflight.as_ref().is_some_and(|f| f.generation == generation) {
        inner.inflight = None;
    }
}

/// Observable auth store. Construct once per application context and thread
/// it explicitly; it is not ambient global state.
pub struct AuthStore {
    gateway: Arc<dyn SessionGateway>,
    inner: Arc<Mutex<Inner>>,
}

/// Disposer capability returned by [`AuthStore::subscribe`]. Removing is
/// idempotent; dropping the handle unsubscribes.
pub struct Subscription {
    inner: Weak<Mutex<Inner>>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.inner.upgrade() {
            lock(&inner).listeners.remove(&self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AuthStore {
    #[must_use]
    pub fn new(gateway: Arc<dyn SessionGateway>) -> Self {
        Self {
            gateway,
            inner: Arc::new(Mutex::new(Inner {
                snapshot: AuthSnapshot { user: None, status: AuthStatus::Idle },
                hydrated: false,
                next_listener: 0,
                listeners: BTreeMap::new(),
                next_flight: 0,
                inflight: None,
            })),
        }
    }

    /// Current snapshot. Pure read, no side effects.
    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        lock(&self.inner).snapshot.clone()
    }

    /// True once any commit has occurred.
    #[must_use]
    pub fn has_hydrated(&self) -> bool {
        lock(&self.inner).hydrated
    }

    /// Register a change listener. Safe to call from within a notification.
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        let mut inner = lock(&self.inner);
        let id = inner.next_listener;
        inner.next_listener += 1;
        inner.listeners.insert(id, Arc::new(listener));
        Subscription { inner: Arc::downgrade(&self.inner), id }
    }

    /// Unconditional commit: replace the snapshot, mark hydrated, notify.
    pub fn set_user(&self, user: Option<User>) {
        self.commit(user);
    }

    /// Same commit as [`set_user`](Self::set_user); named for bootstrap paths
    /// that seed the store from server-rendered state.
    pub fn hydrate_with(&self, user: Option<User>) {
        self.commit(user);
    }

    /// Resolve the session, deduplicating concurrent callers.
    ///
    /// Hydrated stores answer from the snapshot without a gateway call. A
    /// gateway failure commits `None` rather than surfacing an error.
    pub async fn ensure_session(&self) -> Option<User> {
        enum Role {
            Resolved(Option<User>),
            Leader(u64, watch::Sender<FlightOutcome>),
            Follower(u64, watch::Receiver<FlightOutcome>),
        }

        let role = {
            let mut inner = lock(&self.inner);
            if inner.hydrated {
                Role::Resolved(inner.snapshot.user.clone())
            } else if let Some(flight) = &inner.inflight {
                Role::Follower(flight.generation, flight.rx.clone())
            } else {
                let (tx, rx) = watch::channel(None);
                let generation = inner.next_flight;
                inner.next_flight += 1;
                inner.inflight = Some(Flight { generation, rx });
                inner.snapshot = AuthSnapshot { user: None, status: AuthStatus::Loading };
                Role::Leader(generation, tx)
            }
        };

        match role {
            Role::Resolved(user) => user,
            Role::Leader(generation, tx) => self.lead_resolution(generation, tx).await,
            Role::Follower(generation, rx) => self.follow_resolution(generation, rx).await,
        }
    }

    async fn lead_resolution(&self, generation: u64, tx: watch::Sender<FlightOutcome>) -> Option<User> {
        self.notify();

        let user = match self.gateway.resolve_session().await {
            Ok(user) => user,
            Err(error) => {
                tracing::warn!(error = %error, "session resolution failed");
                None
            }
        };

        {
            let mut inner = lock(&self.inner);
            inner.snapshot = AuthSnapshot::committed(user.clone());
            inner.hydrated = true;
            clear_flight(&mut inner, generation);
        }

        // Wake followers after the commit so both they and the subscribers
        // observe the committed snapshot.
        let _ = tx.send(Some(user.clone()));
        self.notify();
        user
    }

    async fn follow_resolution(&self, generation: u64, mut rx: watch::Receiver<FlightOutcome>) -> Option<User> {
        match rx.wait_for(|outcome| outcome.is_some()).await {
            Ok(outcome) => outcome.clone().flatten(),
            Err(_) => {
                // Leader future dropped mid-flight. Fall back to whatever is
                // committed, clearing the marker so a later call retries —
                // but only this flight's marker: a newer leader may already
                // own the slot.
                let mut inner = lock(&self.inner);
                clear_flight(&mut inner, generation);
                inner.snapshot.user.clone()
            }
        }
    }

    /// Revoke remotely, then commit `Unauthenticated` regardless of outcome.
    pub async fn logout(&self) {
        if let Err(error) = self.gateway.revoke_session().await {
            tracing::warn!(error = %error, "remote logout failed; clearing local auth state");
        }
        self.commit(None);
    }

    fn commit(&self, user: Option<User>) {
        {
            let mut inner = lock(&self.inner);
            inner.snapshot = AuthSnapshot::committed(user);
            inner.hydrated = true;
        }
        self.notify();
    }

    /// Invoke the listeners registered at the start of the round, in
    /// registration order, exactly once each. The lock is released around
    /// every call so listeners may subscribe or unsubscribe re-entrantly; a
    /// listener removed while the round is in progress is skipped, and one
    /// added during the round waits for the next commit.
    fn notify(&self) {
        let ids: Vec<u64> = lock(&self.inner).listeners.keys().copied().collect();
        for id in ids {
            let listener = lock(&self.inner).listeners.get(&id).cloned();
            if let Some(listener) = listener {
                listener();
            }
        }
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
