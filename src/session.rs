//! Cart Session
//!
//! The session-scoped cart context. It owns the snapshot store and the pending
//! action queue, dispatches mutations to the backend, and publishes a fresh
//! projection after every state change.
//!
//! State is only locked for synchronous critical sections; no lock is held
//! across a backend call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, watch};
use tracing::{debug, info, warn};

use crate::{
    actions::{ActionKey, CartAction},
    backend::{BackendError, CartBackend},
    cart::CartSnapshot,
    errors::{CartError, CartFailure},
    ids::CartId,
    projection::{ProjectedCart, project},
    queue::{ActionTicket, PendingActionQueue},
    snapshot::SnapshotStore,
};

/// How a dispatched action ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The backend confirmed the mutation and the snapshot was replaced.
    Applied,

    /// The mutation failed; the queue keeps a failed entry for it.
    Failed(CartFailure),

    /// A newer action with the same key was enqueued; this result was dropped.
    Superseded,
}

/// A failed intent awaiting acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingError {
    /// Key of the failed intent; pass to [`CartSession::dismiss`].
    pub key: ActionKey,

    /// The intent that failed.
    pub action: CartAction,

    /// Why it failed.
    pub failure: CartFailure,
}

#[derive(Debug, Default)]
struct SessionState {
    snapshot: SnapshotStore,
    queue: PendingActionQueue,
}

impl SessionState {
    fn project(&self) -> ProjectedCart {
        project(self.snapshot.get(), self.queue.list_pending())
    }
}

struct SessionInner {
    backend: Arc<dyn CartBackend>,
    state: Mutex<SessionState>,
    projection: watch::Sender<ProjectedCart>,
    creation_gate: AsyncMutex<()>,
}

/// Session-scoped cart context.
///
/// Cloning is cheap; clones share the same cart.
#[derive(Clone)]
pub struct CartSession {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for CartSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartSession")
            .field("cart_id", &self.cart_id())
            .finish_non_exhaustive()
    }
}

impl CartSession {
    /// A session with no cart yet.
    pub fn new(backend: Arc<dyn CartBackend>) -> Self {
        Self::with_snapshot(backend, None)
    }

    /// A session seeded with an already-fetched cart.
    pub fn with_snapshot(backend: Arc<dyn CartBackend>, snapshot: Option<CartSnapshot>) -> Self {
        let state = SessionState {
            snapshot: SnapshotStore::seeded(snapshot),
            queue: PendingActionQueue::new(),
        };

        let (projection, _) = watch::channel(state.project());

        Self {
            inner: Arc::new(SessionInner {
                backend,
                state: Mutex::new(state),
                projection,
                creation_gate: AsyncMutex::new(()),
            }),
        }
    }

    /// Seed a session from the backend using a persisted cart id.
    ///
    /// A cart id the backend no longer knows about yields an empty session.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Load` if the backend call fails.
    pub async fn load(
        backend: Arc<dyn CartBackend>,
        cart_id: Option<CartId>,
    ) -> Result<Self, CartError> {
        let Some(cart_id) = cart_id else {
            return Ok(Self::new(backend));
        };

        let snapshot = backend
            .get_cart(cart_id.clone())
            .await
            .map_err(CartError::Load)?;

        if snapshot.is_none() {
            info!(%cart_id, "persisted cart no longer exists; starting without a cart");
        }

        Ok(Self::with_snapshot(backend, snapshot))
    }

    /// The current projected cart.
    pub fn projected(&self) -> ProjectedCart {
        self.inner.projection.borrow().clone()
    }

    /// Observe every new projection.
    pub fn subscribe(&self) -> watch::Receiver<ProjectedCart> {
        self.inner.projection.subscribe()
    }

    /// The confirmed cart id, if a cart exists.
    pub fn cart_id(&self) -> Option<CartId> {
        self.state().snapshot.cart_id().cloned()
    }

    /// The last confirmed snapshot.
    pub fn snapshot(&self) -> Option<CartSnapshot> {
        self.state().snapshot.get().cloned()
    }

    /// Failed intents awaiting acknowledgement, in enqueue order.
    pub fn pending_errors(&self) -> Vec<PendingError> {
        self.state()
            .queue
            .failures()
            .filter_map(|entry| {
                entry.failure().map(|failure| PendingError {
                    key: entry.key().clone(),
                    action: entry.action().clone(),
                    failure: failure.clone(),
                })
            })
            .collect()
    }

    /// Acknowledge a failed intent. Returns whether anything was removed.
    pub fn dismiss(&self, key: &ActionKey) -> bool {
        let mut state = self.state();

        let dismissed = state.queue.dismiss(key).is_some();

        if dismissed {
            self.publish(&state);
        }

        dismissed
    }

    /// Queue an intent and re-project immediately, without contacting the
    /// backend. Pass the ticket to [`Self::submit`] to send it.
    ///
    /// # Errors
    ///
    /// Returns a `CartError` when the action is invalid, or when it needs an
    /// existing cart and there is none.
    pub fn enqueue(&self, action: CartAction) -> Result<ActionTicket, CartError> {
        action.validate()?;

        let mut state = self.state();

        if action.requires_cart() && !state.snapshot.has_cart() {
            return Err(CartError::NoCart);
        }

        let ticket = state.queue.enqueue(action);

        debug!(key = %ticket.key(), generation = ticket.generation(), "cart action enqueued");

        self.publish(&state);

        Ok(ticket)
    }

    /// Send a queued intent to the backend and reconcile its result.
    ///
    /// Never retries. Backend errors are recorded on the queue entry rather
    /// than returned.
    ///
    /// Only a ticket still pending is sent. A ticket that was superseded, or
    /// that has already been submitted, reports `Superseded` without a backend
    /// call; the result of the earlier submission stands.
    pub async fn submit(&self, ticket: ActionTicket) -> DispatchOutcome {
        let Some(action) = self.state().queue.begin_reconciling(&ticket) else {
            debug!(key = %ticket.key(), "cart action superseded before submission");
            return DispatchOutcome::Superseded;
        };

        if let Some(cart_id) = self.cart_id() {
            let result = self
                .inner
                .backend
                .mutate_cart_lines(Some(cart_id), action)
                .await;

            return self.reconcile(&ticket, result);
        }

        // Without a cart, mutations are serialised so only one creates it; the
        // snapshot is replaced before the gate is released.
        let _gate = self.inner.creation_gate.lock().await;
        let cart_id = self.cart_id();

        let result = self.inner.backend.mutate_cart_lines(cart_id, action).await;

        self.reconcile(&ticket, result)
    }

    /// Enqueue then submit.
    ///
    /// # Errors
    ///
    /// Returns a `CartError` when the action is rejected by [`Self::enqueue`].
    pub async fn dispatch(&self, action: CartAction) -> Result<DispatchOutcome, CartError> {
        let ticket = self.enqueue(action)?;

        Ok(self.submit(ticket).await)
    }

    fn reconcile(
        &self,
        ticket: &ActionTicket,
        result: Result<CartSnapshot, BackendError>,
    ) -> DispatchOutcome {
        let mut state = self.state();

        if !state.queue.is_current(ticket) {
            debug!(key = %ticket.key(), generation = ticket.generation(), "discarding superseded cart result");

            // A stale result cannot regress a snapshot that does not exist, and
            // it carries the id of the cart the backend just created.
            if let (Ok(snapshot), false) = (result, state.snapshot.has_cart()) {
                state.snapshot.replace(snapshot);
                self.publish(&state);
            }

            return DispatchOutcome::Superseded;
        }

        let outcome = match result {
            Ok(snapshot) => {
                info!(
                    key = %ticket.key(),
                    cart_id = %snapshot.id,
                    total_quantity = snapshot.total_quantity,
                    "cart mutation applied"
                );

                state.snapshot.replace(snapshot);
                state.queue.resolve(ticket, Ok(()));

                DispatchOutcome::Applied
            }
            Err(error) => {
                let failure = CartFailure::from(error);

                warn!(key = %ticket.key(), %failure, "cart mutation failed");

                state.queue.resolve(ticket, Err(failure.clone()));

                DispatchOutcome::Failed(failure)
            }
        };

        self.publish(&state);

        outcome
    }

    fn publish(&self, state: &SessionState) {
        self.inner.projection.send_replace(state.project());
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
