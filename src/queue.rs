//! Pending Action Queue
//!
//! Holds at most one entry per [`ActionKey`]. Every enqueue bumps the key's
//! generation; a result is only trusted when the ticket that produced it still
//! carries the key's current generation.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{
    actions::{ActionKey, CartAction},
    errors::CartFailure,
};

/// Lifecycle of a queued intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionStatus {
    /// Queued, not yet sent.
    Pending,

    /// Sent; waiting for the backend.
    Reconciling,

    /// The backend call failed. Kept until dismissed or superseded.
    Failed(CartFailure),
}

/// Handle identifying one enqueued action instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTicket {
    key: ActionKey,
    generation: u64,
}

impl ActionTicket {
    /// The action's idempotency key.
    pub fn key(&self) -> &ActionKey {
        &self.key
    }

    /// Generation of the key when this action was enqueued.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// An in-flight or failed mutation intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    key: ActionKey,
    action: CartAction,
    status: ActionStatus,
    generation: u64,
}

impl PendingAction {
    /// Idempotency key.
    pub fn key(&self) -> &ActionKey {
        &self.key
    }

    /// The requested mutation.
    pub fn action(&self) -> &CartAction {
        &self.action
    }

    /// Current status.
    pub fn status(&self) -> &ActionStatus {
        &self.status
    }

    /// Generation this entry was enqueued with.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The failure, if the entry failed.
    pub fn failure(&self) -> Option<&CartFailure> {
        match &self.status {
            ActionStatus::Failed(failure) => Some(failure),
            ActionStatus::Pending | ActionStatus::Reconciling => None,
        }
    }

    /// Whether the entry failed.
    pub fn is_failed(&self) -> bool {
        self.failure().is_some()
    }
}

/// What resolving a ticket did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The outcome was recorded.
    Applied,

    /// A newer action for the key exists; the outcome was ignored.
    Superseded,
}

/// Queue of mutation intents awaiting confirmation.
#[derive(Debug, Default)]
pub struct PendingActionQueue {
    entries: Vec<PendingAction>,
    generations: FxHashMap<ActionKey, u64>,
}

impl PendingActionQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an action, superseding any entry with the same key.
    pub fn enqueue(&mut self, action: CartAction) -> ActionTicket {
        let key = action.key();

        let generation = {
            let counter = self.generations.entry(key.clone()).or_insert(0);
            *counter += 1;
            *counter
        };

        if let Some(index) = self.position(&key) {
            let superseded = self.entries.remove(index);

            debug!(
                %key,
                superseded_generation = superseded.generation,
                generation,
                "superseding pending cart action"
            );
        }

        self.entries.push(PendingAction {
            key: key.clone(),
            action,
            status: ActionStatus::Pending,
            generation,
        });

        ActionTicket { key, generation }
    }

    /// Whether `ticket` is still the authoritative action for its key.
    pub fn is_current(&self, ticket: &ActionTicket) -> bool {
        self.current(ticket).is_some()
    }

    /// Mark a pending action as sent, returning the payload to send.
    ///
    /// Returns `None` when the ticket has been superseded or was already sent.
    pub fn begin_reconciling(&mut self, ticket: &ActionTicket) -> Option<CartAction> {
        let entry = self.current_mut(ticket)?;

        if entry.status != ActionStatus::Pending {
            return None;
        }

        entry.status = ActionStatus::Reconciling;

        Some(entry.action.clone())
    }

    /// Record the outcome of a ticket's backend call.
    ///
    /// Success removes the entry; failure keeps it as [`ActionStatus::Failed`].
    pub fn resolve(
        &mut self,
        ticket: &ActionTicket,
        outcome: Result<(), CartFailure>,
    ) -> Resolution {
        let Some(index) = self.current_position(ticket) else {
            return Resolution::Superseded;
        };

        match outcome {
            Ok(()) => {
                self.entries.remove(index);
            }
            Err(failure) => {
                if let Some(entry) = self.entries.get_mut(index) {
                    entry.status = ActionStatus::Failed(failure);
                }
            }
        }

        Resolution::Applied
    }

    /// Drop a failed entry once the consumer has acknowledged it.
    pub fn dismiss(&mut self, key: &ActionKey) -> Option<PendingAction> {
        let index = self
            .entries
            .iter()
            .position(|entry| &entry.key == key && entry.is_failed())?;

        Some(self.entries.remove(index))
    }

    /// All entries in enqueue order.
    pub fn list_pending(&self) -> &[PendingAction] {
        &self.entries
    }

    /// Failed entries in enqueue order.
    pub fn failures(&self) -> impl Iterator<Item = &PendingAction> {
        self.entries.iter().filter(|entry| entry.is_failed())
    }

    /// Entries that have not failed.
    pub fn in_flight(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.is_failed()).count()
    }

    /// Number of entries, failed ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &ActionKey) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.key == key)
    }

    fn current_position(&self, ticket: &ActionTicket) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.key == ticket.key && entry.generation == ticket.generation)
    }

    fn current(&self, ticket: &ActionTicket) -> Option<&PendingAction> {
        self.current_position(ticket)
            .and_then(|index| self.entries.get(index))
    }

    fn current_mut(&mut self, ticket: &ActionTicket) -> Option<&mut PendingAction> {
        self.current_position(ticket)
            .and_then(|index| self.entries.get_mut(index))
    }
}
