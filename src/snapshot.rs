//! Cart Snapshot Store

use tracing::{debug, warn};

use crate::{cart::CartSnapshot, ids::CartId};

/// Whether the session has a backend cart yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CartState {
    /// No cart exists; the first successful add creates one.
    #[default]
    NoCart,

    /// The last confirmed cart.
    HasCart(CartSnapshot),
}

/// Holds the last-confirmed cart. Snapshots are only ever replaced whole.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    state: CartState,
    version: u64,
}

impl SnapshotStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with an existing cart, if any.
    pub fn seeded(snapshot: Option<CartSnapshot>) -> Self {
        Self {
            state: snapshot.map_or(CartState::NoCart, CartState::HasCart),
            version: 0,
        }
    }

    /// The confirmed cart, if one exists.
    pub fn get(&self) -> Option<&CartSnapshot> {
        match &self.state {
            CartState::NoCart => None,
            CartState::HasCart(snapshot) => Some(snapshot),
        }
    }

    /// Whether a cart exists.
    pub fn has_cart(&self) -> bool {
        matches!(self.state, CartState::HasCart(_))
    }

    /// The id of the confirmed cart.
    pub fn cart_id(&self) -> Option<&CartId> {
        self.get().map(|snapshot| &snapshot.id)
    }

    /// Whether there is no cart or the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.get().is_none_or(CartSnapshot::is_empty)
    }

    /// Number of replacements since the store was created.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Atomically replace the confirmed cart, returning the previous one.
    pub fn replace(&mut self, snapshot: CartSnapshot) -> Option<CartSnapshot> {
        if let Some(current) = self.cart_id().filter(|current| *current != &snapshot.id) {
            warn!(from = %current, to = %snapshot.id, "backend replaced the session cart");
        }

        self.version += 1;

        debug!(cart_id = %snapshot.id, version = self.version, "cart snapshot replaced");

        match std::mem::replace(&mut self.state, CartState::HasCart(snapshot)) {
            CartState::NoCart => None,
            CartState::HasCart(previous) => Some(previous),
        }
    }
}
