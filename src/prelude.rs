//! Storefront cart prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    actions::{ActionKey, ActionKind, CartAction, LineAdd, LineUpdate},
    backend::{BackendError, CartBackend, UserError},
    cart::{CartCost, CartLine, CartSnapshot, DiscountCode, LineCost, Money},
    errors::{CartError, CartFailure},
    ids::{CartId, CartLineId, MerchandiseId},
    projection::{ProjectedCart, ProjectedDiscountCode, ProjectedLine, project},
    queue::{ActionStatus, ActionTicket, PendingAction, PendingActionQueue, Resolution},
    render::write_cart,
    session::{CartSession, DispatchOutcome, PendingError},
    snapshot::{CartState, SnapshotStore},
    storefront::{StorefrontClient, StorefrontConfig},
};
