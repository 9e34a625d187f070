//! Optimistic Projection
//!
//! [`project`] merges the confirmed snapshot with queued intents into the cart
//! shown to consumers. It never mutates its inputs and never suspends, so it is
//! safe to call on every render.
//!
//! Intents are applied in a fixed order relative to the snapshot, regardless of
//! enqueue order: quantity updates, then removals, then additions. A line that
//! is both updated and removed therefore always ends up removed.

use crate::{
    actions::CartAction,
    cart::{CartCost, CartLine, CartSnapshot, LineCost, total_quantity},
    errors::CartFailure,
    ids::{CartId, CartLineId, MerchandiseId},
    queue::PendingAction,
};

/// A line as presented to consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedLine {
    /// Backend line id; `None` for optimistic lines.
    pub id: Option<CartLineId>,

    /// The variant being purchased.
    pub merchandise_id: MerchandiseId,

    /// Quantity including pending intents.
    pub quantity: u32,

    /// Backend cost; `None` while the line only exists optimistically.
    pub cost: Option<LineCost>,

    /// Whether the line is not yet confirmed by the backend.
    pub is_optimistic: bool,

    /// The last failed mutation targeting this line, if any.
    pub error: Option<CartFailure>,
}

impl ProjectedLine {
    fn confirmed(line: &CartLine) -> Self {
        Self {
            id: Some(line.id.clone()),
            merchandise_id: line.merchandise_id.clone(),
            quantity: line.quantity,
            cost: Some(line.cost.clone()),
            is_optimistic: false,
            error: None,
        }
    }

    fn optimistic(merchandise_id: &MerchandiseId, quantity: u32) -> Self {
        Self {
            id: None,
            merchandise_id: merchandise_id.clone(),
            quantity,
            cost: None,
            is_optimistic: true,
            error: None,
        }
    }

    /// Quantity for a "decrease" control.
    pub fn decrement_quantity(&self) -> u32 {
        self.quantity.saturating_sub(1)
    }

    /// Quantity for an "increase" control.
    pub fn increment_quantity(&self) -> u32 {
        self.quantity.saturating_add(1)
    }

    /// Decreasing below one is done by removing the line instead.
    pub fn can_decrement(&self) -> bool {
        self.quantity > 1 && !self.is_optimistic
    }

    /// Optimistic lines have no id to target yet.
    pub fn can_increment(&self) -> bool {
        !self.is_optimistic
    }

    /// Optimistic lines have no id to target yet.
    pub fn can_remove(&self) -> bool {
        !self.is_optimistic
    }
}

/// A discount code as presented to consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedDiscountCode {
    /// The code.
    pub code: String,

    /// Backend verdict; `None` until a pending change is confirmed.
    pub applicable: Option<bool>,
}

/// The cart consumers render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectedCart {
    /// Confirmed cart id, if a cart exists.
    pub id: Option<CartId>,

    /// Lines in display order, optimistic lines last.
    pub lines: Vec<ProjectedLine>,

    /// Sum of all projected line quantities.
    pub total_quantity: u32,

    /// Discount codes including pending changes.
    pub discount_codes: Vec<ProjectedDiscountCode>,

    /// Last confirmed cart cost. Stale while [`Self::has_pending`] is true.
    pub cost: Option<CartCost>,

    /// Checkout URL of the confirmed cart.
    pub checkout_url: Option<String>,

    /// Number of intents still awaiting the backend.
    pub pending: usize,
}

impl ProjectedCart {
    /// Count for a cart badge.
    pub fn badge_count(&self) -> u32 {
        self.total_quantity
    }

    /// Whether there is nothing to show.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether any intents are still in flight.
    pub fn has_pending(&self) -> bool {
        self.pending > 0
    }

    /// Whether at least one discount code is confirmed applicable.
    pub fn has_applicable_discount(&self) -> bool {
        self.discount_codes
            .iter()
            .any(|code| code.applicable == Some(true))
    }

    /// Find a projected line by backend id.
    pub fn line(&self, id: &CartLineId) -> Option<&ProjectedLine> {
        self.lines.iter().find(|line| line.id.as_ref() == Some(id))
    }
}

/// Merge a snapshot with queued intents.
pub fn project(snapshot: Option<&CartSnapshot>, pending: &[PendingAction]) -> ProjectedCart {
    let mut lines: Vec<ProjectedLine> = snapshot
        .map(|snapshot| snapshot.lines.iter().map(ProjectedLine::confirmed).collect())
        .unwrap_or_default();

    let active: Vec<&CartAction> = pending
        .iter()
        .filter(|entry| !entry.is_failed())
        .map(PendingAction::action)
        .collect();

    for action in &active {
        if let CartAction::UpdateLines(updates) = action {
            for update in updates {
                if let Some(line) = lines
                    .iter_mut()
                    .find(|line| line.id.as_ref() == Some(&update.id))
                {
                    line.quantity = update.quantity;
                }
            }
        }
    }

    lines.retain(|line| line.quantity > 0);

    for action in &active {
        if let CartAction::RemoveLines(ids) = action {
            lines.retain(|line| line.id.as_ref().is_none_or(|id| !ids.contains(id)));
        }
    }

    for action in &active {
        if let CartAction::AddLines(adds) = action {
            lines.extend(
                adds.iter()
                    .map(|add| ProjectedLine::optimistic(&add.merchandise_id, add.quantity)),
            );
        }
    }

    for entry in pending {
        let Some(failure) = entry.failure() else {
            continue;
        };

        for line in &mut lines {
            if line
                .id
                .as_ref()
                .is_some_and(|id| entry.action().targets_line(id))
            {
                line.error = Some(failure.clone());
            }
        }
    }

    let discount_codes = project_discount_codes(snapshot, &active);
    let unlisted = snapshot.map_or(0, |snapshot| {
        let listed = total_quantity(snapshot.lines.iter().map(|line| line.quantity));

        snapshot.total_quantity.saturating_sub(listed)
    });
    let total_quantity =
        total_quantity(lines.iter().map(|line| line.quantity)).saturating_add(unlisted);

    ProjectedCart {
        id: snapshot.map(|snapshot| snapshot.id.clone()),
        lines,
        total_quantity,
        discount_codes,
        cost: snapshot.and_then(|snapshot| snapshot.cost.clone()),
        checkout_url: snapshot.and_then(|snapshot| snapshot.checkout_url.clone()),
        pending: active.len(),
    }
}

fn project_discount_codes(
    snapshot: Option<&CartSnapshot>,
    active: &[&CartAction],
) -> Vec<ProjectedDiscountCode> {
    let requested = active.iter().rev().find_map(|action| match action {
        CartAction::UpdateDiscountCodes(codes) => Some(codes),
        CartAction::AddLines(_) | CartAction::UpdateLines(_) | CartAction::RemoveLines(_) => None,
    });

    if let Some(codes) = requested {
        return codes
            .iter()
            .map(|code| ProjectedDiscountCode {
                code: code.clone(),
                applicable: None,
            })
            .collect();
    }

    snapshot
        .map(|snapshot| {
            snapshot
                .discount_codes
                .iter()
                .map(|code| ProjectedDiscountCode {
                    code: code.code.clone(),
                    applicable: Some(code.applicable),
                })
                .collect()
        })
        .unwrap_or_default()
}
