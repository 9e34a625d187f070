//! Cart Actions
//!
//! Each mutation intent is a tagged variant with its own payload shape. The
//! action's [`ActionKey`] identifies which competing intents supersede each
//! other.

use std::fmt::{Display, Formatter, Result as FmtResult};

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::{
    errors::CartError,
    ids::{CartLineId, MerchandiseId},
};

/// Mutation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionKind {
    /// Add merchandise as new lines.
    AddLines,

    /// Set the quantity of existing lines.
    UpdateLines,

    /// Remove existing lines.
    RemoveLines,

    /// Replace the cart's discount codes.
    UpdateDiscountCodes,
}

impl ActionKind {
    /// Stable name used as the key prefix.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddLines => "LinesAdd",
            Self::UpdateLines => "LinesUpdate",
            Self::RemoveLines => "LinesRemove",
            Self::UpdateDiscountCodes => "DiscountCodesUpdate",
        }
    }
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Merchandise to add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineAdd {
    /// Variant to add.
    pub merchandise_id: MerchandiseId,

    /// Quantity to add, at least one.
    pub quantity: u32,
}

/// New quantity for an existing line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineUpdate {
    /// Line to update.
    pub id: CartLineId,

    /// Absolute quantity; zero removes the line.
    pub quantity: u32,
}

/// A cart mutation intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Add merchandise lines.
    AddLines(Vec<LineAdd>),

    /// Set line quantities.
    UpdateLines(Vec<LineUpdate>),

    /// Remove lines by id.
    RemoveLines(Vec<CartLineId>),

    /// Replace the applied discount codes. An empty list clears them.
    UpdateDiscountCodes(Vec<String>),
}

impl CartAction {
    /// Add a single merchandise line.
    pub fn add_line(merchandise_id: impl Into<MerchandiseId>, quantity: u32) -> Self {
        Self::AddLines(vec![LineAdd {
            merchandise_id: merchandise_id.into(),
            quantity,
        }])
    }

    /// Set the quantity of a single line.
    pub fn update_line(id: impl Into<CartLineId>, quantity: u32) -> Self {
        Self::UpdateLines(vec![LineUpdate {
            id: id.into(),
            quantity,
        }])
    }

    /// Remove a single line.
    pub fn remove_line(id: impl Into<CartLineId>) -> Self {
        Self::RemoveLines(vec![id.into()])
    }

    /// The mutation kind.
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::AddLines(_) => ActionKind::AddLines,
            Self::UpdateLines(_) => ActionKind::UpdateLines,
            Self::RemoveLines(_) => ActionKind::RemoveLines,
            Self::UpdateDiscountCodes(_) => ActionKind::UpdateDiscountCodes,
        }
    }

    /// Whether the action can only run against an existing cart.
    pub const fn requires_cart(&self) -> bool {
        !matches!(self, Self::AddLines(_))
    }

    /// Whether this action names `line` as a target.
    pub fn targets_line(&self, line: &CartLineId) -> bool {
        match self {
            Self::UpdateLines(updates) => updates.iter().any(|update| &update.id == line),
            Self::RemoveLines(ids) => ids.contains(line),
            Self::AddLines(_) | Self::UpdateDiscountCodes(_) => false,
        }
    }

    /// Compute the idempotency key: kind plus sorted target identifiers.
    pub fn key(&self) -> ActionKey {
        let mut targets: SmallVec<[String; 2]> = match self {
            Self::AddLines(adds) => adds
                .iter()
                .map(|add| add.merchandise_id.as_str().to_string())
                .collect(),
            Self::UpdateLines(updates) => updates
                .iter()
                .map(|update| update.id.as_str().to_string())
                .collect(),
            Self::RemoveLines(ids) => ids.iter().map(|id| id.as_str().to_string()).collect(),
            Self::UpdateDiscountCodes(_) => SmallVec::new(),
        };

        targets.sort_unstable();

        ActionKey {
            kind: self.kind(),
            targets,
        }
    }

    /// Check the payload before it is queued.
    ///
    /// # Errors
    ///
    /// Returns a `CartError` for empty payloads, zero-quantity adds, repeated
    /// targets and blank discount codes.
    pub fn validate(&self) -> Result<(), CartError> {
        match self {
            Self::AddLines(adds) => {
                if adds.is_empty() {
                    return Err(CartError::EmptyAction);
                }

                if let Some(add) = adds.iter().find(|add| add.quantity == 0) {
                    return Err(CartError::ZeroQuantity(add.merchandise_id.clone()));
                }

                ensure_distinct(adds.iter().map(|add| add.merchandise_id.as_str()))
            }
            Self::UpdateLines(updates) => {
                if updates.is_empty() {
                    return Err(CartError::EmptyAction);
                }

                ensure_distinct(updates.iter().map(|update| update.id.as_str()))
            }
            Self::RemoveLines(ids) => {
                if ids.is_empty() {
                    return Err(CartError::EmptyAction);
                }

                ensure_distinct(ids.iter().map(CartLineId::as_str))
            }
            Self::UpdateDiscountCodes(codes) => {
                if codes.iter().any(|code| code.trim().is_empty()) {
                    return Err(CartError::BlankDiscountCode);
                }

                ensure_distinct(codes.iter().map(String::as_str))
            }
        }
    }
}

fn ensure_distinct<'a>(targets: impl Iterator<Item = &'a str>) -> Result<(), CartError> {
    let mut seen = FxHashSet::default();

    for target in targets {
        if !seen.insert(target) {
            return Err(CartError::DuplicateTarget(target.to_string()));
        }
    }

    Ok(())
}

/// Idempotency key shared by competing intents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionKey {
    kind: ActionKind,
    targets: SmallVec<[String; 2]>,
}

impl ActionKey {
    /// The mutation kind.
    pub const fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Sorted target identifiers.
    pub fn targets(&self) -> &[String] {
        &self.targets
    }
}

impl Display for ActionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.kind.as_str())?;

        for target in &self.targets {
            write!(f, "-{target}")?;
        }

        Ok(())
    }
}
