//! Cart Snapshot

use std::fmt::{Display, Formatter, Result as FmtResult};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{CartId, CartLineId, MerchandiseId};

/// Marker for purchasable variants. Merchandise is opaque to the cart engine.
#[derive(Debug)]
pub enum Merchandise {}

/// An amount as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    /// Decimal amount in major units.
    pub amount: Decimal,

    /// ISO 4217 currency code.
    pub currency_code: String,
}

impl Money {
    /// Create a new amount.
    pub fn new(amount: Decimal, currency_code: impl Into<String>) -> Self {
        Self {
            amount,
            currency_code: currency_code.into(),
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} {}", self.amount, self.currency_code)
    }
}

/// Cost of a single line at its current quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineCost {
    /// Total for the line, computed by the backend.
    pub total_amount: Money,
}

/// Cart-level cost summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCost {
    /// Sum of line totals before cart-level discounts.
    pub subtotal_amount: Money,

    /// Amount due.
    pub total_amount: Money,
}

/// A discount code applied to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountCode {
    /// The code as entered.
    pub code: String,

    /// Whether the backend accepted the code for the current cart contents.
    pub applicable: bool,
}

/// One confirmed merchandise line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Backend-assigned line id.
    pub id: CartLineId,

    /// The variant being purchased.
    pub merchandise_id: MerchandiseId,

    /// Quantity; a line at zero is removed by the backend rather than retained.
    pub quantity: u32,

    /// Backend-computed cost at the current quantity.
    pub cost: LineCost,
}

/// Authoritative, server-confirmed cart state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSnapshot {
    /// Cart id, stable for the session once created.
    pub id: CartId,

    /// Lines in display order.
    pub lines: Vec<CartLine>,

    /// Sum of all line quantities.
    pub total_quantity: u32,

    /// Applied discount codes.
    pub discount_codes: Vec<DiscountCode>,

    /// Cart-level cost, when the backend reports it.
    pub cost: Option<CartCost>,

    /// Where to send the shopper to pay.
    pub checkout_url: Option<String>,
}

impl CartSnapshot {
    /// Create a snapshot from lines, deriving the total quantity.
    pub fn new(id: CartId, lines: Vec<CartLine>) -> Self {
        let total_quantity = total_quantity(lines.iter().map(|line| line.quantity));

        Self {
            id,
            lines,
            total_quantity,
            discount_codes: Vec::new(),
            cost: None,
            checkout_url: None,
        }
    }

    /// Find a line by id.
    pub fn line(&self, id: &CartLineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.id == id)
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Sum line quantities, saturating at `u32::MAX`.
pub(crate) fn total_quantity(quantities: impl Iterator<Item = u32>) -> u32 {
    quantities.fold(0, u32::saturating_add)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn line(id: &str, quantity: u32) -> CartLine {
        CartLine {
            id: CartLineId::new(id),
            merchandise_id: MerchandiseId::new(format!("variant-{id}")),
            quantity,
            cost: LineCost {
                total_amount: Money::new(Decimal::from(quantity) * Decimal::TEN, "GBP"),
            },
        }
    }

    #[test]
    fn new_derives_total_quantity() {
        let snapshot = CartSnapshot::new(CartId::new("cart"), vec![line("a", 2), line("b", 3)]);

        assert_eq!(snapshot.total_quantity, 5);
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn total_quantity_saturates() {
        let snapshot = CartSnapshot::new(
            CartId::new("cart"),
            vec![line("a", u32::MAX), line("b", 1)],
        );

        assert_eq!(snapshot.total_quantity, u32::MAX);
    }

    #[test]
    fn line_lookup_by_id() {
        let snapshot = CartSnapshot::new(CartId::new("cart"), vec![line("a", 2)]);

        assert_eq!(
            snapshot.line(&CartLineId::new("a")).map(|l| l.quantity),
            Some(2)
        );
        assert!(snapshot.line(&CartLineId::new("missing")).is_none());
    }

    #[test]
    fn money_displays_amount_and_currency() {
        let money = Money::new(Decimal::new(1999, 2), "USD");

        assert_eq!(money.to_string(), "19.99 USD");
    }
}
