//! Storefront GraphQL response shapes.

use serde::Deserialize;
use tracing::warn;

use crate::{
    backend::{BackendError, UserError},
    cart::{CartCost, CartLine, CartSnapshot, DiscountCode, LineCost, total_quantity},
    ids::{CartId, CartLineId, MerchandiseId},
};

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse<T> {
    pub(crate) data: Option<T>,

    #[serde(default)]
    pub(crate) errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub(crate) message: String,
}

impl<T> GraphQlResponse<T> {
    pub(crate) fn into_data(self) -> Result<T, BackendError> {
        if !self.errors.is_empty() {
            let messages = self
                .errors
                .iter()
                .map(|error| error.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");

            return Err(BackendError::UnexpectedResponse(messages));
        }

        self.data
            .ok_or_else(|| BackendError::UnexpectedResponse("response has no data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CartQueryData {
    pub(crate) cart: Option<CartNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MutationData {
    pub(crate) payload: Option<CartPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartPayload {
    cart: Option<CartNode>,

    #[serde(default)]
    user_errors: Vec<UserError>,
}

impl CartPayload {
    pub(crate) fn into_snapshot(self) -> Result<CartSnapshot, BackendError> {
        if !self.user_errors.is_empty() {
            return Err(BackendError::Rejected(self.user_errors));
        }

        self.cart.map(CartSnapshot::from).ok_or_else(|| {
            BackendError::UnexpectedResponse("mutation returned no cart".to_string())
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartNode {
    id: CartId,
    checkout_url: Option<String>,
    total_quantity: u32,
    cost: Option<CartCost>,

    #[serde(default)]
    discount_codes: Vec<DiscountCode>,
    lines: Connection<LineNode>,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct LineNode {
    id: CartLineId,
    quantity: u32,
    cost: LineCost,
    merchandise: MerchandiseNode,
}

#[derive(Debug, Deserialize)]
struct MerchandiseNode {
    id: MerchandiseId,
}

impl CartNode {
    /// Quantity the backend counts but the fetched line page does not list.
    fn unlisted_quantity(&self) -> u32 {
        let listed = total_quantity(self.lines.nodes.iter().map(|line| line.quantity));

        self.total_quantity.saturating_sub(listed)
    }
}

impl From<CartNode> for CartSnapshot {
    fn from(node: CartNode) -> Self {
        let unlisted = node.unlisted_quantity();

        if unlisted > 0 {
            warn!(
                cart_id = %node.id,
                total_quantity = node.total_quantity,
                unlisted,
                "cart has more lines than were fetched"
            );
        }

        let lines = node
            .lines
            .nodes
            .into_iter()
            .map(|line| CartLine {
                id: line.id,
                merchandise_id: line.merchandise.id,
                quantity: line.quantity,
                cost: line.cost,
            })
            .collect();

        Self {
            id: node.id,
            lines,
            total_quantity: node.total_quantity,
            discount_codes: node.discount_codes,
            cost: node.cost,
            checkout_url: node.checkout_url,
        }
    }
}
