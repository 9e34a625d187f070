//! Commerce backend seam.

use std::fmt::{Display, Formatter, Result as FmtResult};

use async_trait::async_trait;
use mockall::automock;
use serde::Deserialize;
use thiserror::Error;

use crate::{actions::CartAction, cart::CartSnapshot, ids::CartId};

/// A validation error reported by the backend for a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserError {
    /// Path to the offending input field, if any.
    #[serde(default)]
    pub field: Option<Vec<String>>,

    /// Human-readable message.
    pub message: String,

    /// Machine-readable code, e.g. `"INVALID"` or `"MERCHANDISE_NOT_ENOUGH_STOCK"`.
    #[serde(default)]
    pub code: Option<String>,
}

impl UserError {
    /// A user error carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
            code: None,
        }
    }
}

impl Display for UserError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.message)
    }
}

/// Errors that can occur when talking to the commerce backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// An HTTP transport or body decoding error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered, but not with something we understand.
    #[error("unexpected response from storefront: {0}")]
    UnexpectedResponse(String),

    /// The backend refused the mutation.
    #[error("cart mutation rejected")]
    Rejected(Vec<UserError>),

    /// A mutation other than adding lines was sent without a cart id.
    #[error("cart mutation requires an existing cart")]
    MissingCart,
}

/// The commerce backend's cart operations.
///
/// Mutations return the complete resulting cart; the engine never merges
/// partial results.
#[automock]
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// Fetch a cart. Returns `None` when the cart no longer exists.
    async fn get_cart(&self, cart_id: CartId) -> Result<Option<CartSnapshot>, BackendError>;

    /// Apply a line mutation and return the resulting cart.
    ///
    /// When `cart_id` is `None` the backend creates a cart as part of the
    /// mutation.
    async fn mutate_cart_lines(
        &self,
        cart_id: Option<CartId>,
        action: CartAction,
    ) -> Result<CartSnapshot, BackendError>;
}
