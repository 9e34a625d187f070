//! Cart errors.

use thiserror::Error;

use crate::{
    backend::{BackendError, UserError},
    ids::MerchandiseId,
};

/// Errors returned to callers of the cart session.
///
/// Backend failures during a mutation are not reported here; they become
/// failed queue entries instead.
#[derive(Debug, Error)]
pub enum CartError {
    /// The action carries no lines.
    #[error("cart action has no lines")]
    EmptyAction,

    /// Lines cannot be added with a zero quantity.
    #[error("cannot add {0} with a quantity of zero")]
    ZeroQuantity(MerchandiseId),

    /// The same line or merchandise appears twice in one action.
    #[error("cart action targets {0} more than once")]
    DuplicateTarget(String),

    /// Discount codes must not be blank.
    #[error("discount code cannot be blank")]
    BlankDiscountCode,

    /// Only adding lines may create a cart.
    #[error("no cart exists yet")]
    NoCart,

    /// The initial cart could not be loaded.
    #[error("failed to load cart")]
    Load(#[source] BackendError),
}

/// Why a dispatched mutation did not apply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartFailure {
    /// The call did not complete, or completed with an unreadable answer.
    #[error("network failure: {0}")]
    Network(String),

    /// The backend refused the mutation.
    #[error("{}", join_messages(.0))]
    Rejected(Vec<UserError>),
}

impl From<BackendError> for CartFailure {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::Rejected(errors) => Self::Rejected(errors),
            other => Self::Network(other.to_string()),
        }
    }
}

fn join_messages(errors: &[UserError]) -> String {
    if errors.is_empty() {
        return "cart mutation rejected".to_string();
    }

    errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
