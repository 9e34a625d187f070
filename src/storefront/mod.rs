//! Storefront GraphQL client.
//!
//! Implements [`CartBackend`] against a Shopify-style Storefront API.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::{
    actions::CartAction,
    backend::{BackendError, CartBackend},
    cart::CartSnapshot,
    ids::CartId,
};

use self::responses::{CartQueryData, GraphQlResponse, MutationData};

mod responses;

const GET_CART_QUERY: &str = concat!(
    include_str!("graphql/get_cart.graphql"),
    include_str!("graphql/cart_fragment.graphql")
);
const CART_CREATE_MUTATION: &str = concat!(
    include_str!("graphql/cart_create.graphql"),
    include_str!("graphql/cart_fragment.graphql")
);
const CART_LINES_ADD_MUTATION: &str = concat!(
    include_str!("graphql/cart_lines_add.graphql"),
    include_str!("graphql/cart_fragment.graphql")
);
const CART_LINES_UPDATE_MUTATION: &str = concat!(
    include_str!("graphql/cart_lines_update.graphql"),
    include_str!("graphql/cart_fragment.graphql")
);
const CART_LINES_REMOVE_MUTATION: &str = concat!(
    include_str!("graphql/cart_lines_remove.graphql"),
    include_str!("graphql/cart_fragment.graphql")
);
const CART_DISCOUNT_CODES_UPDATE_MUTATION: &str = concat!(
    include_str!("graphql/cart_discount_codes_update.graphql"),
    include_str!("graphql/cart_fragment.graphql")
);

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

/// Configuration for connecting to a storefront.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Store domain, e.g. `"shop.example.com"`. A full `http(s)://` origin is
    /// used as-is.
    pub store_domain: String,

    /// Storefront API version, e.g. `"2025-01"`.
    pub api_version: String,

    /// Public storefront access token.
    pub access_token: String,
}

impl StorefrontConfig {
    /// GraphQL endpoint URL.
    #[must_use]
    pub fn graphql_url(&self) -> String {
        let domain = self.store_domain.trim_end_matches('/');

        let origin = if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("https://{domain}")
        };

        format!("{origin}/api/{}/graphql.json", self.api_version)
    }
}

/// HTTP client for storefront cart operations.
#[derive(Debug, Clone)]
pub struct StorefrontClient {
    config: StorefrontConfig,
    http: Client,
}

impl StorefrontClient {
    /// Create a new client from the given configuration.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: &Value,
    ) -> Result<T, BackendError> {
        let body = json!({ "query": query, "variables": variables });

        let response = self
            .http
            .post(self.config.graphql_url())
            .header(ACCESS_TOKEN_HEADER, &self.config.access_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(BackendError::UnexpectedResponse(format!(
                "storefront request failed with status {status}: {text}"
            )));
        }

        let parsed: GraphQlResponse<T> = response.json().await?;

        parsed.into_data()
    }
}

#[async_trait]
impl CartBackend for StorefrontClient {
    async fn get_cart(&self, cart_id: CartId) -> Result<Option<CartSnapshot>, BackendError> {
        debug!(%cart_id, "fetching cart");

        let data: CartQueryData = self
            .execute(GET_CART_QUERY, &json!({ "cartId": cart_id }))
            .await?;

        Ok(data.cart.map(CartSnapshot::from))
    }

    async fn mutate_cart_lines(
        &self,
        cart_id: Option<CartId>,
        action: CartAction,
    ) -> Result<CartSnapshot, BackendError> {
        let (query, variables) = mutation_request(cart_id.as_ref(), &action)?;

        debug!(kind = %action.kind(), cart_id = ?cart_id, "sending cart mutation");

        let data: MutationData = self.execute(query, &variables).await?;

        data.payload
            .ok_or_else(|| BackendError::UnexpectedResponse("mutation returned no payload".into()))?
            .into_snapshot()
    }
}

/// Choose the mutation document and variables for an action.
fn mutation_request(
    cart_id: Option<&CartId>,
    action: &CartAction,
) -> Result<(&'static str, Value), BackendError> {
    let Some(cart_id) = cart_id else {
        return match action {
            CartAction::AddLines(_) => Ok((
                CART_CREATE_MUTATION,
                json!({ "input": { "lines": line_inputs(action) } }),
            )),
            CartAction::UpdateLines(_)
            | CartAction::RemoveLines(_)
            | CartAction::UpdateDiscountCodes(_) => Err(BackendError::MissingCart),
        };
    };

    let request = match action {
        CartAction::AddLines(_) => (
            CART_LINES_ADD_MUTATION,
            json!({ "cartId": cart_id, "lines": line_inputs(action) }),
        ),
        CartAction::UpdateLines(_) => (
            CART_LINES_UPDATE_MUTATION,
            json!({ "cartId": cart_id, "lines": line_inputs(action) }),
        ),
        CartAction::RemoveLines(ids) => (
            CART_LINES_REMOVE_MUTATION,
            json!({ "cartId": cart_id, "lineIds": ids }),
        ),
        CartAction::UpdateDiscountCodes(codes) => (
            CART_DISCOUNT_CODES_UPDATE_MUTATION,
            json!({ "cartId": cart_id, "discountCodes": codes }),
        ),
    };

    Ok(request)
}

fn line_inputs(action: &CartAction) -> Value {
    match action {
        CartAction::AddLines(adds) => adds
            .iter()
            .map(|add| json!({ "merchandiseId": add.merchandise_id, "quantity": add.quantity }))
            .collect(),
        CartAction::UpdateLines(updates) => updates
            .iter()
            .map(|update| json!({ "id": update.id, "quantity": update.quantity }))
            .collect(),
        CartAction::RemoveLines(_) | CartAction::UpdateDiscountCodes(_) => Value::Array(Vec::new()),
    }
}
