//! In-memory storefront used by the integration tests.
//!
//! Behaves like the real backend where it matters to the engine: mutations
//! return the whole resulting cart, adds for known merchandise merge into the
//! existing line, and a call without a cart id creates a fresh cart.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Notify;

use storefront_cart::prelude::*;

pub const UNIT_PRICE: i64 = 10;

/// Pauses one backend call until released.
#[derive(Debug, Default)]
pub struct Hold {
    entered: Notify,
    release: Notify,
}

impl Hold {
    /// Wait until the held call has reached the backend.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the held call proceed.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Debug)]
struct FakeState {
    cart: Option<CartSnapshot>,
    carts_created: u32,
    next_line: u32,
    stock: u32,
    fail_network: bool,
    calls: u32,
}

#[derive(Debug)]
pub struct FakeStorefront {
    state: Mutex<FakeState>,
    holds: Mutex<VecDeque<Arc<Hold>>>,
}

impl FakeStorefront {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                cart: None,
                carts_created: 0,
                next_line: 0,
                stock: u32::MAX,
                fail_network: false,
                calls: 0,
            }),
            holds: Mutex::new(VecDeque::new()),
        }
    }

    /// A storefront that already has a cart with `(line id, merchandise id, quantity)` lines.
    pub fn with_cart(cart_id: &str, lines: &[(&str, &str, u32)]) -> Self {
        let fake = Self::new();

        {
            let mut state = fake.state();
            let lines = lines
                .iter()
                .map(|(id, merchandise, quantity)| line(id, merchandise, *quantity))
                .collect();

            state.cart = Some(priced(CartSnapshot::new(CartId::new(cart_id), lines)));
        }

        fake
    }

    /// Hold the next mutation until [`Hold::release`] is called.
    pub fn hold_next(&self) -> Arc<Hold> {
        let hold = Arc::new(Hold::default());

        self.holds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Arc::clone(&hold));

        hold
    }

    /// Maximum quantity any line may reach.
    pub fn set_stock(&self, stock: u32) {
        self.state().stock = stock;
    }

    pub fn fail_network(&self, fail: bool) {
        self.state().fail_network = fail;
    }

    pub fn cart(&self) -> Option<CartSnapshot> {
        self.state().cart.clone()
    }

    pub fn carts_created(&self) -> u32 {
        self.state().carts_created
    }

    pub fn calls(&self) -> u32 {
        self.state().calls
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(
        &self,
        cart_id: Option<CartId>,
        action: &CartAction,
    ) -> Result<CartSnapshot, BackendError> {
        let mut state = self.state();

        state.calls += 1;

        if state.fail_network {
            return Err(BackendError::UnexpectedResponse("connection reset".to_string()));
        }

        let mut cart = match (cart_id, action) {
            (None, CartAction::AddLines(_)) => {
                state.carts_created += 1;
                CartSnapshot::new(
                    CartId::new(format!("gid://fake/Cart/{}", state.carts_created)),
                    Vec::new(),
                )
            }
            (None, _) => return Err(BackendError::MissingCart),
            (Some(id), _) => match &state.cart {
                Some(cart) if cart.id == id => cart.clone(),
                _ => return Err(BackendError::Rejected(vec![UserError::message("cart not found")])),
            },
        };

        match action {
            CartAction::AddLines(adds) => {
                for add in adds {
                    if let Some(existing) = cart
                        .lines
                        .iter_mut()
                        .find(|line| line.merchandise_id == add.merchandise_id)
                    {
                        existing.quantity += add.quantity;
                    } else {
                        state.next_line += 1;
                        cart.lines.push(line(
                            &format!("gid://fake/CartLine/{}", state.next_line),
                            add.merchandise_id.as_str(),
                            add.quantity,
                        ));
                    }
                }
            }
            CartAction::UpdateLines(updates) => {
                for update in updates {
                    let Some(existing) = cart.lines.iter_mut().find(|line| line.id == update.id)
                    else {
                        return Err(BackendError::Rejected(vec![UserError::message(
                            "line not found",
                        )]));
                    };

                    existing.quantity = update.quantity;
                }

                cart.lines.retain(|line| line.quantity > 0);
            }
            CartAction::RemoveLines(ids) => {
                cart.lines.retain(|line| !ids.contains(&line.id));
            }
            CartAction::UpdateDiscountCodes(codes) => {
                cart.discount_codes = codes
                    .iter()
                    .map(|code| DiscountCode {
                        code: code.clone(),
                        applicable: code == "SAVE10",
                    })
                    .collect();
            }
        }

        if cart.lines.iter().any(|line| line.quantity > state.stock) {
            return Err(BackendError::Rejected(vec![UserError::message(
                "exceeds inventory",
            )]));
        }

        let cart = priced(cart);
        state.cart = Some(cart.clone());

        Ok(cart)
    }
}

impl Default for FakeStorefront {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CartBackend for FakeStorefront {
    async fn get_cart(&self, cart_id: CartId) -> Result<Option<CartSnapshot>, BackendError> {
        Ok(self.cart().filter(|cart| cart.id == cart_id))
    }

    async fn mutate_cart_lines(
        &self,
        cart_id: Option<CartId>,
        action: CartAction,
    ) -> Result<CartSnapshot, BackendError> {
        let hold = self
            .holds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        if let Some(hold) = hold {
            hold.entered.notify_one();
            hold.release.notified().await;
        }

        self.apply(cart_id, &action)
    }
}

pub fn line(id: &str, merchandise: &str, quantity: u32) -> CartLine {
    CartLine {
        id: CartLineId::new(id),
        merchandise_id: MerchandiseId::new(merchandise),
        quantity,
        cost: line_cost(quantity),
    }
}

fn line_cost(quantity: u32) -> LineCost {
    LineCost {
        total_amount: Money::new(Decimal::from(UNIT_PRICE) * Decimal::from(quantity), "GBP"),
    }
}

fn priced(mut cart: CartSnapshot) -> CartSnapshot {
    for line in &mut cart.lines {
        line.cost = line_cost(line.quantity);
    }

    let subtotal: Decimal = cart
        .lines
        .iter()
        .map(|line| line.cost.total_amount.amount)
        .sum();

    cart.total_quantity = cart
        .lines
        .iter()
        .map(|line| line.quantity)
        .fold(0, u32::saturating_add);
    cart.cost = Some(CartCost {
        subtotal_amount: Money::new(subtotal, "GBP"),
        total_amount: Money::new(subtotal, "GBP"),
    });

    cart
}

/// `(line id, quantity)` pairs of a projection, optimistic lines as `None`.
pub fn quantities(cart: &ProjectedCart) -> Vec<(Option<String>, u32)> {
    cart.lines
        .iter()
        .map(|line| (line.id.as_ref().map(ToString::to_string), line.quantity))
        .collect()
}
