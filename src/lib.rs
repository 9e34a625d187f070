//! Storefront Cart
//!
//! Optimistic cart synchronisation for headless storefronts. A [`session::CartSession`]
//! shows the shopper's latest intended cart immediately and converges to the
//! commerce backend's confirmed cart as mutations resolve.

pub mod actions;
pub mod backend;
pub mod cart;
pub mod errors;
pub mod ids;
pub mod prelude;
pub mod projection;
pub mod queue;
pub mod render;
pub mod session;
pub mod snapshot;
pub mod storefront;
