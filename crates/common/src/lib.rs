//! Shared types used across the marketplace crates.
//!
//! Identifier newtypes keep the five kinds of UUID-backed ids from being
//! mixed up at compile time; [`Money`] keeps all price arithmetic in
//! integer cents.

mod money;
mod types;

pub use money::Money;
pub use types::{BuyerId, CartId, OrderId, ProductId, SellerId};
