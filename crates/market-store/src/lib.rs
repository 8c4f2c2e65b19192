//! Persistence layer for the marketplace.
//!
//! Owns the persisted documents (products, carts, orders) and the
//! [`MarketStore`] trait through which every other component mutates them.
//! Stock is never written by reading a product and saving it back: the
//! trait expresses every stock change as an atomic conditional operation,
//! and the per-transition stock mutations commit together with the order's
//! status write as a single unit.
//!
//! Two implementations are provided: [`InMemoryMarketStore`] for tests and
//! local development, and [`PostgresMarketStore`] backed by sqlx.

pub mod cart;
pub mod error;
pub mod memory;
pub mod order;
pub mod postgres;
pub mod product;
pub mod store;

pub use cart::{Cart, CartItem};
pub use common::{BuyerId, CartId, Money, OrderId, ProductId, SellerId};
pub use error::{Result, StoreError};
pub use memory::InMemoryMarketStore;
pub use order::{Order, OrderItem, OrderStatus, PaymentMethod, ShippingAddress};
pub use postgres::PostgresMarketStore;
pub use product::{ApprovalStatus, Product};
pub use store::{MarketStore, StockEffect, StockLine, TransitionOutcome};
