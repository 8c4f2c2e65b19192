//! Business services for the marketplace core.
//!
//! Three services own the cross-entity invariants:
//!
//! - [`CartService`]: one cart per (buyer, seller) pair, additions
//!   validated against live stock, carts deleted when emptied.
//! - [`CheckoutService`]: converts exactly one cart into exactly one
//!   order, with frozen line snapshots, totals computed once, and the
//!   cart deleted in the same storage transaction. Checkout never
//!   touches stock.
//! - [`OrderService`]: the order status state machine. Side effects
//!   (stock reservation, restocking, sales analytics) are a property of
//!   the edge taken, not of the caller, and commit atomically with the
//!   status write.
//!
//! Everything is generic over [`market_store::MarketStore`], so the same
//! logic runs against PostgreSQL in production and the in-memory store in
//! tests.

pub mod cart;
pub mod checkout;
pub mod error;
pub mod order;
pub mod pricing;

pub use cart::{AddItemOutcome, CartError, CartLineView, CartService, CartView, ProductSummary, RemoveItemOutcome};
pub use checkout::{CheckoutError, CheckoutRequest, CheckoutService};
pub use error::{DomainError, Result};
pub use order::{OrderError, OrderService, stock_effect};
pub use pricing::PricingPolicy;
