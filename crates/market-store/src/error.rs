use thiserror::Error;

use crate::{OrderId, OrderStatus, ProductId};

/// Errors that can occur when interacting with the market store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A conditional stock decrement was rejected because the product is
    /// missing or does not have enough stock left.
    #[error("insufficient stock for product {product_id}: requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
    },

    /// The order's status compare-and-set found a different status than
    /// expected: a concurrent transition won the race.
    #[error("order {order_id} is no longer in the {expected} status")]
    StatusConflict {
        order_id: OrderId,
        expected: OrderStatus,
    },

    /// A cart for this (buyer, seller) pair already exists.
    #[error("a cart for this buyer and seller already exists")]
    DuplicateCart,

    /// The order number collided with an existing order.
    #[error("order number {0} is already taken")]
    DuplicateOrderNumber(String),

    /// The referenced document was not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A stored record could not be interpreted (e.g. an unknown status
    /// label in the database).
    #[error("corrupt record: {0}")]
    Corrupted(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for market store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
