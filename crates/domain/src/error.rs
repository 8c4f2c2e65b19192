//! Domain error types.

use market_store::StoreError;
use thiserror::Error;

use crate::{CartError, CheckoutError, OrderError};

/// Errors that can occur during domain operations.
///
/// The four broad kinds the HTTP layer cares about are: validation
/// (malformed input), not-found, authorization (acting on someone
/// else's cart or order) and the conflict family carried by the
/// per-component enums.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Cart aggregator error.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout transaction error.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Order state machine error.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// The request itself was malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The referenced document does not exist.
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// The caller does not own the referenced document.
    #[error("not allowed to access {resource} {id}")]
    Forbidden { resource: &'static str, id: String },

    /// An unexpected persistence failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError {
    /// Shorthand for a not-found error on a resource.
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Shorthand for an ownership violation on a resource.
    pub fn forbidden(resource: &'static str, id: impl ToString) -> Self {
        DomainError::Forbidden {
            resource,
            id: id.to_string(),
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
