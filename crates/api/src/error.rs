//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CartError, CheckoutError, DomainError};
use market_store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client (e.g. an unparseable id).
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::Forbidden { .. } => (StatusCode::FORBIDDEN, err.to_string()),

        DomainError::Cart(cart_err) => match cart_err {
            CartError::ItemNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
            CartError::ProductUnavailable { .. } | CartError::InsufficientStock { .. } => {
                (StatusCode::CONFLICT, err.to_string())
            }
        },

        DomainError::Checkout(checkout_err) => match checkout_err {
            // A cart that is missing or empty reads the same to the buyer.
            CheckoutError::EmptyCart => (StatusCode::NOT_FOUND, err.to_string()),
            CheckoutError::ProductUnavailable { .. } => (StatusCode::CONFLICT, err.to_string()),
        },

        // Illegal transitions, insufficient stock at acceptance, lost
        // races, already-cancelled: all conflicts.
        DomainError::Order(_) => (StatusCode::CONFLICT, err.to_string()),

        // Two concurrent first-adds for the same (buyer, seller) pair.
        DomainError::Store(StoreError::DuplicateCart) => (StatusCode::CONFLICT, err.to_string()),

        DomainError::Store(_) => {
            tracing::error!(error = %err, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderId, ProductId};
    use domain::OrderError;
    use market_store::OrderStatus;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let err = ApiError::Domain(DomainError::Validation("quantity".into()));
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_and_forbidden() {
        assert_eq!(
            status_of(ApiError::Domain(DomainError::not_found("order", OrderId::new()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ApiError::Domain(DomainError::forbidden("order", OrderId::new()))),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn conflict_family() {
        assert_eq!(
            status_of(ApiError::Domain(
                OrderError::IllegalTransition {
                    from: OrderStatus::Pending,
                    to: OrderStatus::Delivered,
                }
                .into()
            )),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ApiError::Domain(OrderError::AlreadyCancelled.into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ApiError::Domain(
                CartError::ProductUnavailable {
                    product_id: ProductId::new(),
                }
                .into()
            )),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn store_failures_are_internal_and_opaque() {
        let err = ApiError::Domain(DomainError::Store(StoreError::Corrupted(
            "bad status".into(),
        )));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
