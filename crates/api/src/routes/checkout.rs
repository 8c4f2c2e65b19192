//! Checkout endpoint (buyer surface).

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::{CartId, OrderId};
use domain::CheckoutRequest;
use market_store::{MarketStore, PaymentMethod, ShippingAddress};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::Buyer;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CheckoutPayload {
    pub cart_id: CartId,
    pub shipping_address: ShippingAddress,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub order_id: OrderId,
    pub order_number: String,
    pub total_cents: i64,
}

/// POST /checkout — convert a cart into a pending order.
#[tracing::instrument(skip(state, payload))]
pub async fn checkout<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Buyer(buyer): Buyer,
    Json(payload): Json<CheckoutPayload>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    let order = state
        .checkout
        .checkout(
            buyer,
            CheckoutRequest {
                cart_id: payload.cart_id,
                shipping_address: payload.shipping_address,
                payment_method: payload.payment_method,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            order_id: order.id,
            order_number: order.order_number,
            total_cents: order.total_amount.cents(),
        }),
    ))
}
