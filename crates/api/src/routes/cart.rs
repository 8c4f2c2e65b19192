//! Cart endpoints (buyer surface).

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CartId, ProductId, SellerId};
use domain::{CartLineView, CartView};
use market_store::{Cart, MarketStore};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::Buyer;
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartResponse {
    pub cart_id: CartId,
    pub seller_id: SellerId,
    pub items: Vec<CartLineResponse>,
}

#[derive(Serialize)]
pub struct CartLineResponse {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        Self {
            cart_id: cart.id,
            seller_id: cart.seller,
            items: cart
                .items
                .iter()
                .map(|item| CartLineResponse {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
pub struct RemoveItemResponse {
    pub cart_deleted: bool,
    pub cart: Option<CartResponse>,
}

#[derive(Serialize)]
pub struct CartSummaryResponse {
    pub cart_id: CartId,
    pub seller_id: SellerId,
    pub subtotal_cents: i64,
    pub items: Vec<CartLineSummaryResponse>,
}

#[derive(Serialize)]
pub struct CartLineSummaryResponse {
    pub product_id: ProductId,
    pub quantity: u32,
    pub product: Option<ProductSummaryResponse>,
}

#[derive(Serialize)]
pub struct ProductSummaryResponse {
    pub name: String,
    pub unit_price_cents: i64,
    pub stock: u32,
    pub is_active: bool,
}

impl From<CartView> for CartSummaryResponse {
    fn from(view: CartView) -> Self {
        Self {
            cart_id: view.id,
            seller_id: view.seller,
            subtotal_cents: view.subtotal.cents(),
            items: view.items.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<CartLineView> for CartLineSummaryResponse {
    fn from(line: CartLineView) -> Self {
        Self {
            product_id: line.product_id,
            quantity: line.quantity,
            product: line.product.map(|p| ProductSummaryResponse {
                name: p.name,
                unit_price_cents: p.unit_price.cents(),
                stock: p.stock,
                is_active: p.is_active,
            }),
        }
    }
}

// -- Handlers --

/// POST /cart/items — add a product to the buyer's cart for that
/// product's seller. 201 when the cart was created, 200 when updated.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Buyer(buyer): Buyer,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartResponse>), ApiError> {
    let outcome = state
        .carts
        .add_item(buyer, req.product_id, req.quantity)
        .await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(CartResponse::from(&outcome.cart))))
}

/// PUT /cart/items/{product_id} — overwrite a line's quantity.
#[tracing::instrument(skip(state, req))]
pub async fn update_item<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Buyer(buyer): Buyer,
    Path(product_id): Path<ProductId>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .carts
        .update_item(buyer, product_id, req.quantity)
        .await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// DELETE /cart/items/{product_id} — remove a line; the cart document is
/// deleted when its last line goes.
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Buyer(buyer): Buyer,
    Path(product_id): Path<ProductId>,
) -> Result<Json<RemoveItemResponse>, ApiError> {
    let outcome = state.carts.remove_item(buyer, product_id).await?;
    Ok(Json(RemoveItemResponse {
        cart_deleted: outcome.cart_deleted,
        cart: outcome.cart.as_ref().map(CartResponse::from),
    }))
}

/// GET /cart — all of the buyer's carts with product summaries.
#[tracing::instrument(skip(state))]
pub async fn list<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Buyer(buyer): Buyer,
) -> Result<Json<Vec<CartSummaryResponse>>, ApiError> {
    let views = state.carts.list_carts(buyer).await?;
    Ok(Json(views.into_iter().map(Into::into).collect()))
}
