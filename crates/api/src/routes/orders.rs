//! Order endpoints: buyer history and cancellation, seller management.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::{BuyerId, OrderId, ProductId, SellerId};
use market_store::{MarketStore, Order, OrderStatus, ShippingAddress};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::{Buyer, Seller};
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNotesRequest {
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct SellerOrdersQuery {
    pub status: Option<OrderStatus>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub order_number: String,
    pub buyer_id: BuyerId,
    pub seller_id: SellerId,
    pub status: OrderStatus,
    pub items: Vec<OrderItemResponse>,
    pub subtotal_cents: i64,
    pub total_cents: i64,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub seller_notes: Option<String>,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
    pub line_total_cents: i64,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.clone(),
            buyer_id: order.buyer,
            seller_id: order.seller,
            status: order.status,
            subtotal_cents: order.subtotal().cents(),
            total_cents: order.total_amount.cents(),
            items: order
                .items
                .iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id,
                    name: item.name.clone(),
                    unit_price_cents: item.unit_price.cents(),
                    quantity: item.quantity,
                    line_total_cents: item.line_total.cents(),
                })
                .collect(),
            shipping_address: order.shipping_address,
            payment_method: order.payment_method.as_str().to_string(),
            seller_notes: order.seller_notes,
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

// -- Buyer handlers --

/// GET /orders — the buyer's order history.
#[tracing::instrument(skip(state))]
pub async fn list_for_buyer<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Buyer(buyer): Buyer,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_for_buyer(buyer).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /orders/{id} — a single order, buyer view.
#[tracing::instrument(skip(state))]
pub async fn get_for_buyer<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Buyer(buyer): Buyer,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.get_for_buyer(buyer, id).await?;
    Ok(Json(order.into()))
}

/// PUT /orders/{id}/cancel — buyer cancellation.
///
/// 409 when the order is past the point of no return, with a distinct
/// conflict when it is already cancelled.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Buyer(buyer): Buyer,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.cancel(buyer, id).await?;
    Ok(Json(order.into()))
}

// -- Seller handlers --

/// PATCH /orders/{id}/status — seller-driven transition to an explicit
/// target status. 409 on an illegal edge or insufficient stock.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Seller(seller): Seller,
    Path(id): Path<OrderId>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orders
        .update_status(seller, id, req.status, req.notes)
        .await?;
    Ok(Json(order.into()))
}

/// PATCH /orders/{id}/notes — seller note update, no side effects.
#[tracing::instrument(skip(state, req))]
pub async fn update_notes<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Seller(seller): Seller,
    Path(id): Path<OrderId>,
    Json(req): Json<UpdateNotesRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.update_notes(seller, id, req.notes).await?;
    Ok(Json(order.into()))
}

/// GET /seller/orders — the seller's orders, optionally filtered by
/// `?status=`.
#[tracing::instrument(skip(state))]
pub async fn list_for_seller<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Seller(seller): Seller,
    Query(query): Query<SellerOrdersQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_for_seller(seller, query.status).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

/// GET /seller/orders/{id} — a single order, seller view.
#[tracing::instrument(skip(state))]
pub async fn get_for_seller<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Seller(seller): Seller,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.orders.get_for_seller(seller, id).await?;
    Ok(Json(order.into()))
}
