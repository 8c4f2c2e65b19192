//! Read-only catalog views.
//!
//! Listing CRUD belongs to the external catalog collaborator; these
//! endpoints only expose what this core reads.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{ProductId, SellerId};
use domain::DomainError;
use market_store::{MarketStore, Product};
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub seller_id: SellerId,
    pub name: String,
    pub price_cents: i64,
    pub stock: u32,
    pub sales_count: u64,
    pub is_active: bool,
    pub approval_status: String,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            seller_id: product.seller,
            name: product.name,
            price_cents: product.price.cents(),
            stock: product.stock,
            sales_count: product.sales_count,
            is_active: product.is_active,
            approval_status: product.approval_status.to_string(),
        }
    }
}

/// GET /products — list all product listings.
#[tracing::instrument(skip(state))]
pub async fn list<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state
        .store
        .list_products()
        .await
        .map_err(DomainError::Store)?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// GET /products/{id} — a single product listing.
#[tracing::instrument(skip(state))]
pub async fn get<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .store
        .get_product(id)
        .await
        .map_err(DomainError::Store)?
        .ok_or_else(|| DomainError::not_found("product", id))?;
    Ok(Json(product.into()))
}
