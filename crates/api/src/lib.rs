//! HTTP API server for the marketplace order and inventory engine.
//!
//! Exposes the buyer surface (cart, checkout, order history, cancel), the
//! seller surface (order list, status updates, notes) and read-only
//! catalog views, with structured logging (tracing) and Prometheus
//! metrics. Identity arrives as trusted headers from the external
//! authentication collaborator; see [`auth`].

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post, put};
use domain::{CartService, CheckoutService, OrderService, PricingPolicy};
use market_store::MarketStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub carts: CartService<S>,
    pub checkout: CheckoutService<S>,
    pub orders: OrderService<S>,
    pub store: S,
}

/// Creates the application state over any market store.
pub fn create_state<S: MarketStore + Clone>(
    store: S,
    pricing: PricingPolicy,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        carts: CartService::new(store.clone()),
        checkout: CheckoutService::new(store.clone(), pricing),
        orders: OrderService::new(store.clone()),
        store,
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: MarketStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        // Buyer surface
        .route("/cart", get(routes::cart::list::<S>))
        .route("/cart/items", post(routes::cart::add_item::<S>))
        .route(
            "/cart/items/{product_id}",
            put(routes::cart::update_item::<S>).delete(routes::cart::remove_item::<S>),
        )
        .route("/checkout", post(routes::checkout::checkout::<S>))
        .route("/orders", get(routes::orders::list_for_buyer::<S>))
        .route("/orders/{id}", get(routes::orders::get_for_buyer::<S>))
        .route("/orders/{id}/cancel", put(routes::orders::cancel::<S>))
        // Seller surface
        .route(
            "/orders/{id}/status",
            patch(routes::orders::update_status::<S>),
        )
        .route(
            "/orders/{id}/notes",
            patch(routes::orders::update_notes::<S>),
        )
        .route("/seller/orders", get(routes::orders::list_for_seller::<S>))
        .route(
            "/seller/orders/{id}",
            get(routes::orders::get_for_seller::<S>),
        )
        // Read-only catalog views
        .route("/products", get(routes::products::list::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
