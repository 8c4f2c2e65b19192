//! Order state machine service.

use common::{BuyerId, OrderId, ProductId, SellerId};
use market_store::{
    MarketStore, Order, OrderItem, OrderStatus, StockEffect, StockLine, StoreError,
};
use thiserror::Error;

use crate::error::{DomainError, Result};

/// Errors specific to order status transitions.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The requested edge does not exist in the state machine.
    #[error("cannot move an order from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    /// Accepting the order would drive some product's stock negative.
    #[error("insufficient stock for {name}")]
    InsufficientStock { name: String, product_id: ProductId },

    /// The buyer asked to cancel an order that already is.
    #[error("order is already cancelled")]
    AlreadyCancelled,

    /// The buyer asked to cancel an order past the point of no return.
    #[error("an order in the {status} status can no longer be cancelled")]
    NotCancellable { status: OrderStatus },

    /// A concurrent transition moved the order first.
    #[error("order was modified concurrently, reload and retry")]
    ConcurrentUpdate,
}

/// Maps a legal edge to its stock side effect.
///
/// The effect is a property of the edge alone: the seller declining and
/// the buyer cancelling a Processing order restock identically.
pub fn stock_effect(from: OrderStatus, to: OrderStatus, items: &[OrderItem]) -> StockEffect {
    let lines = || {
        items
            .iter()
            .map(|item| StockLine {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect()
    };

    use OrderStatus::*;
    match (from, to) {
        (Pending, Processing) => StockEffect::Reserve(lines()),
        (Processing | Shipped, Cancelled | Declined) => StockEffect::Restock(lines()),
        (previous, Delivered) if previous != Delivered => StockEffect::RecordSales(lines()),
        _ => StockEffect::None,
    }
}

/// Service driving the order status lifecycle.
///
/// Both callers go through the same machinery: the seller's explicit
/// status updates and the buyer's cancellation differ only in which
/// edges they are allowed to request.
pub struct OrderService<S> {
    store: S,
}

impl<S: MarketStore> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads an order for its buyer.
    pub async fn get_for_buyer(&self, buyer: BuyerId, id: OrderId) -> Result<Order> {
        let order = self
            .store
            .get_order(id)
            .await?
            .ok_or_else(|| DomainError::not_found("order", id))?;
        if order.buyer != buyer {
            return Err(DomainError::forbidden("order", id));
        }
        Ok(order)
    }

    /// Lists a buyer's order history, most recent first.
    pub async fn list_for_buyer(&self, buyer: BuyerId) -> Result<Vec<Order>> {
        Ok(self.store.list_orders_for_buyer(buyer).await?)
    }

    /// Loads an order for its seller.
    pub async fn get_for_seller(&self, seller: SellerId, id: OrderId) -> Result<Order> {
        let order = self
            .store
            .get_order(id)
            .await?
            .ok_or_else(|| DomainError::not_found("order", id))?;
        if order.seller != seller {
            return Err(DomainError::forbidden("order", id));
        }
        Ok(order)
    }

    /// Lists a seller's orders, optionally filtered by status.
    pub async fn list_for_seller(
        &self,
        seller: SellerId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>> {
        Ok(self.store.list_orders_for_seller(seller, status).await?)
    }

    /// Seller-initiated status update to an explicit target status.
    ///
    /// Applies whichever side effect corresponds to the edge actually
    /// taken; the transition and its stock mutations commit as one unit.
    #[tracing::instrument(skip(self, notes))]
    pub async fn update_status(
        &self,
        seller: SellerId,
        id: OrderId,
        target: OrderStatus,
        notes: Option<String>,
    ) -> Result<Order> {
        let order = self.get_for_seller(seller, id).await?;

        if !order.status.can_transition_to(target) {
            return Err(OrderError::IllegalTransition {
                from: order.status,
                to: target,
            }
            .into());
        }

        self.apply_transition(&order, target, notes.as_deref())
            .await?;

        if target == OrderStatus::Delivered {
            metrics::counter!("orders_delivered_total").increment(1);
        }

        self.reload(id).await
    }

    /// Buyer-initiated cancellation.
    ///
    /// Permitted only while the order is Pending or Processing. Reuses
    /// the same edge effects as the seller path: cancelling a Pending
    /// order restores nothing (nothing was reserved), cancelling a
    /// Processing order restocks every line.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, buyer: BuyerId, id: OrderId) -> Result<Order> {
        let order = self.get_for_buyer(buyer, id).await?;

        if order.status == OrderStatus::Cancelled {
            return Err(OrderError::AlreadyCancelled.into());
        }
        if !order.status.buyer_can_cancel() {
            return Err(OrderError::NotCancellable {
                status: order.status,
            }
            .into());
        }

        self.apply_transition(&order, OrderStatus::Cancelled, None)
            .await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        self.reload(id).await
    }

    /// Seller note update. No status change, no stock side effects.
    #[tracing::instrument(skip(self, notes))]
    pub async fn update_notes(
        &self,
        seller: SellerId,
        id: OrderId,
        notes: String,
    ) -> Result<Order> {
        self.get_for_seller(seller, id).await?;
        self.store.update_order_notes(id, &notes).await?;
        self.reload(id).await
    }

    async fn apply_transition(
        &self,
        order: &Order,
        target: OrderStatus,
        notes: Option<&str>,
    ) -> Result<()> {
        let effect = stock_effect(order.status, target, &order.items);

        let outcome = self
            .store
            .transition_order(order.id, order.status, target, notes, effect)
            .await
            .map_err(|e| match e {
                StoreError::InsufficientStock { product_id, .. } => {
                    metrics::counter!("stock_reservations_rejected_total").increment(1);
                    let name = order
                        .items
                        .iter()
                        .find(|item| item.product_id == product_id)
                        .map(|item| item.name.clone())
                        .unwrap_or_else(|| product_id.to_string());
                    DomainError::Order(OrderError::InsufficientStock { name, product_id })
                }
                StoreError::StatusConflict { .. } => {
                    DomainError::Order(OrderError::ConcurrentUpdate)
                }
                other => DomainError::Store(other),
            })?;

        for product_id in outcome.skipped_products {
            tracing::warn!(
                order_id = %order.id,
                %product_id,
                "product missing during restock, line skipped"
            );
        }

        tracing::info!(
            order_id = %order.id,
            from = %order.status,
            to = %target,
            "order transitioned"
        );
        Ok(())
    }

    async fn reload(&self, id: OrderId) -> Result<Order> {
        self.store
            .get_order(id)
            .await?
            .ok_or_else(|| DomainError::not_found("order", id))
    }
}
