use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    BuyerId, Cart, CartId, MarketStore, Order, OrderId, OrderStatus, Product, ProductId, Result,
    SellerId, StockEffect, StoreError, TransitionOutcome,
};

#[derive(Debug, Default)]
struct MemoryState {
    products: HashMap<ProductId, Product>,
    carts: HashMap<CartId, Cart>,
    orders: HashMap<OrderId, Order>,
    order_sequence: u64,
}

/// Applies a stock effect to the product table, or reports the first line
/// that cannot be reserved. Reserve is checked across all lines before any
/// of them is mutated, so a failure leaves every counter untouched.
fn apply_stock_effect(
    products: &mut HashMap<ProductId, Product>,
    effect: &StockEffect,
) -> Result<TransitionOutcome> {
    let mut outcome = TransitionOutcome::default();

    match effect {
        StockEffect::None => {}
        StockEffect::Reserve(lines) => {
            for line in lines {
                let available = products
                    .get(&line.product_id)
                    .map(|product| product.stock)
                    .unwrap_or(0);
                if available < line.quantity {
                    return Err(StoreError::InsufficientStock {
                        product_id: line.product_id,
                        requested: line.quantity,
                    });
                }
            }
            for line in lines {
                if let Some(product) = products.get_mut(&line.product_id) {
                    product.stock -= line.quantity;
                    product.updated_at = Utc::now();
                }
            }
        }
        StockEffect::Restock(lines) => {
            for line in lines {
                match products.get_mut(&line.product_id) {
                    Some(product) => {
                        product.stock += line.quantity;
                        product.updated_at = Utc::now();
                    }
                    None => outcome.skipped_products.push(line.product_id),
                }
            }
        }
        StockEffect::RecordSales(lines) => {
            for line in lines {
                match products.get_mut(&line.product_id) {
                    Some(product) => {
                        product.sales_count += u64::from(line.quantity);
                        product.updated_at = Utc::now();
                    }
                    None => outcome.skipped_products.push(line.product_id),
                }
            }
        }
    }

    Ok(outcome)
}

/// In-memory market store for tests and local development.
///
/// A single lock guards all tables, so the composite operations are
/// atomic exactly like their transactional PostgreSQL counterparts.
#[derive(Clone, Default)]
pub struct InMemoryMarketStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryMarketStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current stock counter for a product, for assertions.
    pub async fn stock_of(&self, id: ProductId) -> Option<u32> {
        self.state
            .read()
            .await
            .products
            .get(&id)
            .map(|product| product.stock)
    }

    /// Returns the number of cart documents, for assertions.
    pub async fn cart_count(&self) -> usize {
        self.state.read().await.carts.len()
    }

    /// Deletes a product listing, standing in for the catalog
    /// collaborator that owns product removal.
    pub async fn remove_product(&self, id: ProductId) -> bool {
        self.state.write().await.products.remove(&id).is_some()
    }
}

#[async_trait]
impl MarketStore for InMemoryMarketStore {
    async fn insert_product(&self, product: Product) -> Result<()> {
        let mut state = self.state.write().await;
        state.products.insert(product.id, product);
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<_> = state.products.values().cloned().collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn get_cart(&self, id: CartId) -> Result<Option<Cart>> {
        Ok(self.state.read().await.carts.get(&id).cloned())
    }

    async fn find_cart_for_seller(
        &self,
        buyer: BuyerId,
        seller: SellerId,
    ) -> Result<Option<Cart>> {
        let state = self.state.read().await;
        Ok(state
            .carts
            .values()
            .find(|cart| cart.buyer == buyer && cart.seller == seller)
            .cloned())
    }

    async fn find_cart_with_product(
        &self,
        buyer: BuyerId,
        product_id: ProductId,
    ) -> Result<Option<Cart>> {
        let state = self.state.read().await;
        Ok(state
            .carts
            .values()
            .find(|cart| cart.buyer == buyer && cart.item_quantity(product_id).is_some())
            .cloned())
    }

    async fn list_carts(&self, buyer: BuyerId) -> Result<Vec<Cart>> {
        let state = self.state.read().await;
        let mut carts: Vec<_> = state
            .carts
            .values()
            .filter(|cart| cart.buyer == buyer)
            .cloned()
            .collect();
        carts.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(carts)
    }

    async fn save_cart(&self, cart: &Cart) -> Result<()> {
        let mut state = self.state.write().await;

        let duplicate = state.carts.values().any(|existing| {
            existing.id != cart.id
                && existing.buyer == cart.buyer
                && existing.seller == cart.seller
        });
        if duplicate {
            return Err(StoreError::DuplicateCart);
        }

        state.carts.insert(cart.id, cart.clone());
        Ok(())
    }

    async fn delete_cart(&self, id: CartId) -> Result<bool> {
        Ok(self.state.write().await.carts.remove(&id).is_some())
    }

    async fn next_order_sequence(&self) -> Result<u64> {
        let mut state = self.state.write().await;
        state.order_sequence += 1;
        Ok(state.order_sequence)
    }

    async fn create_order(&self, order: &Order, cart_id: CartId) -> Result<()> {
        let mut state = self.state.write().await;

        if state
            .orders
            .values()
            .any(|existing| existing.order_number == order.order_number)
        {
            return Err(StoreError::DuplicateOrderNumber(order.order_number.clone()));
        }

        state.orders.insert(order.id, order.clone());
        state.carts.remove(&cart_id);
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn list_orders_for_buyer(&self, buyer: BuyerId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|order| order.buyer == buyer)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn list_orders_for_seller(
        &self,
        seller: SellerId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|order| order.seller == seller)
            .filter(|order| status.is_none_or(|wanted| order.status == wanted))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_order_notes(&self, id: OrderId, notes: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let order = state.orders.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "order",
            id: id.to_string(),
        })?;
        order.seller_notes = Some(notes.to_string());
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn transition_order(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        notes: Option<&str>,
        effect: StockEffect,
    ) -> Result<TransitionOutcome> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let order = state.orders.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "order",
            id: id.to_string(),
        })?;
        if order.status != from {
            return Err(StoreError::StatusConflict {
                order_id: id,
                expected: from,
            });
        }

        // Stock first: a rejected reserve must leave the status untouched.
        let outcome = apply_stock_effect(&mut state.products, &effect)?;

        order.status = to;
        if let Some(notes) = notes {
            order.seller_notes = Some(notes.to_string());
        }
        order.updated_at = Utc::now();

        Ok(outcome)
    }
}
