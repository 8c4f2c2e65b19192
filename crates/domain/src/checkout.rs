//! Checkout transaction service.

use std::time::Instant;

use common::{BuyerId, CartId, Money, ProductId};
use market_store::{MarketStore, Order, OrderItem, PaymentMethod, ShippingAddress};
use thiserror::Error;

use crate::error::{DomainError, Result};
use crate::pricing::PricingPolicy;

/// Errors specific to the checkout transaction.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart exists but holds no lines. Should not happen (empty carts
    /// are deleted), but checkout refuses to mint an empty order.
    #[error("cart is empty")]
    EmptyCart,

    /// A referenced product was deleted or deactivated between cart-add
    /// and checkout. The whole checkout aborts; no order is created.
    #[error("product {product_id} is no longer available")]
    ProductUnavailable { product_id: ProductId },
}

/// Input to [`CheckoutService::checkout`].
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub cart_id: CartId,
    pub shipping_address: ShippingAddress,
    pub payment_method: Option<PaymentMethod>,
}

/// Converts exactly one cart into exactly one order.
///
/// Line items are snapshotted at the current product price; the total is
/// computed once and frozen. The order insert and the cart delete commit
/// as one storage transaction. Stock is untouched here: reservation
/// happens when the seller accepts the order.
pub struct CheckoutService<S> {
    store: S,
    pricing: PricingPolicy,
}

impl<S: MarketStore> CheckoutService<S> {
    /// Creates a checkout service with the given pricing policy.
    pub fn new(store: S, pricing: PricingPolicy) -> Self {
        Self { store, pricing }
    }

    /// Places an order from the buyer's cart.
    #[tracing::instrument(skip(self, request), fields(cart_id = %request.cart_id))]
    pub async fn checkout(&self, buyer: BuyerId, request: CheckoutRequest) -> Result<Order> {
        let start = Instant::now();

        if let Some(field) = request.shipping_address.first_blank_field() {
            return Err(DomainError::Validation(format!(
                "shipping address field `{field}` must not be empty"
            )));
        }

        let cart = self
            .store
            .get_cart(request.cart_id)
            .await?
            .ok_or_else(|| DomainError::not_found("cart", request.cart_id))?;
        if cart.buyer != buyer {
            return Err(DomainError::forbidden("cart", cart.id));
        }
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart.into());
        }

        // Snapshot every line at the current price. Any vanished product
        // aborts the whole transaction before an order exists.
        let mut items = Vec::with_capacity(cart.items.len());
        for line in &cart.items {
            let product = self
                .store
                .get_product(line.product_id)
                .await?
                .filter(|p| p.is_purchasable())
                .ok_or(CheckoutError::ProductUnavailable {
                    product_id: line.product_id,
                })?;
            items.push(OrderItem::new(
                line.product_id,
                product.name,
                product.price,
                line.quantity,
            ));
        }

        let subtotal: Money = items.iter().map(|item| item.line_total).sum();
        let total = self.pricing.order_total(subtotal);

        let sequence = self.store.next_order_sequence().await?;
        let order = Order::new(
            format!("ORD-{sequence:06}"),
            buyer,
            cart.seller,
            items,
            total,
            request.shipping_address,
            request.payment_method.unwrap_or_default(),
        );

        self.store.create_order(&order, cart.id).await?;

        metrics::counter!("orders_placed_total").increment(1);
        metrics::histogram!("checkout_duration_seconds").record(start.elapsed().as_secs_f64());
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total_cents = order.total_amount.cents(),
            "order placed"
        );

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::SellerId;
    use market_store::{InMemoryMarketStore, OrderStatus, Product};

    use crate::cart::CartService;

    fn services() -> (
        CartService<InMemoryMarketStore>,
        CheckoutService<InMemoryMarketStore>,
        InMemoryMarketStore,
    ) {
        let store = InMemoryMarketStore::new();
        (
            CartService::new(store.clone()),
            CheckoutService::new(store.clone(), PricingPolicy::default()),
            store,
        )
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Ada Buyer".to_string(),
            address: "1 Orchard Lane".to_string(),
            city: "Greenfield".to_string(),
            zip_code: "12345".to_string(),
            phone: "555-0101".to_string(),
        }
    }

    fn request(cart_id: CartId) -> CheckoutRequest {
        CheckoutRequest {
            cart_id,
            shipping_address: address(),
            payment_method: None,
        }
    }

    #[tokio::test]
    async fn checkout_totals_include_the_surcharge() {
        let (carts, checkout, store) = services();
        let seller = SellerId::new();
        let apple = Product::new(seller, "Apple", Money::from_cents(100), 10);
        let pear = Product::new(seller, "Pear", Money::from_cents(200), 10);
        store.insert_product(apple.clone()).await.unwrap();
        store.insert_product(pear.clone()).await.unwrap();

        let buyer = BuyerId::new();
        carts.add_item(buyer, apple.id, 2).await.unwrap();
        let outcome = carts.add_item(buyer, pear.id, 1).await.unwrap();

        let order = checkout
            .checkout(buyer, request(outcome.cart.id))
            .await
            .unwrap();

        // 2 * 1.00 + 1 * 2.00 = 4.00 subtotal, below the threshold.
        assert_eq!(order.subtotal().cents(), 400);
        assert_eq!(order.total_amount.cents(), 400 + 599);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.seller, seller);
        assert!(order.order_number.starts_with("ORD-"));
    }

    #[tokio::test]
    async fn checkout_deletes_the_cart_and_leaves_stock_alone() {
        let (carts, checkout, store) = services();
        let product = Product::new(SellerId::new(), "Apple", Money::from_cents(100), 10);
        store.insert_product(product.clone()).await.unwrap();

        let buyer = BuyerId::new();
        let outcome = carts.add_item(buyer, product.id, 3).await.unwrap();
        let cart_id = outcome.cart.id;

        checkout.checkout(buyer, request(cart_id)).await.unwrap();

        assert!(store.get_cart(cart_id).await.unwrap().is_none());
        // Decrement-at-acceptance: checkout itself reserves nothing.
        assert_eq!(store.stock_of(product.id).await, Some(10));
    }

    #[tokio::test]
    async fn checkout_snapshots_the_price_at_checkout_time() {
        let (carts, checkout, store) = services();
        let mut product = Product::new(SellerId::new(), "Apple", Money::from_cents(100), 10);
        store.insert_product(product.clone()).await.unwrap();

        let buyer = BuyerId::new();
        let outcome = carts.add_item(buyer, product.id, 1).await.unwrap();

        // Catalog raises the price after the item went into the cart.
        product.price = Money::from_cents(250);
        store.insert_product(product.clone()).await.unwrap();

        let order = checkout
            .checkout(buyer, request(outcome.cart.id))
            .await
            .unwrap();
        assert_eq!(order.items[0].unit_price.cents(), 250);

        // ...and later edits no longer matter: the snapshot is frozen.
        product.price = Money::from_cents(999);
        store.insert_product(product).await.unwrap();
        let reloaded = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.items[0].unit_price.cents(), 250);
    }

    #[tokio::test]
    async fn missing_cart_is_not_found() {
        let (_, checkout, _) = services();
        let err = checkout
            .checkout(BuyerId::new(), request(CartId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { resource: "cart", .. }));
    }

    #[tokio::test]
    async fn someone_elses_cart_is_forbidden() {
        let (carts, checkout, store) = services();
        let product = Product::new(SellerId::new(), "Apple", Money::from_cents(100), 10);
        store.insert_product(product.clone()).await.unwrap();
        let owner = BuyerId::new();
        let outcome = carts.add_item(owner, product.id, 1).await.unwrap();

        let err = checkout
            .checkout(BuyerId::new(), request(outcome.cart.id))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden { resource: "cart", .. }));
    }

    #[tokio::test]
    async fn deleted_product_aborts_the_whole_checkout() {
        let (carts, checkout, store) = services();
        let seller = SellerId::new();
        let apple = Product::new(seller, "Apple", Money::from_cents(100), 10);
        let pear = Product::new(seller, "Pear", Money::from_cents(200), 10);
        store.insert_product(apple.clone()).await.unwrap();
        store.insert_product(pear.clone()).await.unwrap();

        let buyer = BuyerId::new();
        carts.add_item(buyer, apple.id, 1).await.unwrap();
        let outcome = carts.add_item(buyer, pear.id, 1).await.unwrap();
        let cart_id = outcome.cart.id;

        // The pear listing is deactivated between cart-add and checkout.
        let mut stale = pear.clone();
        stale.is_active = false;
        store.insert_product(stale).await.unwrap();

        let err = checkout.checkout(buyer, request(cart_id)).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Checkout(CheckoutError::ProductUnavailable { .. })
        ));
        // No partial order, and the cart survives.
        assert!(store.get_cart(cart_id).await.unwrap().is_some());
        assert!(store.list_orders_for_buyer(buyer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_shipping_field_is_a_validation_error() {
        let (carts, checkout, store) = services();
        let product = Product::new(SellerId::new(), "Apple", Money::from_cents(100), 10);
        store.insert_product(product.clone()).await.unwrap();
        let buyer = BuyerId::new();
        let outcome = carts.add_item(buyer, product.id, 1).await.unwrap();

        let mut req = request(outcome.cart.id);
        req.shipping_address.phone = String::new();
        let err = checkout.checkout(buyer, req).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn order_numbers_are_sequential_and_unique() {
        let (carts, checkout, store) = services();
        let product = Product::new(SellerId::new(), "Apple", Money::from_cents(100), 10);
        store.insert_product(product.clone()).await.unwrap();

        let first_buyer = BuyerId::new();
        let second_buyer = BuyerId::new();
        let a = carts.add_item(first_buyer, product.id, 1).await.unwrap();
        let b = carts.add_item(second_buyer, product.id, 1).await.unwrap();

        let first = checkout.checkout(first_buyer, request(a.cart.id)).await.unwrap();
        let second = checkout
            .checkout(second_buyer, request(b.cart.id))
            .await
            .unwrap();

        assert_eq!(first.order_number, "ORD-000001");
        assert_eq!(second.order_number, "ORD-000002");
    }
}
