//! End-to-end flows over the in-memory store: cart → checkout → order
//! lifecycle, exercising the cross-entity invariants.

use common::{BuyerId, Money, SellerId};
use domain::{
    CartService, CheckoutRequest, CheckoutService, DomainError, OrderError, OrderService,
    PricingPolicy,
};
use market_store::{
    InMemoryMarketStore, MarketStore, OrderStatus, PaymentMethod, Product, ShippingAddress,
};

struct World {
    store: InMemoryMarketStore,
    carts: CartService<InMemoryMarketStore>,
    checkout: CheckoutService<InMemoryMarketStore>,
    orders: OrderService<InMemoryMarketStore>,
}

fn world() -> World {
    let store = InMemoryMarketStore::new();
    World {
        carts: CartService::new(store.clone()),
        checkout: CheckoutService::new(store.clone(), PricingPolicy::default()),
        orders: OrderService::new(store.clone()),
        store,
    }
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

async fn seed(world: &World, name: &str, price_cents: i64, stock: u32) -> Product {
    let product = Product::new(
        SellerId::new(),
        name,
        Money::from_cents(price_cents),
        stock,
    );
    world.store.insert_product(product.clone()).await.unwrap();
    product
}

#[tokio::test]
async fn full_lifecycle_pending_to_delivered() {
    let w = world();
    let product = seed(&w, "Apples", 100, 10).await;
    let buyer = BuyerId::new();

    let added = w.carts.add_item(buyer, product.id, 4).await.unwrap();
    let order = w
        .checkout
        .checkout(
            buyer,
            CheckoutRequest {
                cart_id: added.cart.id,
                shipping_address: address(),
                payment_method: Some(PaymentMethod::CashOnDelivery),
            },
        )
        .await
        .unwrap();

    // Checkout reserved nothing.
    assert_eq!(w.store.stock_of(product.id).await, Some(10));

    w.orders
        .update_status(product.seller, order.id, OrderStatus::Processing, None)
        .await
        .unwrap();
    assert_eq!(w.store.stock_of(product.id).await, Some(6));

    w.orders
        .update_status(product.seller, order.id, OrderStatus::Shipped, None)
        .await
        .unwrap();
    let delivered = w
        .orders
        .update_status(product.seller, order.id, OrderStatus::Delivered, None)
        .await
        .unwrap();

    assert_eq!(delivered.status, OrderStatus::Delivered);
    let final_product = w.store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(final_product.stock, 6);
    assert_eq!(final_product.sales_count, 4);
}

#[tokio::test]
async fn add_then_remove_leaves_no_cart_document() {
    let w = world();
    let product = seed(&w, "Apples", 100, 10).await;
    let buyer = BuyerId::new();

    w.carts.add_item(buyer, product.id, 3).await.unwrap();
    let outcome = w.carts.remove_item(buyer, product.id).await.unwrap();

    assert!(outcome.cart_deleted);
    assert_eq!(w.store.cart_count().await, 0);
    assert!(w.carts.list_carts(buyer).await.unwrap().is_empty());
}

#[tokio::test]
async fn totals_scenario_apple_and_pear_below_threshold() {
    let w = world();
    let seller = SellerId::new();
    let apple = Product::new(seller, "Apple", Money::from_cents(100), 10);
    let pear = Product::new(seller, "Pear", Money::from_cents(200), 10);
    w.store.insert_product(apple.clone()).await.unwrap();
    w.store.insert_product(pear.clone()).await.unwrap();
    let buyer = BuyerId::new();

    w.carts.add_item(buyer, apple.id, 2).await.unwrap();
    let added = w.carts.add_item(buyer, pear.id, 1).await.unwrap();

    let order = w
        .checkout
        .checkout(
            buyer,
            CheckoutRequest {
                cart_id: added.cart.id,
                shipping_address: address(),
                payment_method: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(order.subtotal(), Money::from_cents(400));
    assert_eq!(
        order.total_amount,
        Money::from_cents(400) + PricingPolicy::default().flat_surcharge
    );
}

#[tokio::test]
async fn cancellation_scenario_restocks_and_conflicts_on_repeat() {
    let w = world();
    let apple = seed(&w, "Apple", 100, 10).await;
    let buyer = BuyerId::new();

    let added = w.carts.add_item(buyer, apple.id, 2).await.unwrap();
    let order = w
        .checkout
        .checkout(
            buyer,
            CheckoutRequest {
                cart_id: added.cart.id,
                shipping_address: address(),
                payment_method: None,
            },
        )
        .await
        .unwrap();

    w.orders
        .update_status(apple.seller, order.id, OrderStatus::Processing, None)
        .await
        .unwrap();
    assert_eq!(w.store.stock_of(apple.id).await, Some(8));

    let cancelled = w.orders.cancel(buyer, order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(w.store.stock_of(apple.id).await, Some(10));

    let err = w.orders.cancel(buyer, order.id).await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::Order(OrderError::AlreadyCancelled)
    ));
}

#[tokio::test]
async fn concurrent_acceptances_reserve_for_exactly_one_order() {
    let w = world();
    let product = seed(&w, "Apples", 100, 5).await;
    let seller = product.seller;

    // Two buyers each place a qty-3 order against stock 5.
    let mut order_ids = Vec::new();
    for _ in 0..2 {
        let buyer = BuyerId::new();
        let added = w.carts.add_item(buyer, product.id, 3).await.unwrap();
        let order = w
            .checkout
            .checkout(
                buyer,
                CheckoutRequest {
                    cart_id: added.cart.id,
                    shipping_address: address(),
                    payment_method: None,
                },
            )
            .await
            .unwrap();
        order_ids.push(order.id);
    }

    let service_a = OrderService::new(w.store.clone());
    let service_b = OrderService::new(w.store.clone());
    let (a_id, b_id) = (order_ids[0], order_ids[1]);
    let (a, b) = tokio::join!(
        tokio::spawn(async move {
            service_a
                .update_status(seller, a_id, OrderStatus::Processing, None)
                .await
        }),
        tokio::spawn(async move {
            service_b
                .update_status(seller, b_id, OrderStatus::Processing, None)
                .await
        }),
    );

    let results = [a.unwrap(), b.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(DomainError::Order(OrderError::InsufficientStock { .. }))
    )));
    // Stock is 2, not 5 and not -1.
    assert_eq!(w.store.stock_of(product.id).await, Some(2));
}

#[tokio::test]
async fn net_zero_stock_effect_for_a_reserved_then_cancelled_order() {
    let w = world();
    let seller = SellerId::new();
    let apple = Product::new(seller, "Apple", Money::from_cents(100), 7);
    let pear = Product::new(seller, "Pear", Money::from_cents(200), 4);
    w.store.insert_product(apple.clone()).await.unwrap();
    w.store.insert_product(pear.clone()).await.unwrap();
    let buyer = BuyerId::new();

    w.carts.add_item(buyer, apple.id, 5).await.unwrap();
    let added = w.carts.add_item(buyer, pear.id, 4).await.unwrap();
    let order = w
        .checkout
        .checkout(
            buyer,
            CheckoutRequest {
                cart_id: added.cart.id,
                shipping_address: address(),
                payment_method: None,
            },
        )
        .await
        .unwrap();

    w.orders
        .update_status(seller, order.id, OrderStatus::Processing, None)
        .await
        .unwrap();
    assert_eq!(w.store.stock_of(apple.id).await, Some(2));
    assert_eq!(w.store.stock_of(pear.id).await, Some(0));

    w.orders
        .update_status(seller, order.id, OrderStatus::Cancelled, None)
        .await
        .unwrap();

    // Every reserved unit came back: net zero.
    assert_eq!(w.store.stock_of(apple.id).await, Some(7));
    assert_eq!(w.store.stock_of(pear.id).await, Some(4));
}

#[tokio::test]
async fn seller_sees_the_order_with_its_snapshot_after_product_edits() {
    let w = world();
    let mut product = seed(&w, "Apples", 150, 10).await;
    let buyer = BuyerId::new();

    let added = w.carts.add_item(buyer, product.id, 2).await.unwrap();
    let order = w
        .checkout
        .checkout(
            buyer,
            CheckoutRequest {
                cart_id: added.cart.id,
                shipping_address: address(),
                payment_method: None,
            },
        )
        .await
        .unwrap();

    // The catalog renames and reprices the product afterwards.
    product.name = "Heritage apples".to_string();
    product.price = Money::from_cents(500);
    w.store.insert_product(product.clone()).await.unwrap();

    let seen = w
        .orders
        .get_for_seller(product.seller, order.id)
        .await
        .unwrap();
    assert_eq!(seen.items[0].name, "Apples");
    assert_eq!(seen.items[0].unit_price, Money::from_cents(150));
    assert_eq!(seen.total_amount, order.total_amount);
}

#[tokio::test]
async fn seller_listing_filters_by_status() {
    let w = world();
    let product = seed(&w, "Apples", 100, 10).await;
    let buyer = BuyerId::new();

    for _ in 0..2 {
        let added = w.carts.add_item(buyer, product.id, 1).await.unwrap();
        w.checkout
            .checkout(
                buyer,
                CheckoutRequest {
                    cart_id: added.cart.id,
                    shipping_address: address(),
                    payment_method: None,
                },
            )
            .await
            .unwrap();
    }

    let all = w
        .orders
        .list_for_seller(product.seller, None)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    w.orders
        .update_status(product.seller, all[0].id, OrderStatus::Declined, None)
        .await
        .unwrap();

    let pending = w
        .orders
        .list_for_seller(product.seller, Some(OrderStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);

    let history = w.orders.list_for_buyer(buyer).await.unwrap();
    assert_eq!(history.len(), 2);
}
