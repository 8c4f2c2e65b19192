use common::{BuyerId, Money, SellerId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{CartService, CheckoutRequest, CheckoutService, OrderService, PricingPolicy};
use market_store::{
    InMemoryMarketStore, MarketStore, OrderStatus, Product, ShippingAddress,
};

fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Bench Buyer".to_string(),
        address: "1 Bench Road".to_string(),
        city: "Benchville".to_string(),
        zip_code: "00000".to_string(),
        phone: "555-0000".to_string(),
    }
}

fn bench_add_to_cart(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryMarketStore::new();
    let carts = CartService::new(store.clone());
    let product = Product::new(SellerId::new(), "Apples", Money::from_cents(100), u32::MAX);
    rt.block_on(async { store.insert_product(product.clone()).await.unwrap() });

    c.bench_function("domain/add_to_cart", |b| {
        b.iter(|| {
            rt.block_on(async {
                carts
                    .add_item(BuyerId::new(), product.id, 1)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_checkout(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryMarketStore::new();
    let carts = CartService::new(store.clone());
    let checkout = CheckoutService::new(store.clone(), PricingPolicy::default());
    let product = Product::new(SellerId::new(), "Apples", Money::from_cents(100), u32::MAX);
    rt.block_on(async { store.insert_product(product.clone()).await.unwrap() });

    c.bench_function("domain/checkout", |b| {
        b.iter(|| {
            rt.block_on(async {
                let buyer = BuyerId::new();
                let added = carts.add_item(buyer, product.id, 2).await.unwrap();
                checkout
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
            });
        });
    });
}

fn bench_accept_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryMarketStore::new();
    let carts = CartService::new(store.clone());
    let checkout = CheckoutService::new(store.clone(), PricingPolicy::default());
    let orders = OrderService::new(store.clone());
    let product = Product::new(SellerId::new(), "Apples", Money::from_cents(100), u32::MAX);
    let seller = product.seller;
    rt.block_on(async { store.insert_product(product.clone()).await.unwrap() });

    c.bench_function("domain/accept_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                let buyer = BuyerId::new();
                let added = carts.add_item(buyer, product.id, 1).await.unwrap();
                let order = checkout
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
                orders
                    .update_status(seller, order.id, OrderStatus::Processing, None)
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_add_to_cart,
    bench_checkout,
    bench_accept_order
);
criterion_main!(benches);
