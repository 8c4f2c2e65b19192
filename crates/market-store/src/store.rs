use async_trait::async_trait;

use crate::{
    BuyerId, Cart, CartId, Order, OrderId, OrderStatus, Product, ProductId, Result, SellerId,
};

/// One product/quantity pair affected by a stock side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// The stock mutation that accompanies an order status transition.
///
/// Which variant applies is decided by the edge being taken; the store
/// only executes it, atomically with the status write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockEffect {
    /// The edge moves no stock (e.g. Processing → Shipped).
    None,

    /// Decrement each line's stock, conditioned on `stock >= quantity`.
    /// Any line failing the condition aborts the whole transition.
    Reserve(Vec<StockLine>),

    /// Increment each line's stock. Lines whose product no longer exists
    /// are skipped and reported, never failed.
    Restock(Vec<StockLine>),

    /// Increment each line's product `sales_count`. Missing products are
    /// skipped like in `Restock`.
    RecordSales(Vec<StockLine>),
}

/// What a successful transition additionally reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// Products referenced by a `Restock`/`RecordSales` effect that no
    /// longer exist and were skipped. Callers log these.
    pub skipped_products: Vec<ProductId>,
}

/// Persistence contract for the marketplace.
///
/// Every implementation must uphold three guarantees:
///
/// 1. **Stock is mutated only conditionally.** A reserve is
///    "decrement if sufficient" in a single operation; a failed condition
///    leaves the counter untouched. No operation reads a product and
///    writes the whole document back.
/// 2. **Transitions are one unit.** [`MarketStore::transition_order`]
///    commits the status compare-and-set and its stock effect together,
///    or not at all.
/// 3. **Cart uniqueness.** At most one cart per (buyer, seller) pair;
///    saving a second one fails with [`crate::StoreError::DuplicateCart`].
#[async_trait]
pub trait MarketStore: Send + Sync {
    // ---- products ----

    /// Inserts a product listing.
    ///
    /// Listing CRUD belongs to the catalog collaborator; this exists so
    /// deployments and tests can seed the table the collaborator owns.
    async fn insert_product(&self, product: Product) -> Result<()>;

    /// Fetches a product by id. Returns `None` if it was deleted.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Lists all product listings.
    async fn list_products(&self) -> Result<Vec<Product>>;

    // ---- carts ----

    /// Fetches a cart by id.
    async fn get_cart(&self, id: CartId) -> Result<Option<Cart>>;

    /// Fetches the buyer's cart for a specific seller, if one exists.
    async fn find_cart_for_seller(
        &self,
        buyer: BuyerId,
        seller: SellerId,
    ) -> Result<Option<Cart>>;

    /// Fetches the buyer's cart containing a line for this product.
    async fn find_cart_with_product(
        &self,
        buyer: BuyerId,
        product_id: ProductId,
    ) -> Result<Option<Cart>>;

    /// Lists all carts belonging to a buyer.
    async fn list_carts(&self, buyer: BuyerId) -> Result<Vec<Cart>>;

    /// Inserts or replaces a cart document.
    ///
    /// Fails with `DuplicateCart` when a different cart already exists
    /// for the same (buyer, seller) pair.
    async fn save_cart(&self, cart: &Cart) -> Result<()>;

    /// Deletes a cart document. Returns true if it existed.
    async fn delete_cart(&self, id: CartId) -> Result<bool>;

    // ---- orders ----

    /// Returns the next value of the monotonic order-number sequence.
    async fn next_order_sequence(&self) -> Result<u64>;

    /// Creates an order and deletes the cart it came from, as one unit.
    ///
    /// Checkout never touches stock; reservation happens on the
    /// Pending → Processing edge via [`MarketStore::transition_order`].
    async fn create_order(&self, order: &Order, cart_id: CartId) -> Result<()>;

    /// Fetches an order by id.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists a buyer's orders, most recent first.
    async fn list_orders_for_buyer(&self, buyer: BuyerId) -> Result<Vec<Order>>;

    /// Lists a seller's orders, most recent first, optionally filtered by
    /// status.
    async fn list_orders_for_seller(
        &self,
        seller: SellerId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>>;

    /// Overwrites the seller notes on an order. No status side effects.
    async fn update_order_notes(&self, id: OrderId, notes: &str) -> Result<()>;

    /// Moves an order from `from` to `to` and applies the edge's stock
    /// effect, all as one atomic unit.
    ///
    /// The status write is a compare-and-set on `from`: if a concurrent
    /// transition already moved the order, the call fails with
    /// `StatusConflict` and no stock is touched. A failing `Reserve` line
    /// aborts with `InsufficientStock`, leaving every other line and the
    /// status untouched.
    async fn transition_order(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        notes: Option<&str>,
        effect: StockEffect,
    ) -> Result<TransitionOutcome>;
}
