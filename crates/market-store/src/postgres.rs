use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{
    BuyerId, Cart, CartId, CartItem, MarketStore, Money, Order, OrderId, OrderItem, OrderStatus,
    Product, ProductId, Result, SellerId, ShippingAddress, StockEffect, StockLine, StoreError,
    TransitionOutcome,
};

/// PostgreSQL-backed market store implementation.
///
/// Stock changes are expressed as conditional `UPDATE ... WHERE stock >= $n`
/// statements inside the transition's transaction; zero rows affected is the
/// insufficient-stock signal. The schema backs the invariants with
/// `CHECK (stock >= 0)`, `UNIQUE (buyer_id, seller_id)` on carts and a
/// unique order number index.
#[derive(Clone)]
pub struct PostgresMarketStore {
    pool: PgPool,
}

impl PostgresMarketStore {
    /// Creates a new PostgreSQL market store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool with sensible defaults.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        let approval: String = row.try_get("approval_status")?;
        let stock: i32 = row.try_get("stock")?;
        let sales_count: i64 = row.try_get("sales_count")?;

        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            seller: SellerId::from_uuid(row.try_get::<Uuid, _>("seller_id")?),
            name: row.try_get("name")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            stock: u32::try_from(stock)
                .map_err(|_| StoreError::Corrupted(format!("negative stock: {stock}")))?,
            sales_count: u64::try_from(sales_count).map_err(|_| {
                StoreError::Corrupted(format!("negative sales count: {sales_count}"))
            })?,
            is_active: row.try_get("is_active")?,
            approval_status: approval.parse().map_err(StoreError::Corrupted)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_cart(row: &PgRow, items: Vec<CartItem>) -> Result<Cart> {
        Ok(Cart {
            id: CartId::from_uuid(row.try_get::<Uuid, _>("id")?),
            buyer: BuyerId::from_uuid(row.try_get::<Uuid, _>("buyer_id")?),
            seller: SellerId::from_uuid(row.try_get::<Uuid, _>("seller_id")?),
            items,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order(row: &PgRow, items: Vec<OrderItem>) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let payment: String = row.try_get("payment_method")?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_number: row.try_get("order_number")?,
            buyer: BuyerId::from_uuid(row.try_get::<Uuid, _>("buyer_id")?),
            seller: SellerId::from_uuid(row.try_get::<Uuid, _>("seller_id")?),
            items,
            total_amount: Money::from_cents(row.try_get("total_cents")?),
            status: status.parse().map_err(StoreError::Corrupted)?,
            shipping_address: ShippingAddress {
                full_name: row.try_get("ship_full_name")?,
                address: row.try_get("ship_address")?,
                city: row.try_get("ship_city")?,
                zip_code: row.try_get("ship_zip_code")?,
                phone: row.try_get("ship_phone")?,
            },
            payment_method: payment.parse().map_err(StoreError::Corrupted)?,
            seller_notes: row.try_get("seller_notes")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn load_cart_items(&self, cart_id: CartId) -> Result<Vec<CartItem>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, quantity
            FROM cart_items
            WHERE cart_id = $1
            ORDER BY added_at ASC
            "#,
        )
        .bind(cart_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let quantity: i32 = row.try_get("quantity")?;
                Ok(CartItem {
                    product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
                    quantity: u32::try_from(quantity).map_err(|_| {
                        StoreError::Corrupted(format!("negative cart quantity: {quantity}"))
                    })?,
                })
            })
            .collect()
    }

    async fn load_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, name, unit_price_cents, quantity, line_total_cents
            FROM order_items
            WHERE order_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let quantity: i32 = row.try_get("quantity")?;
                Ok(OrderItem {
                    product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
                    name: row.try_get("name")?,
                    unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
                    quantity: u32::try_from(quantity).map_err(|_| {
                        StoreError::Corrupted(format!("negative order quantity: {quantity}"))
                    })?,
                    line_total: Money::from_cents(row.try_get("line_total_cents")?),
                })
            })
            .collect()
    }

    async fn fetch_cart_by(&self, sql: &str, binds: &[Uuid]) -> Result<Option<Cart>> {
        let mut query = sqlx::query(sql);
        for bind in binds {
            query = query.bind(*bind);
        }
        let row = query.fetch_optional(&self.pool).await?;

        match row {
            Some(row) => {
                let cart_id = CartId::from_uuid(row.try_get::<Uuid, _>("id")?);
                let items = self.load_cart_items(cart_id).await?;
                Ok(Some(Self::row_to_cart(&row, items)?))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl MarketStore for PostgresMarketStore {
    async fn insert_product(&self, product: Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products
                (id, seller_id, name, price_cents, stock, sales_count,
                 is_active, approval_status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                price_cents = EXCLUDED.price_cents,
                is_active = EXCLUDED.is_active,
                approval_status = EXCLUDED.approval_status,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(product.seller.as_uuid())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(i32::try_from(product.stock).unwrap_or(i32::MAX))
        .bind(i64::try_from(product.sales_count).unwrap_or(i64::MAX))
        .bind(product.is_active)
        .bind(product.approval_status.as_str())
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, seller_id, name, price_cents, stock, sales_count,
                   is_active, approval_status, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, seller_id, name, price_cents, stock, sales_count,
                   is_active, approval_status, created_at, updated_at
            FROM products
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_product).collect()
    }

    async fn get_cart(&self, id: CartId) -> Result<Option<Cart>> {
        self.fetch_cart_by(
            "SELECT id, buyer_id, seller_id, created_at, updated_at FROM carts WHERE id = $1",
            &[id.as_uuid()],
        )
        .await
    }

    async fn find_cart_for_seller(
        &self,
        buyer: BuyerId,
        seller: SellerId,
    ) -> Result<Option<Cart>> {
        self.fetch_cart_by(
            r#"
            SELECT id, buyer_id, seller_id, created_at, updated_at
            FROM carts
            WHERE buyer_id = $1 AND seller_id = $2
            "#,
            &[buyer.as_uuid(), seller.as_uuid()],
        )
        .await
    }

    async fn find_cart_with_product(
        &self,
        buyer: BuyerId,
        product_id: ProductId,
    ) -> Result<Option<Cart>> {
        self.fetch_cart_by(
            r#"
            SELECT c.id, c.buyer_id, c.seller_id, c.created_at, c.updated_at
            FROM carts c
            JOIN cart_items i ON i.cart_id = c.id
            WHERE c.buyer_id = $1 AND i.product_id = $2
            "#,
            &[buyer.as_uuid(), product_id.as_uuid()],
        )
        .await
    }

    async fn list_carts(&self, buyer: BuyerId) -> Result<Vec<Cart>> {
        let rows = sqlx::query(
            r#"
            SELECT id, buyer_id, seller_id, created_at, updated_at
            FROM carts
            WHERE buyer_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(buyer.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let mut carts = Vec::with_capacity(rows.len());
        for row in &rows {
            let cart_id = CartId::from_uuid(row.try_get::<Uuid, _>("id")?);
            let items = self.load_cart_items(cart_id).await?;
            carts.push(Self::row_to_cart(row, items)?);
        }
        Ok(carts)
    }

    async fn save_cart(&self, cart: &Cart) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO carts (id, buyer_id, seller_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(cart.id.as_uuid())
        .bind(cart.buyer.as_uuid())
        .bind(cart.seller.as_uuid())
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("unique_buyer_seller_cart")
            {
                return StoreError::DuplicateCart;
            }
            StoreError::Database(e)
        })?;

        // Replace the line set wholesale; carts are small.
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.id.as_uuid())
            .execute(&mut *tx)
            .await?;

        for item in &cart.items {
            sqlx::query(
                r#"
                INSERT INTO cart_items (cart_id, product_id, quantity)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(cart.id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(i32::try_from(item.quantity).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_cart(&self, id: CartId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn next_order_sequence(&self) -> Result<u64> {
        let value: i64 = sqlx::query_scalar("SELECT nextval('order_number_seq')")
            .fetch_one(&self.pool)
            .await?;
        u64::try_from(value)
            .map_err(|_| StoreError::Corrupted(format!("negative order sequence: {value}")))
    }

    async fn create_order(&self, order: &Order, cart_id: CartId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders
                (id, order_number, buyer_id, seller_id, status, total_cents,
                 ship_full_name, ship_address, ship_city, ship_zip_code, ship_phone,
                 payment_method, seller_notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.order_number)
        .bind(order.buyer.as_uuid())
        .bind(order.seller.as_uuid())
        .bind(order.status.as_str())
        .bind(order.total_amount.cents())
        .bind(&order.shipping_address.full_name)
        .bind(&order.shipping_address.address)
        .bind(&order.shipping_address.city)
        .bind(&order.shipping_address.zip_code)
        .bind(&order.shipping_address.phone)
        .bind(order.payment_method.as_str())
        .bind(&order.seller_notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("unique_order_number")
            {
                return StoreError::DuplicateOrderNumber(order.order_number.clone());
            }
            StoreError::Database(e)
        })?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items
                    (order_id, product_id, name, unit_price_cents, quantity, line_total_cents)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(order.id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(&item.name)
            .bind(item.unit_price.cents())
            .bind(i32::try_from(item.quantity).unwrap_or(i32::MAX))
            .bind(item.line_total.cents())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(cart_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, order_number, buyer_id, seller_id, status, total_cents,
                   ship_full_name, ship_address, ship_city, ship_zip_code, ship_phone,
                   payment_method, seller_notes, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let items = self.load_order_items(id).await?;
                Ok(Some(Self::row_to_order(&row, items)?))
            }
            None => Ok(None),
        }
    }

    async fn list_orders_for_buyer(&self, buyer: BuyerId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_number, buyer_id, seller_id, status, total_cents,
                   ship_full_name, ship_address, ship_city, ship_zip_code, ship_phone,
                   payment_method, seller_notes, created_at, updated_at
            FROM orders
            WHERE buyer_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(buyer.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            let order_id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
            let items = self.load_order_items(order_id).await?;
            orders.push(Self::row_to_order(row, items)?);
        }
        Ok(orders)
    }

    async fn list_orders_for_seller(
        &self,
        seller: SellerId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>> {
        let mut sql = String::from(
            r#"
            SELECT id, order_number, buyer_id, seller_id, status, total_cents,
                   ship_full_name, ship_address, ship_city, ship_zip_code, ship_phone,
                   payment_method, seller_notes, created_at, updated_at
            FROM orders
            WHERE seller_id = $1
            "#,
        );
        if status.is_some() {
            sql.push_str(" AND status = $2");
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut query = sqlx::query(&sql).bind(seller.as_uuid());
        if let Some(status) = status {
            query = query.bind(status.as_str());
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            let order_id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
            let items = self.load_order_items(order_id).await?;
            orders.push(Self::row_to_order(row, items)?);
        }
        Ok(orders)
    }

    async fn update_order_notes(&self, id: OrderId, notes: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET seller_notes = $1, updated_at = $2
            WHERE id = $3
            "#,
        )
        .bind(notes)
        .bind(Utc::now())
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "order",
                id: id.to_string(),
            });
        }
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
        let mut tx = self.pool.begin().await?;

        // Lock the order row and compare-and-set the status. Zero rows
        // affected distinguishes a lost race from a missing order below.
        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;

        let current = current.ok_or(StoreError::NotFound {
            entity: "order",
            id: id.to_string(),
        })?;
        let current: OrderStatus = current.parse().map_err(StoreError::Corrupted)?;
        if current != from {
            return Err(StoreError::StatusConflict {
                order_id: id,
                expected: from,
            });
        }

        let mut outcome = TransitionOutcome::default();
        match &effect {
            StockEffect::None => {}
            StockEffect::Reserve(lines) => {
                for line in lines {
                    let result = sqlx::query(
                        r#"
                        UPDATE products
                        SET stock = stock - $1, updated_at = $2
                        WHERE id = $3 AND stock >= $1
                        "#,
                    )
                    .bind(i32::try_from(line.quantity).unwrap_or(i32::MAX))
                    .bind(Utc::now())
                    .bind(line.product_id.as_uuid())
                    .execute(&mut *tx)
                    .await?;

                    if result.rows_affected() == 0 {
                        // Dropping the transaction rolls back any lines
                        // already decremented.
                        return Err(StoreError::InsufficientStock {
                            product_id: line.product_id,
                            requested: line.quantity,
                        });
                    }
                }
            }
            StockEffect::Restock(lines) => {
                restock_lines(&mut tx, lines, &mut outcome, RestockColumn::Stock).await?;
            }
            StockEffect::RecordSales(lines) => {
                restock_lines(&mut tx, lines, &mut outcome, RestockColumn::SalesCount).await?;
            }
        }

        sqlx::query(
            r#"
            UPDATE orders
            SET status = $1,
                seller_notes = COALESCE($2, seller_notes),
                updated_at = $3
            WHERE id = $4 AND status = $5
            "#,
        )
        .bind(to.as_str())
        .bind(notes)
        .bind(Utc::now())
        .bind(id.as_uuid())
        .bind(from.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            order_id = %id,
            from = %from,
            to = %to,
            "order transition committed"
        );
        Ok(outcome)
    }
}

enum RestockColumn {
    Stock,
    SalesCount,
}

/// Increments `stock` or `sales_count` per line, recording products that
/// no longer exist instead of failing.
async fn restock_lines(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    lines: &[StockLine],
    outcome: &mut TransitionOutcome,
    column: RestockColumn,
) -> Result<()> {
    for line in lines {
        let sql = match column {
            RestockColumn::Stock => {
                "UPDATE products SET stock = stock + $1, updated_at = $2 WHERE id = $3"
            }
            RestockColumn::SalesCount => {
                "UPDATE products SET sales_count = sales_count + $1, updated_at = $2 WHERE id = $3"
            }
        };

        let result = sqlx::query(sql)
            .bind(i32::try_from(line.quantity).unwrap_or(i32::MAX))
            .bind(Utc::now())
            .bind(line.product_id.as_uuid())
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            outcome.skipped_products.push(line.product_id);
        }
    }
    Ok(())
}
