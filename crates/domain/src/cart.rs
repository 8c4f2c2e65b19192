//! Cart aggregator service.

use common::{BuyerId, CartId, Money, ProductId, SellerId};
use market_store::{Cart, MarketStore};
use thiserror::Error;

use crate::error::{DomainError, Result};

/// Errors specific to cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product exists but cannot currently be purchased.
    #[error("product {product_id} is unavailable")]
    ProductUnavailable { product_id: ProductId },

    /// The requested quantity exceeds the live stock counter.
    #[error("insufficient stock for {name}: requested {requested}, available {available}")]
    InsufficientStock {
        name: String,
        requested: u32,
        available: u32,
    },

    /// The product is not a line in any of the buyer's carts.
    #[error("product {product_id} is not in any cart")]
    ItemNotFound { product_id: ProductId },
}

/// Result of adding an item: the updated cart, and whether the cart
/// document was created by this addition.
#[derive(Debug, Clone)]
pub struct AddItemOutcome {
    pub cart: Cart,
    pub created: bool,
}

/// Result of removing an item. `cart` is `None` when removing the last
/// line deleted the cart document itself.
#[derive(Debug, Clone)]
pub struct RemoveItemOutcome {
    pub cart: Option<Cart>,
    pub cart_deleted: bool,
}

/// Display-oriented product fields resolved for a cart line.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSummary {
    pub name: String,
    pub unit_price: Money,
    pub stock: u32,
    pub is_active: bool,
}

/// One cart line with its product summary. `product` is `None` when the
/// listing was deleted after the line was added.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub quantity: u32,
    pub product: Option<ProductSummary>,
}

/// A cart resolved for display.
#[derive(Debug, Clone, PartialEq)]
pub struct CartView {
    pub id: CartId,
    pub seller: SellerId,
    pub items: Vec<CartLineView>,
    /// Subtotal over lines whose product still exists, at live prices.
    pub subtotal: Money,
}

/// Service maintaining one cart per (buyer, seller) pair.
///
/// Homogeneity is structural: the cart a product lands in is derived from
/// the product's own seller, so lines from two sellers can never share a
/// cart.
pub struct CartService<S> {
    store: S,
}

impl<S: MarketStore> CartService<S> {
    /// Creates a new cart service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Adds a quantity of a product to the buyer's cart for that
    /// product's seller, creating the cart if needed.
    ///
    /// The combined line quantity is validated against current stock.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        buyer: BuyerId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<AddItemOutcome> {
        if quantity == 0 {
            return Err(DomainError::Validation(
                "quantity must be at least 1".to_string(),
            ));
        }

        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or_else(|| DomainError::not_found("product", product_id))?;
        if !product.is_purchasable() {
            return Err(CartError::ProductUnavailable { product_id }.into());
        }

        let (mut cart, created) = match self
            .store
            .find_cart_for_seller(buyer, product.seller)
            .await?
        {
            Some(cart) => (cart, false),
            None => (Cart::new(buyer, product.seller), true),
        };

        let combined = cart.item_quantity(product_id).unwrap_or(0) + quantity;
        if combined > product.stock {
            return Err(CartError::InsufficientStock {
                name: product.name,
                requested: combined,
                available: product.stock,
            }
            .into());
        }

        cart.merge_item(product_id, quantity);
        self.store.save_cart(&cart).await?;

        metrics::counter!("cart_items_added_total").increment(1);
        Ok(AddItemOutcome { cart, created })
    }

    /// Overwrites the quantity of an existing cart line.
    ///
    /// The new quantity is re-validated against current stock, the same
    /// check the add path performs.
    #[tracing::instrument(skip(self))]
    pub async fn update_item(
        &self,
        buyer: BuyerId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        if quantity == 0 {
            return Err(DomainError::Validation(
                "quantity must be at least 1; remove the item instead".to_string(),
            ));
        }

        let mut cart = self
            .store
            .find_cart_with_product(buyer, product_id)
            .await?
            .ok_or(CartError::ItemNotFound { product_id })?;

        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or(CartError::ProductUnavailable { product_id })?;
        if quantity > product.stock {
            return Err(CartError::InsufficientStock {
                name: product.name,
                requested: quantity,
                available: product.stock,
            }
            .into());
        }

        cart.set_quantity(product_id, quantity);
        self.store.save_cart(&cart).await?;
        Ok(cart)
    }

    /// Removes a line; deletes the cart document when the last line goes.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        buyer: BuyerId,
        product_id: ProductId,
    ) -> Result<RemoveItemOutcome> {
        let mut cart = self
            .store
            .find_cart_with_product(buyer, product_id)
            .await?
            .ok_or(CartError::ItemNotFound { product_id })?;

        cart.remove_item(product_id);

        if cart.is_empty() {
            self.store.delete_cart(cart.id).await?;
            Ok(RemoveItemOutcome {
                cart: None,
                cart_deleted: true,
            })
        } else {
            self.store.save_cart(&cart).await?;
            Ok(RemoveItemOutcome {
                cart: Some(cart),
                cart_deleted: false,
            })
        }
    }

    /// Lists the buyer's carts with product summaries resolved.
    #[tracing::instrument(skip(self))]
    pub async fn list_carts(&self, buyer: BuyerId) -> Result<Vec<CartView>> {
        let carts = self.store.list_carts(buyer).await?;

        let mut views = Vec::with_capacity(carts.len());
        for cart in carts {
            let mut items = Vec::with_capacity(cart.items.len());
            let mut subtotal = Money::zero();
            for line in &cart.items {
                let product = self.store.get_product(line.product_id).await?;
                let summary = product.map(|p| {
                    subtotal += p.price.multiply(line.quantity);
                    ProductSummary {
                        name: p.name,
                        unit_price: p.price,
                        stock: p.stock,
                        is_active: p.is_active,
                    }
                });
                items.push(CartLineView {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    product: summary,
                });
            }
            views.push(CartView {
                id: cart.id,
                seller: cart.seller,
                items,
                subtotal,
            });
        }
        Ok(views)
    }
}
