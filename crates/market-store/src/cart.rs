//! Cart document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BuyerId, CartId, ProductId, SellerId};

/// A single product line in a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// The product this line refers to (weak reference).
    pub product_id: ProductId,

    /// Quantity staged for purchase. Always at least 1.
    pub quantity: u32,
}

/// A per-(buyer, seller) staging area for not-yet-ordered line items.
///
/// At most one cart exists per (buyer, seller) pair, and a cart with zero
/// items is deleted rather than persisted empty. Both invariants are
/// enforced by the store; the helpers here only manipulate the line list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub buyer: BuyerId,
    pub seller: SellerId,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart for a (buyer, seller) pair.
    pub fn new(buyer: BuyerId, seller: SellerId) -> Self {
        let now = Utc::now();
        Self {
            id: CartId::new(),
            buyer,
            seller,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the staged quantity for a product, if the line exists.
    pub fn item_quantity(&self, product_id: ProductId) -> Option<u32> {
        self.items
            .iter()
            .find(|item| item.product_id == product_id)
            .map(|item| item.quantity)
    }

    /// Adds a quantity to an existing line, or pushes a new line.
    ///
    /// Returns the combined quantity for the line afterwards.
    pub fn merge_item(&mut self, product_id: ProductId, quantity: u32) -> u32 {
        self.updated_at = Utc::now();
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
        {
            item.quantity += quantity;
            item.quantity
        } else {
            self.items.push(CartItem {
                product_id,
                quantity,
            });
            quantity
        }
    }

    /// Overwrites the quantity of an existing line.
    ///
    /// Returns false if the product is not in this cart.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> bool {
        match self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
        {
            Some(item) => {
                item.quantity = quantity;
                self.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Removes a line entirely.
    ///
    /// Returns false if the product is not in this cart.
    pub fn remove_item(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.product_id != product_id);
        let removed = self.items.len() < before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Returns true if the cart has no lines left.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}
