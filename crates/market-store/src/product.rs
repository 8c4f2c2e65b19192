//! Product document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Money, ProductId, SellerId};

/// Admin approval state of a product listing.
///
/// Owned by the admin approval collaborator; this core only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ApprovalStatus {
    /// Freshly listed, awaiting admin review.
    #[default]
    Pending,
    /// Approved for sale.
    Approved,
    /// Rejected by an admin.
    Rejected,
}

impl ApprovalStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "Pending",
            ApprovalStatus::Approved => "Approved",
            ApprovalStatus::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ApprovalStatus::Pending),
            "Approved" => Ok(ApprovalStatus::Approved),
            "Rejected" => Ok(ApprovalStatus::Rejected),
            other => Err(format!("unknown approval status: {other}")),
        }
    }
}

/// A product listing owned by a seller.
///
/// The catalog collaborator owns price and listing metadata; this core
/// writes only `stock` and `sales_count`, and exclusively through the
/// store's atomic operations. `stock` is unsigned so a negative count is
/// unrepresentable; the conditional decrement keeps it from wrapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub seller: SellerId,
    pub name: String,
    pub price: Money,
    pub stock: u32,
    pub sales_count: u64,
    pub is_active: bool,
    pub approval_status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new active, approval-pending product listing.
    pub fn new(seller: SellerId, name: impl Into<String>, price: Money, stock: u32) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::new(),
            seller,
            name: name.into(),
            price,
            stock,
            sales_count: 0,
            is_active: true,
            approval_status: ApprovalStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the listing can currently be added to a cart.
    pub fn is_purchasable(&self) -> bool {
        self.is_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_product_defaults() {
        let product = Product::new(SellerId::new(), "Honeycrisp apples", Money::from_cents(100), 5);
        assert_eq!(product.stock, 5);
        assert_eq!(product.sales_count, 0);
        assert!(product.is_active);
        assert_eq!(product.approval_status, ApprovalStatus::Pending);
        assert!(product.is_purchasable());
    }

    #[test]
    fn deactivated_product_is_not_purchasable() {
        let mut product = Product::new(SellerId::new(), "Pears", Money::from_cents(200), 3);
        product.is_active = false;
        assert!(!product.is_purchasable());
    }

    #[test]
    fn approval_status_roundtrip() {
        for status in [
            ApprovalStatus::Pending,
            ApprovalStatus::Approved,
            ApprovalStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<ApprovalStatus>().unwrap(), status);
        }
        assert!("Unknown".parse::<ApprovalStatus>().is_err());
    }
}
