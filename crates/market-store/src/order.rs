//! Order document and its status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BuyerId, Money, OrderId, ProductId, SellerId};

/// The status of an order in its lifecycle.
///
/// Legal transitions:
/// ```text
/// Pending ──► Processing ──► Shipped ──► Delivered
///    │             │            │
///    ├──► Declined └────────────┴──► Cancelled
///    └──► Cancelled
/// ```
///
/// `Delivered`, `Cancelled` and `Declined` are terminal. Stock and
/// analytics side effects are a property of the edge taken, not of who
/// requested it; they are decided in the domain layer and applied by the
/// store in the same unit as the status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Placed by the buyer, awaiting the seller's decision.
    #[default]
    Pending,

    /// Accepted by the seller; stock has been reserved.
    Processing,

    /// Handed over for delivery.
    Shipped,

    /// Received by the buyer (terminal). Counts toward sales analytics.
    Delivered,

    /// Cancelled by either party (terminal).
    Cancelled,

    /// Rejected by the seller before acceptance (terminal).
    Declined,
}

impl OrderStatus {
    /// Returns true if the edge from `self` to `next` is legal.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing | Declined | Cancelled)
                | (Processing, Shipped | Cancelled)
                | (Shipped, Delivered | Cancelled)
        )
    }

    /// Returns true if the buyer may still cancel an order in this status.
    pub fn buyer_can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }

    /// Returns true if stock has been reserved while in this status.
    pub fn holds_reserved_stock(&self) -> bool {
        matches!(self, OrderStatus::Processing | OrderStatus::Shipped)
    }

    /// Returns true if this is a terminal status (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Declined
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Declined => "Declined",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "Processing" => Ok(OrderStatus::Processing),
            "Shipped" => Ok(OrderStatus::Shipped),
            "Delivered" => Ok(OrderStatus::Delivered),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            "Declined" => Ok(OrderStatus::Declined),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// Payment method label on an order. No payment is actually processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[default]
    #[serde(rename = "COD")]
    CashOnDelivery,
}

impl PaymentMethod {
    /// Returns the label stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "COD",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COD" => Ok(PaymentMethod::CashOnDelivery),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// Delivery address captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub phone: String,
}

impl ShippingAddress {
    /// Returns the name of the first blank field, if any.
    pub fn first_blank_field(&self) -> Option<&'static str> {
        [
            ("full_name", &self.full_name),
            ("address", &self.address),
            ("city", &self.city),
            ("zip_code", &self.zip_code),
            ("phone", &self.phone),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// A frozen line item snapshot inside an order.
///
/// Copies the product fields it needs at checkout time so later product
/// edits or deletion cannot alter order history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Weak reference back to the product; may dangle after deletion.
    pub product_id: ProductId,

    /// Product name at checkout time.
    pub name: String,

    /// Unit price at checkout time.
    pub unit_price: Money,

    /// Quantity ordered.
    pub quantity: u32,

    /// `unit_price * quantity`, fixed at checkout.
    pub line_total: Money,
}

impl OrderItem {
    /// Creates a line snapshot, computing the line total.
    pub fn new(
        product_id: ProductId,
        name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Self {
        Self {
            product_id,
            name: name.into(),
            unit_price,
            quantity,
            line_total: unit_price.multiply(quantity),
        }
    }
}

/// An immutable-snapshot record of a purchase, carrying its own status
/// lifecycle. Never hard-deleted: its existence is the audit trail for
/// the stock movements it caused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub buyer: BuyerId,
    pub seller: SellerId,
    pub items: Vec<OrderItem>,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub seller_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new pending order.
    pub fn new(
        order_number: String,
        buyer: BuyerId,
        seller: SellerId,
        items: Vec<OrderItem>,
        total_amount: Money,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            order_number,
            buyer,
            seller,
            items,
            total_amount,
            status: OrderStatus::Pending,
            shipping_address,
            payment_method,
            seller_notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the sum of the frozen line totals, without any surcharge.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(|item| item.line_total).sum()
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}
