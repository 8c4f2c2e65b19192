//! Shipping surcharge policy.

use common::Money;

/// Flat-surcharge shipping: orders at or below the free-shipping
/// threshold pay the surcharge, larger orders ship free.
///
/// Computed exactly once at checkout; the resulting total is frozen on
/// the order and never recomputed from live prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Subtotals strictly above this ship free.
    pub free_shipping_threshold: Money,
    /// Flat fee added to subtotals at or below the threshold.
    pub flat_surcharge: Money,
}

impl PricingPolicy {
    /// Creates a policy with explicit threshold and surcharge.
    pub fn new(free_shipping_threshold: Money, flat_surcharge: Money) -> Self {
        Self {
            free_shipping_threshold,
            flat_surcharge,
        }
    }

    /// Returns the shipping fee for a subtotal.
    pub fn shipping_fee(&self, subtotal: Money) -> Money {
        if subtotal > self.free_shipping_threshold {
            Money::zero()
        } else {
            self.flat_surcharge
        }
    }

    /// Returns the order total for a subtotal.
    pub fn order_total(&self, subtotal: Money) -> Money {
        subtotal + self.shipping_fee(subtotal)
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Money::from_cents(5000),
            flat_surcharge: Money::from_cents(599),
        }
    }
}
