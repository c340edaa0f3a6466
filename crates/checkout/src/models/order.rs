//! Placed orders.

use chrono::{DateTime, Utc};
use foilbox_core::{CustomerId, OrderId, OrderStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::CartLine;
use super::coupon::AppliedCoupon;
use super::customer::Address;
use super::payment::PaymentSnapshot;

/// A point-in-time record of a completed checkout.
///
/// Written once at commit. Afterwards only `status` changes, and only
/// through [`OrderLifecycle`](crate::lifecycle::OrderLifecycle).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub lines: Vec<CartLine>,
    pub subtotal: Decimal,
    /// Discount actually charged (after the minimum-payable clamp).
    pub discount: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub shipping_address: Address,
    pub payment: PaymentSnapshot,
    pub coupons: Vec<AppliedCoupon>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub estimated_delivery: DateTime<Utc>,
}

impl Order {
    /// Total units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }
}
