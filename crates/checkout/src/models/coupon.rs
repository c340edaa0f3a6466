//! Discount coupons.

use chrono::{DateTime, Utc};
use foilbox_core::{CouponCategory, CouponId, CouponKind, CustomerId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A discount code.
///
/// Promotional coupons are shared. Exchange coupons are minted for one
/// customer by the returns workflow and deactivated once used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    /// Unique, matched case-insensitively.
    pub code: String,
    /// Percent for `percentage`, currency amount for `fixed`.
    pub discount: Decimal,
    pub kind: CouponKind,
    pub category: CouponCategory,
    /// Owning customer; required for exchange coupons.
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub min_order_value: Option<Decimal>,
    /// Cap on the computed discount; only meaningful for `percentage`.
    #[serde(default)]
    pub max_discount: Option<Decimal>,
    pub active: bool,
    pub expires_at: DateTime<Utc>,
}

impl Coupon {
    #[must_use]
    pub fn matches_code(&self, code: &str) -> bool {
        self.code.eq_ignore_ascii_case(code.trim())
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    #[must_use]
    pub const fn is_exchange(&self) -> bool {
        matches!(self.category, CouponCategory::Exchange)
    }

    /// Whether `customer` owns this coupon.
    #[must_use]
    pub fn is_owned_by(&self, customer: &CustomerId) -> bool {
        self.customer_id.as_ref() == Some(customer)
    }
}

/// A coupon with the discount it yields on one specific order.
///
/// Derived at checkout and only ever persisted inside an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    pub coupon: Coupon,
    pub discount_amount: Decimal,
}
