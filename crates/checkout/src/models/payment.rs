//! Payment selections and their order snapshots.

use foilbox_core::{CreditCardId, PaymentMethod};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount charged to one saved card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAllocation {
    pub card_id: CreditCardId,
    pub amount: Decimal,
}

/// The shopper's payment choice for one checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    /// `None` until the shopper picks a method.
    pub method: Option<PaymentMethod>,
    /// Amount the shopper agreed to pay.
    pub total_amount: Decimal,
    /// Per-card split; only used with [`PaymentMethod::Credit`].
    #[serde(default)]
    pub allocations: Vec<PaymentAllocation>,
}

impl PaymentInfo {
    #[must_use]
    pub fn allocated_sum(&self) -> Decimal {
        self.allocations.iter().map(|a| a.amount).sum()
    }
}

/// Card allocation as frozen on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationSnapshot {
    pub card_id: CreditCardId,
    pub brand: String,
    pub masked_number: String,
    pub amount: Decimal,
}

/// Payment as frozen on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSnapshot {
    pub method: PaymentMethod,
    pub total_amount: Decimal,
    pub allocations: Vec<AllocationSnapshot>,
}
