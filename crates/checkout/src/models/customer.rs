//! Customer-owned records produced by the account screens.
//!
//! Checkout only reads these; they arrive already validated by the forms
//! that create them.

use chrono::{Datelike, NaiveDate};
use foilbox_core::{AddressId, CreditCardId, CustomerId};
use serde::{Deserialize, Serialize};

/// A shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub customer_id: CustomerId,
    pub recipient: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// A saved credit card.
///
/// Only the last four digits are stored. This is masking, not encryption:
/// the record must not be treated as protected cardholder data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCard {
    pub id: CreditCardId,
    pub customer_id: CustomerId,
    pub holder_name: String,
    pub brand: String,
    pub last_four: String,
    pub expiry_month: u32,
    pub expiry_year: i32,
}

impl CreditCard {
    /// Display form, e.g. `**** **** **** 4242`.
    #[must_use]
    pub fn masked_number(&self) -> String {
        format!("**** **** **** {}", self.last_four)
    }

    /// Cards stay valid through the last day of their expiry month.
    #[must_use]
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        (self.expiry_year, self.expiry_month) < (today.year(), today.month())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(month: u32, year: i32) -> CreditCard {
        CreditCard {
            id: CreditCardId::new("cc-1"),
            customer_id: CustomerId::new("cust-1"),
            holder_name: "Ash".into(),
            brand: "visa".into(),
            last_four: "4242".into(),
            expiry_month: month,
            expiry_year: year,
        }
    }

    #[test]
    fn test_masked_number() {
        assert_eq!(card(1, 2030).masked_number(), "**** **** **** 4242");
    }

    #[test]
    fn test_expiry_month_is_inclusive() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 31).unwrap();
        assert!(!card(10, 2026).is_expired(today));
        assert!(card(9, 2026).is_expired(today));
        assert!(card(12, 2025).is_expired(today));
        assert!(!card(1, 2027).is_expired(today));
    }
}
