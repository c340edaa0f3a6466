//! Split-card payment checks.
//!
//! A credit payment spreads the order total over up to three saved cards.
//! The allocations must add up to the declared total within one cent.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use foilbox_core::{CustomerId, PaymentMethod, format_money, within_tolerance};
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::CheckoutConfig;
use crate::models::{CreditCard, PaymentInfo};
use crate::report::ValidationReport;

/// Validates and reconciles per-card amounts against a total.
#[derive(Debug, Clone)]
pub struct PaymentAllocator {
    config: Arc<CheckoutConfig>,
}

impl PaymentAllocator {
    #[must_use]
    pub const fn new(config: Arc<CheckoutConfig>) -> Self {
        Self { config }
    }

    /// Check the method and, for credit, the card split.
    #[must_use]
    pub fn validate_payment(&self, payment: &PaymentInfo) -> ValidationReport {
        let mut report = ValidationReport::new();

        match payment.method {
            None => report.error("Select a payment method"),
            Some(PaymentMethod::Credit) => self.validate_allocations(payment, &mut report),
            Some(PaymentMethod::Debit | PaymentMethod::BankTransfer) => {}
        }

        report
    }

    fn validate_allocations(&self, payment: &PaymentInfo, report: &mut ValidationReport) {
        let allocations = &payment.allocations;

        if allocations.is_empty() {
            report.error("Credit payment requires at least one card");
        }
        if allocations.len() > self.config.max_payment_cards {
            report.error(format!(
                "Payment can be split across at most {} cards; {} given",
                self.config.max_payment_cards,
                allocations.len()
            ));
        }

        let sum = payment.allocated_sum();
        if !within_tolerance(sum, payment.total_amount, self.config.amount_epsilon) {
            report.error(format!(
                "Allocation sum does not match total: allocated {}, total {}",
                format_money(sum),
                format_money(payment.total_amount)
            ));
        }

        for (index, allocation) in allocations.iter().enumerate() {
            let position = index + 1;
            if allocation.amount <= Decimal::ZERO {
                report.error(format!(
                    "Card {position} ({}) must be charged more than zero",
                    allocation.card_id
                ));
            } else if allocation.amount < self.config.low_allocation_floor {
                report.warn(format!(
                    "Card {position} ({}) has an unusually low amount: {}",
                    allocation.card_id,
                    format_money(allocation.amount)
                ));
            }
        }

        if allocations.len() > 1 {
            let amounts = allocations.iter().map(|a| a.amount);
            let smallest = amounts.clone().min().unwrap_or_default();
            let largest = amounts.max().unwrap_or_default();
            if largest > Decimal::ZERO
                && smallest > Decimal::ZERO
                && smallest < largest * self.config.lopsided_split_ratio
            {
                report.warn(format!(
                    "Uneven split: smallest card amount {} is under {}% of the largest {}",
                    format_money(smallest),
                    (self.config.lopsided_split_ratio * Decimal::ONE_HUNDRED).normalize(),
                    format_money(largest)
                ));
            }
        }

        debug!(
            cards = allocations.len(),
            sum = %sum,
            total = %payment.total_amount,
            "Validated card allocations"
        );
    }

    /// Check each allocated card against the customer's saved cards.
    ///
    /// Reports unknown cards, cards owned by someone else, expired cards and
    /// the same card allocated twice.
    #[must_use]
    pub fn validate_instruments(
        &self,
        payment: &PaymentInfo,
        cards: &[CreditCard],
        customer: &CustomerId,
        today: NaiveDate,
    ) -> ValidationReport {
        let mut report = ValidationReport::new();
        if payment.method != Some(PaymentMethod::Credit) {
            return report;
        }

        let mut seen = HashSet::new();
        for allocation in &payment.allocations {
            if !seen.insert(&allocation.card_id) {
                report.error(format!(
                    "Card {} is used more than once",
                    allocation.card_id
                ));
                continue;
            }

            match cards.iter().find(|c| c.id == allocation.card_id) {
                None => report.error(format!("Card {} not found", allocation.card_id)),
                Some(card) if &card.customer_id != customer => {
                    report.error(format!("Card {} belongs to another customer", card.id));
                }
                Some(card) if card.is_expired(today) => {
                    report.error(format!(
                        "Card {} expired {:02}/{}",
                        card.masked_number(),
                        card.expiry_month,
                        card.expiry_year
                    ));
                }
                Some(_) => {}
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use foilbox_core::CreditCardId;
    use proptest::prelude::*;

    use super::*;
    use crate::models::PaymentAllocation;

    fn allocator() -> PaymentAllocator {
        PaymentAllocator::new(Arc::new(CheckoutConfig::default()))
    }

    fn credit(total: Decimal, amounts: &[Decimal]) -> PaymentInfo {
        PaymentInfo {
            method: Some(PaymentMethod::Credit),
            total_amount: total,
            allocations: amounts
                .iter()
                .enumerate()
                .map(|(i, amount)| PaymentAllocation {
                    card_id: CreditCardId::new(format!("cc-{i}")),
                    amount: *amount,
                })
                .collect(),
        }
    }

    fn dollars(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_missing_method_rejected() {
        let payment = PaymentInfo {
            method: None,
            total_amount: dollars(10_000),
            allocations: Vec::new(),
        };
        assert!(!allocator().validate_payment(&payment).is_valid());
    }

    #[test]
    fn test_non_credit_skips_allocations() {
        let payment = PaymentInfo {
            method: Some(PaymentMethod::BankTransfer),
            total_amount: dollars(10_000),
            allocations: Vec::new(),
        };
        assert!(allocator().validate_payment(&payment).is_valid());
    }

    #[test]
    fn test_split_within_one_cent_is_valid() {
        let payment = credit(dollars(10_000), &[dollars(6_000), dollars(3_999)]);
        assert!(allocator().validate_payment(&payment).is_valid());
    }

    #[test]
    fn test_split_off_by_a_dollar_is_invalid() {
        let payment = credit(dollars(10_000), &[dollars(6_000), dollars(3_900)]);
        let report = allocator().validate_payment(&payment);
        assert!(!report.is_valid());
        assert!(report.errors[0].starts_with("Allocation sum does not match total"));
    }

    #[test]
    fn test_too_many_cards() {
        let payment = credit(dollars(4_000), &[dollars(1_000); 4]);
        let report = allocator().validate_payment(&payment);
        assert!(!report.is_valid());
        assert!(report.errors[0].contains("at most 3 cards"));
    }

    #[test]
    fn test_non_positive_allocation() {
        let payment = credit(dollars(5_000), &[dollars(5_000), Decimal::ZERO]);
        let report = allocator().validate_payment(&payment);
        assert!(!report.is_valid());
        assert!(report.errors[0].contains("more than zero"));
    }

    #[test]
    fn test_low_and_lopsided_allocations_warn() {
        let payment = credit(dollars(10_000), &[dollars(9_700), dollars(300)]);
        let report = allocator().validate_payment(&payment);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].contains("unusually low amount"));
        assert!(report.warnings[1].starts_with("Uneven split"));
    }

    #[test]
    fn test_even_split_has_no_warnings() {
        let payment = credit(dollars(9_000), &[dollars(3_000); 3]);
        let report = allocator().validate_payment(&payment);
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    fn saved_card(id: &str, owner: &str, year: i32) -> CreditCard {
        CreditCard {
            id: CreditCardId::new(id),
            customer_id: CustomerId::new(owner),
            holder_name: "Misty".into(),
            brand: "mastercard".into(),
            last_four: "5555".into(),
            expiry_month: 6,
            expiry_year: year,
        }
    }

    #[test]
    fn test_instrument_checks() {
        let cards = vec![
            saved_card("cc-0", "cust-1", 2030),
            saved_card("cc-1", "cust-2", 2030),
            saved_card("cc-2", "cust-1", 2020),
        ];
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let customer = CustomerId::new("cust-1");

        let ok = credit(dollars(100), &[dollars(100)]);
        assert!(allocator().validate_instruments(&ok, &cards, &customer, today).is_valid());

        let mut payment = credit(dollars(400), &[dollars(100); 4]);
        payment.allocations[3].card_id = CreditCardId::new("cc-0");
        payment.allocations.push(PaymentAllocation {
            card_id: CreditCardId::new("cc-9"),
            amount: dollars(100),
        });

        let report = allocator().validate_instruments(&payment, &cards, &customer, today);
        // foreign cc-1, expired cc-2, duplicate cc-0, unknown cc-9
        assert_eq!(report.errors.len(), 4);
    }

    proptest! {
        #[test]
        fn prop_credit_valid_iff_sum_within_one_cent(
            total in 1_000i64..1_000_000,
            split in 1usize..=3,
            drift in -500i64..500,
        ) {
            let total = Decimal::new(total, 2);
            let part = (total / Decimal::from(split)).round_dp(2);
            let mut amounts = vec![part; split];
            let last = total - part * Decimal::from(split - 1) + Decimal::new(drift, 2);
            amounts[split - 1] = last;
            prop_assume!(last > Decimal::ZERO);

            let payment = credit(total, &amounts);
            let report = allocator().validate_payment(&payment);
            let in_tolerance = (payment.allocated_sum() - total).abs() <= Decimal::new(1, 2);
            prop_assert_eq!(report.is_valid(), in_tolerance);
        }
    }
}
