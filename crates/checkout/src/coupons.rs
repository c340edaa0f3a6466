//! Coupon eligibility, combination limits and discount math.
//!
//! A single coupon is checked in a fixed order and the first failure wins.
//! A coupon *set* is checked exhaustively so every conflict is reported.
//! Discounts are summed per coupon without capping; only
//! [`apply_coupons`] clamps the aggregate so an order always keeps a
//! payable remainder of one cent.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use foilbox_core::{CENT, CouponCategory, CouponKind, CustomerId, format_money, round_money};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::config::CheckoutConfig;
use crate::error::StoreError;
use crate::events::{EventBus, StoreEvent};
use crate::models::{AppliedCoupon, Coupon};
use crate::report::ValidationReport;
use crate::store::{KeyValueStore, keys, load_list, load_list_or_empty, save_list};

/// Why a single coupon cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponRejection {
    #[error("Coupon {0} not found")]
    NotFound(String),

    #[error("Coupon {0} is no longer active")]
    Inactive(String),

    #[error("Coupon {0} has expired")]
    Expired(String),

    #[error("Coupon {0} belongs to another customer")]
    NotOwner(String),

    #[error("Coupon {code} requires a minimum order of {}", format_money(*.minimum))]
    BelowMinimum { code: String, minimum: Decimal },
}

/// Discount for one coupon on an order of `order_value`.
///
/// Percentage coupons are capped at `max_discount`. Fixed coupons return
/// their flat amount even when it exceeds the order value.
#[must_use]
pub fn calculate_discount(coupon: &Coupon, order_value: Decimal) -> Decimal {
    match coupon.kind {
        CouponKind::Percentage => {
            let raw = round_money(order_value * coupon.discount / Decimal::ONE_HUNDRED);
            coupon.max_discount.map_or(raw, |cap| raw.min(cap))
        }
        CouponKind::Fixed => coupon.discount,
    }
}

/// Coupons applied to one order value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponApplication {
    /// Promotional coupons first, then exchange coupons.
    pub applied: Vec<AppliedCoupon>,
    /// Sum of individual discounts, for display.
    pub total_discount: Decimal,
    /// Discount to charge: at most `order_value - 0.01`.
    pub adjusted_discount: Decimal,
}

/// Order, price and clamp a coupon set.
///
/// Ordering is by category only; the sort is stable so coupons of the same
/// category keep their input order.
#[must_use]
pub fn apply_coupons(coupons: &[Coupon], order_value: Decimal) -> CouponApplication {
    let mut ordered: Vec<&Coupon> = coupons.iter().collect();
    ordered.sort_by_key(|c| c.category.precedence());

    let applied: Vec<AppliedCoupon> = ordered
        .into_iter()
        .map(|coupon| AppliedCoupon {
            discount_amount: calculate_discount(coupon, order_value),
            coupon: coupon.clone(),
        })
        .collect();

    let total_discount: Decimal = applied.iter().map(|a| a.discount_amount).sum();
    let adjusted_discount = total_discount.min(order_value - CENT).max(Decimal::ZERO);

    CouponApplication {
        applied,
        total_discount,
        adjusted_discount,
    }
}

/// Single-coupon checks, short-circuiting on the first failure.
///
/// # Errors
///
/// Returns the first [`CouponRejection`] that applies.
pub fn check_coupon(
    coupon: &Coupon,
    customer: Option<&CustomerId>,
    order_value: Option<Decimal>,
    now: DateTime<Utc>,
) -> Result<(), CouponRejection> {
    if !coupon.active {
        return Err(CouponRejection::Inactive(coupon.code.clone()));
    }
    if coupon.is_expired(now) {
        return Err(CouponRejection::Expired(coupon.code.clone()));
    }
    if coupon.is_exchange() && !customer.is_some_and(|c| coupon.is_owned_by(c)) {
        return Err(CouponRejection::NotOwner(coupon.code.clone()));
    }
    if let (Some(minimum), Some(value)) = (coupon.min_order_value, order_value) {
        if value < minimum {
            return Err(CouponRejection::BelowMinimum {
                code: coupon.code.clone(),
                minimum,
            });
        }
    }
    Ok(())
}

/// Coupon lookups, combination rules and consumption.
pub struct CouponEngine<S> {
    store: Arc<S>,
    config: Arc<CheckoutConfig>,
    events: EventBus,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> CouponEngine<S> {
    #[must_use]
    pub fn new(store: Arc<S>, config: Arc<CheckoutConfig>, events: EventBus) -> Self {
        Self {
            store,
            config,
            events,
            write_lock: Mutex::new(()),
        }
    }

    /// Case-insensitive lookup by code.
    pub async fn find_by_code(&self, code: &str) -> Option<Coupon> {
        let coupons: Vec<Coupon> = load_list_or_empty(self.store.as_ref(), keys::COUPONS).await;
        coupons.into_iter().find(|c| c.matches_code(code))
    }

    /// Look up `code` and check it for this customer and order value.
    ///
    /// # Errors
    ///
    /// Returns the first [`CouponRejection`] that applies.
    pub async fn validate_coupon(
        &self,
        code: &str,
        customer: Option<&CustomerId>,
        order_value: Option<Decimal>,
    ) -> Result<Coupon, CouponRejection> {
        self.validate_coupon_at(code, customer, order_value, Utc::now())
            .await
    }

    /// [`validate_coupon`](Self::validate_coupon) with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns the first [`CouponRejection`] that applies.
    #[instrument(skip(self, customer, order_value, now))]
    pub async fn validate_coupon_at(
        &self,
        code: &str,
        customer: Option<&CustomerId>,
        order_value: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> Result<Coupon, CouponRejection> {
        let coupon = self
            .find_by_code(code)
            .await
            .ok_or_else(|| CouponRejection::NotFound(code.trim().to_string()))?;

        check_coupon(&coupon, customer, order_value, now).inspect_err(|reason| {
            debug!(%reason, "Coupon rejected");
        })?;
        Ok(coupon)
    }

    /// Active, unexpired coupons this customer may use.
    pub async fn coupons_for_customer(
        &self,
        customer: &CustomerId,
        now: DateTime<Utc>,
    ) -> Vec<Coupon> {
        let coupons: Vec<Coupon> = load_list_or_empty(self.store.as_ref(), keys::COUPONS).await;
        coupons
            .into_iter()
            .filter(|c| check_coupon(c, Some(customer), None, now).is_ok())
            .collect()
    }

    /// Check that a set of coupons may be combined on one order.
    ///
    /// Every rule runs; errors and warnings accumulate.
    #[must_use]
    pub fn validate_combination(
        &self,
        coupons: &[Coupon],
        customer: &CustomerId,
        order_value: Decimal,
    ) -> ValidationReport {
        let mut report = ValidationReport::new();
        if coupons.is_empty() {
            return report;
        }

        let promotional = coupons
            .iter()
            .filter(|c| c.category == CouponCategory::Promotional)
            .count();
        if promotional > self.config.max_promotional_coupons {
            report.error(format!(
                "Only {} promotional coupon(s) can be used per order; {promotional} applied",
                self.config.max_promotional_coupons
            ));
        }

        let exchange: Vec<&Coupon> = coupons.iter().filter(|c| c.is_exchange()).collect();
        if exchange.len() > self.config.max_exchange_coupons {
            report.error(format!(
                "Only {} exchange coupons can be used per order; {} applied",
                self.config.max_exchange_coupons,
                exchange.len()
            ));
        }
        for coupon in exchange.iter().filter(|c| !c.is_owned_by(customer)) {
            report.error(format!(
                "Exchange coupon {} belongs to another customer",
                coupon.code
            ));
        }

        let mut seen = HashSet::new();
        for coupon in coupons {
            if !seen.insert(coupon.code.to_ascii_lowercase()) {
                report.error(format!("Coupon {} is applied more than once", coupon.code));
            }
        }

        if let Some(minimum) = coupons
            .iter()
            .filter_map(|c| c.min_order_value)
            .filter(|min| *min > order_value)
            .max()
        {
            report.error(format!(
                "Order value {} is below the coupon minimum of {}",
                format_money(order_value),
                format_money(minimum)
            ));
        }

        let total: Decimal = coupons
            .iter()
            .map(|c| calculate_discount(c, order_value))
            .sum();
        if total >= order_value {
            report.warn(format!(
                "Discounts of {} cover the whole order; the charged discount will be capped at {}",
                format_money(total),
                format_money((order_value - CENT).max(Decimal::ZERO))
            ));
        } else if order_value > Decimal::ZERO
            && total / order_value > self.config.large_discount_ratio
        {
            report.warn(format!(
                "Large discount: {} off an order of {}",
                format_money(total),
                format_money(order_value)
            ));
        }

        report
    }

    /// Deactivate the exchange coupons among `coupons`, all or nothing.
    ///
    /// Each one is re-read under the write lock and must still be active,
    /// unexpired and owned by `customer`, so two checkouts racing for the
    /// same credit cannot both spend it. If any fails, nothing is written and
    /// the report carries the reasons. Promotional coupons are shared and
    /// stay active.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the coupons document cannot be read or written.
    #[instrument(skip(self, coupons, customer, now), fields(count = coupons.len()))]
    pub async fn consume(
        &self,
        coupons: &[Coupon],
        customer: &CustomerId,
        now: DateTime<Utc>,
    ) -> Result<ValidationReport, StoreError> {
        let mut report = ValidationReport::new();
        let requested: Vec<&Coupon> = coupons.iter().filter(|c| c.is_exchange()).collect();
        if requested.is_empty() {
            return Ok(report);
        }

        let _guard = self.write_lock.lock().await;

        let mut stored: Vec<Coupon> = load_list(self.store.as_ref(), keys::COUPONS).await?;
        for coupon in &requested {
            match stored.iter().find(|c| c.id == coupon.id) {
                Some(current) => {
                    if let Err(reason) = check_coupon(current, Some(customer), None, now) {
                        report.error(reason.to_string());
                    }
                }
                None => report.error(CouponRejection::NotFound(coupon.code.clone()).to_string()),
            }
        }
        if !report.is_valid() {
            warn!(errors = ?report.errors, "Exchange coupons no longer usable");
            return Ok(report);
        }

        for coupon in stored
            .iter_mut()
            .filter(|c| requested.iter().any(|r| r.id == c.id))
        {
            coupon.active = false;
        }
        save_list(self.store.as_ref(), keys::COUPONS, &stored).await?;
        self.events.publish(StoreEvent::CouponsChanged);
        info!(consumed = requested.len(), "Consumed exchange coupons");
        Ok(report)
    }

    /// Reactivate exchange coupons consumed by a checkout that did not
    /// complete.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the coupons document cannot be read or written.
    #[instrument(skip(self, coupons), fields(count = coupons.len()))]
    pub async fn restore(&self, coupons: &[Coupon]) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut stored: Vec<Coupon> = load_list(self.store.as_ref(), keys::COUPONS).await?;
        let mut restored = 0;
        for coupon in stored.iter_mut().filter(|c| {
            c.is_exchange() && !c.active && coupons.iter().any(|r| r.id == c.id)
        }) {
            coupon.active = true;
            restored += 1;
        }

        if restored > 0 {
            save_list(self.store.as_ref(), keys::COUPONS, &stored).await?;
            self.events.publish(StoreEvent::CouponsChanged);
            info!(restored, "Restored exchange coupons");
        }
        Ok(restored)
    }
}
