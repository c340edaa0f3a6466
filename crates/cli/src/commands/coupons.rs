//! Coupon lookups.

use chrono::Utc;
use foilbox_checkout::coupons::calculate_discount;
use foilbox_core::{CouponKind, CustomerId, format_money};
use rust_decimal::Decimal;
use tracing::info;

use super::{CliError, Context};

/// Check one code the way checkout would.
///
/// # Errors
///
/// Returns `CliError::Coupon` with the reason the code cannot be used.
pub async fn check(
    ctx: &Context,
    code: &str,
    customer: Option<&str>,
    order_value: Option<Decimal>,
) -> Result<(), CliError> {
    let customer = customer.map(CustomerId::new);
    let coupon = ctx
        .pipeline
        .coupons()
        .validate_coupon(code, customer.as_ref(), order_value)
        .await?;

    info!(
        "Coupon {} is valid ({} {}, expires {})",
        coupon.code,
        coupon.category,
        describe(coupon.kind, coupon.discount),
        coupon.expires_at.date_naive()
    );
    if let Some(order_value) = order_value {
        info!(
            "  Discount on {}: {}",
            format_money(order_value),
            format_money(calculate_discount(&coupon, order_value))
        );
    }
    Ok(())
}

pub async fn list(ctx: &Context, customer: &str) {
    let coupons = ctx
        .pipeline
        .coupons()
        .coupons_for_customer(&CustomerId::new(customer), Utc::now())
        .await;

    info!("Usable coupons for {customer}: {}", coupons.len());
    for coupon in &coupons {
        let minimum = coupon
            .min_order_value
            .map(|m| format!(", min {}", format_money(m)))
            .unwrap_or_default();
        info!(
            "  {:<16} {:<12} {}{minimum}",
            coupon.code,
            coupon.category.to_string(),
            describe(coupon.kind, coupon.discount)
        );
    }
}

fn describe(kind: CouponKind, discount: Decimal) -> String {
    match kind {
        CouponKind::Percentage => format!("{}% off", discount.normalize()),
        CouponKind::Fixed => format!("{} off", format_money(discount)),
    }
}
