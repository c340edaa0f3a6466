//! Place an order from a JSON checkout request.
//!
//! # Usage
//!
//! ```bash
//! fb-cli checkout request.json --dry-run
//! fb-cli checkout request.json
//! ```

use foilbox_checkout::{CheckoutError, CheckoutRequest, ValidationReport};
use foilbox_core::format_money;
use tracing::{error, info, warn};

use super::{CliError, Context, read_file};

/// # Errors
///
/// Returns an error if the request cannot be read or parsed, checkout
/// rejects it, or the store fails.
pub async fn from_file(ctx: &Context, path: &str, dry_run: bool) -> Result<(), CliError> {
    let content = read_file(path).await?;
    let request: CheckoutRequest = serde_json::from_str(&content)?;

    let (quote, report) = ctx.pipeline.preview(&request).await;
    info!("Subtotal: {}", format_money(quote.subtotal));
    if quote.total_discount == quote.discount {
        info!("Discount: -{}", format_money(quote.discount));
    } else {
        info!(
            "Discount: -{} (capped from {})",
            format_money(quote.discount),
            format_money(quote.total_discount)
        );
    }
    info!("Shipping: {}", format_money(quote.shipping_cost));
    info!("Total: {}", format_money(quote.total));

    if dry_run {
        print_report(&report);
        if report.is_valid() {
            info!("Checkout would succeed");
            return Ok(());
        }
        return Err(CheckoutError::Rejected(report).into());
    }

    match ctx.pipeline.commit(&request).await {
        Ok(placed) => {
            for warning in &placed.warnings {
                warn!("  {warning}");
            }
            info!(
                "Order {} placed, estimated delivery {}",
                placed.order.id,
                placed.order.estimated_delivery.date_naive()
            );
            Ok(())
        }
        Err(e) => {
            if let Some(report) = e.report() {
                print_report(report);
            }
            Err(e.into())
        }
    }
}

fn print_report(report: &ValidationReport) {
    for err in &report.errors {
        error!("  - {err}");
    }
    for warning in &report.warnings {
        warn!("  - {warning}");
    }
}
