//! Order inspection and lifecycle commands.
//!
//! # Usage
//!
//! ```bash
//! fb-cli order list --customer cust-1
//! fb-cli order show ORD-...
//! fb-cli order advance ORD-...
//! fb-cli order cancel ORD-...
//! ```

use foilbox_checkout::OrderError;
use foilbox_checkout::models::Order;
use foilbox_core::{CustomerId, OrderId, format_money};
use tracing::info;

use super::{CliError, Context};

pub async fn list(ctx: &Context, customer: Option<&str>) {
    let orders = match customer {
        Some(customer) => ctx.pipeline.orders().for_customer(&CustomerId::new(customer)).await,
        None => ctx.pipeline.orders().list().await,
    };

    info!("Orders: {}", orders.len());
    for order in &orders {
        info!(
            "  {} {:<10} {:>10} {} ({} units)",
            order.id,
            order.status.as_str(),
            format_money(order.total),
            order.created_at.format("%Y-%m-%d %H:%M"),
            order.unit_count()
        );
    }
}

/// # Errors
///
/// Returns `OrderError::NotFound` for an unknown ID.
pub async fn show(ctx: &Context, id: &str) -> Result<(), CliError> {
    let id = OrderId::new(id);
    let order = ctx
        .pipeline
        .orders()
        .get(&id)
        .await
        .ok_or(OrderError::NotFound(id))?;
    print_order(&order);
    Ok(())
}

/// # Errors
///
/// Returns an error if the order is unknown or already delivered.
pub async fn advance(ctx: &Context, id: &str) -> Result<(), CliError> {
    let order = ctx.pipeline.lifecycle().advance(&OrderId::new(id)).await?;
    info!("Order {} is now {}", order.id, order.status);
    Ok(())
}

/// # Errors
///
/// Returns an error if the order is unknown, has shipped, or the restock
/// cannot be written.
pub async fn cancel(ctx: &Context, id: &str) -> Result<(), CliError> {
    let order = ctx.pipeline.lifecycle().cancel_order(&OrderId::new(id)).await?;
    info!(
        "Order {} cancelled; {} units returned to stock",
        order.id,
        order.unit_count()
    );
    Ok(())
}

fn print_order(order: &Order) {
    info!("Order {} ({})", order.id, order.status);
    info!("  Customer: {}", order.customer_id);
    info!("  Placed: {}", order.created_at.to_rfc3339());
    info!("  Estimated delivery: {}", order.estimated_delivery.date_naive());
    for line in &order.lines {
        info!(
            "  {} x{} @ {} = {}",
            line.item.name,
            line.quantity,
            format_money(line.item.unit_price),
            format_money(line.line_total())
        );
    }
    for applied in &order.coupons {
        info!(
            "  Coupon {} ({}): -{}",
            applied.coupon.code,
            applied.coupon.category,
            format_money(applied.discount_amount)
        );
    }
    info!("  Subtotal: {}", format_money(order.subtotal));
    info!("  Discount: -{}", format_money(order.discount));
    info!("  Shipping: {}", format_money(order.shipping_cost));
    info!("  Total: {}", format_money(order.total));
    for allocation in &order.payment.allocations {
        info!(
            "  Charged {} to {} {}",
            format_money(allocation.amount),
            allocation.brand,
            allocation.masked_number
        );
    }
    let a = &order.shipping_address;
    info!(
        "  Ship to: {}, {}, {} {} {}, {}",
        a.recipient, a.street, a.city, a.state, a.postal_code, a.country
    );
}
