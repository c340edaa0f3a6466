//! Inventory listings.

use foilbox_checkout::models::CatalogItem;
use foilbox_core::format_money;
use tracing::info;

use super::Context;

pub async fn list(ctx: &Context) {
    let items = ctx.pipeline.stock().list_items().await;
    info!("Catalog: {} items", items.len());
    print_items(&items);
}

pub async fn low(ctx: &Context) {
    let items = ctx.pipeline.stock().low_stock_items().await;
    info!(
        "Items at or below {} units: {}",
        ctx.pipeline.config().low_stock_threshold,
        items.len()
    );
    print_items(&items);
}

fn print_items(items: &[CatalogItem]) {
    for item in items {
        let note = if item.is_out_of_stock() { " (sold out)" } else { "" };
        info!(
            "  {:<16} {:<24} {:<10} {:>10} x{}{note}",
            item.id.as_str(),
            item.name,
            item.rarity.to_string(),
            format_money(item.price),
            item.quantity
        );
    }
}
