//! Catalog inventory.
//!
//! The `cards` document is the one resource both checkout (decrement) and
//! cancellation (increment) mutate. Every read-modify-write of it runs under
//! `write_lock`, so two commits in this process cannot both pass the
//! sufficiency check against the same snapshot and oversell. The store has
//! no version token, so running several processes against one store still
//! needs a compare-and-swap capable backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use foilbox_core::{CatalogItemId, format_money};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::config::CheckoutConfig;
use crate::error::StoreError;
use crate::events::{EventBus, StoreEvent};
use crate::models::{CartLine, CatalogItem};
use crate::report::ValidationReport;
use crate::store::{KeyValueStore, keys, load_list, load_list_or_empty, save_list};

/// Requested units per catalog item, merging repeated lines.
fn requested_quantities(lines: &[CartLine]) -> BTreeMap<&CatalogItemId, (&str, u32)> {
    let mut requested: BTreeMap<&CatalogItemId, (&str, u32)> = BTreeMap::new();
    for line in lines {
        let entry = requested
            .entry(&line.item_id)
            .or_insert((line.item.name.as_str(), 0));
        entry.1 = entry.1.saturating_add(line.quantity);
    }
    requested
}

/// Check every requested quantity and line price against `items`.
///
/// A line whose snapshot price differs from the catalog is an error, so a
/// stale or edited cart cannot be charged at a price the catalog no longer
/// holds. Low-stock warnings use the current quantity, not what would
/// remain after the purchase.
fn check_availability(
    items: &[CatalogItem],
    lines: &[CartLine],
    low_stock_threshold: u32,
) -> ValidationReport {
    let mut report = ValidationReport::new();

    for (item_id, (name, requested)) in requested_quantities(lines) {
        let Some(item) = items.iter().find(|i| &i.id == item_id) else {
            report.error(format!("{name} ({item_id}) is no longer in the catalog"));
            continue;
        };

        if item.is_out_of_stock() {
            report.error(format!("{} is out of stock", item.name));
        } else if requested > item.quantity {
            report.error(format!(
                "{}: insufficient stock (requested {requested}, available {})",
                item.name, item.quantity
            ));
        } else if item.quantity <= low_stock_threshold {
            report.warn(format!("Only {} left of {}", item.quantity, item.name));
        }
    }

    for line in lines {
        if let Some(item) = items.iter().find(|i| i.id == line.item_id)
            && item.price != line.item.unit_price
        {
            report.error(format!(
                "Price of {} changed from {} to {}; review the cart",
                item.name,
                format_money(line.item.unit_price),
                format_money(item.price)
            ));
        }
    }

    report
}

/// Price and quantity tracking for catalog items.
pub struct CatalogStock<S> {
    store: Arc<S>,
    config: Arc<CheckoutConfig>,
    events: EventBus,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> CatalogStock<S> {
    #[must_use]
    pub fn new(store: Arc<S>, config: Arc<CheckoutConfig>, events: EventBus) -> Self {
        Self {
            store,
            config,
            events,
            write_lock: Mutex::new(()),
        }
    }

    /// All catalog items; an unreadable catalog is treated as empty.
    pub async fn list_items(&self) -> Vec<CatalogItem> {
        load_list_or_empty(self.store.as_ref(), keys::CARDS).await
    }

    pub async fn get_item(&self, id: &CatalogItemId) -> Option<CatalogItem> {
        self.list_items().await.into_iter().find(|i| &i.id == id)
    }

    /// Items at or below the low-stock threshold, including sold-out ones.
    pub async fn low_stock_items(&self) -> Vec<CatalogItem> {
        let threshold = self.config.low_stock_threshold;
        self.list_items()
            .await
            .into_iter()
            .filter(|i| i.quantity <= threshold)
            .collect()
    }

    /// Check that every line can be fulfilled from current inventory.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn validate_cart_stock(&self, lines: &[CartLine]) -> ValidationReport {
        let items = self.list_items().await;
        check_availability(&items, lines, self.config.low_stock_threshold)
    }

    /// Subtract every line's quantity, all or nothing.
    ///
    /// Sufficiency is re-checked for every line first. If any line fails,
    /// nothing is written and the returned report carries the errors.
    /// Otherwise all decrements are persisted in a single write.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the catalog cannot be read or written.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn decrease_stock(&self, lines: &[CartLine]) -> Result<ValidationReport, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut items: Vec<CatalogItem> = load_list(self.store.as_ref(), keys::CARDS).await?;
        let report = check_availability(&items, lines, self.config.low_stock_threshold);
        if !report.is_valid() {
            warn!(errors = ?report.errors, "Stock decrement aborted");
            return Ok(report);
        }

        let requested = requested_quantities(lines);
        let mut changed = Vec::with_capacity(requested.len());
        for item in &mut items {
            if let Some((_, quantity)) = requested.get(&item.id) {
                // checked above: quantity <= item.quantity
                item.quantity -= quantity;
                changed.push(item.id.clone());
            }
        }

        save_list(self.store.as_ref(), keys::CARDS, &items).await?;
        info!(items = changed.len(), "Decreased stock");
        self.events.publish(StoreEvent::StockChanged { items: changed });
        Ok(report)
    }

    /// Add every line's quantity back.
    ///
    /// Unconditional: call it exactly once per reversed decrement, with the
    /// same lines. Items deleted from the catalog since are skipped.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the catalog cannot be read or written.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn increase_stock(&self, lines: &[CartLine]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut items: Vec<CatalogItem> = load_list(self.store.as_ref(), keys::CARDS).await?;
        let mut changed = Vec::new();
        for (item_id, (name, quantity)) in requested_quantities(lines) {
            match items.iter_mut().find(|i| &i.id == item_id) {
                Some(item) => {
                    item.quantity = item.quantity.saturating_add(quantity);
                    changed.push(item.id.clone());
                }
                None => {
                    warn!(%item_id, item_name = name, quantity, "Cannot restock item missing from catalog");
                }
            }
        }

        save_list(self.store.as_ref(), keys::CARDS, &items).await?;
        info!(items = changed.len(), "Increased stock");
        self.events.publish(StoreEvent::StockChanged { items: changed });
        Ok(())
    }
}
