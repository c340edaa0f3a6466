//! Cart composition rules and the persisted session cart.
//!
//! [`CartValidator`] is pure: it checks counts and totals only. Stock
//! sufficiency needs current inventory and lives in
//! [`CatalogStock::validate_cart_stock`](crate::stock::CatalogStock::validate_cart_stock).

use std::sync::Arc;

use foilbox_core::{CatalogItemId, format_money};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::config::CheckoutConfig;
use crate::error::StoreError;
use crate::events::{EventBus, StoreEvent};
use crate::models::cart::subtotal;
use crate::models::{CartLine, CatalogItem};
use crate::report::ValidationReport;
use crate::store::{KeyValueStore, keys, load_list, load_list_or_empty, save_list};

/// Validates cart composition independent of coupons and payment.
#[derive(Debug, Clone)]
pub struct CartValidator {
    config: Arc<CheckoutConfig>,
}

impl CartValidator {
    #[must_use]
    pub const fn new(config: Arc<CheckoutConfig>) -> Self {
        Self { config }
    }

    /// Check line count, quantities and subtotal.
    #[must_use]
    pub fn validate_cart(&self, lines: &[CartLine]) -> ValidationReport {
        let mut report = ValidationReport::new();

        if lines.is_empty() {
            report.error("Cart is empty");
            return report;
        }

        if lines.len() > self.config.max_cart_lines {
            report.error(format!(
                "Cart has {} items; at most {} distinct items are allowed",
                lines.len(),
                self.config.max_cart_lines
            ));
        }

        for line in lines {
            if line.quantity == 0 {
                report.error(format!(
                    "Quantity for {} must be greater than zero",
                    line.item.name
                ));
            } else if line.quantity > self.config.high_line_quantity {
                report.warn(format!(
                    "High quantity for {}: {} units",
                    line.item.name, line.quantity
                ));
            }
        }

        let total = subtotal(lines);
        if total <= Decimal::ZERO {
            report.error("Cart subtotal must be greater than zero");
        } else if total > self.config.high_order_value {
            report.warn(format!("High order value: {}", format_money(total)));
        }

        debug!(
            lines = lines.len(),
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "Validated cart"
        );
        report
    }
}

/// The active session's cart, persisted under the `cart` document.
pub struct CartStore<S> {
    store: Arc<S>,
    events: EventBus,
}

impl<S: KeyValueStore> CartStore<S> {
    #[must_use]
    pub const fn new(store: Arc<S>, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Current cart lines; an unreadable cart is treated as empty.
    pub async fn lines(&self) -> Vec<CartLine> {
        load_list_or_empty(self.store.as_ref(), keys::CART).await
    }

    pub async fn subtotal(&self) -> Decimal {
        subtotal(&self.lines().await)
    }

    /// Add `quantity` units of `item`, merging with an existing line.
    ///
    /// New lines snapshot the item's current attributes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the cart cannot be read or written.
    #[instrument(skip(self, item), fields(item_id = %item.id))]
    pub async fn add_item(&self, item: &CatalogItem, quantity: u32) -> Result<Vec<CartLine>, StoreError> {
        let mut lines: Vec<CartLine> = load_list(self.store.as_ref(), keys::CART).await?;

        if let Some(line) = lines.iter_mut().find(|l| l.item_id == item.id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            lines.push(CartLine {
                item_id: item.id.clone(),
                item: item.snapshot(),
                quantity,
            });
        }

        self.save(&lines).await?;
        Ok(lines)
    }

    /// Set a line's quantity; zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the cart cannot be read or written.
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        item_id: &CatalogItemId,
        quantity: u32,
    ) -> Result<Vec<CartLine>, StoreError> {
        let mut lines: Vec<CartLine> = load_list(self.store.as_ref(), keys::CART).await?;

        if quantity == 0 {
            lines.retain(|l| &l.item_id != item_id);
        } else if let Some(line) = lines.iter_mut().find(|l| &l.item_id == item_id) {
            line.quantity = quantity;
        }

        self.save(&lines).await?;
        Ok(lines)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the cart cannot be read or written.
    pub async fn remove(&self, item_id: &CatalogItemId) -> Result<Vec<CartLine>, StoreError> {
        self.set_quantity(item_id, 0).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the cart cannot be written.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.save(&[]).await
    }

    async fn save(&self, lines: &[CartLine]) -> Result<(), StoreError> {
        save_list(self.store.as_ref(), keys::CART, lines).await?;
        self.events.publish(StoreEvent::CartChanged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use foilbox_core::Rarity;

    use super::*;
    use crate::models::ItemSnapshot;
    use crate::store::MemoryStore;

    fn line(name: &str, price: Decimal, quantity: u32) -> CartLine {
        CartLine {
            item_id: CatalogItemId::new(name),
            item: ItemSnapshot {
                name: name.to_string(),
                category: "creature".into(),
                rarity: Rarity::Common,
                unit_price: price,
            },
            quantity,
        }
    }

    fn validator() -> CartValidator {
        CartValidator::new(Arc::new(CheckoutConfig::default()))
    }

    #[test]
    fn test_valid_cart() {
        let report = validator().validate_cart(&[line("pikachu", Decimal::new(50, 0), 2)]);
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_empty_cart_rejected() {
        let report = validator().validate_cart(&[]);
        assert!(!report.is_valid());
    }

    #[test]
    fn test_too_many_lines() {
        let lines: Vec<_> = (0..21)
            .map(|i| line(&format!("card-{i}"), Decimal::ONE, 1))
            .collect();
        let report = validator().validate_cart(&lines);
        assert!(!report.is_valid());
        assert!(report.errors.iter().any(|e| e.contains("at most 20")));

        let report = validator().validate_cart(&lines[..20]);
        assert!(report.is_valid());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let report = validator().validate_cart(&[
            line("a", Decimal::ONE, 0),
            line("b", Decimal::ONE, 1),
        ]);
        assert!(!report.is_valid());
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_high_quantity_warns() {
        let report = validator().validate_cart(&[line("a", Decimal::ONE, 11)]);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);

        let report = validator().validate_cart(&[line("a", Decimal::ONE, 10)]);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_zero_subtotal_rejected() {
        let report = validator().validate_cart(&[line("promo", Decimal::ZERO, 1)]);
        assert!(!report.is_valid());
        assert!(report.errors.iter().any(|e| e.contains("subtotal")));
    }

    #[test]
    fn test_high_value_warns() {
        let report = validator().validate_cart(&[line("charizard", Decimal::new(10_001, 0), 1)]);
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.contains("High order value")));
    }

    fn catalog_item(id: &str, price: Decimal) -> CatalogItem {
        CatalogItem {
            id: CatalogItemId::new(id),
            name: id.to_uppercase(),
            category: "spell".into(),
            rarity: Rarity::Rare,
            price,
            quantity: 5,
        }
    }

    #[tokio::test]
    async fn test_cart_store_merges_and_removes() {
        let events = EventBus::default();
        let mut rx = events.subscribe();
        let cart = CartStore::new(Arc::new(MemoryStore::new()), events);
        let item = catalog_item("bolt", Decimal::new(250, 2));

        cart.add_item(&item, 1).await.unwrap();
        let lines = cart.add_item(&item, 2).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 3);
        assert_eq!(rx.recv().await.unwrap(), StoreEvent::CartChanged);

        cart.set_quantity(&item.id, 1).await.unwrap();
        assert_eq!(cart.lines().await[0].quantity, 1);

        cart.remove(&item.id).await.unwrap();
        assert!(cart.lines().await.is_empty());
    }

    #[tokio::test]
    async fn test_cart_keeps_snapshot_price() {
        let cart = CartStore::new(Arc::new(MemoryStore::new()), EventBus::default());
        let mut item = catalog_item("bolt", Decimal::new(250, 2));
        cart.add_item(&item, 1).await.unwrap();

        item.price = Decimal::new(999, 2);
        let lines = cart.add_item(&item, 1).await.unwrap();
        assert_eq!(lines[0].item.unit_price, Decimal::new(250, 2));
        assert_eq!(cart.subtotal().await, Decimal::new(500, 2));

        cart.clear().await.unwrap();
        assert!(cart.lines().await.is_empty());
    }
}
