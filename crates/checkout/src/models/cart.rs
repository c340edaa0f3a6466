//! Cart lines.

use foilbox_core::{CatalogItemId, Rarity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Item attributes frozen when the line was created.
///
/// Orders keep this copy so later catalog edits never rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub name: String,
    pub category: String,
    pub rarity: Rarity,
    pub unit_price: Decimal,
}

/// One catalog item and the quantity a shopper wants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: CatalogItemId,
    pub item: ItemSnapshot,
    pub quantity: u32,
}

impl CartLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.item.unit_price * Decimal::from(self.quantity)
    }
}

/// Sum of every line total.
#[must_use]
pub fn subtotal(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::line_total).sum()
}
