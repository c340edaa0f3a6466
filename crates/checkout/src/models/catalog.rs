//! Catalog items.

use foilbox_core::{CatalogItemId, Rarity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::ItemSnapshot;

/// A sellable card with its current inventory.
///
/// Created and deleted by catalog administration; only
/// [`CatalogStock`](crate::stock::CatalogStock) changes `quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: CatalogItemId,
    pub name: String,
    /// Card type (e.g. "creature", "spell").
    pub category: String,
    pub rarity: Rarity,
    /// Unit price, never negative.
    pub price: Decimal,
    /// Units available to sell.
    pub quantity: u32,
}

impl CatalogItem {
    /// Freeze the attributes a cart line or order keeps.
    #[must_use]
    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            name: self.name.clone(),
            category: self.category.clone(),
            rarity: self.rarity,
            unit_price: self.price,
        }
    }

    #[must_use]
    pub const fn is_out_of_stock(&self) -> bool {
        self.quantity == 0
    }
}
