//! Change notifications for UI observers.
//!
//! Services publish after every successful mutation. Delivery is advisory:
//! no checkout rule depends on a subscriber having seen an event, and a
//! lagging subscriber simply misses older events.

use foilbox_core::{CatalogItemId, OrderId, OrderStatus};
use tokio::sync::broadcast;
use tracing::trace;

const DEFAULT_CAPACITY: usize = 64;

/// A document changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    CartChanged,
    StockChanged { items: Vec<CatalogItemId> },
    OrderPlaced { order_id: OrderId },
    OrderStatusChanged { order_id: OrderId, status: OrderStatus },
    CouponsChanged,
}

/// Cloneable handle to a broadcast channel of [`StoreEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Broadcast an event. Having no subscribers is fine.
    pub fn publish(&self, event: StoreEvent) {
        trace!(?event, "Publishing store event");
        let _ = self.sender.send(event);
    }
}
