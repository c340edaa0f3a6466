//! Order document access.
//!
//! Orders are append-only apart from `status`. Writes are serialised so an
//! insert cannot race a status update and drop it.

use std::sync::Arc;

use foilbox_core::{CustomerId, OrderId, OrderStatus};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::error::{OrderError, StoreError};
use crate::models::Order;
use crate::store::{KeyValueStore, keys, load_list, load_list_or_empty, save_list};

/// Reads and writes the `orders` document.
pub struct OrderRepository<S> {
    store: Arc<S>,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> OrderRepository<S> {
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// All orders, oldest first.
    pub async fn list(&self) -> Vec<Order> {
        load_list_or_empty(self.store.as_ref(), keys::ORDERS).await
    }

    pub async fn get(&self, id: &OrderId) -> Option<Order> {
        self.list().await.into_iter().find(|o| &o.id == id)
    }

    /// Orders placed by one customer, newest first.
    pub async fn for_customer(&self, customer: &CustomerId) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .list()
            .await
            .into_iter()
            .filter(|o| &o.customer_id == customer)
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// Append a new order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the document cannot be read or written.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn insert(&self, order: Order) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut orders: Vec<Order> = load_list(self.store.as_ref(), keys::ORDERS).await?;
        orders.push(order);
        save_list(self.store.as_ref(), keys::ORDERS, &orders).await?;
        debug!(count = orders.len(), "Inserted order");
        Ok(())
    }

    /// Replace an order's status after `check` approves the current order.
    ///
    /// Returns the order as it was before the update.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` for an unknown ID, whatever `check`
    /// returns, or a store failure.
    pub(crate) async fn update_status<F>(
        &self,
        id: &OrderId,
        status: OrderStatus,
        check: F,
    ) -> Result<Order, OrderError>
    where
        F: FnOnce(&Order) -> Result<(), OrderError> + Send,
    {
        let _guard = self.write_lock.lock().await;

        let mut orders: Vec<Order> = load_list(self.store.as_ref(), keys::ORDERS).await?;
        let order = orders
            .iter_mut()
            .find(|o| &o.id == id)
            .ok_or_else(|| OrderError::NotFound(id.clone()))?;

        check(order)?;
        let previous = order.clone();
        order.status = status;

        save_list(self.store.as_ref(), keys::ORDERS, &orders).await?;
        Ok(previous)
    }
}
