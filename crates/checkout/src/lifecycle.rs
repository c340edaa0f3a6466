//! Order status transitions.
//!
//! Forward moves (`pending -> processing -> shipped -> delivered`) change
//! only the status. Cancellation is legal from `pending` or `processing`
//! and is the one transition with an inventory effect: it returns the
//! order's units to stock. [`OrderLifecycle::cancel_order`] is the only way
//! to reach `cancelled`, so that restock can never be skipped.

use std::sync::Arc;

use foilbox_core::{OrderId, OrderStatus};
use tracing::{error, info, instrument};

use crate::error::OrderError;
use crate::events::{EventBus, StoreEvent};
use crate::models::Order;
use crate::orders::OrderRepository;
use crate::stock::CatalogStock;
use crate::store::KeyValueStore;

/// Drives orders through their lifecycle.
pub struct OrderLifecycle<S> {
    orders: Arc<OrderRepository<S>>,
    stock: Arc<CatalogStock<S>>,
    events: EventBus,
}

impl<S: KeyValueStore> OrderLifecycle<S> {
    #[must_use]
    pub const fn new(
        orders: Arc<OrderRepository<S>>,
        stock: Arc<CatalogStock<S>>,
        events: EventBus,
    ) -> Self {
        Self {
            orders,
            stock,
            events,
        }
    }

    /// Move an order to the next forward status.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound`, `OrderError::IllegalTransition` for a
    /// terminal order, or a store failure.
    pub async fn advance(&self, id: &OrderId) -> Result<Order, OrderError> {
        let order = self
            .orders
            .get(id)
            .await
            .ok_or_else(|| OrderError::NotFound(id.clone()))?;

        let next = order.status.next().ok_or(OrderError::IllegalTransition {
            from: order.status,
            to: order.status,
        })?;
        self.transition(id, next).await
    }

    /// Apply a forward transition.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::CancelRequiresRestock` when `to` is `cancelled`,
    /// `OrderError::IllegalTransition` for an edge not in the lifecycle,
    /// `OrderError::NotFound`, or a store failure.
    #[instrument(skip(self, id), fields(order_id = %id))]
    pub async fn transition(&self, id: &OrderId, to: OrderStatus) -> Result<Order, OrderError> {
        if to == OrderStatus::Cancelled {
            return Err(OrderError::CancelRequiresRestock);
        }

        let previous = self
            .orders
            .update_status(id, to, |order| {
                if order.status.can_transition_to(to) {
                    Ok(())
                } else {
                    Err(OrderError::IllegalTransition {
                        from: order.status,
                        to,
                    })
                }
            })
            .await?;

        info!(from = %previous.status, "Order status changed");
        Ok(self.updated(previous, to))
    }

    /// Cancel an order and return its units to stock.
    ///
    /// The status check and update happen atomically, so concurrent
    /// cancellations restock at most once. If restocking fails the status
    /// is rolled back.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::IllegalTransition` once the order has shipped,
    /// was delivered or is already cancelled; `OrderError::NotFound`; or a
    /// store failure. Stock is unchanged on every error.
    #[instrument(skip(self, id), fields(order_id = %id))]
    pub async fn cancel_order(&self, id: &OrderId) -> Result<Order, OrderError> {
        let previous = self
            .orders
            .update_status(id, OrderStatus::Cancelled, |order| {
                if order.status.can_cancel() {
                    Ok(())
                } else {
                    Err(OrderError::IllegalTransition {
                        from: order.status,
                        to: OrderStatus::Cancelled,
                    })
                }
            })
            .await?;

        if let Err(e) = self.stock.increase_stock(&previous.lines).await {
            error!(error = %e, "Restock failed, reverting cancellation");
            self.orders
                .update_status(id, previous.status, |_| Ok(()))
                .await?;
            return Err(e.into());
        }

        info!(
            from = %previous.status,
            units = previous.unit_count(),
            "Order cancelled and restocked"
        );
        Ok(self.updated(previous, OrderStatus::Cancelled))
    }

    fn updated(&self, mut order: Order, status: OrderStatus) -> Order {
        order.status = status;
        self.events.publish(StoreEvent::OrderStatusChanged {
            order_id: order.id.clone(),
            status,
        });
        order
    }
}
