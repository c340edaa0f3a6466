//! Checkout orchestration.
//!
//! Validation runs every sub-validator and concatenates their findings so
//! a shopper sees all problems at once. Nothing is written until all of
//! them pass. Commit then consumes exchange coupons, reserves stock and
//! persists the order, in that order, undoing the earlier steps when a
//! later one fails.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use foilbox_core::{CustomerId, OrderId, OrderStatus, PaymentMethod, format_money, within_tolerance};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::cart::{CartStore, CartValidator};
use crate::config::CheckoutConfig;
use crate::coupons::{CouponEngine, apply_coupons};
use crate::error::CheckoutError;
use crate::events::{EventBus, StoreEvent};
use crate::lifecycle::OrderLifecycle;
use crate::models::cart::subtotal;
use crate::models::{
    Address, AllocationSnapshot, AppliedCoupon, CartLine, Coupon, CreditCard, Order, PaymentInfo,
    PaymentSnapshot,
};
use crate::orders::OrderRepository;
use crate::payment::PaymentAllocator;
use crate::report::ValidationReport;
use crate::stock::CatalogStock;
use crate::store::{KeyValueStore, keys, load_list_or_empty};

/// Everything the shopper chose for one checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub customer_id: CustomerId,
    pub lines: Vec<CartLine>,
    #[serde(default)]
    pub coupons: Vec<Coupon>,
    pub payment: PaymentInfo,
    pub shipping_address: Address,
}

/// Money breakdown for a cart and coupon set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderQuote {
    pub subtotal: Decimal,
    /// Unclamped coupon total, for display.
    pub total_discount: Decimal,
    /// Discount actually charged.
    pub discount: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub coupons: Vec<AppliedCoupon>,
}

/// A committed order plus the non-blocking warnings seen on the way.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub warnings: Vec<String>,
}

/// Wires the checkout services over one shared store.
pub struct CheckoutPipeline<S> {
    store: Arc<S>,
    config: Arc<CheckoutConfig>,
    events: EventBus,
    cart: CartValidator,
    payments: PaymentAllocator,
    coupons: Arc<CouponEngine<S>>,
    stock: Arc<CatalogStock<S>>,
    orders: Arc<OrderRepository<S>>,
}

impl<S: KeyValueStore> CheckoutPipeline<S> {
    #[must_use]
    pub fn new(store: Arc<S>, config: CheckoutConfig, events: EventBus) -> Self {
        let config = Arc::new(config);
        Self {
            cart: CartValidator::new(Arc::clone(&config)),
            payments: PaymentAllocator::new(Arc::clone(&config)),
            coupons: Arc::new(CouponEngine::new(
                Arc::clone(&store),
                Arc::clone(&config),
                events.clone(),
            )),
            stock: Arc::new(CatalogStock::new(
                Arc::clone(&store),
                Arc::clone(&config),
                events.clone(),
            )),
            orders: Arc::new(OrderRepository::new(Arc::clone(&store))),
            store,
            config,
            events,
        }
    }

    #[must_use]
    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    #[must_use]
    pub fn stock(&self) -> &CatalogStock<S> {
        &self.stock
    }

    #[must_use]
    pub fn coupons(&self) -> &CouponEngine<S> {
        &self.coupons
    }

    #[must_use]
    pub fn orders(&self) -> &OrderRepository<S> {
        &self.orders
    }

    /// Lifecycle sharing this pipeline's stock, so restocks and commits
    /// take the same catalog lock.
    #[must_use]
    pub fn lifecycle(&self) -> OrderLifecycle<S> {
        OrderLifecycle::new(
            Arc::clone(&self.orders),
            Arc::clone(&self.stock),
            self.events.clone(),
        )
    }

    /// The persisted session cart.
    #[must_use]
    pub fn cart_store(&self) -> CartStore<S> {
        CartStore::new(Arc::clone(&self.store), self.events.clone())
    }

    /// Price a cart with a coupon set.
    #[must_use]
    pub fn quote(&self, lines: &[CartLine], coupons: &[Coupon]) -> OrderQuote {
        let subtotal = subtotal(lines);
        let application = apply_coupons(coupons, subtotal);
        let shipping_cost = self.config.shipping_for(subtotal);

        OrderQuote {
            subtotal,
            total_discount: application.total_discount,
            discount: application.adjusted_discount,
            shipping_cost,
            total: subtotal - application.adjusted_discount + shipping_cost,
            coupons: application.applied,
        }
    }

    /// Run every checkout validator and collect all errors and warnings.
    pub async fn validate_checkout(&self, request: &CheckoutRequest) -> ValidationReport {
        self.validate_checkout_at(request, Utc::now()).await
    }

    /// [`validate_checkout`](Self::validate_checkout) with an explicit clock.
    #[instrument(skip_all, fields(customer_id = %request.customer_id, lines = request.lines.len()))]
    pub async fn validate_checkout_at(
        &self,
        request: &CheckoutRequest,
        now: DateTime<Utc>,
    ) -> ValidationReport {
        let mut report = ValidationReport::new();
        let customer = &request.customer_id;

        if customer.is_blank() {
            report.error("A signed-in customer is required to check out");
        }

        report.merge(self.cart.validate_cart(&request.lines));

        let quote = self.quote(&request.lines, &request.coupons);
        report.merge(
            self.coupons
                .validate_combination(&request.coupons, customer, quote.subtotal),
        );

        report.merge(self.payments.validate_payment(&request.payment));
        if request.payment.method == Some(PaymentMethod::Credit) {
            let cards = self.saved_cards().await;
            report.merge(self.payments.validate_instruments(
                &request.payment,
                &cards,
                customer,
                now.date_naive(),
            ));
        }

        if !within_tolerance(
            request.payment.total_amount,
            quote.total,
            self.config.amount_epsilon,
        ) {
            report.error(format!(
                "Payment total {} does not match order total {}",
                format_money(request.payment.total_amount),
                format_money(quote.total)
            ));
        }

        if &request.shipping_address.customer_id != customer {
            report.error("Shipping address belongs to another customer");
        }

        report
    }

    /// Quote and validate a request against the stored coupons, without
    /// writing anything.
    ///
    /// This is what [`commit`](Self::commit) would charge and check.
    pub async fn preview(&self, request: &CheckoutRequest) -> (OrderQuote, ValidationReport) {
        let now = Utc::now();
        let (request, mut report) = self.with_stored_coupons(request, now).await;
        report.merge(self.validate_checkout_at(&request, now).await);
        (self.quote(&request.lines, &request.coupons), report)
    }

    /// Validate, consume exchange coupons, reserve stock and persist a new
    /// `pending` order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Rejected` with every problem found when
    /// validation fails, an exchange coupon was spent since validation, a
    /// line price no longer matches the catalog or stock ran out; nothing is
    /// persisted in that case. Returns `CheckoutError::Store` on a storage
    /// failure, after releasing whatever was already reserved.
    pub async fn commit(&self, request: &CheckoutRequest) -> Result<PlacedOrder, CheckoutError> {
        self.commit_at(request, Utc::now()).await
    }

    /// [`commit`](Self::commit) with an explicit clock.
    ///
    /// # Errors
    ///
    /// See [`commit`](Self::commit).
    #[instrument(skip_all, fields(customer_id = %request.customer_id))]
    pub async fn commit_at(
        &self,
        request: &CheckoutRequest,
        now: DateTime<Utc>,
    ) -> Result<PlacedOrder, CheckoutError> {
        let (request, mut report) = self.with_stored_coupons(request, now).await;
        report.merge(self.validate_checkout_at(&request, now).await);

        let Some(method) = request.payment.method.filter(|_| report.is_valid()) else {
            warn!(errors = ?report.errors, "Checkout rejected");
            return Err(CheckoutError::Rejected(report));
        };

        report.merge(
            self.coupons
                .consume(&request.coupons, &request.customer_id, now)
                .await?,
        );
        if !report.is_valid() {
            warn!(errors = ?report.errors, "Checkout rejected at coupon redemption");
            return Err(CheckoutError::Rejected(report));
        }

        match self.stock.decrease_stock(&request.lines).await {
            Ok(stock_report) => report.merge(stock_report),
            Err(e) => {
                self.restore_coupons(&request.coupons).await;
                return Err(e.into());
            }
        }
        if !report.is_valid() {
            warn!(errors = ?report.errors, "Checkout rejected at stock reservation");
            self.restore_coupons(&request.coupons).await;
            return Err(CheckoutError::Rejected(report));
        }

        let quote = self.quote(&request.lines, &request.coupons);
        let order = Order {
            id: OrderId::generate(),
            customer_id: request.customer_id.clone(),
            lines: request.lines.clone(),
            subtotal: quote.subtotal,
            discount: quote.discount,
            shipping_cost: quote.shipping_cost,
            total: quote.total,
            shipping_address: request.shipping_address.clone(),
            payment: self.payment_snapshot(method, &request.payment).await,
            coupons: quote.coupons,
            status: OrderStatus::Pending,
            created_at: now,
            estimated_delivery: now + Duration::days(self.config.delivery_days),
        };

        if let Err(e) = self.orders.insert(order.clone()).await {
            error!(error = %e, "Saving order failed, releasing reserved stock and coupons");
            if let Err(restock) = self.stock.increase_stock(&request.lines).await {
                error!(error = %restock, "Releasing reserved stock failed");
            }
            self.restore_coupons(&request.coupons).await;
            return Err(e.into());
        }

        self.events.publish(StoreEvent::OrderPlaced {
            order_id: order.id.clone(),
        });
        info!(
            order_id = %order.id,
            total = %order.total,
            units = order.unit_count(),
            "Order placed"
        );

        Ok(PlacedOrder {
            order,
            warnings: report.warnings,
        })
    }

    /// Copy of `request` with each coupon swapped for the stored one.
    ///
    /// Unknown, inactive, expired or foreign coupons are dropped and
    /// reported, so client copies never decide the discount.
    async fn with_stored_coupons(
        &self,
        request: &CheckoutRequest,
        now: DateTime<Utc>,
    ) -> (CheckoutRequest, ValidationReport) {
        let mut report = ValidationReport::new();
        let mut coupons = Vec::with_capacity(request.coupons.len());

        for requested in &request.coupons {
            match self
                .coupons
                .validate_coupon_at(&requested.code, Some(&request.customer_id), None, now)
                .await
            {
                Ok(coupon) => coupons.push(coupon),
                Err(reason) => report.error(reason.to_string()),
            }
        }

        let request = CheckoutRequest {
            coupons,
            ..request.clone()
        };
        (request, report)
    }

    async fn restore_coupons(&self, coupons: &[Coupon]) {
        if let Err(e) = self.coupons.restore(coupons).await {
            error!(error = %e, "Restoring exchange coupons failed");
        }
    }

    async fn saved_cards(&self) -> Vec<CreditCard> {
        load_list_or_empty(self.store.as_ref(), keys::CUSTOMER_CREDIT_CARDS).await
    }

    async fn payment_snapshot(&self, method: PaymentMethod, payment: &PaymentInfo) -> PaymentSnapshot {
        let allocations = if method == PaymentMethod::Credit {
            let cards = self.saved_cards().await;
            payment
                .allocations
                .iter()
                .map(|allocation| {
                    let card = cards.iter().find(|c| c.id == allocation.card_id);
                    AllocationSnapshot {
                        card_id: allocation.card_id.clone(),
                        brand: card.map(|c| c.brand.clone()).unwrap_or_default(),
                        masked_number: card.map(CreditCard::masked_number).unwrap_or_default(),
                        amount: allocation.amount,
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        PaymentSnapshot {
            method,
            total_amount: payment.total_amount,
            allocations,
        }
    }
}
