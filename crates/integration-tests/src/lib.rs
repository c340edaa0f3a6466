//! End-to-end tests for the Foilbox checkout pipeline.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p foilbox-integration-tests
//! ```
//!
//! Each test gets a fresh [`TestContext`] backed by a JSON file store in a
//! temporary directory, so documents go through real serialization and
//! survive reopening the store.
//!
//! # Test Categories
//!
//! - `checkout_flow` - Validation aggregation and order placement
//! - `order_lifecycle` - Status transitions and cancellation restock
//! - `coupon_rules` - Coupon eligibility and combination against stored data

use std::path::Path;
use std::sync::Arc;

use chrono::{Duration, Utc};
use foilbox_checkout::models::{
    Address, CartLine, CatalogItem, Coupon, CreditCard, PaymentAllocation, PaymentInfo,
};
use foilbox_checkout::store::{keys, save_list};
use foilbox_checkout::{
    CheckoutConfig, CheckoutPipeline, CheckoutRequest, EventBus, JsonFileStore,
};
use foilbox_core::{
    AddressId, CatalogItemId, CouponCategory, CouponId, CouponKind, CreditCardId, CustomerId,
    PaymentMethod, Rarity,
};
use rust_decimal::Decimal;
use tempfile::TempDir;

/// The customer most fixtures belong to.
pub const CUSTOMER: &str = "cust-ash";

/// A pipeline over a throwaway file store.
pub struct TestContext {
    pub dir: TempDir,
    pub store: Arc<JsonFileStore>,
    pub pipeline: CheckoutPipeline<JsonFileStore>,
}

impl TestContext {
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let (store, pipeline) = open(dir.path());
        Self {
            dir,
            store,
            pipeline,
        }
    }

    /// A second pipeline over the same directory, as a restarted process
    /// would see it.
    #[must_use]
    pub fn reopen(&self) -> CheckoutPipeline<JsonFileStore> {
        open(self.dir.path()).1
    }

    /// Write the catalog, coupons, one address and the customer's cards.
    ///
    /// # Panics
    ///
    /// Panics if a document cannot be written.
    pub async fn seed(&self, catalog: &[CatalogItem], coupons: &[Coupon], cards: &[CreditCard]) {
        let store = self.store.as_ref();
        save_list(store, keys::CARDS, catalog).await.expect("seed catalog");
        save_list(store, keys::COUPONS, coupons).await.expect("seed coupons");
        save_list(store, keys::CUSTOMER_ADDRESSES, &[address(CUSTOMER)])
            .await
            .expect("seed addresses");
        save_list(store, keys::CUSTOMER_CREDIT_CARDS, cards)
            .await
            .expect("seed cards");
    }

    /// Current quantity of one catalog item, zero if it is missing.
    pub async fn available(&self, id: &str) -> u32 {
        self.pipeline
            .stock()
            .get_item(&CatalogItemId::new(id))
            .await
            .map_or(0, |item| item.quantity)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

fn open(dir: &Path) -> (Arc<JsonFileStore>, CheckoutPipeline<JsonFileStore>) {
    let store = Arc::new(JsonFileStore::new(dir.join("data")));
    let pipeline = CheckoutPipeline::new(
        Arc::clone(&store),
        CheckoutConfig::default(),
        EventBus::default(),
    );
    (store, pipeline)
}

/// Whole-currency amount.
#[must_use]
pub fn dollars(amount: i64) -> Decimal {
    Decimal::new(amount, 0)
}

/// Amount in cents.
#[must_use]
pub fn cents(amount: i64) -> Decimal {
    Decimal::new(amount, 2)
}

#[must_use]
pub fn item(id: &str, price: Decimal, quantity: u32) -> CatalogItem {
    CatalogItem {
        id: CatalogItemId::new(id),
        name: id.replace('-', " "),
        category: "creature".into(),
        rarity: Rarity::Rare,
        price,
        quantity,
    }
}

#[must_use]
pub fn line(item: &CatalogItem, quantity: u32) -> CartLine {
    CartLine {
        item_id: item.id.clone(),
        item: item.snapshot(),
        quantity,
    }
}

#[must_use]
pub fn address(customer: &str) -> Address {
    Address {
        id: AddressId::new(format!("addr-{customer}")),
        customer_id: CustomerId::new(customer),
        recipient: "Ash Ketchum".into(),
        street: "1 Route One".into(),
        city: "Pallet Town".into(),
        state: "KT".into(),
        postal_code: "00001".into(),
        country: "JP".into(),
    }
}

#[must_use]
pub fn card(id: &str, owner: &str, last_four: &str) -> CreditCard {
    CreditCard {
        id: CreditCardId::new(id),
        customer_id: CustomerId::new(owner),
        holder_name: "Ash Ketchum".into(),
        brand: "visa".into(),
        last_four: last_four.into(),
        expiry_month: 12,
        expiry_year: 2099,
    }
}

#[must_use]
pub fn promo(code: &str, kind: CouponKind, discount: Decimal) -> Coupon {
    Coupon {
        id: CouponId::new(format!("promo-{}", code.to_ascii_lowercase())),
        code: code.into(),
        discount,
        kind,
        category: CouponCategory::Promotional,
        customer_id: None,
        min_order_value: None,
        max_discount: None,
        active: true,
        expires_at: Utc::now() + Duration::days(30),
    }
}

#[must_use]
pub fn exchange(code: &str, owner: &str, amount: Decimal) -> Coupon {
    Coupon {
        id: CouponId::new(format!("exchange-{}", code.to_ascii_lowercase())),
        category: CouponCategory::Exchange,
        customer_id: Some(CustomerId::new(owner)),
        ..promo(code, CouponKind::Fixed, amount)
    }
}

/// A credit checkout for [`CUSTOMER`] paying `split` across the given cards.
#[must_use]
pub fn credit_request(
    lines: Vec<CartLine>,
    coupons: Vec<Coupon>,
    split: &[(&str, Decimal)],
) -> CheckoutRequest {
    let allocations: Vec<PaymentAllocation> = split
        .iter()
        .map(|(card_id, amount)| PaymentAllocation {
            card_id: CreditCardId::new(*card_id),
            amount: *amount,
        })
        .collect();

    CheckoutRequest {
        customer_id: CustomerId::new(CUSTOMER),
        lines,
        coupons,
        payment: PaymentInfo {
            method: Some(PaymentMethod::Credit),
            total_amount: allocations.iter().map(|a| a.amount).sum(),
            allocations,
        },
        shipping_address: address(CUSTOMER),
    }
}
