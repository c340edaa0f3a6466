//! Integration tests for checkout validation and order placement.
//!
//! Every test runs against a JSON file store so orders, stock and coupons
//! are checked as persisted documents, not just in-memory values.

use std::sync::Arc;

use foilbox_checkout::models::PaymentInfo;
use foilbox_checkout::store::keys;
use foilbox_checkout::{CheckoutError, KeyValueStore};
use foilbox_core::{CouponKind, OrderStatus, PaymentMethod};
use foilbox_integration_tests::{
    CUSTOMER, TestContext, card, cents, credit_request, dollars, exchange, item, line, promo,
};

// =============================================================================
// Placement
// =============================================================================

#[tokio::test]
async fn test_commit_with_fixed_promo_empties_stock() {
    let ctx = TestContext::new();
    let mewtwo = item("mewtwo", dollars(50), 2);
    let tenoff = promo("TENOFF", CouponKind::Fixed, dollars(10));
    ctx.seed(&[mewtwo.clone()], &[tenoff.clone()], &[card("cc-1", CUSTOMER, "4242")])
        .await;

    let request = credit_request(vec![line(&mewtwo, 2)], vec![tenoff], &[("cc-1", dollars(90))]);
    let quote = ctx.pipeline.quote(&request.lines, &request.coupons);
    assert_eq!(quote.subtotal, dollars(100));
    assert_eq!(quote.discount, dollars(10));
    assert_eq!(quote.shipping_cost, dollars(0));

    let placed = ctx.pipeline.commit(&request).await.unwrap();
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.order.total, dollars(90));
    assert_eq!(ctx.available("mewtwo").await, 0);

    // A restarted process sees the same order and stock.
    let reopened = ctx.reopen();
    let stored = reopened.orders().get(&placed.order.id).await.unwrap();
    assert_eq!(stored.payment.allocations[0].masked_number, "**** **** **** 4242");
    assert_eq!(stored.lines[0].item.unit_price, dollars(50));
    assert_eq!(reopened.stock().list_items().await[0].quantity, 0);

    let raw = ctx.store.get(keys::ORDERS).await.unwrap().unwrap();
    assert_eq!(raw.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_insufficient_stock_rejects_without_writing() {
    let ctx = TestContext::new();
    let mewtwo = item("mewtwo", dollars(50), 1);
    let tenoff = promo("TENOFF", CouponKind::Fixed, dollars(10));
    ctx.seed(&[mewtwo.clone()], &[tenoff.clone()], &[card("cc-1", CUSTOMER, "4242")])
        .await;

    let request = credit_request(vec![line(&mewtwo, 2)], vec![tenoff], &[("cc-1", dollars(90))]);
    let err = ctx.pipeline.commit(&request).await.unwrap_err();

    let report = err.report().unwrap();
    assert!(
        report.errors.iter().any(|e| e.contains("insufficient stock")),
        "{report:?}"
    );
    assert_eq!(ctx.available("mewtwo").await, 1);
    assert!(ctx.pipeline.orders().list().await.is_empty());
}

#[tokio::test]
async fn test_snapshot_price_survives_catalog_change() {
    let ctx = TestContext::new();
    let pikachu = item("pikachu", dollars(120), 5);
    ctx.seed(&[pikachu.clone()], &[], &[card("cc-1", CUSTOMER, "4242")])
        .await;

    let request = credit_request(vec![line(&pikachu, 1)], vec![], &[("cc-1", dollars(120))]);
    let placed = ctx.pipeline.commit(&request).await.unwrap();

    let repriced = item("pikachu", dollars(999), 4);
    foilbox_checkout::store::save_list(ctx.store.as_ref(), keys::CARDS, &[repriced])
        .await
        .unwrap();

    let stored = ctx.pipeline.orders().get(&placed.order.id).await.unwrap();
    assert_eq!(stored.lines[0].item.unit_price, dollars(120));
    assert_eq!(stored.total, dollars(120));
}

#[tokio::test]
async fn test_concurrent_checkouts_for_last_unit() {
    let ctx = TestContext::new();
    let charizard = item("charizard", dollars(250), 1);
    ctx.seed(&[charizard.clone()], &[], &[card("cc-1", CUSTOMER, "4242")])
        .await;

    let request = credit_request(vec![line(&charizard, 1)], vec![], &[("cc-1", dollars(250))]);
    let (first, second) = tokio::join!(
        ctx.pipeline.commit(&request),
        ctx.pipeline.commit(&request)
    );

    assert_eq!(
        [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
        1
    );
    assert_eq!(ctx.available("charizard").await, 0);
    assert_eq!(ctx.pipeline.orders().list().await.len(), 1);
}

// =============================================================================
// Payment Split
// =============================================================================

#[tokio::test]
async fn test_split_within_one_cent_is_accepted() {
    let ctx = TestContext::new();
    let mewtwo = item("mewtwo", dollars(100), 3);
    ctx.seed(
        &[mewtwo.clone()],
        &[],
        &[card("cc-1", CUSTOMER, "4242"), card("cc-2", CUSTOMER, "5555")],
    )
    .await;

    let mut request = credit_request(
        vec![line(&mewtwo, 1)],
        vec![],
        &[("cc-1", dollars(60)), ("cc-2", cents(3999))],
    );
    request.payment.total_amount = dollars(100);
    assert!(ctx.pipeline.validate_checkout(&request).await.is_valid());

    request.payment.allocations[1].amount = dollars(39);
    let report = ctx.pipeline.validate_checkout(&request).await;
    assert!(!report.is_valid());
    assert!(
        report
            .errors
            .iter()
            .any(|e| e.starts_with("Allocation sum does not match total"))
    );
}

#[tokio::test]
async fn test_bank_transfer_needs_no_cards() {
    let ctx = TestContext::new();
    let energy = item("energy", dollars(12), 10);
    ctx.seed(&[energy.clone()], &[], &[]).await;

    let mut request = credit_request(vec![line(&energy, 2)], vec![], &[]);
    request.payment = PaymentInfo {
        method: Some(PaymentMethod::BankTransfer),
        total_amount: cents(3399),
        allocations: Vec::new(),
    };

    let placed = ctx.pipeline.commit(&request).await.unwrap();
    assert_eq!(placed.order.shipping_cost, cents(999));
    assert!(placed.order.payment.allocations.is_empty());
}

// =============================================================================
// Discounts
// =============================================================================

#[tokio::test]
async fn test_over_discount_is_clamped_and_exchange_coupons_consumed() {
    let ctx = TestContext::new();
    let pikachu = item("pikachu", dollars(30), 5);
    let credits = vec![
        exchange("RET-1", CUSTOMER, dollars(15)),
        exchange("RET-2", CUSTOMER, dollars(15)),
        exchange("RET-3", CUSTOMER, dollars(15)),
    ];
    ctx.seed(&[pikachu.clone()], &credits, &[card("cc-1", CUSTOMER, "4242")])
        .await;

    // 30.00 - 29.99 + 9.99 shipping
    let request = credit_request(vec![line(&pikachu, 1)], credits, &[("cc-1", dollars(10))]);
    let placed = ctx.pipeline.commit(&request).await.unwrap();

    assert_eq!(placed.order.discount, cents(2999));
    assert_eq!(placed.order.total, dollars(10));
    assert!(placed.warnings.iter().any(|w| w.contains("capped at $29.99")));

    for code in ["RET-1", "RET-2", "RET-3"] {
        let coupon = ctx.pipeline.coupons().find_by_code(code).await.unwrap();
        assert!(!coupon.active, "{code} should be consumed");
    }

    // Consumed credit cannot be spent twice.
    let again = credit_request(
        vec![line(&pikachu, 1)],
        vec![exchange("RET-1", CUSTOMER, dollars(15))],
        &[("cc-1", cents(2499))],
    );
    let err = ctx.pipeline.commit(&again).await.unwrap_err();
    assert!(
        err.report()
            .unwrap()
            .errors
            .iter()
            .any(|e| e.contains("no longer active"))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_exchange_credit_is_spent_once_across_concurrent_checkouts() {
    let ctx = Arc::new(TestContext::new());
    let pikachu = item("pikachu", dollars(30), 10);
    let credit = exchange("RET-1", CUSTOMER, dollars(15));
    ctx.seed(&[pikachu.clone()], &[credit.clone()], &[card("cc-1", CUSTOMER, "4242")])
        .await;

    // 30.00 - 15.00 + 9.99 shipping
    let request = credit_request(vec![line(&pikachu, 1)], vec![credit], &[("cc-1", cents(2499))]);
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let ctx = Arc::clone(&ctx);
            let request = request.clone();
            tokio::spawn(async move { ctx.pipeline.commit(&request).await })
        })
        .collect();

    let mut placed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(err) => assert!(
                err.report()
                    .unwrap()
                    .errors
                    .iter()
                    .any(|e| e.contains("no longer active")),
                "{err}"
            ),
        }
    }

    assert_eq!(placed, 1);
    let discounted = ctx
        .pipeline
        .orders()
        .list()
        .await
        .into_iter()
        .filter(|o| o.discount == dollars(15))
        .count();
    assert_eq!(discounted, 1);
    assert_eq!(ctx.available("pikachu").await, 9);
}

#[tokio::test]
async fn test_tampered_line_price_is_rejected() {
    let ctx = TestContext::new();
    let charizard = item("charizard", dollars(250), 1);
    ctx.seed(&[charizard.clone()], &[], &[card("cc-1", CUSTOMER, "4242")])
        .await;

    let mut cheap = line(&charizard, 1);
    cheap.item.unit_price = dollars(1);
    let request = credit_request(vec![cheap], vec![], &[("cc-1", cents(1099))]);

    let err = ctx.pipeline.commit(&request).await.unwrap_err();
    assert!(
        err.report()
            .unwrap()
            .errors
            .iter()
            .any(|e| e.contains("changed from $1.00 to $250.00"))
    );
    assert_eq!(ctx.available("charizard").await, 1);
    assert!(ctx.pipeline.orders().list().await.is_empty());
}

// =============================================================================
// Aggregated Validation
// =============================================================================

#[tokio::test]
async fn test_every_problem_is_reported_at_once() {
    let ctx = TestContext::new();
    let mewtwo = item("mewtwo", dollars(50), 5);
    let promos = vec![
        promo("SPRING10", CouponKind::Percentage, dollars(10)),
        promo("TENOFF", CouponKind::Fixed, dollars(10)),
    ];
    ctx.seed(
        &[mewtwo.clone()],
        &promos,
        &[card("cc-theirs", "cust-gary", "1111")],
    )
    .await;

    let mut request = credit_request(
        vec![line(&mewtwo, 2)],
        promos,
        &[("cc-theirs", dollars(80))],
    );
    request.shipping_address = foilbox_integration_tests::address("cust-gary");

    let err = ctx.pipeline.commit(&request).await.unwrap_err();
    let CheckoutError::Rejected(report) = err else {
        panic!("expected a rejection");
    };

    assert!(report.errors.iter().any(|e| e.contains("promotional coupon")));
    assert!(report.errors.iter().any(|e| e.contains("belongs to another customer")));
    assert!(report.errors.iter().any(|e| e.contains("Shipping address")));
    assert_eq!(ctx.available("mewtwo").await, 5);
    assert!(ctx.pipeline.orders().list().await.is_empty());
}
