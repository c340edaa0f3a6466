//! Foilbox Checkout - the order-checkout pipeline.
//!
//! Validates a cart and its coupons, computes capped discounts, reconciles
//! split card payments against the order total, reserves inventory and drives
//! orders through their status lifecycle.
//!
//! # Architecture
//!
//! Every service reads and writes named JSON documents through a
//! [`store::KeyValueStore`]; nothing depends on a concrete storage engine.
//! Pure validators ([`cart::CartValidator`], [`payment::PaymentAllocator`] and
//! the combination rules in [`coupons`]) never touch the store. Mutating
//! services publish [`events::StoreEvent`]s on an [`events::EventBus`] so UI
//! observers can refresh without polling.
//!
//! # Modules
//!
//! - [`store`] - Key-value persistence interface with memory and file backends
//! - [`cart`] - Cart composition rules and the persisted session cart
//! - [`coupons`] - Coupon eligibility, combination limits and discount math
//! - [`payment`] - Split-card allocation checks
//! - [`stock`] - Catalog inventory with all-or-nothing decrements
//! - [`orders`] - Order document access
//! - [`lifecycle`] - Order status transitions and cancellation restock
//! - [`pipeline`] - Checkout validation and commit orchestration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod coupons;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod models;
pub mod orders;
pub mod payment;
pub mod pipeline;
pub mod report;
pub mod stock;
pub mod store;

pub use config::{CheckoutConfig, ConfigError};
pub use error::{CheckoutError, OrderError, StoreError};
pub use events::{EventBus, StoreEvent};
pub use pipeline::{CheckoutPipeline, CheckoutRequest, OrderQuote, PlacedOrder};
pub use report::ValidationReport;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
