//! Domain models persisted in the key-value store.

pub mod cart;
pub mod catalog;
pub mod coupon;
pub mod customer;
pub mod order;
pub mod payment;

pub use cart::{CartLine, ItemSnapshot};
pub use catalog::CatalogItem;
pub use coupon::{AppliedCoupon, Coupon};
pub use customer::{Address, CreditCard};
pub use order::Order;
pub use payment::{AllocationSnapshot, PaymentAllocation, PaymentInfo, PaymentSnapshot};
