//! Foilbox Core - Shared types library.
//!
//! This crate provides common types used across all Foilbox components:
//! - `checkout` - Cart, coupon, payment, stock and order lifecycle rules
//! - `cli` - Command-line tools for seeding and operating the store
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no persistence, no async
//! runtime. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money helpers and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
