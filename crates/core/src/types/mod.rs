//! Core types for Foilbox.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod money;
pub mod status;

pub use id::*;
pub use money::{CENT, format_money, round_money, within_tolerance};
pub use status::*;
