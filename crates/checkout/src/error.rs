//! Error types for checkout services.
//!
//! Expected business outcomes (bad cart, ineligible coupon, short stock) are
//! reported through [`ValidationReport`] values. The enums here cover what
//! callers must handle beyond that: storage failures, a rejected commit and
//! illegal order transitions.

use foilbox_core::{OrderId, OrderStatus};
use thiserror::Error;

use crate::report::ValidationReport;

/// Errors raised by a [`KeyValueStore`](crate::store::KeyValueStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Document keys are restricted to `[A-Za-z0-9_-]+`.
    #[error("invalid document key: {0:?}")]
    InvalidKey(String),
}

/// Errors returned by [`CheckoutPipeline::commit`](crate::pipeline::CheckoutPipeline::commit).
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Validation or stock reservation failed; nothing was persisted.
    #[error("checkout rejected: {}", .0.errors.join("; "))]
    Rejected(ValidationReport),

    /// Persistence failed while committing.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl CheckoutError {
    /// The user-facing report, if this was a business rejection.
    #[must_use]
    pub const fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Rejected(report) => Some(report),
            Self::Store(_) => None,
        }
    }
}

/// Errors raised by order lookups and status transitions.
#[derive(Debug, Error)]
pub enum OrderError {
    /// No order with this ID exists.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// The lifecycle graph has no edge `from -> to`.
    #[error("cannot move order from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    /// Cancellation must go through `cancel_order` so stock is restored.
    #[error("orders can only be cancelled through cancel_order")]
    CancelRequiresRestock,

    /// Persistence failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_message_joins_errors() {
        let mut report = ValidationReport::new();
        report.error("first problem");
        report.error("second problem");
        let err = CheckoutError::Rejected(report);
        assert_eq!(
            err.to_string(),
            "checkout rejected: first problem; second problem"
        );
        assert_eq!(err.report().map(|r| r.errors.len()), Some(2));
    }

    #[test]
    fn test_illegal_transition_message() {
        let err = OrderError::IllegalTransition {
            from: OrderStatus::Shipped,
            to: OrderStatus::Cancelled,
        };
        assert_eq!(err.to_string(), "cannot move order from shipped to cancelled");
    }

    #[test]
    fn test_store_error_has_no_report() {
        let err = CheckoutError::Store(StoreError::InvalidKey("../x".into()));
        assert!(err.report().is_none());
    }
}
