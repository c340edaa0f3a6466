//! Checkout limits loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional; defaults in parentheses.
//!
//! - `FOILBOX_MAX_CART_LINES` - Distinct lines allowed in one cart (20)
//! - `FOILBOX_HIGH_LINE_QUANTITY` - Line quantity above which a warning is shown (10)
//! - `FOILBOX_HIGH_ORDER_VALUE` - Subtotal above which a warning is shown (10000)
//! - `FOILBOX_MAX_PROMOTIONAL_COUPONS` - Promotional coupons per order (1)
//! - `FOILBOX_MAX_EXCHANGE_COUPONS` - Exchange coupons per order (5)
//! - `FOILBOX_LARGE_DISCOUNT_RATIO` - Discount share of the order that triggers a warning (0.5)
//! - `FOILBOX_MAX_PAYMENT_CARDS` - Cards one credit payment may be split across (3)
//! - `FOILBOX_LOW_ALLOCATION_FLOOR` - Card allocation below which a warning is shown (5)
//! - `FOILBOX_LOPSIDED_SPLIT_RATIO` - Smallest/largest allocation ratio that triggers a warning (0.10)
//! - `FOILBOX_AMOUNT_EPSILON` - Tolerance when comparing money sums (0.01)
//! - `FOILBOX_LOW_STOCK_THRESHOLD` - Available quantity at or below which stock is "low" (3)
//! - `FOILBOX_SHIPPING_FLAT_RATE` - Shipping charged below the free threshold (9.99)
//! - `FOILBOX_FREE_SHIPPING_THRESHOLD` - Subtotal at which shipping is free (100)
//! - `FOILBOX_DELIVERY_DAYS` - Days added to the order date for the delivery estimate (7)

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Tunable checkout limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    pub max_cart_lines: usize,
    pub high_line_quantity: u32,
    pub high_order_value: Decimal,
    pub max_promotional_coupons: usize,
    pub max_exchange_coupons: usize,
    pub large_discount_ratio: Decimal,
    pub max_payment_cards: usize,
    pub low_allocation_floor: Decimal,
    pub lopsided_split_ratio: Decimal,
    pub amount_epsilon: Decimal,
    pub low_stock_threshold: u32,
    pub shipping_flat_rate: Decimal,
    pub free_shipping_threshold: Decimal,
    pub delivery_days: i64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            max_cart_lines: 20,
            high_line_quantity: 10,
            high_order_value: Decimal::new(10_000, 0),
            max_promotional_coupons: 1,
            max_exchange_coupons: 5,
            large_discount_ratio: Decimal::new(5, 1),
            max_payment_cards: 3,
            low_allocation_floor: Decimal::new(5, 0),
            lopsided_split_ratio: Decimal::new(10, 2),
            amount_epsilon: Decimal::new(1, 2),
            low_stock_threshold: 3,
            shipping_flat_rate: Decimal::new(999, 2),
            free_shipping_threshold: Decimal::new(100, 0),
            delivery_days: 7,
        }
    }
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present. Unset
    /// variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        Ok(Self {
            max_cart_lines: parse_env_or("FOILBOX_MAX_CART_LINES", defaults.max_cart_lines)?,
            high_line_quantity: parse_env_or(
                "FOILBOX_HIGH_LINE_QUANTITY",
                defaults.high_line_quantity,
            )?,
            high_order_value: parse_env_or("FOILBOX_HIGH_ORDER_VALUE", defaults.high_order_value)?,
            max_promotional_coupons: parse_env_or(
                "FOILBOX_MAX_PROMOTIONAL_COUPONS",
                defaults.max_promotional_coupons,
            )?,
            max_exchange_coupons: parse_env_or(
                "FOILBOX_MAX_EXCHANGE_COUPONS",
                defaults.max_exchange_coupons,
            )?,
            large_discount_ratio: parse_env_or(
                "FOILBOX_LARGE_DISCOUNT_RATIO",
                defaults.large_discount_ratio,
            )?,
            max_payment_cards: parse_env_or("FOILBOX_MAX_PAYMENT_CARDS", defaults.max_payment_cards)?,
            low_allocation_floor: parse_env_or(
                "FOILBOX_LOW_ALLOCATION_FLOOR",
                defaults.low_allocation_floor,
            )?,
            lopsided_split_ratio: parse_env_or(
                "FOILBOX_LOPSIDED_SPLIT_RATIO",
                defaults.lopsided_split_ratio,
            )?,
            amount_epsilon: parse_env_or("FOILBOX_AMOUNT_EPSILON", defaults.amount_epsilon)?,
            low_stock_threshold: parse_env_or(
                "FOILBOX_LOW_STOCK_THRESHOLD",
                defaults.low_stock_threshold,
            )?,
            shipping_flat_rate: parse_env_or(
                "FOILBOX_SHIPPING_FLAT_RATE",
                defaults.shipping_flat_rate,
            )?,
            free_shipping_threshold: parse_env_or(
                "FOILBOX_FREE_SHIPPING_THRESHOLD",
                defaults.free_shipping_threshold,
            )?,
            delivery_days: parse_env_or("FOILBOX_DELIVERY_DAYS", defaults.delivery_days)?,
        })
    }

    /// Shipping charged for a given subtotal.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal >= self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.shipping_flat_rate
        }
    }
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| parse_value(key, &raw))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_limits() {
        let config = CheckoutConfig::default();
        assert_eq!(config.max_cart_lines, 20);
        assert_eq!(config.max_promotional_coupons, 1);
        assert_eq!(config.max_exchange_coupons, 5);
        assert_eq!(config.max_payment_cards, 3);
        assert_eq!(config.amount_epsilon, Decimal::new(1, 2));
        assert_eq!(config.low_stock_threshold, 3);
    }

    #[test]
    fn test_parse_value_decimal() {
        let value: Decimal = parse_value("TEST_VAR", " 12.50 ").unwrap();
        assert_eq!(value, Decimal::new(1250, 2));
    }

    #[test]
    fn test_parse_value_invalid() {
        let result: Result<u32, _> = parse_value("TEST_VAR", "many");
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "TEST_VAR"));
    }

    #[test]
    fn test_shipping_free_at_threshold() {
        let config = CheckoutConfig::default();
        assert_eq!(config.shipping_for(Decimal::new(100, 0)), Decimal::ZERO);
        assert_eq!(config.shipping_for(Decimal::new(9999, 2)), Decimal::new(999, 2));
    }
}
