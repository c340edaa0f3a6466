//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;

use foilbox_checkout::coupons::CouponRejection;
use foilbox_checkout::{
    CheckoutConfig, CheckoutError, CheckoutPipeline, ConfigError, EventBus, JsonFileStore,
    OrderError, StoreError,
};
use thiserror::Error;

pub mod checkout;
pub mod coupons;
pub mod orders;
pub mod seed;
pub mod stock;

const DEFAULT_DATA_DIR: &str = "./data";

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Coupon(#[from] CouponRejection),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid seed file: {0}")]
    SeedFormat(#[from] serde_yaml::Error),

    #[error("Invalid checkout request: {0}")]
    RequestFormat(#[from] serde_json::Error),

    #[error("{0} seed validation errors found")]
    InvalidSeed(usize),
}

/// The store and pipeline every command works against.
pub struct Context {
    pub store: Arc<JsonFileStore>,
    pub pipeline: CheckoutPipeline<JsonFileStore>,
}

impl Context {
    /// Open the store named by `FOILBOX_DATA_DIR`.
    ///
    /// Loading the configuration reads `.env` first, so the data directory
    /// may be set there too.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Config` if a `FOILBOX_*` variable is malformed.
    pub fn open() -> Result<Self, CliError> {
        let config = CheckoutConfig::from_env()?;
        let data_dir =
            std::env::var("FOILBOX_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_owned());
        tracing::debug!(data_dir, "Opening file store");
        Ok(Self::with_store(JsonFileStore::new(data_dir), config))
    }

    pub fn with_store(store: JsonFileStore, config: CheckoutConfig) -> Self {
        let store = Arc::new(store);
        Self {
            pipeline: CheckoutPipeline::new(Arc::clone(&store), config, EventBus::default()),
            store,
        }
    }
}

pub(crate) async fn read_file(path: &str) -> Result<String, CliError> {
    tokio::fs::read_to_string(Path::new(path))
        .await
        .map_err(|source| CliError::Read {
            path: path.to_owned(),
            source,
        })
}
