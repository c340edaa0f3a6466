//! Key-value document persistence.
//!
//! # Documents
//!
//! Each key holds one JSON array:
//!
//! - `cards` - Catalog items with price and available quantity
//! - `cart` - Lines of the active browsing session's cart
//! - `coupons` - Promotional and exchange coupons
//! - `orders` - Placed orders (append-only apart from `status`)
//! - `customer_addresses` - Validated shipping addresses (read-only here)
//! - `customer_credit_cards` - Masked saved cards (read-only here)

use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::StoreError;

/// Well-known document keys.
pub mod keys {
    pub const CARDS: &str = "cards";
    pub const CART: &str = "cart";
    pub const COUPONS: &str = "coupons";
    pub const ORDERS: &str = "orders";
    pub const CUSTOMER_ADDRESSES: &str = "customer_addresses";
    pub const CUSTOMER_CREDIT_CARDS: &str = "customer_credit_cards";
}

/// Generic read/write access to named JSON documents.
pub trait KeyValueStore: Send + Sync {
    /// Fetch a document, `None` if the key has never been written.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<JsonValue>, StoreError>> + Send;

    /// Replace a document.
    fn put(&self, key: &str, value: JsonValue) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove a document. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Load a list document. A missing key is an empty list.
///
/// # Errors
///
/// Returns `StoreError` if the store fails or the document is malformed.
pub async fn load_list<S, T>(store: &S, key: &str) -> Result<Vec<T>, StoreError>
where
    S: KeyValueStore,
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(Vec::new()),
    }
}

/// Load a list document for a read-only path, treating failures as empty.
///
/// Mutating paths must use [`load_list`] so a corrupt document is never
/// overwritten with an empty one.
pub async fn load_list_or_empty<S, T>(store: &S, key: &str) -> Vec<T>
where
    S: KeyValueStore,
    T: DeserializeOwned,
{
    match load_list(store, key).await {
        Ok(items) => items,
        Err(e) => {
            warn!(key, error = %e, "Failed to read document, using empty list");
            Vec::new()
        }
    }
}

/// Replace a list document.
///
/// # Errors
///
/// Returns `StoreError` if serialization or the write fails.
pub async fn save_list<S, T>(store: &S, key: &str, items: &[T]) -> Result<(), StoreError>
where
    S: KeyValueStore,
    T: Serialize + Sync,
{
    let value = serde_json::to_value(items)?;
    store.put(key, value).await
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// In-process store, used by tests and short-lived tools.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, JsonValue>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>, StoreError> {
        validate_key(key)?;
        Ok(self.documents.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: JsonValue) -> Result<(), StoreError> {
        validate_key(key)?;
        self.documents.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.documents.write().await.remove(key);
        Ok(())
    }
}

/// One pretty-printed `<key>.json` file per document under a directory.
///
/// Writes go to a temporary file that is renamed over the target, so a
/// crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>, StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, value: JsonValue) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.root).await?;

        let bytes = serde_json::to_vec_pretty(&value)?;
        let tmp = self.root.join(format!("{key}.json.tmp"));
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(key, path = %path.display(), "Wrote document");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Store doubles for exercising failure paths.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::{JsonValue, KeyValueStore, MemoryStore, StoreError};

    /// A [`MemoryStore`] whose writes to chosen keys fail.
    #[derive(Debug, Default)]
    pub struct FailingStore {
        inner: MemoryStore,
        failing: Mutex<HashSet<String>>,
    }

    impl FailingStore {
        pub fn fail_writes_to(&self, key: &str) {
            self.failing.lock().unwrap().insert(key.to_string());
        }

        fn fails(&self, key: &str) -> bool {
            self.failing.lock().unwrap().contains(key)
        }
    }

    impl KeyValueStore for FailingStore {
        async fn get(&self, key: &str) -> Result<Option<JsonValue>, StoreError> {
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, value: JsonValue) -> Result<(), StoreError> {
            if self.fails(key) {
                return Err(StoreError::Io(std::io::Error::other(format!(
                    "write to {key} refused"
                ))));
            }
            self.inner.put(key, value).await
        }

        async fn delete(&self, key: &str) -> Result<(), StoreError> {
            self.inner.delete(key).await
        }
    }
}
