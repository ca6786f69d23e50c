use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::warn;

pub const TABLES_KEY: &str = "restaurantTables";
pub const ORDERS_KEY: &str = "restaurantOrders";
pub const NOTIFICATIONS_KEY: &str = "adminNotifications";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("malformed document {key}: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Key/value port holding one JSON document per key.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;
    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;
}

/// Reads `key` as `T`. Missing documents and failed reads both yield `None`;
/// the failure is logged.
pub async fn load<T: DeserializeOwned>(store: &dyn DocumentStore, key: &str) -> Option<T> {
    match store.get(key).await {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!("Ignoring malformed document {}: {}", key, e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!("Failed to read {}: {}", key, e);
            None
        }
    }
}

/// Reads `key` as `T` for a read-modify-write. Only a missing document yields
/// `None`; failed reads and malformed documents are errors so a write never
/// replaces data it could not see.
pub async fn load_for_update<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(value) = store.get(key).await? else {
        return Ok(None);
    };
    serde_json::from_value(value)
        .map(Some)
        .map_err(|source| StoreError::Malformed {
            key: key.to_string(),
            source,
        })
}

pub async fn save<T: Serialize>(
    store: &dyn DocumentStore,
    key: &str,
    doc: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(doc).map_err(|source| StoreError::Malformed {
        key: key.to_string(),
        source,
    })?;
    store.set(key, value).await
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.docs.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        self.docs.write().await.insert(key.to_string(), value);
        Ok(())
    }
}
