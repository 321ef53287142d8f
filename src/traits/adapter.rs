//! The contract every storage backend implements.
//!
//! The facade only ever talks to backends through [`StorageAdapter`], so a
//! backend can be swapped without callers noticing anything but its
//! durability and consistency guarantees.

use crate::backend::{BackendKind, Operation};
use crate::error::{VaultError, VaultResult};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Asynchronous CRUD operations over JSON entities keyed by strings.
///
/// Each backend keeps its keys in a private namespace: a key stored through
/// one adapter is never visible through another.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Which backend this adapter talks to
    fn kind(&self) -> BackendKind;

    /// Persist `value` under `key`, overwriting any existing value.
    ///
    /// # Returns
    /// * `Ok(None)` for backends that do not echo writes
    /// * `Ok(Some(resource))` when the backend returns what it persisted
    async fn store(&self, key: &str, value: &Value) -> VaultResult<Option<Value>>;

    /// Fetch the value stored under `key`.
    ///
    /// # Returns
    /// * `Ok(Some(value))` if the key is present
    /// * `Ok(None)` if the key is absent
    async fn retrieve(&self, key: &str) -> VaultResult<Option<Value>>;

    /// Replace the value under `key`. Same as [`store`](Self::store) unless
    /// the backend distinguishes creating from updating.
    async fn update(&self, key: &str, value: &Value) -> VaultResult<Option<Value>> {
        self.store(key, value).await
    }

    /// Remove whatever is stored under `key`.
    async fn delete(&self, key: &str) -> VaultResult<()>;
}

/// Typed convenience wrappers over [`StorageAdapter`].
#[async_trait]
pub trait StorageAdapterExt: StorageAdapter {
    /// Serialize `value` to JSON and store it
    async fn store_as<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> VaultResult<Option<Value>> {
        let value = to_value(self.kind(), Operation::Store, value)?;
        self.store(key, &value).await
    }

    /// Serialize `value` to JSON and update it
    async fn update_as<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> VaultResult<Option<Value>> {
        let value = to_value(self.kind(), Operation::Update, value)?;
        self.update(key, &value).await
    }

    /// Retrieve and deserialize into `T`
    async fn retrieve_as<T: DeserializeOwned + Send>(&self, key: &str) -> VaultResult<Option<T>> {
        match self.retrieve(key).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| VaultError::Corrupt {
                    backend: self.kind(),
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }
}

// Blanket implementation for all StorageAdapter implementors
impl<T: StorageAdapter + ?Sized> StorageAdapterExt for T {}

fn to_value<T: Serialize + ?Sized>(
    backend: BackendKind,
    operation: Operation,
    value: &T,
) -> VaultResult<Value> {
    serde_json::to_value(value).map_err(|source| VaultError::Encode {
        backend,
        operation,
        source,
    })
}
