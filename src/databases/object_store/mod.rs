//! Transactional backend: one named table inside a versioned redb database.
//!
//! Every CRUD call obtains the shared handle from the [`ConnectionManager`]
//! and runs exactly one transaction on the blocking pool: a write
//! transaction for store, update and delete, a read transaction for
//! retrieve. Entities are keyed directly by the entity key.

pub mod connection;

pub use connection::ConnectionManager;

use crate::backend::{BackendKind, Operation};
use crate::config::{DecodePolicy, ObjectStoreConfig};
use crate::error::{RedbError, VaultError, VaultResult};
use crate::traits::adapter::StorageAdapter;
use crate::traits::convert::JsonBytes;
use async_trait::async_trait;
use connection::collection;
use log::debug;
use redb::{Database, ReadableDatabase};
use serde_json::Value;

pub struct ObjectStore {
    connection: ConnectionManager,
    decode_policy: DecodePolicy,
}

impl ObjectStore {
    pub fn new(config: ObjectStoreConfig, decode_policy: DecodePolicy) -> Self {
        Self {
            connection: ConnectionManager::new(config),
            decode_policy,
        }
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Run `f` against the collection on the blocking pool.
    ///
    /// Open failures come back as [`VaultError::BackendOpen`]; anything that
    /// goes wrong inside the transaction is reported against `operation`.
    async fn run<T, F>(&self, operation: Operation, f: F) -> VaultResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database, &str) -> Result<T, RedbError> + Send + 'static,
    {
        let db = self.connection.connection().await?;
        let name = self.connection.collection().to_string();
        tokio::task::spawn_blocking(move || f(db.as_ref(), name.as_str()))
            .await
            .map_err(RedbError::from)
            .and_then(|result| result)
            .map_err(|source| VaultError::Transactional { operation, source })
    }

    async fn put(&self, operation: Operation, key: &str, value: &Value) -> VaultResult<()> {
        let bytes = value.to_json_bytes(BackendKind::Transactional, operation)?;
        let key = key.to_string();
        self.run(operation, move |db, name| {
            let txn = db.begin_write()?;
            {
                let mut table = txn.open_table(collection(name))?;
                table.insert(key.as_str(), bytes.as_slice())?;
            }
            txn.commit()?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl StorageAdapter for ObjectStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Transactional
    }

    async fn store(&self, key: &str, value: &Value) -> VaultResult<Option<Value>> {
        debug!("transactional: store `{}`", key);
        self.put(Operation::Store, key, value).await?;
        Ok(None)
    }

    async fn retrieve(&self, key: &str) -> VaultResult<Option<Value>> {
        debug!("transactional: retrieve `{}`", key);
        let owned = key.to_string();
        let bytes = self
            .run(Operation::Retrieve, move |db, name| {
                let txn = db.begin_read()?;
                let table = match txn.open_table(collection(name)) {
                    Ok(table) => table,
                    Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
                    Err(e) => return Err(e.into()),
                };
                Ok(table.get(owned.as_str())?.map(|guard| guard.value().to_vec()))
            })
            .await?;

        match bytes {
            Some(bytes) => {
                Value::from_json_bytes(&bytes, BackendKind::Transactional, key, self.decode_policy)
            }
            None => Ok(None),
        }
    }

    async fn update(&self, key: &str, value: &Value) -> VaultResult<Option<Value>> {
        debug!("transactional: update `{}`", key);
        self.put(Operation::Update, key, value).await?;
        Ok(None)
    }

    async fn delete(&self, key: &str) -> VaultResult<()> {
        debug!("transactional: delete `{}`", key);
        let key = key.to_string();
        self.run(Operation::Delete, move |db, name| {
            let txn = db.begin_write()?;
            {
                let mut table = txn.open_table(collection(name))?;
                table.remove(key.as_str())?;
            }
            txn.commit()?;
            Ok(())
        })
        .await
    }
}
