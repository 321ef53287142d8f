use crate::backend::{BackendKind, Operation};
use crate::config::{DecodePolicy, LocalConfig, SessionConfig};
use crate::error::{VaultError, VaultResult};
use crate::traits::adapter::StorageAdapter;
use crate::traits::convert::JsonBytes;
use async_trait::async_trait;
use log::debug;
use serde_json::Value;

/// Flat string-keyed store backing the `local` and `session` adapters.
///
/// Both variants wrap a sled database and prepend a fixed prefix to every
/// entity key, so unrelated data sharing the database never collides.
/// `local` lives on disk and survives restarts; `session` is a temporary
/// database removed when the store is dropped.
///
/// sled calls never block for long, so the async methods complete without
/// yielding; they are async only to satisfy [`StorageAdapter`].
pub struct KvStore {
    db: sled::Db,
    kind: BackendKind,
    prefix: String,
    flush_on_write: bool,
    decode_policy: DecodePolicy,
}

impl KvStore {
    /// Open the persistent store at `config.path`
    pub fn local(config: &LocalConfig, decode_policy: DecodePolicy) -> VaultResult<Self> {
        let db = sled::Config::new()
            .path(&config.path)
            .cache_capacity(config.cache_size_mb.saturating_mul(1024 * 1024))
            .open()
            .map_err(|e| VaultError::BackendOpen {
                backend: BackendKind::Local,
                reason: format!("{}: {}", config.path.display(), e),
            })?;
        debug!("local: opened {}", config.path.display());
        Ok(Self {
            db,
            kind: BackendKind::Local,
            prefix: config.prefix.clone(),
            flush_on_write: config.flush_on_write,
            decode_policy,
        })
    }

    /// Create a temporary store that disappears with this value
    pub fn session(config: &SessionConfig, decode_policy: DecodePolicy) -> VaultResult<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| VaultError::BackendOpen {
                backend: BackendKind::Session,
                reason: e.to_string(),
            })?;
        Ok(Self {
            db,
            kind: BackendKind::Session,
            prefix: config.prefix.clone(),
            flush_on_write: false,
            decode_policy,
        })
    }

    /// Get direct access to the underlying sled database
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Keys in this store's namespace, without the prefix
    pub fn keys(&self) -> VaultResult<Vec<String>> {
        let mut keys = Vec::new();
        for item in self.db.scan_prefix(self.prefix.as_bytes()) {
            let (raw, _) = item.map_err(|e| self.error(Operation::Retrieve, e))?;
            keys.push(String::from_utf8_lossy(&raw[self.prefix.len()..]).into_owned());
        }
        Ok(keys)
    }

    /// Remove every key in this store's namespace and return how many were removed.
    ///
    /// Keys outside the namespace are left alone.
    pub fn clear(&self) -> VaultResult<usize> {
        let mut removed = 0;
        for item in self.db.scan_prefix(self.prefix.as_bytes()) {
            let (raw, _) = item.map_err(|e| self.error(Operation::Delete, e))?;
            if self
                .db
                .remove(raw)
                .map_err(|e| self.error(Operation::Delete, e))?
                .is_some()
            {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn namespaced(&self, key: &str) -> Vec<u8> {
        let mut raw = Vec::with_capacity(self.prefix.len() + key.len());
        raw.extend_from_slice(self.prefix.as_bytes());
        raw.extend_from_slice(key.as_bytes());
        raw
    }

    fn error(&self, operation: Operation, source: sled::Error) -> VaultError {
        VaultError::KeyValue {
            backend: self.kind,
            operation,
            source,
        }
    }

    fn flush(&self, operation: Operation) -> VaultResult<()> {
        if self.flush_on_write {
            self.db.flush().map_err(|e| self.error(operation, e))?;
        }
        Ok(())
    }

    fn put(&self, operation: Operation, key: &str, value: &Value) -> VaultResult<()> {
        let bytes = value.to_json_bytes(self.kind, operation)?;
        self.db
            .insert(self.namespaced(key), bytes)
            .map_err(|e| self.error(operation, e))?;
        self.flush(operation)
    }
}

#[async_trait]
impl StorageAdapter for KvStore {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn store(&self, key: &str, value: &Value) -> VaultResult<Option<Value>> {
        debug!("{}: store `{}`", self.kind, key);
        self.put(Operation::Store, key, value)?;
        Ok(None)
    }

    async fn retrieve(&self, key: &str) -> VaultResult<Option<Value>> {
        debug!("{}: retrieve `{}`", self.kind, key);
        match self
            .db
            .get(self.namespaced(key))
            .map_err(|e| self.error(Operation::Retrieve, e))?
        {
            Some(ivec) => Value::from_json_bytes(&ivec, self.kind, key, self.decode_policy),
            None => Ok(None),
        }
    }

    async fn update(&self, key: &str, value: &Value) -> VaultResult<Option<Value>> {
        debug!("{}: update `{}`", self.kind, key);
        self.put(Operation::Update, key, value)?;
        Ok(None)
    }

    async fn delete(&self, key: &str) -> VaultResult<()> {
        debug!("{}: delete `{}`", self.kind, key);
        self.db
            .remove(self.namespaced(key))
            .map_err(|e| self.error(Operation::Delete, e))?;
        self.flush(Operation::Delete)
    }
}
