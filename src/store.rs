//! The storage facade: a single entry point that routes CRUD calls to
//! whichever backend is currently selected.
//!
//! A [`StorageFacade`] owns one adapter per [`BackendKind`] and a selection.
//! Callers pick a backend once with [`init`](StorageFacade::init) and from
//! then on never name it again:
//!
//! ```no_run
//! use jsonvault::prelude::*;
//! use serde_json::json;
//!
//! # async fn run() -> VaultResult<()> {
//! let vault = StorageFacade::open(VaultConfig::in_dir("./editor-data"))?;
//! vault.init("local").await?;
//!
//! vault.store("draft", &json!({"a": 1})).await?;
//! assert_eq!(vault.retrieve("draft").await?, Some(json!({"a": 1})));
//!
//! vault.delete("draft").await?;
//! assert_eq!(vault.retrieve("draft").await?, None);
//! # Ok(())
//! # }
//! ```
//!
//! Switching the selection only affects calls issued afterwards; a call that
//! already resolved its adapter finishes against that adapter. The facade
//! does not queue or serialize calls, so concurrent calls on the same key
//! complete in whatever order their backend finishes them.

use crate::backend::BackendKind;
use crate::config::{InitPolicy, VaultConfig};
use crate::databases::{KvStore, ObjectStore, RemoteStore};
use crate::error::{VaultError, VaultResult};
use crate::traits::adapter::{StorageAdapter, StorageAdapterExt};
use log::{error, info};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};

pub struct StorageFacade {
    local: Arc<KvStore>,
    session: Arc<KvStore>,
    transactional: Arc<ObjectStore>,
    remote: Arc<RemoteStore>,
    active: RwLock<Option<BackendKind>>,
    init_policy: InitPolicy,
}

impl StorageFacade {
    /// Build all four adapters. No backend is selected yet.
    ///
    /// The local and session databases are opened here; the transactional
    /// database is opened on first use or by [`init`](Self::init).
    pub fn open(config: VaultConfig) -> VaultResult<Self> {
        let local = KvStore::local(&config.local, config.decode_policy)?;
        let session = KvStore::session(&config.session, config.decode_policy)?;
        let transactional = ObjectStore::new(config.object_store, config.decode_policy);
        let remote = RemoteStore::new(&config.remote)?;

        Ok(Self {
            local: Arc::new(local),
            session: Arc::new(session),
            transactional: Arc::new(transactional),
            remote: Arc::new(remote),
            active: RwLock::new(None),
            init_policy: config.init_policy,
        })
    }

    /// Select `backend` and warm up the transactional connection.
    ///
    /// The connection is opened when `transactional` is selected or when no
    /// connection exists yet. With [`InitPolicy::BestEffort`] a failed open is
    /// logged and `init` still succeeds; the first operation against the
    /// transactional backend then reports the failure. With
    /// [`InitPolicy::Strict`] the failure is returned if `transactional` is the
    /// selected backend.
    pub async fn init(&self, backend: &str) -> VaultResult<()> {
        let kind = self.set_adapter(backend)?;
        let connection = self.transactional.connection();

        if kind == BackendKind::Transactional || !connection.is_open() {
            match connection.connection().await {
                Ok(_) => info!("Transactional backend initialized."),
                Err(e)
                    if self.init_policy == InitPolicy::Strict
                        && kind == BackendKind::Transactional =>
                {
                    return Err(e);
                }
                Err(e) => error!("Failed to initialize transactional backend: {}", e),
            }
        }
        Ok(())
    }

    /// Select the backend named `backend`.
    ///
    /// An unknown name returns [`VaultError::InvalidBackend`] and leaves the
    /// current selection untouched.
    pub fn set_adapter(&self, backend: &str) -> VaultResult<BackendKind> {
        let kind: BackendKind = backend
            .parse()
            .map_err(|_| VaultError::InvalidBackend(backend.to_string()))?;
        self.select(kind);
        Ok(kind)
    }

    pub fn select(&self, kind: BackendKind) {
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = Some(kind);
        info!("Storage adapter set to: {}", kind);
    }

    pub fn active_backend(&self) -> Option<BackendKind> {
        *self.active.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// The currently selected adapter.
    pub fn adapter(&self) -> VaultResult<Arc<dyn StorageAdapter>> {
        self.active_backend()
            .map(|kind| self.adapter_for(kind))
            .ok_or(VaultError::NoBackendSelected)
    }

    /// The adapter for `kind`, regardless of the selection.
    pub fn adapter_for(&self, kind: BackendKind) -> Arc<dyn StorageAdapter> {
        match kind {
            BackendKind::Local => self.local.clone(),
            BackendKind::Session => self.session.clone(),
            BackendKind::Transactional => self.transactional.clone(),
            BackendKind::Remote => self.remote.clone(),
        }
    }

    pub fn local(&self) -> &KvStore {
        &self.local
    }

    pub fn session(&self) -> &KvStore {
        &self.session
    }

    pub fn transactional(&self) -> &ObjectStore {
        &self.transactional
    }

    pub fn remote(&self) -> &RemoteStore {
        &self.remote
    }

    pub async fn store(&self, key: &str, value: &Value) -> VaultResult<Option<Value>> {
        self.adapter()?.store(key, value).await
    }

    pub async fn retrieve(&self, key: &str) -> VaultResult<Option<Value>> {
        self.adapter()?.retrieve(key).await
    }

    pub async fn update(&self, key: &str, value: &Value) -> VaultResult<Option<Value>> {
        self.adapter()?.update(key, value).await
    }

    pub async fn delete(&self, key: &str) -> VaultResult<()> {
        self.adapter()?.delete(key).await
    }

    /// Serialize `value` and store it with the selected adapter
    pub async fn store_as<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> VaultResult<Option<Value>> {
        self.adapter()?.store_as(key, value).await
    }

    /// Serialize `value` and update it with the selected adapter
    pub async fn update_as<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> VaultResult<Option<Value>> {
        self.adapter()?.update_as(key, value).await
    }

    /// Retrieve with the selected adapter and deserialize into `T`
    pub async fn retrieve_as<T: DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> VaultResult<Option<T>> {
        self.adapter()?.retrieve_as(key).await
    }
}
