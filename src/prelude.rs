//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use jsonvault::prelude::*;
//! ```

pub use crate::backend::{BackendKind, Operation};
pub use crate::config::{
    DecodePolicy, InitPolicy, LocalConfig, ObjectStoreConfig, RemoteConfig, SessionConfig,
    VaultConfig,
};
pub use crate::databases::{ConnectionManager, Envelope, KvStore, ObjectStore, RemoteStore};
pub use crate::error::{VaultError, VaultResult};
pub use crate::store::StorageFacade;
pub use crate::traits::{StorageAdapter, StorageAdapterExt};
