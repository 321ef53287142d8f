//! Configuration for the facade and its four backends.
//!
//! Every struct has a `typed-builder` builder and a `Default` carrying the
//! stock namespaces, names and URLs. The same structs deserialize from TOML,
//! with omitted fields falling back to those defaults.
//!
//! # Examples
//!
//! ```
//! use jsonvault::config::{LocalConfig, VaultConfig};
//!
//! let config = VaultConfig::builder()
//!     .local(LocalConfig::builder().path("/var/lib/editor/local").build())
//!     .build();
//! assert_eq!(config.local.prefix, "json_editor_local_");
//!
//! let config = VaultConfig::from_toml_str(
//!     r#"
//!     init_policy = "strict"
//!
//!     [remote]
//!     base_url = "http://localhost:3000/posts"
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.remote.user_id, 1);
//! ```

use crate::error::{VaultError, VaultResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use typed_builder::TypedBuilder;

pub const LOCAL_PREFIX: &str = "json_editor_local_";
pub const SESSION_PREFIX: &str = "json_editor_session_";
pub const DATABASE_FILE: &str = "JSONEditorDB.redb";
pub const COLLECTION_NAME: &str = "json_data";
pub const SCHEMA_VERSION: u32 = 1;
pub const REMOTE_BASE_URL: &str = "https://jsonplaceholder.typicode.com/posts";
pub const REMOTE_USER_ID: u64 = 1;

/// What `retrieve` does when a key-value entry holds text that is not JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodePolicy {
    /// Treat the entry as absent and return `None`.
    #[default]
    Lenient,
    /// Return [`VaultError::Corrupt`].
    Strict,
}

/// What `init` does when warming up the transactional connection fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitPolicy {
    /// Log the failure; the first real operation reports it.
    #[default]
    BestEffort,
    /// Return the failure from `init` when the transactional backend is selected.
    Strict,
}

/// Persistent key-value backend (`local`).
#[derive(Debug, Clone, TypedBuilder, Deserialize)]
#[builder(doc)]
#[serde(default)]
pub struct LocalConfig {
    /// Directory of the sled database
    #[builder(default = PathBuf::from("jsonvault/local"), setter(into))]
    pub path: PathBuf,

    /// Prefix prepended to every entity key
    #[builder(default = LOCAL_PREFIX.to_string(), setter(into))]
    pub prefix: String,

    /// Page cache size in megabytes
    #[builder(default = 64)]
    pub cache_size_mb: u64,

    /// Flush to disk after every store, update and delete
    #[builder(default = true)]
    pub flush_on_write: bool,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl LocalConfig {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self::builder().path(path).build()
    }
}

/// Session-scoped key-value backend (`session`).
#[derive(Debug, Clone, TypedBuilder, Deserialize)]
#[builder(doc)]
#[serde(default)]
pub struct SessionConfig {
    /// Prefix prepended to every entity key
    #[builder(default = SESSION_PREFIX.to_string(), setter(into))]
    pub prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Transactional object-store backend (`transactional`).
#[derive(Debug, Clone, TypedBuilder, Deserialize)]
#[builder(doc)]
#[serde(default)]
pub struct ObjectStoreConfig {
    /// Path of the redb database file
    #[builder(default = PathBuf::from("jsonvault").join(DATABASE_FILE), setter(into))]
    pub path: PathBuf,

    /// Name of the table holding the entities
    #[builder(default = COLLECTION_NAME.to_string(), setter(into))]
    pub collection: String,

    /// Schema version; raising it runs the upgrade step on next open
    #[builder(default = SCHEMA_VERSION)]
    pub schema_version: u32,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ObjectStoreConfig {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self::builder().path(path).build()
    }
}

/// Remote collection backend (`remote`).
#[derive(Debug, Clone, TypedBuilder, Deserialize)]
#[builder(doc)]
#[serde(default)]
pub struct RemoteConfig {
    /// URL of the collection root; resources live at `<base_url>/<key>`
    #[builder(default = REMOTE_BASE_URL.to_string(), setter(into))]
    pub base_url: String,

    /// `userId` written into every envelope
    #[builder(default = REMOTE_USER_ID)]
    pub user_id: u64,

    /// Per-request timeout in milliseconds; `None` keeps the client default
    #[builder(default, setter(strip_option))]
    pub timeout_ms: Option<u64>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RemoteConfig {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self::builder().base_url(base_url).build()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Configuration for a whole [`StorageFacade`](crate::store::StorageFacade).
#[derive(Debug, Clone, Default, TypedBuilder, Deserialize)]
#[builder(doc)]
#[serde(default)]
pub struct VaultConfig {
    #[builder(default)]
    pub local: LocalConfig,

    #[builder(default)]
    pub session: SessionConfig,

    #[builder(default)]
    pub object_store: ObjectStoreConfig,

    #[builder(default)]
    pub remote: RemoteConfig,

    #[builder(default)]
    pub decode_policy: DecodePolicy,

    #[builder(default)]
    pub init_policy: InitPolicy,
}

impl VaultConfig {
    /// Default configuration with the local and transactional files placed under `dir`.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            local: LocalConfig::new(dir.join("local")),
            object_store: ObjectStoreConfig::new(dir.join(DATABASE_FILE)),
            ..Self::default()
        }
    }

    pub fn from_toml_str(source: &str) -> VaultResult<Self> {
        toml::from_str(source).map_err(|e| VaultError::Config(e.to_string()))
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> VaultResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| VaultError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_names() {
        let config = VaultConfig::default();
        assert_eq!(config.local.prefix, LOCAL_PREFIX);
        assert_eq!(config.session.prefix, SESSION_PREFIX);
        assert_eq!(config.object_store.collection, "json_data");
        assert_eq!(config.object_store.schema_version, 1);
        assert_eq!(config.remote.base_url, REMOTE_BASE_URL);
        assert_eq!(config.remote.timeout(), None);
        assert_eq!(config.decode_policy, DecodePolicy::Lenient);
        assert_eq!(config.init_policy, InitPolicy::BestEffort);
    }

    #[test]
    fn test_builder_overrides() {
        let config = RemoteConfig::builder()
            .base_url("http://127.0.0.1:8080/items")
            .user_id(7)
            .timeout_ms(1500)
            .build();
        assert_eq!(config.base_url, "http://127.0.0.1:8080/items");
        assert_eq!(config.user_id, 7);
        assert_eq!(config.timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_in_dir_places_both_files() {
        let config = VaultConfig::in_dir("/tmp/vault");
        assert_eq!(config.local.path, PathBuf::from("/tmp/vault/local"));
        assert_eq!(
            config.object_store.path,
            PathBuf::from("/tmp/vault/JSONEditorDB.redb")
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = VaultConfig::from_toml_str(
            r#"
            decode_policy = "strict"

            [object_store]
            schema_version = 3

            [session]
            prefix = "tab_"
            "#,
        )
        .unwrap();
        assert_eq!(config.decode_policy, DecodePolicy::Strict);
        assert_eq!(config.object_store.schema_version, 3);
        assert_eq!(config.object_store.collection, COLLECTION_NAME);
        assert_eq!(config.session.prefix, "tab_");
        assert_eq!(config.local.prefix, LOCAL_PREFIX);
    }

    #[test]
    fn test_invalid_toml_is_a_configuration_error() {
        let err = VaultConfig::from_toml_str("init_policy = \"sometimes\"").unwrap_err();
        assert!(err.is_configuration());
    }
}
