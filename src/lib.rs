//! # jsonvault
//!
//! A uniform key-value persistence facade for JSON entities. Calling code
//! stores and retrieves `serde_json::Value`s by string key without knowing
//! which of four backends is active:
//!
//! - **local**: a persistent sled database on disk
//! - **session**: a temporary sled database that lives as long as the facade
//! - **transactional**: one named table in a versioned redb database, opened
//!   lazily and shared by every operation
//! - **remote**: a JSON resource collection behind an HTTP API
//!
//! Only one backend is active at a time. Each backend has its own key
//! namespace and nothing is copied between them when the selection changes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jsonvault::prelude::*;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> VaultResult<()> {
//! let vault = StorageFacade::open(VaultConfig::in_dir("./editor-data"))?;
//! vault.init("transactional").await?;
//!
//! vault.store("settings", &json!({"theme": "dark"})).await?;
//! let settings = vault.retrieve("settings").await?;
//! assert_eq!(settings, Some(json!({"theme": "dark"})));
//!
//! // Later calls go to the session store; "settings" is not visible there.
//! vault.set_adapter("session")?;
//! assert_eq!(vault.retrieve("settings").await?, None);
//! # Ok(())
//! # }
//! ```
//!
//! The library logs through the `log` facade and never installs a logger.

pub mod backend;
pub mod config;
pub mod databases;
pub mod error;
pub mod prelude;
pub mod store;
pub mod traits;

pub use backend::{BackendKind, Operation};
pub use error::{VaultError, VaultResult};
pub use store::StorageFacade;
