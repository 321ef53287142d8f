//! Error types for jsonvault operations.
//!
//! Every fallible call returns [`VaultResult<T>`]. Errors fall into three
//! groups:
//!
//! - configuration errors ([`VaultError::InvalidBackend`],
//!   [`VaultError::NoBackendSelected`], [`VaultError::InvalidKey`],
//!   [`VaultError::Config`]), raised before any backend is touched;
//! - backend-open errors ([`VaultError::BackendOpen`]), raised when the
//!   transactional database cannot be opened;
//! - per-operation errors, each naming the backend and the failing operation.
//!
//! A missing key is never an error: `retrieve` returns `Ok(None)`.

use crate::backend::{BackendKind, Operation};
use thiserror::Error;

pub type VaultResult<T> = Result<T, VaultError>;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Invalid storage adapter type: {0}")]
    InvalidBackend(String),

    #[error("No storage adapter has been set. Call StorageFacade::init() first.")]
    NoBackendSelected,

    #[error("{backend} backend rejected key `{key}`: {reason}")]
    InvalidKey {
        backend: BackendKind,
        key: String,
        reason: &'static str,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{backend} backend failed to open: {reason}")]
    BackendOpen { backend: BackendKind, reason: String },

    #[error("{backend} {operation} failed: {source}")]
    KeyValue {
        backend: BackendKind,
        operation: Operation,
        #[source]
        source: sled::Error,
    },

    #[error("transactional {operation} failed: {source}")]
    Transactional {
        operation: Operation,
        #[source]
        source: RedbError,
    },

    #[error("remote {operation} failed: {source}")]
    Http {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },

    #[error("remote {operation} failed: HTTP {status}")]
    Status {
        operation: Operation,
        status: reqwest::StatusCode,
    },

    #[error("{backend} {operation} failed to encode value: {source}")]
    Encode {
        backend: BackendKind,
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },

    #[error("{backend} value under key `{key}` could not be decoded: {source}")]
    Corrupt {
        backend: BackendKind,
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl VaultError {
    /// Errors caused by how the facade was configured or called, as opposed to
    /// a backend failing. These are never worth retrying.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            VaultError::InvalidBackend(_)
                | VaultError::NoBackendSelected
                | VaultError::InvalidKey { .. }
                | VaultError::Config(_)
        )
    }

    /// The backend the error originated from, if any.
    pub fn backend(&self) -> Option<BackendKind> {
        match self {
            VaultError::InvalidBackend(_) | VaultError::NoBackendSelected | VaultError::Config(_) => {
                None
            }
            VaultError::InvalidKey { backend, .. }
            | VaultError::BackendOpen { backend, .. }
            | VaultError::KeyValue { backend, .. }
            | VaultError::Encode { backend, .. }
            | VaultError::Corrupt { backend, .. } => Some(*backend),
            VaultError::Transactional { .. } => Some(BackendKind::Transactional),
            VaultError::Http { .. } | VaultError::Status { .. } => Some(BackendKind::Remote),
        }
    }

    /// The operation that failed, for per-operation errors.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            VaultError::KeyValue { operation, .. }
            | VaultError::Transactional { operation, .. }
            | VaultError::Http { operation, .. }
            | VaultError::Status { operation, .. }
            | VaultError::Encode { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}

/// Failures of the embedded transactional database, one variant per redb
/// error family.
#[derive(Error, Debug)]
pub enum RedbError {
    #[error(transparent)]
    Database(#[from] redb::DatabaseError),
    #[error(transparent)]
    Transaction(#[from] redb::TransactionError),
    #[error(transparent)]
    Table(#[from] redb::TableError),
    #[error(transparent)]
    Commit(#[from] redb::CommitError),
    #[error(transparent)]
    Storage(#[from] redb::StorageError),
    #[error("blocking task failed: {0}")]
    Worker(String),
}

impl From<tokio::task::JoinError> for RedbError {
    fn from(err: tokio::task::JoinError) -> Self {
        RedbError::Worker(err.to_string())
    }
}
