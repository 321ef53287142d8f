pub mod adapter;
pub mod convert;

// Re-export commonly used types
pub use adapter::{StorageAdapter, StorageAdapterExt};
pub use convert::JsonBytes;
