pub mod kv_store;
pub mod object_store;
pub mod remote_store;

pub use kv_store::KvStore;
pub use object_store::{ConnectionManager, ObjectStore};
pub use remote_store::{Envelope, RemoteStore};
