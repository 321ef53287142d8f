use crate::backend::{BackendKind, Operation};
use crate::config::DecodePolicy;
use crate::error::{VaultError, VaultResult};
use log::warn;
use serde_json::Value;

/// Conversion between entity values and the JSON text the embedded backends
/// persist.
///
/// Only [`serde_json::Value`] implements this trait, so adapters never touch
/// raw bytes of any other shape.
pub trait JsonBytes: Sized {
    /// Serialize for a write performed by `operation` on `backend`.
    fn to_json_bytes(&self, backend: BackendKind, operation: Operation) -> VaultResult<Vec<u8>>;

    /// Parse bytes read back from `backend` under `key`.
    ///
    /// Unparsable bytes yield `Ok(None)` under [`DecodePolicy::Lenient`] and
    /// [`VaultError::Corrupt`] under [`DecodePolicy::Strict`].
    fn from_json_bytes(
        bytes: &[u8],
        backend: BackendKind,
        key: &str,
        policy: DecodePolicy,
    ) -> VaultResult<Option<Self>>;
}

impl JsonBytes for Value {
    fn to_json_bytes(&self, backend: BackendKind, operation: Operation) -> VaultResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|source| VaultError::Encode {
            backend,
            operation,
            source,
        })
    }

    fn from_json_bytes(
        bytes: &[u8],
        backend: BackendKind,
        key: &str,
        policy: DecodePolicy,
    ) -> VaultResult<Option<Self>> {
        match serde_json::from_slice(bytes) {
            Ok(value) => Ok(Some(value)),
            Err(source) => match policy {
                DecodePolicy::Lenient => {
                    warn!("{backend}: ignoring unparsable value under key `{key}`: {source}");
                    Ok(None)
                }
                DecodePolicy::Strict => Err(VaultError::Corrupt {
                    backend,
                    key: key.to_string(),
                    source,
                }),
            },
        }
    }
}
