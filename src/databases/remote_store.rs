//! Remote backend: a JSON resource collection reached over HTTP.
//!
//! Values travel inside an [`Envelope`]. `store` creates a resource under the
//! collection root, the other verbs address `<base_url>/<key>`. Remote
//! services are not required to persist writes, so a retrieve after a store
//! or update may return stale data or nothing at all.

use crate::backend::{BackendKind, Operation};
use crate::config::RemoteConfig;
use crate::error::{VaultError, VaultResult};
use crate::traits::adapter::StorageAdapter;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire shape of one resource in the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// The entity key
    pub title: String,
    /// The entity value as JSON text
    pub body: String,
    #[serde(rename = "userId")]
    pub user_id: u64,
}

impl Envelope {
    /// Parse `body` back into the value it was built from, if it is JSON.
    pub fn decode_body(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

pub struct RemoteStore {
    client: reqwest::Client,
    base_url: Url,
    user_id: u64,
}

impl RemoteStore {
    pub fn new(config: &RemoteConfig) -> VaultResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            VaultError::Config(format!("invalid remote base_url `{}`: {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(VaultError::Config(format!(
                "remote base_url `{}` cannot hold resource paths",
                config.base_url
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| VaultError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            user_id: config.user_id,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `<base_url>/<key>`, with `key` percent-encoded as a single path segment
    pub fn resource_url(&self, key: &str) -> VaultResult<Url> {
        check_key(key)?;
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                VaultError::Config(format!(
                    "remote base_url `{}` cannot hold resource paths",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push(key);
        Ok(url)
    }

    pub fn envelope(&self, key: &str, value: &Value, operation: Operation) -> VaultResult<Envelope> {
        let body = serde_json::to_string(value).map_err(|source| VaultError::Encode {
            backend: BackendKind::Remote,
            operation,
            source,
        })?;
        Ok(Envelope {
            title: key.to_string(),
            body,
            user_id: self.user_id,
        })
    }

    async fn send(&self, operation: Operation, request: RequestBuilder) -> VaultResult<Response> {
        request
            .send()
            .await
            .map_err(|source| VaultError::Http { operation, source })
    }

    /// The response body as JSON; `None` when the server sent no body.
    async fn body(
        &self,
        operation: Operation,
        key: &str,
        response: Response,
    ) -> VaultResult<Option<Value>> {
        let bytes = response
            .bytes()
            .await
            .map_err(|source| VaultError::Http { operation, source })?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| VaultError::Corrupt {
                backend: BackendKind::Remote,
                key: key.to_string(),
                source,
            })
    }
}

fn check_key(key: &str) -> VaultResult<()> {
    let reason = match key {
        "" => "resource keys must not be empty",
        // The URL parser drops these segments, leaving the collection root
        "." | ".." => "dot-segments cannot address a resource",
        _ => return Ok(()),
    };
    Err(VaultError::InvalidKey {
        backend: BackendKind::Remote,
        key: key.to_string(),
        reason,
    })
}

fn check_status(operation: Operation, response: &Response) -> VaultResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    warn!("remote: {} {} answered {}", operation, response.url(), status);
    Err(VaultError::Status { operation, status })
}

/// Resources that are envelopes around JSON text yield the decoded value;
/// anything else is returned as the server sent it.
fn unwrap_envelope(resource: Value) -> Value {
    match serde_json::from_value::<Envelope>(resource.clone()) {
        Ok(envelope) => envelope.decode_body().unwrap_or(resource),
        Err(_) => resource,
    }
}

#[async_trait]
impl StorageAdapter for RemoteStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn store(&self, key: &str, value: &Value) -> VaultResult<Option<Value>> {
        check_key(key)?;
        let envelope = self.envelope(key, value, Operation::Store)?;
        debug!("remote: POST {} for `{}`", self.base_url, key);
        let response = self
            .send(Operation::Store, self.client.post(self.base_url.clone()).json(&envelope))
            .await?;
        check_status(Operation::Store, &response)?;
        self.body(Operation::Store, key, response).await
    }

    async fn retrieve(&self, key: &str) -> VaultResult<Option<Value>> {
        let url = self.resource_url(key)?;
        debug!("remote: GET {}", url);
        let response = self.send(Operation::Retrieve, self.client.get(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        check_status(Operation::Retrieve, &response)?;
        Ok(self
            .body(Operation::Retrieve, key, response)
            .await?
            .map(unwrap_envelope))
    }

    async fn update(&self, key: &str, value: &Value) -> VaultResult<Option<Value>> {
        let url = self.resource_url(key)?;
        let envelope = self.envelope(key, value, Operation::Update)?;
        debug!("remote: PUT {}", url);
        let response = self
            .send(Operation::Update, self.client.put(url).json(&envelope))
            .await?;
        check_status(Operation::Update, &response)?;
        self.body(Operation::Update, key, response).await
    }

    async fn delete(&self, key: &str) -> VaultResult<()> {
        let url = self.resource_url(key)?;
        debug!("remote: DELETE {}", url);
        let response = self.send(Operation::Delete, self.client.delete(url)).await?;
        check_status(Operation::Delete, &response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_at(base: &str) -> RemoteStore {
        RemoteStore::new(&RemoteConfig::new(base)).unwrap()
    }

    #[test]
    fn test_resource_urls_append_one_encoded_segment() {
        let store = store_at("https://example.com/posts");
        assert_eq!(
            store.resource_url("42").unwrap().as_str(),
            "https://example.com/posts/42"
        );
        assert_eq!(
            store.resource_url("a/b c").unwrap().as_str(),
            "https://example.com/posts/a%2Fb%20c"
        );

        let trailing = store_at("https://example.com/posts/");
        assert_eq!(
            trailing.resource_url("7").unwrap().as_str(),
            "https://example.com/posts/7"
        );
    }

    #[test]
    fn test_empty_and_dot_keys_are_rejected() {
        let store = store_at("https://example.com/posts");
        for key in ["", ".", ".."] {
            let err = store.resource_url(key).unwrap_err();
            assert!(err.is_configuration(), "{:?}", key);
            assert_eq!(err.backend(), Some(BackendKind::Remote));
        }
        // Dots inside a key are ordinary characters
        assert_eq!(
            store.resource_url("...").unwrap().as_str(),
            "https://example.com/posts/..."
        );
        assert_eq!(
            store.resource_url("v1.2").unwrap().as_str(),
            "https://example.com/posts/v1.2"
        );
    }

    #[test]
    fn test_bad_base_url_is_a_configuration_error() {
        assert!(RemoteStore::new(&RemoteConfig::new("not a url")).is_err());
        assert!(RemoteStore::new(&RemoteConfig::new("mailto:someone@example.com")).is_err());
    }

    #[test]
    fn test_envelope_wire_shape() {
        let store = store_at("https://example.com/posts");
        let envelope = store
            .envelope("draft", &json!({"a": 1}), Operation::Store)
            .unwrap();
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"title": "draft", "body": "{\"a\":1}", "userId": 1})
        );
    }

    #[test]
    fn test_unwrap_envelope_decodes_json_bodies_only() {
        let wrapped = json!({"id": 3, "title": "draft", "body": "{\"a\":1}", "userId": 1});
        assert_eq!(unwrap_envelope(wrapped), json!({"a": 1}));

        let prose = json!({"id": 1, "title": "t", "body": "quia et suscipit", "userId": 1});
        assert_eq!(unwrap_envelope(prose.clone()), prose);

        let other = json!([1, 2, 3]);
        assert_eq!(unwrap_envelope(other.clone()), other);
    }
}
