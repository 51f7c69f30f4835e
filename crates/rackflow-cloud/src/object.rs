//! App-scoped object storage
//!
//! Objects live at `apps/{app}/objects/{key}` in the backend's blob storage.
//! The layout is shared by every backend.

use crate::error::{ProviderError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::AsyncRead;

/// Readable object contents; dropping it releases the underlying handle
pub type ObjectBody = Box<dyn AsyncRead + Send + Unpin>;

/// Descriptor returned by a successful store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    pub key: String,
    /// Bytes written
    pub size: u64,
}

/// Backend storage hints, passed through untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectStoreOptions {
    pub content_type: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl ObjectStoreOptions {
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Key-addressed byte storage per app
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Open the object for reading
    async fn fetch(&self, app: &str, key: &str) -> Result<ObjectBody>;

    /// Write the whole body, replacing any existing object at `key`
    async fn store(
        &self,
        app: &str,
        key: &str,
        body: ObjectBody,
        options: ObjectStoreOptions,
    ) -> Result<Object>;
}

/// Answers whether an app exists
#[async_trait]
pub trait AppRegistry: Send + Sync {
    /// `Ok(())` when the app exists, `AppNotFound` otherwise
    async fn app_exists(&self, app: &str) -> Result<()>;
}

/// Path-addressed durable byte storage
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn exists(&self, path: &str) -> Result<bool>;

    async fn read(&self, path: &str) -> Result<ObjectBody>;

    /// Persist the full body at `path` and return the number of bytes written
    async fn write(&self, path: &str, body: ObjectBody, options: &ObjectStoreOptions)
    -> Result<u64>;
}

/// Storage path of `key` within `app`
pub fn object_path(app: &str, key: &str) -> String {
    format!("apps/{app}/objects/{key}")
}

/// Reject keys that are blank or do not name a single object inside the
/// app's namespace
///
/// Every `/`-separated segment must be non-empty and neither `.` nor `..`,
/// which also rules out leading, trailing and doubled slashes.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(ProviderError::InvalidInput("key must not be blank".to_string()));
    }
    let bad_segment = key
        .split('/')
        .any(|segment| matches!(segment, "" | "." | ".."));
    if bad_segment || key.contains('\0') {
        return Err(ProviderError::InvalidInput(format!("invalid key: {key:?}")));
    }
    Ok(())
}

/// [`ObjectStore`] over an app registry and blob storage
#[derive(Clone)]
pub struct NamespacedObjectStore {
    apps: Arc<dyn AppRegistry>,
    storage: Arc<dyn BlobStorage>,
}

impl NamespacedObjectStore {
    pub fn new(apps: Arc<dyn AppRegistry>, storage: Arc<dyn BlobStorage>) -> Self {
        Self { apps, storage }
    }

    async fn check_app(&self, app: &str) -> Result<()> {
        if app.is_empty() {
            return Err(ProviderError::InvalidInput(
                "app name must not be blank".to_string(),
            ));
        }
        self.apps.app_exists(app).await
    }
}

#[async_trait]
impl ObjectStore for NamespacedObjectStore {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, app: &str, key: &str) -> Result<ObjectBody> {
        self.check_app(app).await?;
        validate_key(key)?;

        let path = object_path(app, key);
        if !self.storage.exists(&path).await? {
            return Err(ProviderError::ObjectNotFound {
                app: app.to_string(),
                key: key.to_string(),
            });
        }

        tracing::debug!(path = %path, "Opening object");
        self.storage.read(&path).await
    }

    #[tracing::instrument(skip(self, body, options))]
    async fn store(
        &self,
        app: &str,
        key: &str,
        body: ObjectBody,
        options: ObjectStoreOptions,
    ) -> Result<Object> {
        validate_key(key)?;
        self.check_app(app).await?;

        let path = object_path(app, key);
        let size = self.storage.write(&path, body, &options).await?;

        tracing::info!(path = %path, size, "Stored object");
        Ok(Object {
            key: key.to_string(),
            size,
        })
    }
}
