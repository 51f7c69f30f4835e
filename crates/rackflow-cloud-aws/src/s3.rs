//! S3 blob storage
//!
//! The bucket is either given directly or looked up once from a rack
//! resource (the `Settings` bucket by default) on first use.
//!
//! Uploads are buffered in memory and sent with a single `PutObject`, so an
//! object may not exceed [`MAX_OBJECT_SIZE`] (the single-request S3 limit) or
//! the smaller limit set with [`S3Storage::with_max_object_size`].

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use rackflow_cloud::{
    BlobStorage, ObjectBody, ObjectStoreOptions, ProviderError, ResourceResolver, Result,
};
use tokio::io::AsyncReadExt;
use tokio::sync::OnceCell;

/// Largest body accepted by one `PutObject` (5 GiB)
pub const MAX_OBJECT_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Bucket lookup through the rack stack
#[derive(Clone)]
struct RackBucket {
    resolver: ResourceResolver,
    logical_id: String,
}

/// [`BlobStorage`] over one S3 bucket
pub struct S3Storage {
    client: Client,
    bucket: OnceCell<String>,
    lookup: Option<RackBucket>,
    max_object_size: u64,
}

impl S3Storage {
    /// Storage in a known bucket
    pub fn with_bucket(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: OnceCell::from(bucket.into()),
            lookup: None,
            max_object_size: MAX_OBJECT_SIZE,
        }
    }

    /// Storage in the bucket named by the rack resource `logical_id`
    pub fn from_rack_resource(
        client: Client,
        resolver: ResourceResolver,
        logical_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            bucket: OnceCell::new(),
            lookup: Some(RackBucket {
                resolver,
                logical_id: logical_id.into(),
            }),
            max_object_size: MAX_OBJECT_SIZE,
        }
    }

    /// Reject bodies larger than `limit` bytes, capped at [`MAX_OBJECT_SIZE`]
    pub fn with_max_object_size(mut self, limit: u64) -> Self {
        self.max_object_size = limit.min(MAX_OBJECT_SIZE);
        self
    }

    async fn bucket(&self) -> Result<&str> {
        let bucket = self
            .bucket
            .get_or_try_init(|| async {
                let lookup = self.lookup.as_ref().ok_or_else(|| {
                    ProviderError::InvalidConfig("no bucket configured".to_string())
                })?;
                let bucket = lookup
                    .resolver
                    .resolve_rack_resource(&lookup.logical_id)
                    .await?;
                tracing::debug!(bucket = %bucket, "Resolved object bucket");
                Ok::<_, ProviderError>(bucket)
            })
            .await?;
        Ok(bucket)
    }
}

fn unavailable<E>(err: &E) -> ProviderError
where
    E: std::error::Error,
{
    ProviderError::BackendUnavailable(DisplayErrorContext(err).to_string())
}

#[async_trait]
impl BlobStorage for S3Storage {
    async fn exists(&self, path: &str) -> Result<bool> {
        let bucket = self.bucket().await?;
        tracing::debug!(bucket = %bucket, key = %path, "HeadObject");

        match self.client.head_object().bucket(bucket).key(path).send().await {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(err) => Err(unavailable(&err)),
        }
    }

    async fn read(&self, path: &str) -> Result<ObjectBody> {
        let bucket = self.bucket().await?;
        tracing::debug!(bucket = %bucket, key = %path, "GetObject");

        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(path)
            .send()
            .await
            .map_err(|err| unavailable(&err))?;

        Ok(Box::new(Box::pin(output.body.into_async_read())))
    }

    async fn write(
        &self,
        path: &str,
        mut body: ObjectBody,
        options: &ObjectStoreOptions,
    ) -> Result<u64> {
        let bucket = self.bucket().await?;

        // One byte past the limit is enough to tell an oversized body apart
        let mut data = Vec::new();
        (&mut body)
            .take(self.max_object_size + 1)
            .read_to_end(&mut data)
            .await?;
        let size = data.len() as u64;
        if size > self.max_object_size {
            return Err(ProviderError::InvalidInput(format!(
                "object {path} exceeds {} bytes",
                self.max_object_size
            )));
        }

        let mut request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(path)
            .body(ByteStream::from(data));
        if let Some(content_type) = &options.content_type {
            request = request.content_type(content_type);
        }
        if !options.metadata.is_empty() {
            request = request.set_metadata(Some(options.metadata.clone()));
        }

        request.send().await.map_err(|err| unavailable(&err))?;

        tracing::info!(bucket = %bucket, key = %path, bytes = size, "PutObject");
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::{BehaviorVersion, Region};
    use rackflow_cloud::{ErrorKind, StackDescriber};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Client that is never sent a request in these tests
    fn offline_client() -> Client {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build();
        Client::from_conf(config)
    }

    /// Rack stack that fails the first `failures` lookups
    struct CountingStacks {
        calls: AtomicUsize,
        failures: usize,
    }

    #[async_trait]
    impl StackDescriber for CountingStacks {
        async fn describe_stack_resource(&self, stack: &str, logical_id: &str) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!((stack, logical_id), ("prod", "Settings"));
            if call < self.failures {
                return Err(ProviderError::BackendUnavailable("throttled".to_string()));
            }
            Ok("prod-settings-1a2b".to_string())
        }
    }

    fn rack_storage(failures: usize) -> (Arc<CountingStacks>, S3Storage) {
        let stacks = Arc::new(CountingStacks {
            calls: AtomicUsize::new(0),
            failures,
        });
        let storage = S3Storage::from_rack_resource(
            offline_client(),
            ResourceResolver::new("prod", stacks.clone()),
            "Settings",
        );
        (stacks, storage)
    }

    #[tokio::test]
    async fn test_bucket_resolved_once() {
        let (stacks, storage) = rack_storage(0);

        assert_eq!(storage.bucket().await.unwrap(), "prod-settings-1a2b");
        assert_eq!(storage.bucket().await.unwrap(), "prod-settings-1a2b");
        assert_eq!(stacks.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_bucket_lookup_is_retried() {
        let (stacks, storage) = rack_storage(1);

        let err = storage.bucket().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);

        assert_eq!(storage.bucket().await.unwrap(), "prod-settings-1a2b");
        assert_eq!(stacks.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_known_bucket_skips_lookup() {
        let storage = S3Storage::with_bucket(offline_client(), "objects");
        assert_eq!(storage.bucket().await.unwrap(), "objects");
    }

    #[tokio::test]
    async fn test_oversized_body_rejected_before_upload() {
        let storage = S3Storage::with_bucket(offline_client(), "objects").with_max_object_size(4);

        let err = storage
            .write(
                "apps/web/objects/big",
                Box::new(&b"12345"[..]),
                &ObjectStoreOptions::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("exceeds 4 bytes"));
    }

    #[test]
    fn test_limit_capped_at_single_put() {
        let storage =
            S3Storage::with_bucket(offline_client(), "objects").with_max_object_size(u64::MAX);
        assert_eq!(storage.max_object_size, MAX_OBJECT_SIZE);
    }
}
