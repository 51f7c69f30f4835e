//! Filesystem blob storage
//!
//! Paths are relative to the storage root. Writes go to a temporary file in
//! the destination directory and are renamed into place, so readers observe
//! either the previous content or the complete new content.

use async_trait::async_trait;
use rackflow_cloud::{BlobStorage, ObjectBody, ObjectStoreOptions, ProviderError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Blob storage rooted at a local directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a storage path
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    fn temp_path(target: &Path) -> PathBuf {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        target.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()))
    }

    /// Fail when a parent of `path` is a blob or `path` itself is a directory
    async fn check_placement(&self, path: &str) -> Result<()> {
        let segments: Vec<&str> = path.split('/').collect();
        let mut current = self.root.clone();
        for (i, segment) in segments.iter().enumerate() {
            current.push(segment);
            let meta = match fs::metadata(&current).await {
                Ok(meta) => meta,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
                Err(e) => return Err(ProviderError::Io(e)),
            };
            let last = i + 1 == segments.len();
            if last && meta.is_dir() {
                return Err(ProviderError::InvalidInput(format!(
                    "cannot store {path}: a directory exists there"
                )));
            }
            if !last && !meta.is_dir() {
                return Err(ProviderError::InvalidInput(format!(
                    "cannot store {path}: {} is an object",
                    segments[..=i].join("/")
                )));
            }
        }
        Ok(())
    }

    async fn remove_temp(temp: &Path) {
        if let Err(cleanup) = fs::remove_file(temp).await {
            tracing::warn!(path = %temp.display(), error = %cleanup, "Failed to remove partial write");
        }
    }

    async fn write_temp(&self, temp: &Path, mut body: ObjectBody) -> Result<u64> {
        let mut file = fs::File::create(temp).await?;
        let written = tokio::io::copy(&mut body, &mut file).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(written)
    }
}

#[async_trait]
impl BlobStorage for FileStorage {
    async fn exists(&self, path: &str) -> Result<bool> {
        match fs::metadata(self.resolve(path)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
                ) =>
            {
                Ok(false)
            }
            Err(e) => Err(ProviderError::Io(e)),
        }
    }

    async fn read(&self, path: &str) -> Result<ObjectBody> {
        let file = fs::File::open(self.resolve(path)).await?;
        Ok(Box::new(file))
    }

    async fn write(
        &self,
        path: &str,
        body: ObjectBody,
        _options: &ObjectStoreOptions,
    ) -> Result<u64> {
        self.check_placement(path).await?;

        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp = Self::temp_path(&target);
        let written = match self.write_temp(&temp, body).await {
            Ok(written) => written,
            Err(e) => {
                Self::remove_temp(&temp).await;
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&temp, &target).await {
            Self::remove_temp(&temp).await;
            return Err(ProviderError::Io(e));
        }
        tracing::debug!(path = %target.display(), bytes = written, "Wrote blob");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    fn body(data: Vec<u8>) -> ObjectBody {
        Box::new(std::io::Cursor::new(data))
    }

    #[tokio::test]
    async fn test_write_read() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        assert!(!storage.exists("apps/web/objects/a").await.unwrap());

        let written = storage
            .write("apps/web/objects/a", body(b"hello".to_vec()), &Default::default())
            .await
            .unwrap();
        assert_eq!(written, 5);
        assert!(storage.exists("apps/web/objects/a").await.unwrap());
        assert!(dir.path().join("apps/web/objects/a").is_file());

        let mut out = String::new();
        storage
            .read("apps/web/objects/a")
            .await
            .unwrap()
            .read_to_string(&mut out)
            .await
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn test_overwrite_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.write("k", body(b"first".to_vec()), &Default::default()).await.unwrap();
        storage.write("k", body(b"second".to_vec()), &Default::default()).await.unwrap();

        assert_eq!(std::fs::read(dir.path().join("k")).unwrap(), b"second");
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_directory_is_not_a_blob() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("apps/web/objects/nested")).unwrap();

        let storage = FileStorage::new(dir.path());
        assert!(!storage.exists("apps/web/objects/nested").await.unwrap());
    }

    fn temp_files(root: &Path) -> Vec<PathBuf> {
        let mut found = Vec::new();
        let mut pending = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            for entry in std::fs::read_dir(&dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    pending.push(path);
                } else if path.extension().is_some_and(|ext| ext == "tmp") {
                    found.push(path);
                }
            }
        }
        found
    }

    #[tokio::test]
    async fn test_object_cannot_become_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.write("apps/web/objects/f", body(b"file".to_vec()), &Default::default()).await.unwrap();

        let err = storage
            .write("apps/web/objects/f/g", body(b"nested".to_vec()), &Default::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidInput(_)));
        assert!(err.to_string().contains("apps/web/objects/f is an object"));

        // The blocking object is intact and a child of it reads as absent
        assert_eq!(std::fs::read(dir.path().join("apps/web/objects/f")).unwrap(), b"file");
        assert!(!storage.exists("apps/web/objects/f/g").await.unwrap());
        assert!(temp_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_directory_cannot_be_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.write("apps/web/objects/d/child", body(b"x".to_vec()), &Default::default()).await.unwrap();

        let err = storage
            .write("apps/web/objects/d", body(b"y".to_vec()), &Default::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidInput(_)));
        assert!(dir.path().join("apps/web/objects/d/child").is_file());
        assert!(temp_files(dir.path()).is_empty());
    }
}
