//! Local filesystem storage backend.

use crate::error::{StorageError, StorageResult};
use crate::traits::{ByteStream, ObjectMeta, ObjectStore};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

/// Default chunk size for streaming reads (64 KiB).
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Local filesystem object store.
///
/// Blob keys are flat file names under the root; keys containing path
/// separators or traversal components are rejected outright.
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Get the full path for a key, with path traversal protection.
    fn key_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey("empty key".to_string()));
        }
        if key.contains('/') || key.contains('\\') || key.contains("..") {
            return Err(StorageError::InvalidKey(format!(
                "path traversal not allowed: {key}"
            )));
        }
        if key.starts_with('.') || key.chars().any(|c| c.is_control()) {
            return Err(StorageError::InvalidKey(format!("unsafe key: {key}")));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStore for FilesystemBackend {
    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn head(&self, key: &str) -> StorageResult<ObjectMeta> {
        let path = self.key_path(key)?;
        let metadata = fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        Ok(ObjectMeta {
            size: metadata.len(),
        })
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let path = self.key_path(key)?;
        let data = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        Ok(Bytes::from(data))
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream> {
        use tokio::io::AsyncReadExt;

        let path = self.key_path(key)?;
        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;

        // Stream the file in chunks instead of loading entirely into memory
        let stream = async_stream::try_stream! {
            let mut file = file;
            let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
            loop {
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                yield Bytes::copy_from_slice(&buf[..n]);
            }
        };

        Ok(Box::pin(stream))
    }

    #[instrument(skip(self, data), fields(backend = "filesystem", size = data.len()))]
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        let path = self.key_path(key)?;

        // Write to temp file, fsync, then rename for atomicity and durability.
        // UUID suffix avoids conflicts during concurrent writes to the same key.
        let temp_path = self.root.join(format!("{key}.tmp.{}", Uuid::new_v4()));
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
        }
        fs::rename(&temp_path, &path).await?;

        Ok(())
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_path(key)?;
        fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<()> {
        if !fs::try_exists(&self.root).await? {
            return Err(StorageError::Config(format!(
                "storage root does not exist: {}",
                self.root.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tempfile::tempdir;

    async fn test_backend() -> (tempfile::TempDir, FilesystemBackend) {
        let temp = tempdir().unwrap();
        let backend = FilesystemBackend::new(temp.path()).await.unwrap();
        (temp, backend)
    }

    #[tokio::test]
    async fn put_get_delete_roundtrip() {
        let (_temp, backend) = test_backend().await;

        backend
            .put("abc.png", Bytes::from_static(b"hello"))
            .await
            .unwrap();
        assert!(backend.exists("abc.png").await.unwrap());
        assert_eq!(backend.head("abc.png").await.unwrap().size, 5);
        assert_eq!(
            backend.get("abc.png").await.unwrap(),
            Bytes::from_static(b"hello")
        );

        backend.delete("abc.png").await.unwrap();
        assert!(!backend.exists("abc.png").await.unwrap());
    }

    #[tokio::test]
    async fn get_missing_key_is_not_found() {
        let (_temp, backend) = test_backend().await;

        match backend.get("missing.bin").await {
            Err(StorageError::NotFound(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
        match backend.delete("missing.bin").await {
            Err(StorageError::NotFound(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_stream_yields_full_content() {
        let (_temp, backend) = test_backend().await;
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        backend
            .put("big.bin", Bytes::from(data.clone()))
            .await
            .unwrap();

        let mut stream = backend.get_stream("big.bin").await.unwrap();
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(out, data);
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let (_temp, backend) = test_backend().await;

        for key in ["../evil", "a/b", "a\\b", ".hidden", ""] {
            match backend.get(key).await {
                Err(StorageError::InvalidKey(_)) => {}
                other => panic!("key {key:?} not rejected: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn put_overwrites_existing_key() {
        let (_temp, backend) = test_backend().await;
        backend
            .put("k.txt", Bytes::from_static(b"one"))
            .await
            .unwrap();
        backend
            .put("k.txt", Bytes::from_static(b"two"))
            .await
            .unwrap();
        assert_eq!(
            backend.get("k.txt").await.unwrap(),
            Bytes::from_static(b"two")
        );
    }
}
