//! Floor plan image storage with a pluggable filesystem backend.
//!
//! Images are opaque blobs to this layer: the API probes dimensions before
//! handing the bytes over, and the store only writes, reads, and deletes
//! them under backend-relative paths. Backend failures surface as
//! `Error::Storage` and abort the request; nothing is retried.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use deskmap_core::{Error, Result};

/// Storage backend trait for different storage implementations.
///
/// Allows abstracting over filesystem, S3, or other storage providers.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write data to the specified path.
    async fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Read data from the specified path.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Delete data at the specified path.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Check if data exists at the specified path.
    async fn exists(&self, path: &str) -> Result<bool>;
}

/// Filesystem storage backend.
///
/// Stores floor plan images in a directory hierarchy keyed by plan id.
/// Path format: `{base_path}/floorplans/{first-2-hex}/{uuid}`
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend with the given base directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }

    /// Validate that the storage backend can write, read, and delete files.
    ///
    /// Performs a full round-trip test at startup to catch filesystem issues
    /// (permission errors, missing directories) early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base_path.join("floorplans/.health-check");
        let test_file = test_dir.join("test.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await;

        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);
        debug!(
            subsystem = "storage",
            component = "image_store",
            op = "write",
            storage_path = %path,
            size = data.len(),
            "writing image"
        );

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(format!("create_dir_all {:?}: {}", parent, e)))?;
        }
        fs::write(&full_path, data)
            .await
            .map_err(|e| Error::Storage(format!("write {:?}: {}", full_path, e)))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(path);
        fs::read(&full_path)
            .await
            .map_err(|e| Error::Storage(format!("read {:?}: {}", full_path, e)))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path);
        fs::remove_file(&full_path)
            .await
            .map_err(|e| Error::Storage(format!("remove {:?}: {}", full_path, e)))
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(fs::try_exists(self.full_path(path))
            .await
            .unwrap_or(false))
    }
}

/// Image store facade over a storage backend.
pub struct ImageStore {
    backend: Box<dyn StorageBackend>,
}

impl ImageStore {
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Backend-relative storage path for a floor plan's image. Each plan has
    /// at most one image; re-uploads overwrite in place.
    pub fn storage_path(floorplan_id: Uuid) -> String {
        let hex = floorplan_id.simple().to_string();
        format!("floorplans/{}/{}", &hex[..2], hex)
    }

    /// Store a floor plan's image, returning its storage path.
    pub async fn store(&self, floorplan_id: Uuid, data: &[u8]) -> Result<String> {
        let path = Self::storage_path(floorplan_id);
        self.backend.write(&path, data).await?;
        Ok(path)
    }

    /// Load image bytes by storage path.
    pub async fn load(&self, path: &str) -> Result<Vec<u8>> {
        self.backend.read(path).await
    }

    /// Remove a stored image; missing blobs are not an error.
    pub async fn remove(&self, path: &str) -> Result<()> {
        if self.backend.exists(path).await? {
            self.backend.delete(path).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_filesystem_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());

        backend.write("floorplans/ab/test", b"bytes").await.unwrap();
        assert!(backend.exists("floorplans/ab/test").await.unwrap());
        assert_eq!(backend.read("floorplans/ab/test").await.unwrap(), b"bytes");

        backend.delete("floorplans/ab/test").await.unwrap();
        assert!(!backend.exists("floorplans/ab/test").await.unwrap());
    }

    #[tokio::test]
    async fn test_read_missing_blob_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());

        match backend.read("floorplans/zz/missing").await {
            Err(Error::Storage(_)) => {}
            other => panic!("expected storage error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_backend_validate_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());
        backend.validate().await.unwrap();
    }

    #[tokio::test]
    async fn test_image_store_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(FilesystemBackend::new(dir.path()));
        let plan_id = Uuid::now_v7();

        let path = store.store(plan_id, b"first").await.unwrap();
        let same_path = store.store(plan_id, b"second").await.unwrap();
        assert_eq!(path, same_path);
        assert_eq!(store.load(&path).await.unwrap(), b"second");
    }

    #[test]
    fn test_storage_path_shape() {
        let id = Uuid::now_v7();
        let path = ImageStore::storage_path(id);
        let hex = id.simple().to_string();
        assert_eq!(path, format!("floorplans/{}/{}", &hex[..2], hex));
    }

    #[tokio::test]
    async fn test_remove_missing_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(FilesystemBackend::new(dir.path()));
        store.remove("floorplans/aa/gone").await.unwrap();
    }
}
