use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::path::StoredPath;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Storage for uploaded files, addressed by generated relative paths.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store bytes under `folder` with a freshly generated file name and return its path.
    async fn put(
        &self,
        folder: &str,
        extension: &str,
        data: &[u8],
    ) -> Result<StoredPath, StorageError>;

    /// Open a stored file as a streaming async reader.
    async fn open(&self, path: &StoredPath) -> Result<BoxReader, StorageError>;

    /// Retrieve all bytes of a stored file.
    async fn read(&self, path: &StoredPath) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.open(path).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Check whether a file exists.
    async fn exists(&self, path: &StoredPath) -> Result<bool, StorageError>;

    /// Delete a file.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, path: &StoredPath) -> Result<bool, StorageError>;

    /// Get the size of a file in bytes.
    async fn size(&self, path: &StoredPath) -> Result<u64, StorageError>;
}
