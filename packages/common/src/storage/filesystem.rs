use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufReader};
use tracing::debug;

use super::error::StorageError;
use super::path::StoredPath;
use super::traits::{BoxReader, FileStore};

/// Filesystem-backed file store.
///
/// Files live at `{base_path}/{folder}/{uuid}.{ext}`. Writes go to
/// `{base_path}/.tmp` first and are renamed into place, so readers never
/// observe a partially written file.
pub struct FilesystemFileStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemFileStore {
    /// Create a new filesystem file store.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    /// Compute the filesystem path for a stored path.
    fn file_path(&self, path: &StoredPath) -> PathBuf {
        self.base_path.join(path.as_str())
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

fn normalize_extension(extension: &str) -> Result<String, StorageError> {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(StorageError::InvalidPath(format!(
            "unsupported extension '{extension}'"
        )));
    }
    Ok(ext)
}

#[async_trait]
impl FileStore for FilesystemFileStore {
    async fn put(
        &self,
        folder: &str,
        extension: &str,
        data: &[u8],
    ) -> Result<StoredPath, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let ext = normalize_extension(extension)?;
        let path = StoredPath::join(folder, &format!("{}.{ext}", uuid::Uuid::new_v4()))?;
        let file_path = self.file_path(&path);

        let temp_path = self.temp_path();
        let write = async {
            let mut temp_file = fs::File::create(&temp_path).await?;
            temp_file.write_all(data).await?;
            temp_file.flush().await?;
            Ok::<_, std::io::Error>(())
        };
        if let Err(e) = write.await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = file_path.parent()
            && let Err(e) = fs::create_dir_all(parent).await
        {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, &file_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!(path = %path, bytes = data.len(), "Stored file");
        Ok(path)
    }

    async fn open(&self, path: &StoredPath) -> Result<BoxReader, StorageError> {
        match fs::File::open(self.file_path(path)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &StoredPath) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.file_path(path)).await?)
    }

    async fn delete(&self, path: &StoredPath) -> Result<bool, StorageError> {
        match fs::remove_file(self.file_path(path)).await {
            Ok(()) => {
                debug!(path = %path, "Deleted file");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, path: &StoredPath) -> Result<u64, StorageError> {
        match fs::metadata(self.file_path(path)).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> (FilesystemFileStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemFileStore::new(dir.path().join("public"), 1024)
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn put_read_round_trip() {
        let (store, _dir) = temp_store().await;
        let path = store.put("downloads", "pdf", b"%PDF-1.4").await.unwrap();
        assert!(path.as_str().starts_with("downloads/"));
        assert_eq!(path.extension().as_deref(), Some("pdf"));
        assert_eq!(store.read(&path).await.unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn same_content_gets_distinct_paths() {
        let (store, _dir) = temp_store().await;
        let a = store.put("x", "png", b"same").await.unwrap();
        let b = store.put("x", "png", b"same").await.unwrap();
        assert_ne!(a, b);

        // Deleting one leaves the other intact.
        assert!(store.delete(&a).await.unwrap());
        assert!(store.exists(&b).await.unwrap());
    }

    #[tokio::test]
    async fn nested_folders_are_created() {
        let (store, _dir) = temp_store().await;
        let path = store
            .put("form-submissions/FRM001", ".JPG", b"jpeg")
            .await
            .unwrap();
        assert!(path.as_str().starts_with("form-submissions/FRM001/"));
        assert!(path.as_str().ends_with(".jpg"));
        assert!(store.base_path().join(path.as_str()).exists());
    }

    #[tokio::test]
    async fn size_limit_enforced() {
        let (store, dir) = temp_store().await;
        let result = store.put("x", "pdf", &[0u8; 2048]).await;
        assert!(matches!(
            result,
            Err(StorageError::SizeLimitExceeded {
                actual: 2048,
                limit: 1024
            })
        ));

        let tmp_entries: Vec<_> = std::fs::read_dir(dir.path().join("public/.tmp"))
            .unwrap()
            .collect();
        assert_eq!(tmp_entries.len(), 0);
    }

    #[tokio::test]
    async fn unwritable_folder_leaves_no_temp_file() {
        let (store, dir) = temp_store().await;
        std::fs::write(dir.path().join("public/blocked"), b"not a dir").unwrap();

        let result = store.put("blocked", "pdf", b"%PDF").await;
        assert!(matches!(result, Err(StorageError::Io(_))));

        let tmp_entries: Vec<_> = std::fs::read_dir(dir.path().join("public/.tmp"))
            .unwrap()
            .collect();
        assert_eq!(tmp_entries.len(), 0);
    }

    #[tokio::test]
    async fn rejects_bad_extension_and_folder() {
        let (store, _dir) = temp_store().await;
        assert!(matches!(
            store.put("x", "p/df", b"a").await,
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            store.put("../etc", "pdf", b"a").await,
            Err(StorageError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn open_not_found() {
        let (store, _dir) = temp_store().await;
        let path = StoredPath::parse("x/missing.pdf").unwrap();
        assert!(matches!(
            store.open(&path).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            store.size(&path).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_nonexistent_returns_false() {
        let (store, _dir) = temp_store().await;
        let path = StoredPath::parse("x/never.pdf").unwrap();
        assert!(!store.delete(&path).await.unwrap());
    }

    #[tokio::test]
    async fn size_returns_byte_count() {
        let (store, _dir) = temp_store().await;
        let path = store.put("x", "png", b"12345").await.unwrap();
        assert_eq!(store.size(&path).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn constructor_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("deep/nested/public");
        assert!(!base.exists());

        let _store = FilesystemFileStore::new(base.clone(), 1024).await.unwrap();

        assert!(base.exists());
        assert!(base.join(".tmp").exists());
    }
}
