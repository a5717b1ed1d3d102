/// Errors that can occur during file storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested file was not found.
    #[error("file not found: {0}")]
    NotFound(String),
    /// An I/O error occurred.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The relative path is malformed or escapes the storage root.
    #[error("invalid storage path: {0}")]
    InvalidPath(String),
    /// The file exceeds the configured size limit.
    #[error("file exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
}
