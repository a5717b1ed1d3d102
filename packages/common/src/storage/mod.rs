mod error;
mod path;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use path::StoredPath;
pub use traits::{BoxReader, FileStore};
