//! Key-value persistence for the Beacon event journal.
//!
//! The journal only needs two keys (the retry queue and the user id), so the
//! substrate is deliberately small:
//! - [`FileStore`]: one JSON object file, rewritten atomically
//! - [`MemoryStore`]: a `HashMap`, for tests and ephemeral runs

mod file;
mod keys;
mod memory;
mod traits;

pub use file::FileStore;
pub use keys::{KeySpace, StorageKeys, DEFAULT_NAMESPACE};
pub use memory::MemoryStore;
pub use traits::{KeyValueStore, KeyValueStoreExt};

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend cannot be used right now (quota, lock poisoning, ...)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Stored data could not be encoded or decoded
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Open the default file-backed store at `path`, shared behind an `Arc`.
pub fn open_store(path: &Path) -> StorageResult<Arc<dyn KeyValueStore>> {
    let store = FileStore::open(path)?;
    Ok(Arc::new(store))
}
