//! Blob storage used by the file routes.
//!
//! Handlers only see the [`BlobStore`] trait: read a named blob, or write
//! one. [`FsStore`] backs it with a directory on disk and refuses names that
//! would resolve outside that directory.
//!
//! Concurrent writers to the same name are not coordinated. The last write
//! to land wins and a reader racing a writer may observe a partial file.

pub mod fs;

use std::future::Future;
use std::io;

use thiserror::Error;

pub use fs::FsStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("blob not found")]
    NotFound,
    #[error("invalid blob name {0:?}")]
    InvalidName(String),
    #[error("storage I/O error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound,
            _ => StoreError::Io(e),
        }
    }
}

/// Named byte storage shared by every connection.
pub trait BlobStore: Send + Sync + 'static {
    fn read(&self, name: &str) -> impl Future<Output = Result<Vec<u8>, StoreError>> + Send;

    fn write(
        &self,
        name: &str,
        bytes: &[u8],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
