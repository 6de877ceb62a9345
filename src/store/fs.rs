use std::path::{Component, Path, PathBuf};

use tracing::trace;

use crate::store::{BlobStore, StoreError};

/// Stores blobs as files directly under a root directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a blob name to a path inside the root.
    ///
    /// Only plain relative names are accepted: every component must be a
    /// normal file or directory name. Empty names, absolute paths, `.`/`..`
    /// segments and NUL bytes are rejected with `InvalidName`.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, StoreError> {
        if name.is_empty() || name.contains('\0') {
            return Err(StoreError::InvalidName(name.to_string()));
        }

        let relative = Path::new(name);
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

        if !contained {
            return Err(StoreError::InvalidName(name.to_string()));
        }

        Ok(self.root.join(relative))
    }
}

impl BlobStore for FsStore {
    async fn read(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.resolve(name)?;
        trace!(path = %path.display(), "Reading blob");
        Ok(tokio::fs::read(&path).await?)
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.resolve(name)?;
        trace!(path = %path.display(), len = bytes.len(), "Writing blob");
        Ok(tokio::fs::write(&path, bytes).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_plain_names_under_root() {
        let store = FsStore::new("/srv/files");

        assert_eq!(
            store.resolve("report.txt").unwrap(),
            PathBuf::from("/srv/files/report.txt")
        );
        assert_eq!(
            store.resolve("nested/report.txt").unwrap(),
            PathBuf::from("/srv/files/nested/report.txt")
        );
    }

    #[test]
    fn rejects_names_that_leave_the_root() {
        let store = FsStore::new("/srv/files");

        for name in ["", "../etc/passwd", "a/../../b", "/etc/passwd", "./a", "..", "a\0b"] {
            assert!(
                matches!(store.resolve(name), Err(StoreError::InvalidName(_))),
                "{name:?} should be rejected"
            );
        }
    }
}
