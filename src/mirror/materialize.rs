//! Directory materialization for section nodes.

use crate::error::FilesystemError;
use std::path::Path;
use tracing::info;

/// Outcome of [`ensure_dir`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialized {
    Created,
    Existing,
}

/// Create `path` and any missing ancestors.
///
/// A directory already at `path` is success. Anything else (a file in
/// the way, permissions, an invalid path) is returned as an error.
pub async fn ensure_dir(path: &Path) -> Result<Materialized, FilesystemError> {
    match create(path).await {
        Ok(()) => Ok(Materialized::Created),
        Err(FilesystemError::AlreadyExists(existing)) => {
            info!(
                "Not creating folder {} because it already exists.",
                existing.display()
            );
            Ok(Materialized::Existing)
        }
        Err(e) => Err(e),
    }
}

async fn create(path: &Path) -> Result<(), FilesystemError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => return Err(FilesystemError::AlreadyExists(path.to_path_buf())),
        Ok(_) => return Err(FilesystemError::NotADirectory(path.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(FilesystemError::from_io(path, e)),
    }
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| FilesystemError::from_io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_creates_missing_ancestors() {
        let root = tempfile::tempdir().unwrap();
        let deep = root.path().join("a").join("b").join("c");
        assert_eq!(ensure_dir(&deep).await.unwrap(), Materialized::Created);
        assert!(deep.is_dir());
    }

    #[tokio::test]
    async fn test_twice_on_same_path_succeeds() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("Section-1");
        assert_eq!(ensure_dir(&dir).await.unwrap(), Materialized::Created);
        assert_eq!(ensure_dir(&dir).await.unwrap(), Materialized::Existing);
        assert_eq!(ensure_dir(&dir).await.unwrap(), Materialized::Existing);
    }

    #[tokio::test]
    async fn test_file_in_the_way_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("occupied");
        std::fs::write(&file, b"not a dir").unwrap();
        let err = ensure_dir(&file).await.unwrap_err();
        assert!(matches!(err, FilesystemError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_file_as_ancestor_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("occupied");
        std::fs::write(&file, b"not a dir").unwrap();
        let err = ensure_dir(&file.join("child")).await.unwrap_err();
        assert!(!err.is_recoverable());
    }
}
