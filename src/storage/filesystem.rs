//! File system operations
//!
//! Thin wrappers over `std::fs` used by the gateway operations.

use log::{error, info};
use std::fs;
use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::error::StorageError;

const MAX_RETRIES: u64 = 3;

/// Create a directory
pub fn create_directory(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Check if file exists
pub fn file_exists(path: &Path) -> bool {
    path.exists() && path.is_file()
}

/// Check if directory exists
pub fn directory_exists(path: &Path) -> bool {
    path.exists() && path.is_dir()
}

/// Make sure `dir` exists, creating it only when `auto_create` is set
pub fn ensure_directory(dir: &Path, auto_create: bool) -> Result<(), StorageError> {
    if directory_exists(dir) {
        return Ok(());
    }

    if !auto_create {
        return Err(StorageError::DirectoryMissing(dir.display().to_string()));
    }

    create_directory(dir)?;
    info!("Created directory {}", dir.display());
    Ok(())
}

/// Write `bytes` to `path` in one synchronous write, returning the byte count
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<u64, StorageError> {
    fs::write(path, bytes).map_err(|e| {
        error!("Failed to write {}: {}", path.display(), e);
        StorageError::IoError(e)
    })?;
    Ok(bytes.len() as u64)
}

/// Delete a file, retrying briefly when the OS reports it as locked
pub fn remove_file(path: &Path) -> Result<(), StorageError> {
    for attempt in 1..=MAX_RETRIES {
        match fs::remove_file(path) {
            Ok(()) => {
                info!("Deleted file {}", path.display());
                return Ok(());
            }
            Err(e) if attempt < MAX_RETRIES && e.kind() == io::ErrorKind::PermissionDenied => {
                thread::sleep(Duration::from_millis(100 * attempt));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(path.display().to_string()));
            }
            Err(e) => {
                error!("Failed to delete file {}: {}", path.display(), e);
                return Err(StorageError::IoError(e));
            }
        }
    }

    Err(StorageError::IoError(io::Error::new(
        io::ErrorKind::Other,
        "Failed to delete file after retries",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_directory_without_auto_create_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nope");

        let err = ensure_directory(&dir, false).unwrap_err();
        assert!(matches!(err, StorageError::DirectoryMissing(_)));
        assert!(!dir.exists());

        ensure_directory(&dir, true).unwrap();
        assert!(directory_exists(&dir));
    }

    #[test]
    fn write_then_remove() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.bin");

        assert_eq!(write_file(&path, b"hello").unwrap(), 5);
        assert!(file_exists(&path));

        remove_file(&path).unwrap();
        assert!(!path.exists());
        assert!(matches!(
            remove_file(&path).unwrap_err(),
            StorageError::NotFound(_)
        ));
    }
}
