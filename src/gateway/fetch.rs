//! Read side: serving stored assets and listing the primary root

use std::fs;
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

use crate::config::GatewayConfig;
use crate::error::{GatewayResult, StorageError};
use crate::gateway::results::{AssetMetadata, FetchedAsset, FileEntry, FileListing};
use crate::storage::filesystem::{directory_exists, file_exists};
use crate::storage::media::{content_type_for, is_media_file};
use crate::storage::resolve_for_fetch;
use crate::storage::resolver::to_forward_slashes;

pub fn fetch_asset(logical_path: &str, config: &GatewayConfig) -> GatewayResult<FetchedAsset> {
    let path = resolve_for_fetch(logical_path, config)?;
    if !file_exists(&path) {
        return Err(StorageError::NotFound(logical_path.to_string()).into());
    }

    let bytes = fs::read(&path)?;

    Ok(FetchedAsset {
        path: path.display().to_string(),
        content_type: content_type_for(&path),
        bytes,
    })
}

pub fn asset_metadata(logical_path: &str, config: &GatewayConfig) -> GatewayResult<AssetMetadata> {
    let path = resolve_for_fetch(logical_path, config)?;
    let metadata = fs::metadata(&path)?;
    if !metadata.is_file() {
        return Err(StorageError::NotFound(logical_path.to_string()).into());
    }

    Ok(AssetMetadata {
        content_type: content_type_for(&path),
        size: metadata.len(),
    })
}

/// Media files under the primary root, walked recursively in name order
pub fn list_files(config: &GatewayConfig) -> FileListing {
    let root = &config.primary_root;
    let base_path = to_forward_slashes(root);

    if !directory_exists(root) {
        return FileListing {
            files: Vec::new(),
            base_path,
        };
    }

    let files = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_media_file(entry.path()))
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            let relative = entry.path().strip_prefix(root).ok()?;
            let mtime = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs_f64())
                .unwrap_or_default();

            Some(FileEntry {
                filename: entry.file_name().to_string_lossy().to_string(),
                path: to_forward_slashes(entry.path()),
                relative_path: to_forward_slashes(relative),
                size: metadata.len(),
                mtime,
            })
        })
        .collect();

    FileListing { files, base_path }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use std::path::Path;
    use tempfile::TempDir;

    fn stored(root: &Path, relative: &str, bytes: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn fetch_serves_bytes_with_content_type() {
        let tmp = TempDir::new().unwrap();
        let config = GatewayConfig::with_primary_root(tmp.path());
        stored(tmp.path(), "clips/v.mov", b"moov");

        let asset = fetch_asset("clips/v.mov", &config).unwrap();
        assert_eq!(asset.bytes, b"moov");
        assert_eq!(asset.content_type, "video/quicktime");

        let meta = asset_metadata("clips/v.mov", &config).unwrap();
        assert_eq!(meta.size, 4);
    }

    #[test]
    fn fetch_falls_back_to_image_root() {
        let tmp = TempDir::new().unwrap();
        let mut config = GatewayConfig::with_primary_root(tmp.path().join("primary"));
        config.image_root = Some(tmp.path().join("images"));
        stored(&tmp.path().join("images"), "characters/c1.jpg", b"jpg");

        let asset = fetch_asset("characters/c1.jpg", &config).unwrap();
        assert_eq!(asset.content_type, "image/jpeg");
        assert_eq!(
            asset.path,
            tmp.path().join("images/characters/c1.jpg").display().to_string()
        );
    }

    #[test]
    fn fetch_refuses_escapes_and_directories() {
        let tmp = TempDir::new().unwrap();
        let config = GatewayConfig::with_primary_root(tmp.path().join("primary"));
        stored(tmp.path(), "secret.txt", b"s");
        fs::create_dir_all(tmp.path().join("primary/dir")).unwrap();

        for logical in ["../secret.txt", "dir", "nope.png"] {
            assert!(matches!(
                fetch_asset(logical, &config),
                Err(GatewayError::Storage(StorageError::NotFound(_)))
            ));
        }
    }

    #[test]
    fn listing_returns_media_only() {
        let tmp = TempDir::new().unwrap();
        let config = GatewayConfig::with_primary_root(tmp.path());
        stored(tmp.path(), "a.png", b"png");
        stored(tmp.path(), "nested/b.MP4", b"mp4");
        stored(tmp.path(), "notes.txt", b"txt");

        let listing = list_files(&config);
        let relative: Vec<&str> = listing
            .files
            .iter()
            .map(|f| f.relative_path.as_str())
            .collect();

        assert_eq!(relative, vec!["a.png", "nested/b.MP4"]);
        assert_eq!(listing.files[0].size, 3);
        assert!(listing.files[0].mtime > 0.0);
    }

    #[test]
    fn listing_a_missing_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        let config = GatewayConfig::with_primary_root(tmp.path().join("absent"));
        assert!(list_files(&config).files.is_empty());
    }
}
