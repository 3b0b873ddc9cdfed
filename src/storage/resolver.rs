//! Path resolution
//!
//! Turns logical identifiers (relative paths, category + id, custom absolute paths)
//! into filesystem paths across the configured roots, and back again.

use log::debug;
use std::path::{Component, Path, PathBuf};

use crate::config::{GatewayConfig, expand_root};
use crate::error::StorageError;
use crate::storage::media::AssetKind;
use crate::storage::results::{ResolvedAsset, SaveTarget};
use crate::storage::validation::{
    allowed_roots, canonicalize_lenient, ensure_lexically_within, is_plain_name,
};

/// Subdirectory of the primary root holding cache assets
pub const CACHE_DIR: &str = ".cache";

/// Path segment that introduces a logical path inside a retrieval reference
pub const FILE_ROUTE_MARKER: &str = "/file/";

/// Destination of a save request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveDestination {
    /// Absolute path chosen by the caller
    Custom(PathBuf),
    /// `filename` inside `primary_root/subfolder`
    Relative {
        subfolder: Option<String>,
        filename: String,
    },
}

/// Identity and placement of a cache asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLocation {
    pub id: String,
    pub category: String,
    /// Extension including the leading dot
    pub extension: String,
    pub kind: AssetKind,
    pub custom_path: Option<PathBuf>,
}

/// Candidate roots in lookup priority: primary, video, image
pub fn candidate_roots(config: &GatewayConfig) -> Vec<&Path> {
    allowed_roots(config)
}

/// Absolute path and directory to ensure for a save
pub fn resolve_for_save(
    destination: &SaveDestination,
    config: &GatewayConfig,
) -> Result<SaveTarget, StorageError> {
    match destination {
        SaveDestination::Custom(custom) => {
            let path = expand_root(custom);
            let directory = path
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StorageError::InvalidPath(custom.display().to_string()))?;
            Ok(SaveTarget { path, directory })
        }
        SaveDestination::Relative {
            subfolder,
            filename,
        } => {
            let directory = resolve_save_directory(subfolder.as_deref(), config)?;
            let path = resolve_in_directory(&directory, filename, &config.primary_root)?;
            let directory = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or(directory);
            Ok(SaveTarget { path, directory })
        }
    }
}

/// `primary_root/subfolder`, refusing subfolders that climb out of the primary root
pub fn resolve_save_directory(
    subfolder: Option<&str>,
    config: &GatewayConfig,
) -> Result<PathBuf, StorageError> {
    let directory = match subfolder.filter(|s| !s.trim().is_empty()) {
        Some(sub) => config.primary_root.join(sub),
        None => config.primary_root.clone(),
    };
    ensure_lexically_within(&directory, &config.primary_root)?;
    Ok(directory)
}

/// `directory/filename`, refusing names that leave `root`
pub fn resolve_in_directory(
    directory: &Path,
    filename: &str,
    root: &Path,
) -> Result<PathBuf, StorageError> {
    if filename.trim().is_empty() {
        return Err(StorageError::InvalidPath("empty filename".into()));
    }
    let path = directory.join(filename);
    ensure_lexically_within(&path, root)?;
    if !matches!(Path::new(filename).components().next_back(), Some(Component::Normal(_))) {
        return Err(StorageError::InvalidPath(filename.to_string()));
    }
    Ok(path)
}

/// Directory and file name for a cache asset.
///
/// Directory precedence: custom path, then the kind-specific root joined with the
/// category, then `primary_root/.cache/<category>`.
pub fn resolve_for_cache_asset(
    location: &CacheLocation,
    config: &GatewayConfig,
) -> Result<(PathBuf, String), StorageError> {
    let directory = match &location.custom_path {
        Some(custom) => expand_root(custom),
        None => {
            let base = cache_base(location.kind, config);
            let directory = base.join(&location.category);
            ensure_lexically_within(&directory, &base)?;
            directory
        }
    };

    let filename = cache_file_name(&location.id, &location.extension)?;
    Ok((directory, filename))
}

/// Thumbnails always live under `primary_root/.cache/<category>`
pub fn resolve_thumbnail_directory(
    category: &str,
    config: &GatewayConfig,
) -> Result<PathBuf, StorageError> {
    let base = config.primary_root.join(CACHE_DIR);
    let directory = base.join(category);
    ensure_lexically_within(&directory, &base)?;
    Ok(directory)
}

fn cache_base(kind: AssetKind, config: &GatewayConfig) -> PathBuf {
    match (kind, &config.video_root, &config.image_root) {
        (AssetKind::Video, Some(video), _) => video.clone(),
        (AssetKind::Image, _, Some(image)) => image.clone(),
        _ => config.primary_root.join(CACHE_DIR),
    }
}

/// `id + extension`, which must be a single plain file name
pub fn cache_file_name(id: &str, extension: &str) -> Result<String, StorageError> {
    let filename = format!("{id}{extension}");
    if is_plain_name(id) && is_plain_name(&filename) {
        Ok(filename)
    } else {
        Err(StorageError::InvalidPath(filename))
    }
}

/// Logical prefix used when a cache asset cannot be expressed relative to a root
pub fn cache_fallback_prefix(location: &CacheLocation, config: &GatewayConfig) -> String {
    let kind_root_set = match location.kind {
        AssetKind::Video => config.video_root.is_some(),
        AssetKind::Image => config.image_root.is_some(),
    };
    if location.custom_path.is_some() || kind_root_set {
        location.category.clone()
    } else {
        format!("{CACHE_DIR}/{}", location.category)
    }
}

/// Convert a forward-slash logical path into a relative path.
///
/// Returns `None` for absolute paths and paths that climb with `..`.
pub fn logical_to_relative(logical: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for segment in logical.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s => relative.push(s),
        }
    }

    let is_plain = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if relative.as_os_str().is_empty() || !is_plain {
        None
    } else {
        Some(relative)
    }
}

/// Find an existing file for `logical` by trying each candidate root in order
pub fn resolve_for_fetch(logical: &str, config: &GatewayConfig) -> Result<PathBuf, StorageError> {
    let relative =
        logical_to_relative(logical).ok_or_else(|| StorageError::NotFound(logical.to_string()))?;

    for root in candidate_roots(config) {
        let candidate = root.join(&relative);
        debug!("Checking {} (exists: {})", candidate.display(), candidate.exists());
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(StorageError::NotFound(logical.to_string()))
}

/// Extract the logical path from a retrieval reference.
///
/// The known serving prefix is stripped when present; otherwise everything after the
/// first `/file/` segment of the URL path is used. Query strings and fragments are
/// dropped and the remainder is percent-decoded.
pub fn reference_to_logical(reference: &str, file_url_prefix: &str) -> Option<String> {
    let tail = match reference.strip_prefix(file_url_prefix) {
        Some(tail) => tail,
        None => {
            let url_path = match reference.split_once("://") {
                Some((_, rest)) => &rest[rest.find('/')?..],
                None => reference,
            };
            url_path.split_once(FILE_ROUTE_MARKER).map(|(_, tail)| tail)?
        }
    };
    let tail = tail.split(['?', '#']).next().unwrap_or(tail);
    if tail.is_empty() {
        return None;
    }
    urlencoding::decode(tail).ok().map(|decoded| decoded.into_owned())
}

/// Root-relative, forward-slash name for an absolute path.
///
/// Tries each configured root; when none contains the path, the name is built from
/// `fallback_prefix` and the file name, served from the file's own directory.
pub fn reverse_resolve(
    absolute_path: &Path,
    config: &GatewayConfig,
    fallback_prefix: &str,
) -> ResolvedAsset {
    let canonical = canonicalize_lenient(absolute_path);

    for root in candidate_roots(config) {
        if let Ok(relative) = canonical.strip_prefix(canonicalize_lenient(root)) {
            return ResolvedAsset {
                absolute_path: absolute_path.to_path_buf(),
                root_relative_path: to_forward_slashes(relative),
                serving_root: root.to_path_buf(),
            };
        }
    }

    let file_name = absolute_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let prefix = fallback_prefix.trim_matches('/');
    let root_relative_path = if prefix.is_empty() {
        file_name
    } else {
        format!("{prefix}/{file_name}")
    };

    ResolvedAsset {
        absolute_path: absolute_path.to_path_buf(),
        root_relative_path,
        serving_root: absolute_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    }
}

/// Join path components with `/` regardless of the host separator
pub fn to_forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Build a retrieval URL, percent-encoding each segment of the logical path
pub fn retrieval_url(file_url_prefix: &str, root_relative_path: &str) -> String {
    let encoded = root_relative_path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{file_url_prefix}{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PREFIX: &str = "http://127.0.0.1:9527/file/";

    fn relative(subfolder: Option<&str>, filename: &str) -> SaveDestination {
        SaveDestination::Relative {
            subfolder: subfolder.map(String::from),
            filename: filename.to_string(),
        }
    }

    #[test]
    fn save_resolves_under_primary_root() {
        let config = GatewayConfig::with_primary_root("/srv/media");
        let target = resolve_for_save(&relative(Some("shots"), "a.png"), &config).unwrap();

        assert_eq!(target.path, PathBuf::from("/srv/media/shots/a.png"));
        assert_eq!(target.directory, PathBuf::from("/srv/media/shots"));
    }

    #[test]
    fn custom_path_uses_its_parent() {
        let config = GatewayConfig::with_primary_root("/srv/media");
        let target = resolve_for_save(
            &SaveDestination::Custom(PathBuf::from("/data/out/b.jpg")),
            &config,
        )
        .unwrap();

        assert_eq!(target.directory, PathBuf::from("/data/out"));
    }

    #[test]
    fn save_traversal_is_forbidden() {
        let config = GatewayConfig::with_primary_root("/srv/media");
        let err = resolve_for_save(&relative(Some("../.."), "a.png"), &config).unwrap_err();
        assert!(matches!(err, StorageError::Forbidden(_)));

        let err = resolve_for_save(&relative(None, "../a.png"), &config).unwrap_err();
        assert!(matches!(err, StorageError::Forbidden(_)));
    }

    #[test]
    fn cache_directory_precedence() {
        let mut config = GatewayConfig::with_primary_root("/srv/media");
        let mut location = CacheLocation {
            id: "c1".into(),
            category: "characters".into(),
            extension: ".png".into(),
            kind: AssetKind::Image,
            custom_path: None,
        };

        let (dir, name) = resolve_for_cache_asset(&location, &config).unwrap();
        assert_eq!(dir, PathBuf::from("/srv/media/.cache/characters"));
        assert_eq!(name, "c1.png");

        config.image_root = Some(PathBuf::from("/srv/images"));
        let (dir, _) = resolve_for_cache_asset(&location, &config).unwrap();
        assert_eq!(dir, PathBuf::from("/srv/images/characters"));

        location.kind = AssetKind::Video;
        let (dir, _) = resolve_for_cache_asset(&location, &config).unwrap();
        assert_eq!(dir, PathBuf::from("/srv/media/.cache/characters"));

        location.custom_path = Some(PathBuf::from("/elsewhere"));
        let (dir, _) = resolve_for_cache_asset(&location, &config).unwrap();
        assert_eq!(dir, PathBuf::from("/elsewhere"));
    }

    #[test]
    fn cache_ids_must_be_plain_names() {
        assert!(cache_file_name("../../evil", ".png").is_err());
        assert!(cache_file_name("", "").is_err());
        assert_eq!(cache_file_name("abc", ".jpg").unwrap(), "abc.jpg");
    }

    #[test]
    fn fetch_tries_roots_in_priority_order() {
        let tmp = TempDir::new().unwrap();
        let primary = tmp.path().join("primary");
        let video = tmp.path().join("video");
        let image = tmp.path().join("image");
        fs::create_dir_all(video.join("history")).unwrap();
        fs::create_dir_all(image.join("history")).unwrap();
        fs::write(video.join("history/x.mp4"), b"v").unwrap();
        fs::write(image.join("history/x.mp4"), b"i").unwrap();

        let mut config = GatewayConfig::with_primary_root(&primary);
        config.video_root = Some(video.clone());
        config.image_root = Some(image.clone());

        assert_eq!(
            resolve_for_fetch("history/x.mp4", &config).unwrap(),
            video.join("history/x.mp4")
        );
        assert!(matches!(
            resolve_for_fetch("history/missing.mp4", &config),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn fetch_rejects_traversal() {
        let tmp = TempDir::new().unwrap();
        let config = GatewayConfig::with_primary_root(tmp.path().join("primary"));
        fs::write(tmp.path().join("secret"), b"s").unwrap();

        assert!(matches!(
            resolve_for_fetch("../secret", &config),
            Err(StorageError::NotFound(_))
        ));
        assert_eq!(logical_to_relative("/a//b/./c"), Some(PathBuf::from("a/b/c")));
    }

    #[test]
    fn references_are_stripped_and_decoded() {
        assert_eq!(
            reference_to_logical(&format!("{PREFIX}shots/my%20shot.png"), PREFIX).as_deref(),
            Some("shots/my shot.png")
        );
        assert_eq!(
            reference_to_logical("http://localhost:1234/file/a/b.png?t=1", PREFIX).as_deref(),
            Some("a/b.png")
        );
        assert_eq!(
            reference_to_logical("http://localhost:1234/file/projects/file/a.png", PREFIX)
                .as_deref(),
            Some("projects/file/a.png")
        );
        assert_eq!(reference_to_logical("https://cdn.example/x.png", PREFIX), None);
    }

    #[test]
    fn reverse_resolution_round_trips_through_fetch() {
        let tmp = TempDir::new().unwrap();
        let primary = tmp.path().join("primary");
        let image = tmp.path().join("images");
        let mut config = GatewayConfig::with_primary_root(&primary);
        config.image_root = Some(image.clone());

        let stored = image.join("characters/c1.jpg");
        fs::create_dir_all(stored.parent().unwrap()).unwrap();
        fs::write(&stored, b"jpg").unwrap();

        let resolved = reverse_resolve(&stored, &config, "characters");
        assert_eq!(resolved.root_relative_path, "characters/c1.jpg");
        assert_eq!(resolved.serving_root, image);
        assert_eq!(
            resolve_for_fetch(&resolved.root_relative_path, &config).unwrap(),
            stored
        );
    }

    #[test]
    fn saved_paths_reverse_resolve_to_fetchable_names() {
        let tmp = TempDir::new().unwrap();
        let primary = tmp.path().join("primary");
        let mut config = GatewayConfig::with_primary_root(&primary);

        for image_root in [None, Some(tmp.path().join("images"))] {
            config.image_root = image_root;
            let target =
                resolve_for_save(&relative(Some("shots/day 1"), "a.png"), &config).unwrap();
            fs::create_dir_all(&target.directory).unwrap();
            fs::write(&target.path, b"png").unwrap();

            let resolved = reverse_resolve(&target.path, &config, "shots");
            assert_eq!(resolved.root_relative_path, "shots/day 1/a.png");
            assert_eq!(resolved.serving_root, primary);
            assert_eq!(
                resolve_for_fetch(&resolved.root_relative_path, &config).unwrap(),
                target.path
            );
        }
    }

    #[test]
    fn reverse_resolution_outside_roots_uses_prefix() {
        let tmp = TempDir::new().unwrap();
        let config = GatewayConfig::with_primary_root(tmp.path().join("primary"));
        let stray = tmp.path().join("custom/c2.png");

        let resolved = reverse_resolve(&stray, &config, "characters");
        assert_eq!(resolved.root_relative_path, "characters/c2.png");
        assert_eq!(resolved.serving_root, tmp.path().join("custom"));
    }

    #[test]
    fn retrieval_urls_encode_segments() {
        assert_eq!(
            retrieval_url(PREFIX, ".cache/history/my shot.jpg"),
            format!("{PREFIX}.cache/history/my%20shot.jpg")
        );
    }
}
