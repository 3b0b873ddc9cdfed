//! Media file classification
//!
//! Extension tables shared by the containment fallback, file listing and content types.

use serde::Deserialize;
use std::path::Path;

/// Extensions that may be deleted outside the configured roots and that show up in listings
pub const MEDIA_ALLOW_LIST: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "mp4", "mov", "webm"];

const CONTENT_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("mp4", "video/mp4"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
];

/// Kind of asset a cache request carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    #[default]
    Image,
    Video,
}

/// Lowercased extension without the leading dot
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

pub fn is_media_file(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| MEDIA_ALLOW_LIST.contains(&ext.as_str()))
}

/// MIME type served for a file, `application/octet-stream` when unknown
pub fn content_type_for(path: &Path) -> &'static str {
    extension_of(path)
        .and_then(|ext| {
            CONTENT_TYPES
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, mime)| *mime)
        })
        .unwrap_or("application/octet-stream")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_extension_case_insensitively() {
        assert!(is_media_file(Path::new("/tmp/a.PNG")));
        assert!(!is_media_file(Path::new("clip.mkv")));
        assert!(!is_media_file(Path::new("/etc/passwd")));
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.mov")), "video/quicktime");
        assert_eq!(content_type_for(Path::new("a.txt")), "application/octet-stream");
    }
}
