//! Gateway result types
//!
//! Serialized with camelCase keys; every success body is wrapped in an [`Envelope`].

use serde::Serialize;

use crate::config::EffectiveConfig;

/// `{"success": true, ...body}`
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(body: T) -> Self {
        Self {
            success: true,
            body,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SaveResult {
    pub path: String,
    pub size: u64,
}

/// Outcome of one item in a batch
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemResult {
    pub identifier: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl BatchItemResult {
    pub fn succeeded(identifier: impl Into<String>, path: String, size: Option<u64>) -> Self {
        Self {
            identifier: identifier.into(),
            success: true,
            path: Some(path),
            error: None,
            size,
        }
    }

    pub fn failed(identifier: impl Into<String>, error: impl ToString) -> Self {
        Self {
            identifier: identifier.into(),
            success: false,
            path: None,
            error: Some(error.to_string()),
            size: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub success_count: usize,
    pub total: usize,
    pub results: Vec<BatchItemResult>,
}

impl BatchResult {
    pub fn from_items(results: Vec<BatchItemResult>) -> Self {
        Self {
            success_count: results.iter().filter(|r| r.success).count(),
            total: results.len(),
            results,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CacheAssetResult {
    pub path: String,
    pub url: String,
    pub relative_path: String,
    pub converted: bool,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailResult {
    pub path: String,
    pub url: String,
    pub relative_path: String,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeleteResult {
    pub path: String,
}

/// Bytes of a stored asset ready to serve
#[derive(Debug, Clone)]
pub struct FetchedAsset {
    pub path: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Headers-only view of a stored asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMetadata {
    pub content_type: &'static str,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub filename: String,
    pub path: String,
    pub relative_path: String,
    pub size: u64,
    /// Modification time in seconds since the Unix epoch
    pub mtime: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileListing {
    pub files: Vec<FileEntry>,
    pub base_path: String,
}

/// Body of a config update: `{"config": {...}}`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConfigSnapshot {
    pub config: EffectiveConfig,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub status: &'static str,
    pub version: &'static str,
    pub primary_root: String,
    pub image_root: String,
    pub video_root: String,
    pub port: u16,
    pub codec_available: bool,
    pub transcode_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn batch_counts_successes() {
        let batch = BatchResult::from_items(vec![
            BatchItemResult::succeeded("a.png", "/r/a.png".into(), Some(3)),
            BatchItemResult::failed("/etc/passwd", "Forbidden: /etc/passwd"),
        ]);

        let value = serde_json::to_value(Envelope::ok(batch)).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["successCount"], json!(1));
        assert_eq!(value["total"], json!(2));
        assert_eq!(value["results"][1]["error"], json!("Forbidden: /etc/passwd"));
        assert!(value["results"][1].get("path").is_none());
    }
}
