//! Inbound request shapes
//!
//! Each operation has its own request type. Required fields are checked once, in
//! `validate`, before any filesystem work happens.

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{DecodeError, GatewayError};
use crate::storage::resolver::{CacheLocation, SaveDestination};
use crate::storage::validation::is_plain_name;
use crate::storage::AssetKind;

const DEFAULT_CACHE_CATEGORY: &str = "characters";
const DEFAULT_CACHE_EXTENSION: &str = ".jpg";
const DEFAULT_THUMBNAIL_CATEGORY: &str = "history";

/// Either inline base64 content or a remote URL to fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentPayload {
    pub inline_content: Option<String>,
    pub remote_url: Option<String>,
}

impl ContentPayload {
    fn from_parts(inline_content: Option<String>, remote_url: Option<String>) -> Option<Self> {
        let inline_content = inline_content.filter(|c| !c.is_empty());
        let remote_url = remote_url.filter(|u| !u.trim().is_empty());
        if inline_content.is_none() && remote_url.is_none() {
            None
        } else {
            Some(Self {
                inline_content,
                remote_url,
            })
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub filename: Option<String>,
    #[serde(alias = "path", alias = "custom_path")]
    pub custom_path: Option<String>,
    pub subfolder: Option<String>,
    #[serde(alias = "content")]
    pub inline_content: Option<String>,
    #[serde(alias = "url")]
    pub remote_url: Option<String>,
}

/// A save request with its destination and payload established
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSave {
    pub destination: SaveDestination,
    pub content: ContentPayload,
}

impl SaveRequest {
    pub fn validate(self) -> Result<ValidSave, GatewayError> {
        let custom_path = non_empty(self.custom_path);
        let filename = non_empty(self.filename);

        let destination = match (custom_path, filename) {
            (Some(custom), _) => SaveDestination::Custom(PathBuf::from(custom)),
            (None, Some(filename)) => SaveDestination::Relative {
                subfolder: non_empty(self.subfolder),
                filename,
            },
            (None, None) => {
                return Err(GatewayError::InvalidRequest(
                    "filename or path is required".into(),
                ));
            }
        };

        let content = ContentPayload::from_parts(self.inline_content, self.remote_url)
            .ok_or(GatewayError::Decode(DecodeError::MissingContent))?;

        Ok(ValidSave {
            destination,
            content,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSaveItem {
    pub filename: Option<String>,
    #[serde(alias = "content")]
    pub inline_content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSaveRequest {
    pub subfolder: Option<String>,
    #[serde(default, alias = "files")]
    pub items: Vec<BatchSaveItem>,
}

impl BatchSaveItem {
    /// Name to save under; unnamed items become `file_<index>.png`
    pub fn filename_or_default(&self, index: usize) -> String {
        self.filename
            .clone()
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| format!("file_{index}.png"))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheAssetRequest {
    pub id: Option<String>,
    pub category: Option<String>,
    #[serde(alias = "type")]
    pub kind: Option<AssetKind>,
    #[serde(alias = "ext")]
    pub extension: Option<String>,
    #[serde(alias = "custom_path")]
    pub custom_path: Option<String>,
    #[serde(alias = "content")]
    pub inline_content: Option<String>,
}

/// A cache asset request with its location and content established
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCacheAsset {
    pub location: CacheLocation,
    pub inline_content: String,
}

impl CacheAssetRequest {
    pub fn validate(self) -> Result<ValidCacheAsset, GatewayError> {
        let id = required_id(self.id)?;
        let inline_content = non_empty(self.inline_content)
            .ok_or(GatewayError::Decode(DecodeError::MissingContent))?;

        let category = category_or(self.category, DEFAULT_CACHE_CATEGORY)?;
        let extension = normalize_extension(
            non_empty(self.extension).as_deref().unwrap_or(DEFAULT_CACHE_EXTENSION),
        )?;

        Ok(ValidCacheAsset {
            location: CacheLocation {
                id,
                category,
                extension,
                kind: self.kind.unwrap_or_default(),
                custom_path: non_empty(self.custom_path).map(PathBuf::from),
            },
            inline_content,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailRequest {
    pub id: Option<String>,
    pub category: Option<String>,
    #[serde(alias = "content")]
    pub inline_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidThumbnail {
    pub id: String,
    pub category: String,
    pub inline_content: String,
}

impl ThumbnailRequest {
    pub fn validate(self) -> Result<ValidThumbnail, GatewayError> {
        let id = required_id(self.id)?;
        let inline_content = non_empty(self.inline_content)
            .ok_or(GatewayError::Decode(DecodeError::MissingContent))?;
        let category = category_or(self.category, DEFAULT_THUMBNAIL_CATEGORY)?;

        Ok(ValidThumbnail {
            id,
            category,
            inline_content,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    pub path: Option<String>,
    #[serde(alias = "reference")]
    pub url: Option<String>,
}

/// What a delete request points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Path(String),
    Reference(String),
}

impl DeleteRequest {
    pub fn validate(self) -> Result<DeleteTarget, GatewayError> {
        match (non_empty(self.path), non_empty(self.url)) {
            (Some(path), _) => Ok(DeleteTarget::Path(path)),
            (None, Some(url)) => Ok(DeleteTarget::Reference(url)),
            (None, None) => Err(GatewayError::InvalidRequest(
                "path or url is required".into(),
            )),
        }
    }
}

/// Batch delete entries are either a bare path or an object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DeleteItem {
    Path(String),
    Object {
        #[serde(default)]
        path: Option<String>,
        #[serde(default, alias = "reference")]
        url: Option<String>,
    },
}

impl DeleteItem {
    /// `(path, reference)` with empty strings treated as absent
    pub fn parts(&self) -> (Option<&str>, Option<&str>) {
        match self {
            DeleteItem::Path(path) => (Some(path.as_str()).filter(|p| !p.is_empty()), None),
            DeleteItem::Object { path, url } => (
                path.as_deref().filter(|p| !p.is_empty()),
                url.as_deref().filter(|u| !u.is_empty()),
            ),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBatchRequest {
    #[serde(default, alias = "files")]
    pub items: Vec<DeleteItem>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required_id(id: Option<String>) -> Result<String, GatewayError> {
    let id = non_empty(id).ok_or_else(|| GatewayError::InvalidRequest("id is required".into()))?;
    if !is_plain_name(&id) {
        return Err(GatewayError::InvalidRequest(format!("invalid id: {id}")));
    }
    Ok(id)
}

fn category_or(category: Option<String>, default: &str) -> Result<String, GatewayError> {
    let category = non_empty(category).unwrap_or_else(|| default.to_string());
    if !is_plain_name(&category) {
        return Err(GatewayError::InvalidRequest(format!(
            "invalid category: {category}"
        )));
    }
    Ok(category)
}

/// Ensure a leading dot; extensions may not contain separators
fn normalize_extension(extension: &str) -> Result<String, GatewayError> {
    let extension = extension.trim();
    let normalized = if extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{extension}")
    };
    if normalized.len() < 2 || !is_plain_name(&normalized) {
        return Err(GatewayError::InvalidRequest(format!(
            "invalid extension: {extension}"
        )));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_requires_a_destination() {
        let err = SaveRequest {
            inline_content: Some("aGk=".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequest(_)));
    }

    #[test]
    fn save_requires_content() {
        let err = SaveRequest {
            filename: Some("a.png".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, GatewayError::Decode(DecodeError::MissingContent)));
    }

    #[test]
    fn custom_path_takes_precedence() {
        let valid = SaveRequest {
            filename: Some("a.png".into()),
            custom_path: Some("/tmp/out/b.png".into()),
            remote_url: Some("http://example.com/b.png".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(
            valid.destination,
            SaveDestination::Custom(PathBuf::from("/tmp/out/b.png"))
        );
    }

    #[test]
    fn legacy_wire_names_are_accepted() {
        let req: SaveRequest = serde_json::from_str(
            r#"{"filename": "a.png", "content": "aGk=", "subfolder": "shots"}"#,
        )
        .unwrap();
        assert_eq!(req.inline_content.as_deref(), Some("aGk="));

        let cache: CacheAssetRequest = serde_json::from_str(
            r#"{"id": "c1", "ext": "png", "type": "video", "content": "aGk="}"#,
        )
        .unwrap();
        let valid = cache.validate().unwrap();
        assert_eq!(valid.location.extension, ".png");
        assert_eq!(valid.location.kind, AssetKind::Video);
        assert_eq!(valid.location.category, "characters");
    }

    #[test]
    fn cache_ids_cannot_traverse() {
        let err = CacheAssetRequest {
            id: Some("../escape".into()),
            inline_content: Some("aGk=".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequest(_)));
    }

    #[test]
    fn delete_items_accept_strings_and_objects() {
        let req: DeleteBatchRequest = serde_json::from_str(
            r#"{"files": ["/a.png", {"url": "http://127.0.0.1:9527/file/x.png"}, {"path": ""}]}"#,
        )
        .unwrap();

        assert_eq!(req.items[0].parts(), (Some("/a.png"), None));
        assert_eq!(
            req.items[1].parts(),
            (None, Some("http://127.0.0.1:9527/file/x.png"))
        );
        assert_eq!(req.items[2].parts(), (None, None));
    }

    #[test]
    fn thumbnail_defaults_to_history() {
        let valid = ThumbnailRequest {
            id: Some("h1".into()),
            inline_content: Some("aGk=".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(valid.category, "history");
    }
}
