//! Content decoding
//!
//! Turns inbound payloads (inline base64, optionally wrapped in a data URL, or a
//! remote URL) into raw bytes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{info, warn};

use crate::error::DecodeError;

/// Decode whichever payload is present, preferring inline content.
///
/// Empty strings count as absent.
pub fn decode(inline_content: Option<&str>, remote_url: Option<&str>) -> Result<Vec<u8>, DecodeError> {
    let inline_content = inline_content.filter(|c| !c.is_empty());
    let remote_url = remote_url.filter(|u| !u.trim().is_empty());

    match (inline_content, remote_url) {
        (Some(content), _) => decode_inline(content),
        (None, Some(url)) => fetch_remote(url),
        (None, None) => Err(DecodeError::MissingContent),
    }
}

/// Base64-decode `content`, dropping a `data:<mime>;base64,` style header if present
pub fn decode_inline(content: &str) -> Result<Vec<u8>, DecodeError> {
    let payload = match content.split_once(',') {
        Some((_, rest)) => rest,
        None => content,
    };

    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| DecodeError::InvalidEncoding(e.to_string()))
}

/// Blocking fetch of `url`; any transport failure or non-success status is `FetchFailed`.
///
/// No timeout is set here beyond the HTTP client's own default.
pub fn fetch_remote(url: &str) -> Result<Vec<u8>, DecodeError> {
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| {
            warn!("Fetching {} failed: {}", url, e);
            DecodeError::FetchFailed(e.to_string())
        })?;

    let body = response
        .bytes()
        .map_err(|e| DecodeError::FetchFailed(e.to_string()))?;

    info!("Fetched {} ({} bytes)", url, body.len());
    Ok(body.to_vec())
}
