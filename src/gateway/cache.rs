//! Cache assets and thumbnails
//!
//! Cache assets are keyed by id and overwritten on resave, so the namer is never
//! applied here. Their directories are managed by the gateway and always created.

use log::info;

use crate::codec::transcode::TARGET_EXTENSION;
use crate::codec::{decode_inline, maybe_transcode};
use crate::config::GatewayConfig;
use crate::error::GatewayResult;
use crate::gateway::GatewayContext;
use crate::gateway::requests::{CacheAssetRequest, ThumbnailRequest};
use crate::gateway::results::{CacheAssetResult, ThumbnailResult};
use crate::storage::filesystem::{ensure_directory, write_file};
use crate::storage::resolver::{
    CACHE_DIR, cache_fallback_prefix, cache_file_name, resolve_for_cache_asset,
    resolve_thumbnail_directory, retrieval_url,
};
use crate::storage::reverse_resolve;

pub fn save_cache_asset(
    request: CacheAssetRequest,
    config: &GatewayConfig,
    context: &GatewayContext,
) -> GatewayResult<CacheAssetResult> {
    let valid = request.validate()?;
    let location = valid.location;

    let (directory, _) = resolve_for_cache_asset(&location, config)?;
    ensure_directory(&directory, true)?;

    let bytes = decode_inline(&valid.inline_content)?;
    let transcoded = maybe_transcode(
        bytes,
        &location.extension,
        location.kind,
        config,
        context.codec,
    );

    // Transcoding may change the extension
    let filename = cache_file_name(&location.id, &transcoded.extension)?;
    let path = directory.join(filename);
    let size = write_file(&path, &transcoded.bytes)?;

    let resolved = reverse_resolve(&path, config, &cache_fallback_prefix(&location, config));
    let url = retrieval_url(&context.file_url_prefix, &resolved.root_relative_path);

    info!(
        "Cached {} asset {} at {} ({} bytes, converted: {})",
        location.category,
        location.id,
        path.display(),
        size,
        transcoded.converted
    );

    Ok(CacheAssetResult {
        path: path.display().to_string(),
        url,
        relative_path: resolved.root_relative_path,
        converted: transcoded.converted,
        size,
    })
}

/// Thumbnails always land in `primary_root/.cache/<category>/<id>.jpg`, untranscoded
pub fn save_thumbnail(
    request: ThumbnailRequest,
    config: &GatewayConfig,
    context: &GatewayContext,
) -> GatewayResult<ThumbnailResult> {
    let valid = request.validate()?;

    let directory = resolve_thumbnail_directory(&valid.category, config)?;
    let filename = cache_file_name(&valid.id, TARGET_EXTENSION)?;
    ensure_directory(&directory, true)?;

    let bytes = decode_inline(&valid.inline_content)?;
    let path = directory.join(filename);
    let size = write_file(&path, &bytes)?;

    let fallback = format!("{CACHE_DIR}/{}", valid.category);
    let resolved = reverse_resolve(&path, config, &fallback);
    info!("Saved thumbnail {} ({} bytes)", path.display(), size);

    Ok(ThumbnailResult {
        path: path.display().to_string(),
        url: retrieval_url(&context.file_url_prefix, &resolved.root_relative_path),
        relative_path: resolved.root_relative_path,
        size,
    })
}
