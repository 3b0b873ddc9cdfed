//! Save and BatchSave

use log::{info, warn};
use std::path::Path;

use crate::codec::decode;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::requests::{BatchSaveItem, BatchSaveRequest, SaveRequest};
use crate::gateway::results::{BatchItemResult, BatchResult, SaveResult};
use crate::storage::filesystem::{ensure_directory, write_file};
use crate::storage::resolver::{resolve_for_save, resolve_in_directory, resolve_save_directory};
use crate::storage::uniquify;

/// Save one file under the primary root or at a caller-chosen absolute path
pub fn save(request: SaveRequest, config: &GatewayConfig) -> GatewayResult<SaveResult> {
    let valid = request.validate()?;
    let target = resolve_for_save(&valid.destination, config)?;

    ensure_directory(&target.directory, config.auto_create_dir)?;
    let path = uniquify(&target.path, config.allow_overwrite);

    let bytes = decode(
        valid.content.inline_content.as_deref(),
        valid.content.remote_url.as_deref(),
    )?;
    let size = write_file(&path, &bytes)?;

    info!("Saved {} ({} bytes)", path.display(), size);
    Ok(SaveResult {
        path: path.display().to_string(),
        size,
    })
}

/// Save every item into one shared directory.
///
/// Items are written one at a time in request order. A failing item is recorded in
/// its result and the rest carry on.
pub fn batch_save(request: BatchSaveRequest, config: &GatewayConfig) -> GatewayResult<BatchResult> {
    if request.items.is_empty() {
        return Err(GatewayError::InvalidRequest("no files to save".into()));
    }

    let directory = resolve_save_directory(request.subfolder.as_deref(), config)?;
    let directory_ready = ensure_directory(&directory, config.auto_create_dir);
    if let Err(e) = &directory_ready {
        warn!("Batch target {} unavailable: {}", directory.display(), e);
    }

    let results: Vec<BatchItemResult> = request
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let filename = item.filename_or_default(index);
            let outcome = match &directory_ready {
                Ok(()) => save_item(&directory, &filename, item, config).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };

            match outcome {
                Ok(saved) => BatchItemResult::succeeded(filename, saved.path, Some(saved.size)),
                Err(message) => {
                    warn!("Batch item {} failed: {}", filename, message);
                    BatchItemResult::failed(filename, message)
                }
            }
        })
        .collect();

    let batch = BatchResult::from_items(results);
    info!(
        "Batch save finished: {}/{} written to {}",
        batch.success_count,
        batch.total,
        directory.display()
    );
    Ok(batch)
}

fn save_item(
    directory: &Path,
    filename: &str,
    item: &BatchSaveItem,
    config: &GatewayConfig,
) -> GatewayResult<SaveResult> {
    let path = resolve_in_directory(directory, filename, &config.primary_root)?;
    let path = uniquify(&path, config.allow_overwrite);

    let bytes = decode(item.inline_content.as_deref(), None)?;
    let size = write_file(&path, &bytes)?;

    Ok(SaveResult {
        path: path.display().to_string(),
        size,
    })
}
