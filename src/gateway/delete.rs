//! Delete and BatchDelete
//!
//! Both run the containment guard before touching anything. Only batch deletion
//! accepts media files outside every root by extension.

use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult, StorageError};
use crate::gateway::GatewayContext;
use crate::gateway::requests::{DeleteBatchRequest, DeleteItem, DeleteRequest, DeleteTarget};
use crate::gateway::results::{BatchItemResult, BatchResult, DeleteResult};
use crate::storage::filesystem::{file_exists, remove_file};
use crate::storage::resolver::reference_to_logical;
use crate::storage::validation::ensure_allowed;
use crate::storage::{GuardPolicy, resolve_for_fetch};

pub fn delete_file(
    request: DeleteRequest,
    config: &GatewayConfig,
    context: &GatewayContext,
) -> GatewayResult<DeleteResult> {
    let target = request.validate()?;
    let path = locate(&target, config, &context.file_url_prefix)?;

    ensure_allowed(&path, config, GuardPolicy::RootsOnly)?;
    if !file_exists(&path) {
        return Err(StorageError::NotFound(path.display().to_string()).into());
    }

    remove_file(&path)?;
    Ok(DeleteResult {
        path: path.display().to_string(),
    })
}

/// Where a single delete points. Targets that cannot be found in any root fall back
/// to the primary root so the guard and existence checks still see a concrete path.
fn locate(
    target: &DeleteTarget,
    config: &GatewayConfig,
    file_url_prefix: &str,
) -> Result<PathBuf, StorageError> {
    let logical = match target {
        DeleteTarget::Path(path) if Path::new(path).is_absolute() => {
            return Ok(PathBuf::from(path));
        }
        DeleteTarget::Path(path) if is_url(path) => reference_logical(path, file_url_prefix)?,
        DeleteTarget::Path(path) => path.clone(),
        DeleteTarget::Reference(reference) => reference_logical(reference, file_url_prefix)?,
    };

    Ok(resolve_for_fetch(&logical, config).unwrap_or_else(|_| config.primary_root.join(&logical)))
}

fn reference_logical(reference: &str, file_url_prefix: &str) -> Result<String, StorageError> {
    reference_to_logical(reference, file_url_prefix)
        .ok_or_else(|| StorageError::NotFound(reference.to_string()))
}

fn is_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Delete each item independently; one failure never aborts the rest
pub fn delete_batch(
    request: DeleteBatchRequest,
    config: &GatewayConfig,
    context: &GatewayContext,
) -> GatewayResult<BatchResult> {
    if request.items.is_empty() {
        return Err(GatewayError::InvalidRequest("no files to delete".into()));
    }

    let results: Vec<BatchItemResult> = request
        .items
        .iter()
        .map(|item| {
            let (path, reference) = item.parts();
            let identifier = path.or(reference).unwrap_or_default().to_string();

            match delete_item(item, config, &context.file_url_prefix) {
                Ok(removed) => {
                    BatchItemResult::succeeded(identifier, removed.display().to_string(), None)
                }
                Err(e) => {
                    debug!("Batch delete of {} failed: {}", identifier, e);
                    BatchItemResult::failed(identifier, e)
                }
            }
        })
        .collect();

    let batch = BatchResult::from_items(results);
    info!("Batch delete finished: {}/{} removed", batch.success_count, batch.total);
    Ok(batch)
}

fn delete_item(
    item: &DeleteItem,
    config: &GatewayConfig,
    file_url_prefix: &str,
) -> Result<PathBuf, StorageError> {
    let (path, reference) = item.parts();
    if path.is_none() && reference.is_none() {
        return Err(StorageError::InvalidPath("empty delete item".into()));
    }

    let Some(target) = locate_batch_item(path, reference, config, file_url_prefix) else {
        // An absolute path the guard would refuse is reported as forbidden, not missing
        if let Some(absolute) = path.map(Path::new).filter(|p| p.is_absolute()) {
            ensure_allowed(absolute, config, GuardPolicy::RootsOrMediaExtension)?;
        }
        let missing = path.or(reference).unwrap_or_default();
        return Err(StorageError::NotFound(missing.to_string()));
    };

    ensure_allowed(&target, config, GuardPolicy::RootsOrMediaExtension)?;
    remove_file(&target)?;
    Ok(target)
}

/// Lookup order: existing absolute path, then reference, then relative path
fn locate_batch_item(
    path: Option<&str>,
    reference: Option<&str>,
    config: &GatewayConfig,
    file_url_prefix: &str,
) -> Option<PathBuf> {
    if let Some(absolute) = path.map(Path::new).filter(|p| p.is_absolute()) {
        if file_exists(absolute) {
            return Some(absolute.to_path_buf());
        }
    }

    let from_reference = reference
        .and_then(|r| reference_to_logical(r, file_url_prefix))
        .and_then(|logical| resolve_for_fetch(&logical, config).ok());
    if from_reference.is_some() {
        return from_reference;
    }

    path.filter(|p| !Path::new(p).is_absolute())
        .and_then(|relative| resolve_for_fetch(relative, config).ok())
}
