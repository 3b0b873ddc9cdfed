//! Path validation
//!
//! Containment checks that keep mutating operations inside the configured roots.

use log::{debug, warn};
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::config::GatewayConfig;
use crate::error::StorageError;
use crate::storage::media;

/// Which rules a path may satisfy to be allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPolicy {
    RootsOnly,
    /// Also accept known media extensions outside every root (batch delete only)
    RootsOrMediaExtension,
}

/// Outcome of a containment check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Containment {
    Root(PathBuf),
    MediaExtension,
    Denied,
}

impl Containment {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Containment::Denied)
    }
}

/// Resolve `.` and `..` components without touching the filesystem
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Canonicalize a path that may not exist yet.
///
/// Components are walked in order and every prefix that exists is canonicalized
/// before the next component applies, so `..` always pops the resolved target of
/// a symlink rather than the link itself. A dangling symlink is replaced by its
/// target.
pub fn canonicalize_lenient(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    let mut resolved = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => {
                resolved.push(other.as_os_str());
                resolved = resolve_existing(resolved);
            }
        }
    }
    resolved
}

fn resolve_existing(path: PathBuf) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match fs::read_link(&path) {
        Ok(target) => {
            let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
            normalize_lexically(&parent.join(target))
        }
        Err(_) => path,
    }
}

/// Whether `path` lies inside `root` once both are canonicalized
pub fn is_within(path: &Path, root: &Path) -> bool {
    canonicalize_lenient(path).starts_with(canonicalize_lenient(root))
}

/// Lexical containment for paths built from request fields before anything exists on disk
pub fn ensure_lexically_within(path: &Path, root: &Path) -> Result<(), StorageError> {
    if normalize_lexically(path).starts_with(normalize_lexically(root)) && is_within(path, root) {
        Ok(())
    } else {
        Err(StorageError::Forbidden(format!(
            "{} escapes {}",
            path.display(),
            root.display()
        )))
    }
}

/// A single file name: no separators, not empty, not `.` or `..`
pub fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Configured roots in the order they are searched
pub fn allowed_roots(config: &GatewayConfig) -> Vec<&Path> {
    let mut roots = vec![config.primary_root.as_path()];
    if let Some(video) = config.video_root.as_deref() {
        roots.push(video);
    }
    if let Some(image) = config.image_root.as_deref() {
        roots.push(image);
    }
    roots
}

/// Classify `path` against the configured roots and, if the policy permits, the
/// media extension allow-list.
pub fn check_containment(path: &Path, config: &GatewayConfig, policy: GuardPolicy) -> Containment {
    let canonical = canonicalize_lenient(path);

    for root in allowed_roots(config) {
        if canonical.starts_with(canonicalize_lenient(root)) {
            return Containment::Root(root.to_path_buf());
        }
    }

    if policy == GuardPolicy::RootsOrMediaExtension && media::is_media_file(&canonical) {
        return Containment::MediaExtension;
    }

    Containment::Denied
}

pub fn is_allowed(path: &Path, config: &GatewayConfig, policy: GuardPolicy) -> bool {
    check_containment(path, config, policy).is_allowed()
}

/// Containment check for a mutating operation; logs the weaker extension-based allowance
pub fn ensure_allowed(
    path: &Path,
    config: &GatewayConfig,
    policy: GuardPolicy,
) -> Result<Containment, StorageError> {
    match check_containment(path, config, policy) {
        Containment::Denied => {
            warn!("Containment check failed, refusing {}", path.display());
            Err(StorageError::Forbidden(format!(
                "{} is outside the configured roots",
                path.display()
            )))
        }
        Containment::MediaExtension => {
            warn!(
                "Allowing media file outside configured roots by extension: {}",
                path.display()
            );
            Ok(Containment::MediaExtension)
        }
        Containment::Root(root) => {
            debug!("{} is contained in root {}", path.display(), root.display());
            Ok(Containment::Root(root))
        }
    }
}
