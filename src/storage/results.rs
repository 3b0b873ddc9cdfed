//! Storage result types
//!
//! Defines result structures returned by path resolution.

use std::path::PathBuf;

/// Where a save should land and which directory has to exist first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTarget {
    pub path: PathBuf,
    pub directory: PathBuf,
}

/// Reverse-resolved location of a stored asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub absolute_path: PathBuf,
    /// Forward-slash path relative to `serving_root`
    pub root_relative_path: String,
    pub serving_root: PathBuf,
}
