//! Collision-safe file naming

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Returns a path that will not clobber an existing file.
///
/// With `allow_overwrite`, or when `path` is free, `path` is returned unchanged.
/// Otherwise `stem_1.ext`, `stem_2.ext`, ... are probed until a free name turns up.
/// The counter has no upper bound; it is limited only by what the directory holds.
pub fn uniquify(path: &Path, allow_overwrite: bool) -> PathBuf {
    if allow_overwrite || !path.exists() {
        return path.to_path_buf();
    }

    let stem = path.file_stem().map(OsString::from).unwrap_or_default();
    let extension = path.extension();

    let mut counter: u64 = 1;
    loop {
        let mut name = stem.clone();
        name.push(format!("_{counter}"));
        if let Some(ext) = extension {
            name.push(".");
            name.push(ext);
        }

        let candidate = path.with_file_name(&name);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
