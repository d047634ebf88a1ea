//! On-disk tree helpers used while staging and committing patched outputs

use std::fs;
use std::path::Path;

use glob::Pattern;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::path::{is_excluded, relative_slash_path};

/// Copy one file, creating parent directories as needed.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::at_path(parent, e))?;
    }
    fs::copy(src, dst).map_err(|e| Error::at_path(src, e))?;
    Ok(())
}

/// Copy a directory tree, skipping `.git` and paths matching `excludes`.
///
/// Exclude patterns are matched against `/`-separated paths relative to `src`.
/// Returns the number of files copied.
pub fn copy_tree(src: &Path, dst: &Path, excludes: &[Pattern]) -> Result<usize> {
    fs::create_dir_all(dst).map_err(|e| Error::at_path(dst, e))?;
    let mut copied = 0;

    let walker = WalkDir::new(src)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git");

    for entry in walker {
        let entry = entry.map_err(|e| Error::Filesystem {
            path: src.display().to_string(),
            message: e.to_string(),
        })?;
        let Some(rel) = relative_slash_path(src, entry.path()) else {
            continue;
        };
        if is_excluded(excludes, &rel) {
            log::trace!("excluded {}", rel);
            continue;
        }

        let target = dst.join(&rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| Error::at_path(&target, e))?;
        } else if entry.file_type().is_file() {
            copy_file(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Remove a file or directory if present.
pub fn remove_path(path: &Path) -> Result<()> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else if path.exists() {
        fs::remove_file(path)
    } else {
        return Ok(());
    };
    result.map_err(|e| Error::at_path(path, e))
}

/// Replace `dst` with `src`, moving it into place.
pub fn replace_path(src: &Path, dst: &Path) -> Result<()> {
    remove_path(dst)?;
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::at_path(parent, e))?;
    }
    fs::rename(src, dst).map_err(|e| Error::at_path(dst, e))
}

/// Content hash of a file or a whole directory tree.
///
/// Directory hashes cover every file's relative path and bytes in sorted
/// order, so they only change when content or layout changes. Returns `None`
/// when the path does not exist.
pub fn hash_path(path: &Path) -> Result<Option<String>> {
    if path.is_file() {
        let bytes = fs::read(path).map_err(|e| Error::at_path(path, e))?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        return Ok(Some(hex::encode(hasher.finalize())));
    }
    if !path.is_dir() {
        return Ok(None);
    }

    let mut hasher = Sha256::new();
    for entry in WalkDir::new(path).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Filesystem {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = relative_slash_path(path, entry.path()).unwrap_or_default();
        let bytes = fs::read(entry.path()).map_err(|e| Error::at_path(entry.path(), e))?;
        hasher.update(rel.as_bytes());
        hasher.update([0u8]);
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }
    Ok(Some(hex::encode(hasher.finalize())))
}
