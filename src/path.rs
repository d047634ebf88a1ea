//! Path manipulation utilities for forkpatch

use std::path::{Component, Path};

use crate::error::{Error, Result};
use glob::Pattern;

/// Normalize a project- or upstream-relative path.
///
/// Backslashes become `/`, `./` segments and trailing separators are dropped.
/// Absolute paths, empty paths and paths escaping their root with `..` are
/// rejected.
pub fn normalize_rel_path(path: &str) -> Result<String> {
    let unified = path.replace('\\', "/");
    if Path::new(&unified).is_absolute() || unified.starts_with('/') {
        return Err(Error::config(format!("path must be relative: {}", path)));
    }

    let mut parts = Vec::new();
    for component in Path::new(&unified).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::config(format!(
                    "path must not contain '..': {}",
                    path
                )))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::config(format!("path must be relative: {}", path)))
            }
        }
    }

    if parts.is_empty() {
        return Err(Error::config(format!("path must not be empty: '{}'", path)));
    }
    Ok(parts.join("/"))
}

/// Compile exclude patterns, failing on the first invalid one.
pub fn compile_globs<'a, I>(patterns: I) -> Result<Vec<Pattern>>
where
    I: IntoIterator<Item = &'a String>,
{
    patterns
        .into_iter()
        .map(|p| Pattern::new(p).map_err(Error::Glob))
        .collect()
}

/// Whether a `/`-separated relative path matches any of the patterns.
pub fn is_excluded(patterns: &[Pattern], rel_path: &str) -> bool {
    patterns.iter().any(|p| p.matches(rel_path))
}

/// Relative path of `path` under `base`, `/`-separated.
pub fn relative_slash_path(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// Encode a URL or ref to be filesystem-safe
///
/// This converts characters that are problematic for filesystems
/// into safe alternatives.
pub fn encode_path_segment(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '/' | '\\' => '-',
            c if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' => c,
            _ => '_',
        })
        .collect()
}
