//! Lexical path containment checks.
//!
//! Configured paths are resolved without touching the filesystem so that a
//! value escaping its root is rejected even when the target does not exist.

use std::path::{Component, Path, PathBuf};

use crate::error::{DocpupError, Result};

/// Normalize `relative` lexically and join it onto `root`.
///
/// Fails with [`DocpupError::PathEscape`] when `relative` is absolute or
/// climbs above `root` through `..` segments.
pub fn resolve_within(root: &Path, relative: impl AsRef<Path>) -> Result<PathBuf> {
    let relative = relative.as_ref();
    let normalized = normalize_relative(relative).ok_or_else(|| DocpupError::PathEscape {
        path: relative.to_path_buf(),
        root: root.to_path_buf(),
    })?;
    Ok(root.join(normalized))
}

/// Lexically normalize a relative path, or `None` if it is absolute or escapes.
pub fn normalize_relative(path: &Path) -> Option<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(parts.iter().collect())
}

/// Whether `path` is relative and stays inside whatever root it is joined to.
pub fn is_contained(path: &str) -> bool {
    normalize_relative(Path::new(path)).is_some()
}

/// Render a relative path with `/` separators and no leading `./`.
pub fn to_posix(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
