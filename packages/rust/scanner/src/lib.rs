//! Directory scanner.
//!
//! Walks a checked-out tree and records which files match the configured
//! extension, visibility, and exclusion rules as a [`DirectoryTree`].

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, instrument, warn};
use walkdir::{DirEntry, WalkDir};

use docpup_shared::{DirectoryTree, DocpupError, Result, ScanConfig, to_posix};

/// Scan `root` and return every selected file grouped by relative directory.
///
/// A missing `root` yields an empty tree. Only a `root` that exists but
/// cannot be read is an error; unreadable subdirectories are logged and
/// skipped.
#[instrument(skip(config), fields(root = %root.display()))]
pub fn scan(root: &Path, config: &ScanConfig) -> Result<DirectoryTree> {
    let mut tree = DirectoryTree::new();

    if !root.exists() {
        debug!("scan root does not exist, nothing to scan");
        return Ok(tree);
    }
    if !root.is_dir() {
        let err = io::Error::new(io::ErrorKind::NotADirectory, "scan root is not a directory");
        return Err(DocpupError::io(root, err));
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || descend_into(e, config));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(DocpupError::io(root, io::Error::from(e))),
            Err(e) => {
                let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                warn!(path = %path, error = %e, "cannot read directory, skipping");
                continue;
            }
        };

        if !is_file_like(&entry) {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !matches_file(&name, config) {
            continue;
        }
        let rel = entry
            .path()
            .parent()
            .and_then(|parent| parent.strip_prefix(root).ok())
            .map(to_posix)
            .unwrap_or_default();
        tree.insert(rel, name.into_owned());
    }

    debug!(
        dirs = tree.dir_count(),
        files = tree.file_count(),
        "scan complete"
    );
    Ok(tree)
}

/// Scan several source roots that live under a common `base`.
///
/// Each root may be a directory (walked with [`scan`]) or a single file
/// (kept if it passes the same extension rules). Results are merged with
/// keys relative to `base`. Relative roots are taken relative to `base`;
/// a root outside `base` is rejected.
#[instrument(skip(roots, config), fields(base = %base.display(), roots = roots.len()))]
pub fn scan_multiple_paths<P: AsRef<Path>>(
    base: &Path,
    roots: &[P],
    config: &ScanConfig,
) -> Result<DirectoryTree> {
    let mut tree = DirectoryTree::new();

    for root in roots {
        let root = root.as_ref();
        let root = if root.is_absolute() {
            root.to_path_buf()
        } else {
            base.join(root)
        };

        let rel = root
            .strip_prefix(base)
            .map_err(|_| DocpupError::PathEscape {
                path: root.clone(),
                root: base.to_path_buf(),
            })?;
        let rel = to_posix(rel);

        if root.is_dir() {
            tree.merge_under(&rel, scan(&root, config)?);
        } else if root.is_file() {
            let (parent, name) = match rel.rsplit_once('/') {
                Some((parent, name)) => (parent.to_string(), name.to_string()),
                None => (String::new(), rel.clone()),
            };
            if matches_file(&name, config) {
                tree.insert(parent, name);
            } else {
                debug!(file = %rel, "source file does not match scan rules");
            }
        } else {
            debug!(path = %root.display(), "source path missing, skipping");
        }
    }

    Ok(tree)
}

/// Whether a file name passes the extension rules of `config`.
///
/// Explicit extensions match case-insensitively; the md/mdx flags require
/// the exact lowercase `.md` / `.mdx` suffix.
pub fn matches_file(name: &str, config: &ScanConfig) -> bool {
    let Some(ext) = Path::new(name).extension().and_then(|e| e.to_str()) else {
        return false;
    };

    match &config.explicit_extensions {
        Some(allowed) => allowed.contains(&format!(".{}", ext.to_ascii_lowercase())),
        None => (ext == "md" && config.include_markdown) || (ext == "mdx" && config.include_mdx),
    }
}

/// Whether the walker should enter a directory called `name`.
pub fn should_descend(name: &str, config: &ScanConfig) -> bool {
    if name.starts_with('.') && !config.include_hidden_directories {
        return false;
    }
    !config.excluded_directory_names.contains(name)
}

/// Directory filter for the walker. Non-directories always pass.
fn descend_into(entry: &DirEntry, config: &ScanConfig) -> bool {
    if !entry.file_type().is_dir() {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    let descend = should_descend(&name, config);
    if !descend {
        debug!(dir = %name, "skipping directory");
    }
    descend
}

/// Symlinked files count as files; symlinked directories are never followed.
fn is_file_like(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_file() {
        return true;
    }
    file_type.is_symlink() && fs::metadata(entry.path()).is_ok_and(|m| m.is_file())
}
