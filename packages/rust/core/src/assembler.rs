//! Output directory assembly.
//!
//! Copies the files selected by a scan from the checkout (or preprocess
//! output) into the repository's own output directory, preserving the
//! relative layout recorded in the [`DirectoryTree`].

use std::path::Path;

use tracing::{debug, info, instrument};

use docpup_shared::{DirectoryTree, DocpupError, Result, join_posix, resolve_within};

/// Remove `dir` if present and create it again, empty.
pub fn reset_dir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => debug!(dir = %dir.display(), "removed previous output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(DocpupError::io(dir, e)),
    }
    std::fs::create_dir_all(dir).map_err(|e| DocpupError::io(dir, e))
}

/// Copy every file in `tree` from `source_root` into `dest_root`.
///
/// Both sides are resolved lexically; a tree entry that would land outside
/// either root fails with [`DocpupError::PathEscape`]. Returns the number
/// of files copied.
#[instrument(skip(tree), fields(source = %source_root.display(), dest = %dest_root.display()))]
pub fn copy_tree(tree: &DirectoryTree, source_root: &Path, dest_root: &Path) -> Result<usize> {
    let mut copied = 0usize;

    for (dir, files) in tree.iter() {
        let dest_dir = resolve_within(dest_root, dir)?;
        std::fs::create_dir_all(&dest_dir).map_err(|e| DocpupError::io(&dest_dir, e))?;

        for file in files {
            let rel = join_posix(dir, file);
            let from = resolve_within(source_root, &rel)?;
            let to = resolve_within(dest_root, &rel)?;
            std::fs::copy(&from, &to).map_err(|e| DocpupError::io(&from, e))?;
            copied += 1;
        }
    }

    info!(files = copied, "copied selected files");
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn copies_nested_layout() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        write(&src.path().join("index.md"), "# Home");
        write(&src.path().join("guide/intro.md"), "# Intro");
        write(&src.path().join("guide/skip.txt"), "not selected");

        let mut tree = DirectoryTree::new();
        tree.insert("", "index.md");
        tree.insert("guide", "intro.md");

        let count = copy_tree(&tree, src.path(), dst.path()).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            std::fs::read_to_string(dst.path().join("guide/intro.md")).unwrap(),
            "# Intro"
        );
        assert!(dst.path().join("index.md").exists());
        assert!(!dst.path().join("guide/skip.txt").exists());
    }

    #[test]
    fn escaping_entry_is_rejected() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let mut tree = DirectoryTree::new();
        tree.insert("../outside", "a.md");

        let err = copy_tree(&tree, src.path(), dst.path()).unwrap_err();
        assert!(matches!(err, DocpupError::PathEscape { .. }));
    }

    #[test]
    fn missing_source_file_is_io_error() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let mut tree = DirectoryTree::new();
        tree.insert("", "gone.md");

        let err = copy_tree(&tree, src.path(), dst.path()).unwrap_err();
        assert!(matches!(err, DocpupError::Io { .. }));
    }

    #[test]
    fn reset_dir_clears_stale_files() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        write(&out.join("stale/old.md"), "old");

        reset_dir(&out).unwrap();
        assert!(out.is_dir());
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);

        // Missing directories are simply created.
        let fresh = tmp.path().join("fresh/nested");
        reset_dir(&fresh).unwrap();
        assert!(fresh.is_dir());
    }
}
