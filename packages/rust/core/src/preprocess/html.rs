//! HTML tree → Markdown tree conversion.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use docpup_markdown::{ConvertOptions, convert};
use docpup_shared::{DocpupError, HtmlDirective, Result};

use super::resolve_dirs;
use crate::assembler::reset_dir;

/// Convert every `.html`/`.htm` file under the work directory into a `.md`
/// file at the same relative location under the output directory.
///
/// Files that fail to read, convert or write are logged and skipped. Fails
/// with [`DocpupError::NoMarkdownProduced`] when nothing was written.
#[instrument(skip(directive), fields(checkout = %checkout_root.display()))]
pub fn run(checkout_root: &Path, directive: &HtmlDirective) -> Result<PathBuf> {
    let dirs = resolve_dirs(
        checkout_root,
        directive.work_dir.as_deref(),
        &directive.output_dir,
    )?;
    reset_dir(&dirs.output_dir)?;

    let pages = collect_html_files(&dirs.work_dir, &dirs.output_dir)?;
    if pages.is_empty() {
        return Err(DocpupError::NoMarkdownProduced {
            work_dir: dirs.work_dir,
        });
    }

    let opts = ConvertOptions {
        selector: directive.selector.clone(),
        rewrite_links: directive.rewrite_links,
    };

    let mut written = 0usize;
    for page in &pages {
        match convert_page(page, &dirs.work_dir, &dirs.output_dir, &opts) {
            Ok(target) => {
                debug!(page = %page.display(), target = %target.display(), "converted page");
                written += 1;
            }
            Err(e) => warn!(page = %page.display(), error = %e, "skipping page"),
        }
    }

    if written == 0 {
        return Err(DocpupError::NoMarkdownProduced {
            work_dir: dirs.work_dir,
        });
    }

    info!(pages = pages.len(), written, "html conversion complete");
    Ok(dirs.output_dir)
}

fn convert_page(
    page: &Path,
    work_dir: &Path,
    output_dir: &Path,
    opts: &ConvertOptions,
) -> Result<PathBuf> {
    let bytes = std::fs::read(page).map_err(|e| DocpupError::io(page, e))?;
    let html = String::from_utf8_lossy(&bytes);
    let result = convert(&html, opts)?;

    let rel = page.strip_prefix(work_dir).map_err(|_| DocpupError::PathEscape {
        path: page.to_path_buf(),
        root: work_dir.to_path_buf(),
    })?;
    let target = output_dir.join(rel).with_extension("md");
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DocpupError::io(parent, e))?;
    }
    std::fs::write(&target, result.markdown).map_err(|e| DocpupError::io(&target, e))?;
    Ok(target)
}

/// Sorted list of HTML files under `work_dir`.
///
/// Hidden directories and the output subtree are skipped.
fn collect_html_files(work_dir: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(work_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e.file_type().is_dir()
                || !(e.file_name().to_string_lossy().starts_with('.') || e.path() == output_dir)
        });

    let mut found = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(DocpupError::io(work_dir, std::io::Error::from(e)));
            }
            Err(e) => {
                warn!(error = %e, "cannot read directory, skipping");
                continue;
            }
        };
        if entry.file_type().is_file() && is_html(&entry.file_name().to_string_lossy()) {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

fn is_html(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
}
