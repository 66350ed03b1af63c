//! Preprocessing: turn a checkout that is not Markdown into Markdown.
//!
//! Each directive kind resolves its work and output directories against the
//! checkout root, clears the output directory, and returns the directory the
//! scanner should walk next.

pub mod html;
pub mod sphinx;

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use docpup_shared::{DocpupError, PreprocessDirective, Result, resolve_within};

/// Run `directive` (if any) against `checkout_root`.
///
/// Without a directive the checkout root is returned unchanged.
#[instrument(skip(directive), fields(checkout = %checkout_root.display(), kind = tracing::field::Empty))]
pub fn preprocess(checkout_root: &Path, directive: Option<&PreprocessDirective>) -> Result<PathBuf> {
    let Some(directive) = directive else {
        return Ok(checkout_root.to_path_buf());
    };
    tracing::Span::current().record("kind", directive.kind());

    let output = match directive {
        PreprocessDirective::Sphinx(d) => sphinx::run(checkout_root, d)?,
        PreprocessDirective::Html(d) => html::run(checkout_root, d)?,
    };

    info!(output = %output.display(), "preprocess finished");
    Ok(output)
}

/// Work and output directories of a directive, both inside the checkout.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedDirs {
    pub work_dir: PathBuf,
    pub output_dir: PathBuf,
}

/// Resolve and sanity-check a directive's directories.
///
/// The work directory must exist, and must not sit inside the output
/// directory, since the output directory is wiped before every run.
pub(crate) fn resolve_dirs(
    checkout_root: &Path,
    work_dir: Option<&str>,
    output_dir: &str,
) -> Result<ResolvedDirs> {
    let work_rel = work_dir.unwrap_or(".");
    let work_dir = resolve_within(checkout_root, work_rel).map_err(|_| {
        DocpupError::config(format!(
            "preprocess work_dir '{work_rel}' resolves outside the checkout"
        ))
    })?;
    let output_dir = resolve_within(checkout_root, output_dir).map_err(|_| {
        DocpupError::config(format!(
            "preprocess output_dir '{output_dir}' resolves outside the checkout"
        ))
    })?;

    if output_dir == checkout_root {
        return Err(DocpupError::config(
            "preprocess output_dir must not be the checkout root",
        ));
    }
    if work_dir.starts_with(&output_dir) {
        return Err(DocpupError::config(
            "preprocess work_dir must not be inside output_dir",
        ));
    }
    if !work_dir.is_dir() {
        return Err(DocpupError::WorkDirNotFound { path: work_dir });
    }

    Ok(ResolvedDirs {
        work_dir,
        output_dir,
    })
}
