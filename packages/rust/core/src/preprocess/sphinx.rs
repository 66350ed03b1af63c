//! Sphinx preprocessing via `python -m sphinx -b markdown`.
//!
//! Requires the `sphinx` and `sphinx-markdown-builder` Python packages on
//! the configured interpreter. Common failures are recognized from the
//! process output and reported with an install hint.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info, instrument};

use docpup_shared::types::SPHINX_MARKDOWN_BUILDER;
use docpup_shared::{DocpupError, Result, SphinxDirective};

use super::resolve_dirs;
use crate::assembler::reset_dir;

const INSTALL_HINT: &str = "pip install sphinx sphinx-markdown-builder";

/// Why a sphinx invocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SphinxFailure {
    InterpreterNotFound,
    ExtensionNotInstalled,
    BuilderUnavailable,
    Other,
}

/// Build the work directory into Markdown under the output directory.
#[instrument(skip(directive), fields(checkout = %checkout_root.display(), python = %directive.python))]
pub fn run(checkout_root: &Path, directive: &SphinxDirective) -> Result<PathBuf> {
    if directive.builder != SPHINX_MARKDOWN_BUILDER {
        return Err(DocpupError::preprocess(format!(
            "unsupported sphinx builder '{}' (only '{SPHINX_MARKDOWN_BUILDER}' is supported)",
            directive.builder
        )));
    }

    let dirs = resolve_dirs(
        checkout_root,
        directive.work_dir.as_deref(),
        &directive.output_dir,
    )?;
    reset_dir(&dirs.output_dir)?;

    debug!(
        work_dir = %dirs.work_dir.display(),
        output_dir = %dirs.output_dir.display(),
        "running sphinx"
    );
    let output = Command::new(&directive.python)
        .args(["-m", "sphinx", "-b", SPHINX_MARKDOWN_BUILDER])
        .arg(&dirs.work_dir)
        .arg(&dirs.output_dir)
        .current_dir(checkout_root)
        .stdin(Stdio::null())
        .output();

    let output = match output {
        Ok(output) => output,
        Err(e) => {
            let kind = classify(&e.to_string(), e.kind() == ErrorKind::NotFound);
            return Err(failure_error(kind, &directive.python, &e.to_string()));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let raw = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        let kind = classify(&format!("{stderr}\n{stdout}"), false);
        return Err(failure_error(kind, &directive.python, &raw));
    }

    info!(output_dir = %dirs.output_dir.display(), "sphinx build succeeded");
    Ok(dirs.output_dir)
}

/// Recognize a failure from the combined process output.
pub fn classify(output: &str, spawn_not_found: bool) -> SphinxFailure {
    let text = output.to_lowercase();
    if spawn_not_found
        || text.contains("command not found")
        || text.contains("is not recognized as an internal or external command")
    {
        SphinxFailure::InterpreterNotFound
    } else if text.contains("builder name markdown not registered")
        || (text.contains("builder") && text.contains("not registered"))
    {
        SphinxFailure::BuilderUnavailable
    } else if text.contains("no module named") || text.contains("could not import extension") {
        SphinxFailure::ExtensionNotInstalled
    } else {
        SphinxFailure::Other
    }
}

fn failure_error(kind: SphinxFailure, python: &str, raw: &str) -> DocpupError {
    let message = match kind {
        SphinxFailure::InterpreterNotFound => format!(
            "python interpreter '{python}' was not found; install Python 3 or set `python` in the preprocess config"
        ),
        SphinxFailure::ExtensionNotInstalled => {
            format!("sphinx or its markdown builder is not installed for '{python}'; run: {INSTALL_HINT}")
        }
        SphinxFailure::BuilderUnavailable => format!(
            "the sphinx 'markdown' builder is unavailable; run: {INSTALL_HINT} and enable sphinx_markdown_builder in conf.py"
        ),
        SphinxFailure::Other => format!("sphinx build failed: {raw}"),
    };
    DocpupError::preprocess(message)
}
