//! Error types for docpup.
//!
//! Library crates use [`DocpupError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docpup operations.
#[derive(Debug, thiserror::Error)]
pub enum DocpupError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Remote checkout failed (unreachable remote, unknown ref, missing path).
    #[error("checkout failed: {0}")]
    Checkout(String),

    /// A preprocessing step failed.
    #[error("preprocess failed: {message}")]
    Preprocess { message: String },

    /// The preprocess work directory does not exist or is not a directory.
    #[error("preprocess workDir not found: {path:?}")]
    WorkDirNotFound { path: PathBuf },

    /// Preprocessing finished without writing a single Markdown file.
    #[error("preprocess produced no markdown files from {work_dir:?}")]
    NoMarkdownProduced { work_dir: PathBuf },

    /// A configured or derived path resolves outside of its allowed root.
    #[error("path {path:?} escapes {root:?}")]
    PathEscape { path: PathBuf, root: PathBuf },

    /// HTML-to-Markdown conversion error.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// A background worker failed before it could report a result.
    #[error("worker task failed: {0}")]
    Task(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocpupError>;

impl DocpupError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a preprocess error from any displayable message.
    pub fn preprocess(msg: impl Into<String>) -> Self {
        Self::Preprocess {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = DocpupError::config("duplicate repo name 'next'");
        assert_eq!(err.to_string(), "config error: duplicate repo name 'next'");

        let err = DocpupError::NoMarkdownProduced {
            work_dir: PathBuf::from("/tmp/site"),
        };
        assert!(err.to_string().contains("produced no markdown files"));
    }

    #[test]
    fn workdir_not_found_mentions_path() {
        let err = DocpupError::WorkDirNotFound {
            path: PathBuf::from("docs/_build/html"),
        };
        let msg = err.to_string();
        assert!(msg.contains("workDir not found"));
        assert!(msg.contains("docs/_build/html"));
    }
}
