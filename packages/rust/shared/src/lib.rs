//! Shared types, error model, and configuration for docpup.
//!
//! This crate is the foundation depended on by all other docpup crates.
//! It provides:
//! - [`DocpupError`], the unified error type
//! - Domain types ([`ScanConfig`], [`DirectoryTree`], [`RepoSpec`], [`PreprocessDirective`])
//! - Configuration ([`ProjectConfig`], config loading and validation)
//! - Lexical path containment helpers

pub mod config;
pub mod error;
pub mod paths;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    CONFIG_FILE_NAME, ConfigFile, DEFAULT_CONCURRENCY, GitignoreConfig, ProjectConfig,
    effective_concurrency, find_config, init_config, load_config_from, parse_config,
};
pub use error::{DocpupError, Result};
pub use paths::{is_contained, resolve_within, to_posix};
pub use types::{
    CheckoutRequest, ContentType, DEFAULT_PREPROCESS_OUTPUT_DIR, DirectoryTree, HtmlDirective,
    PreprocessDirective, RepoSpec, ScanConfig, ScanOverride, SphinxDirective, join_posix,
};
