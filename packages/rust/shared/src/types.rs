//! Core domain types shared by the scanner, preprocessors, and orchestrator.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Output directory used by preprocessors when none is configured.
pub const DEFAULT_PREPROCESS_OUTPUT_DIR: &str = "docpup-build";

/// The only Sphinx builder docpup knows how to consume.
pub const SPHINX_MARKDOWN_BUILDER: &str = "markdown";

// ---------------------------------------------------------------------------
// ContentType
// ---------------------------------------------------------------------------

/// Whether a repository contributes documentation or source code.
///
/// Controls the index title and warning wording.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Docs,
    Source,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Docs => "docs",
            Self::Source => "source",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ScanConfig
// ---------------------------------------------------------------------------

/// File selection rules applied by the scanner.
///
/// When `explicit_extensions` is set it fully replaces the md/mdx flags.
/// Extensions are stored lowercase with a leading dot (`.rst`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub include_markdown: bool,
    pub include_mdx: bool,
    pub include_hidden_directories: bool,
    /// Directory names skipped wherever they appear (case-sensitive).
    pub excluded_directory_names: BTreeSet<String>,
    pub explicit_extensions: Option<BTreeSet<String>>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include_markdown: true,
            include_mdx: true,
            include_hidden_directories: false,
            excluded_directory_names: BTreeSet::from(["node_modules".to_string()]),
            explicit_extensions: None,
        }
    }
}

impl ScanConfig {
    /// Apply a per-repository override on top of these rules.
    ///
    /// Fields left unset in the override keep their current value; set
    /// collections replace (rather than extend) the inherited ones.
    pub fn with_override(&self, over: &ScanOverride) -> Self {
        Self {
            include_markdown: over.include_markdown.unwrap_or(self.include_markdown),
            include_mdx: over.include_mdx.unwrap_or(self.include_mdx),
            include_hidden_directories: over
                .include_hidden_directories
                .unwrap_or(self.include_hidden_directories),
            excluded_directory_names: over
                .excluded_directory_names
                .clone()
                .unwrap_or_else(|| self.excluded_directory_names.clone()),
            explicit_extensions: over
                .explicit_extensions
                .clone()
                .or_else(|| self.explicit_extensions.clone()),
        }
    }
}

/// A partial [`ScanConfig`] attached to a single repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOverride {
    pub include_markdown: Option<bool>,
    pub include_mdx: Option<bool>,
    pub include_hidden_directories: Option<bool>,
    pub excluded_directory_names: Option<BTreeSet<String>>,
    pub explicit_extensions: Option<BTreeSet<String>>,
}

// ---------------------------------------------------------------------------
// PreprocessDirective
// ---------------------------------------------------------------------------

/// Conversion step that turns a non-Markdown checkout into Markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PreprocessDirective {
    Sphinx(SphinxDirective),
    Html(HtmlDirective),
}

impl PreprocessDirective {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sphinx(_) => "sphinx",
            Self::Html(_) => "html",
        }
    }

    /// Configured work directory, relative to the checkout root.
    pub fn work_dir(&self) -> Option<&str> {
        match self {
            Self::Sphinx(d) => d.work_dir.as_deref(),
            Self::Html(d) => d.work_dir.as_deref(),
        }
    }

    /// Output directory, relative to the checkout root.
    pub fn output_dir(&self) -> &str {
        match self {
            Self::Sphinx(d) => &d.output_dir,
            Self::Html(d) => &d.output_dir,
        }
    }

    /// Fill in `work_dir` from the repository's single source path when unset.
    pub fn with_default_work_dir(mut self, source_path: &str) -> Self {
        let slot = match &mut self {
            Self::Sphinx(d) => &mut d.work_dir,
            Self::Html(d) => &mut d.work_dir,
        };
        if slot.is_none() {
            *slot = Some(source_path.to_string());
        }
        self
    }
}

/// Run `sphinx-build` with the Markdown builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SphinxDirective {
    #[serde(default)]
    pub work_dir: Option<String>,
    #[serde(default = "default_builder")]
    pub builder: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Python interpreter used to run `-m sphinx`.
    #[serde(default = "default_python")]
    pub python: String,
}

/// Convert a tree of HTML files into Markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlDirective {
    #[serde(default)]
    pub work_dir: Option<String>,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// CSS selector for the content root; falls back to well-known containers.
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default = "default_true")]
    pub rewrite_links: bool,
}

fn default_builder() -> String {
    SPHINX_MARKDOWN_BUILDER.into()
}
fn default_output_dir() -> String {
    DEFAULT_PREPROCESS_OUTPUT_DIR.into()
}
fn default_python() -> String {
    "python3".into()
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// RepoSpec
// ---------------------------------------------------------------------------

/// A validated repository entry, immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSpec {
    /// Unique name matching `[A-Za-z0-9._-]+`.
    pub name: String,
    /// Remote URL handed to the checkout provider.
    pub remote: String,
    /// Repo-relative paths to fetch (never empty).
    pub source_paths: Vec<String>,
    pub reference: Option<String>,
    /// Only present when `source_paths` has exactly one entry.
    pub preprocess: Option<PreprocessDirective>,
    pub scan_override: Option<ScanOverride>,
    pub content_type: ContentType,
}

impl RepoSpec {
    /// Effective scan rules for this repository.
    pub fn scan_config(&self, global: &ScanConfig) -> ScanConfig {
        match &self.scan_override {
            Some(over) => global.with_override(over),
            None => global.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// DirectoryTree
// ---------------------------------------------------------------------------

/// Relative directory path (posix, `""` for the root) → selected file names.
///
/// Only directories with at least one selected file have an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryTree {
    dirs: BTreeMap<String, Vec<String>>,
}

impl DirectoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `file` as present in `dir`. File lists stay sorted and unique.
    pub fn insert(&mut self, dir: impl Into<String>, file: impl Into<String>) {
        let files = self.dirs.entry(dir.into()).or_default();
        let file = file.into();
        // Walk order is already sorted, so the common case is a push.
        match files.last() {
            None => files.push(file),
            Some(last) if *last < file => files.push(file),
            _ => {
                if let Err(pos) = files.binary_search(&file) {
                    files.insert(pos, file);
                }
            }
        }
    }

    pub fn files(&self, dir: &str) -> Option<&[String]> {
        self.dirs.get(dir).map(Vec::as_slice)
    }

    pub fn contains_dir(&self, dir: &str) -> bool {
        self.dirs.contains_key(dir)
    }

    /// Iterate `(directory, files)` pairs in directory order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.dirs.iter().map(|(d, f)| (d.as_str(), f.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Number of directories with at least one file.
    pub fn dir_count(&self) -> usize {
        self.dirs.len()
    }

    pub fn file_count(&self) -> usize {
        self.dirs.values().map(Vec::len).sum()
    }

    /// Merge `other` into this tree with every directory key placed under `prefix`.
    pub fn merge_under(&mut self, prefix: &str, other: DirectoryTree) {
        for (dir, files) in other.dirs {
            let key = join_posix(prefix, &dir);
            for file in files {
                self.insert(key.clone(), file);
            }
        }
    }
}

/// Join two posix path fragments, treating `""` as the identity.
pub fn join_posix(prefix: &str, rest: &str) -> String {
    match (prefix.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}/{rest}"),
    }
}

// ---------------------------------------------------------------------------
// Checkout
// ---------------------------------------------------------------------------

/// Input to a checkout provider.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub remote: String,
    pub paths: Vec<String>,
    pub reference: Option<String>,
    /// Empty directory the provider populates.
    pub destination: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_replaces_only_set_fields() {
        let global = ScanConfig::default();
        let over = ScanOverride {
            include_mdx: Some(false),
            explicit_extensions: Some(BTreeSet::from([".rst".to_string()])),
            ..Default::default()
        };

        let merged = global.with_override(&over);
        assert!(merged.include_markdown);
        assert!(!merged.include_mdx);
        assert_eq!(merged.excluded_directory_names, global.excluded_directory_names);
        assert!(merged.explicit_extensions.unwrap().contains(".rst"));
    }

    #[test]
    fn preprocess_directive_defaults() {
        let directive: PreprocessDirective = toml::from_str("kind = \"html\"").expect("parse");
        match directive {
            PreprocessDirective::Html(html) => {
                assert_eq!(html.output_dir, DEFAULT_PREPROCESS_OUTPUT_DIR);
                assert!(html.rewrite_links);
                assert!(html.selector.is_none());
            }
            other => panic!("unexpected directive: {other:?}"),
        }

        let directive: PreprocessDirective = toml::from_str("kind = \"sphinx\"").expect("parse");
        assert_eq!(directive.kind(), "sphinx");
        assert_eq!(directive.output_dir(), DEFAULT_PREPROCESS_OUTPUT_DIR);
    }

    #[test]
    fn default_work_dir_only_fills_missing() {
        let directive: PreprocessDirective =
            toml::from_str("kind = \"html\"\nwork_dir = \"site\"").expect("parse");
        assert_eq!(directive.with_default_work_dir("docs").work_dir(), Some("site"));

        let directive: PreprocessDirective = toml::from_str("kind = \"sphinx\"").expect("parse");
        assert_eq!(directive.with_default_work_dir("docs").work_dir(), Some("docs"));
    }

    #[test]
    fn tree_merge_under_prefixes_keys() {
        let mut inner = DirectoryTree::new();
        inner.insert("", "index.md");
        inner.insert("guide", "intro.md");

        let mut tree = DirectoryTree::new();
        tree.merge_under("docs", inner);
        tree.insert("", "README.md");

        assert_eq!(tree.files("docs"), Some(&["index.md".to_string()][..]));
        assert!(tree.contains_dir("docs/guide"));
        assert_eq!(tree.file_count(), 3);
        assert_eq!(tree.dir_count(), 3);
    }

    #[test]
    fn tree_ignores_duplicate_files() {
        let mut tree = DirectoryTree::new();
        tree.insert("", "a.md");
        tree.insert("", "a.md");
        assert_eq!(tree.file_count(), 1);
    }

    #[test]
    fn tree_keeps_files_sorted_and_unique() {
        let mut tree = DirectoryTree::new();
        for name in ["c.md", "a.md", "b.md", "a.md", "c.md", "d.md"] {
            tree.insert("guide", name);
        }
        let files: Vec<&str> = tree
            .files("guide")
            .unwrap_or_default()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(files, vec!["a.md", "b.md", "c.md", "d.md"]);
    }

    #[test]
    fn large_directory_inserts_stay_deduplicated() {
        let mut tree = DirectoryTree::new();
        for round in 0..2 {
            for i in 0..5_000 {
                tree.insert("api", format!("page{i:05}.md"));
            }
            assert_eq!(tree.file_count(), 5_000, "round {round}");
        }
    }
}
