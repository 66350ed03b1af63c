//! Project configuration for docpup.
//!
//! The config lives in `docpup.toml` at the project root. Relative paths in
//! the file resolve against the directory containing it. Loading validates
//! the whole file up front; any problem is a [`DocpupError::Config`] and
//! aborts the run before a single repository is touched.

use std::collections::{BTreeSet, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DocpupError, Result};
use crate::paths::{is_contained, normalize_relative, to_posix};
use crate::types::{
    ContentType, PreprocessDirective, RepoSpec, SPHINX_MARKDOWN_BUILDER, ScanConfig, ScanOverride,
};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "docpup.toml";

/// Worker pool size when none (or an unusable value) is configured.
pub const DEFAULT_CONCURRENCY: usize = 2;

/// Default header of the managed `.gitignore` section.
pub const DEFAULT_SECTION_HEADER: &str = "docpup generated docs";

static REPO_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("valid regex"));

static EXTENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.?[A-Za-z0-9][A-Za-z0-9_-]*$").expect("valid regex"));

// ---------------------------------------------------------------------------
// File schema (matching docpup.toml)
// ---------------------------------------------------------------------------

/// Raw `docpup.toml` contents, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default = "default_docs_dir")]
    pub docs_dir: String,

    #[serde(default = "default_indices_dir")]
    pub indices_dir: String,

    #[serde(default)]
    pub concurrency: Option<usize>,

    #[serde(default)]
    pub gitignore: GitignoreConfig,

    #[serde(default)]
    pub scan: ScanSection,

    #[serde(default)]
    pub repos: Vec<RepoEntry>,
}

fn default_docs_dir() -> String {
    "documentation".into()
}
fn default_indices_dir() -> String {
    "documentation/indices".into()
}

/// `[gitignore]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitignoreConfig {
    #[serde(default = "default_true")]
    pub add_docs_dir: bool,

    #[serde(default)]
    pub add_docs_sub_dirs: bool,

    #[serde(default)]
    pub add_index_files: bool,

    #[serde(default = "default_section_header")]
    pub section_header: String,
}

impl Default for GitignoreConfig {
    fn default() -> Self {
        Self {
            add_docs_dir: true,
            add_docs_sub_dirs: false,
            add_index_files: false,
            section_header: default_section_header(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_section_header() -> String {
    DEFAULT_SECTION_HEADER.into()
}

/// `[scan]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSection {
    #[serde(default = "default_true")]
    pub include_md: bool,

    #[serde(default = "default_true")]
    pub include_mdx: bool,

    #[serde(default)]
    pub include_hidden_dirs: bool,

    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,

    /// When set, replaces the md/mdx flags entirely.
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            include_md: true,
            include_mdx: true,
            include_hidden_dirs: false,
            exclude_dirs: default_exclude_dirs(),
            extensions: None,
        }
    }
}

fn default_exclude_dirs() -> Vec<String> {
    vec!["node_modules".into()]
}

/// `[repos.scan]`: every field optional, inherited from `[scan]` when unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanOverrideSection {
    #[serde(default)]
    pub include_md: Option<bool>,
    #[serde(default)]
    pub include_mdx: Option<bool>,
    #[serde(default)]
    pub include_hidden_dirs: Option<bool>,
    #[serde(default)]
    pub exclude_dirs: Option<Vec<String>>,
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
}

/// `[[repos]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoEntry {
    pub name: String,
    /// Remote repository URL.
    pub repo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_paths: Option<Vec<String>>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preprocess: Option<PreprocessDirective>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan: Option<ScanOverrideSection>,
    #[serde(default)]
    pub content_type: ContentType,
}

// ---------------------------------------------------------------------------
// Validated config
// ---------------------------------------------------------------------------

/// Validated, immutable project configuration for one run.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Directory relative paths resolve against (where `docpup.toml` lives).
    pub root: PathBuf,
    /// `docs_dir` as written in the config.
    pub docs_dir: String,
    /// `indices_dir` as written in the config.
    pub indices_dir: String,
    pub concurrency: usize,
    pub gitignore: GitignoreConfig,
    pub scan: ScanConfig,
    pub repos: Vec<RepoSpec>,
}

impl ProjectConfig {
    /// Absolute-or-rooted docs output directory.
    pub fn docs_path(&self) -> PathBuf {
        self.root.join(&self.docs_dir)
    }

    pub fn indices_path(&self) -> PathBuf {
        self.root.join(&self.indices_dir)
    }

    /// Output directory owned by a single repository.
    pub fn repo_output_dir(&self, name: &str) -> PathBuf {
        self.docs_path().join(name)
    }

    /// Root path rendered into a repository's index (`./documentation/next`).
    pub fn index_root(&self, name: &str) -> String {
        match display_relative(&self.docs_dir) {
            Some(rel) if rel.is_empty() => format!("./{name}"),
            Some(rel) => format!("./{rel}/{name}"),
            None => format!("{}/{name}", self.docs_dir.trim_end_matches('/')),
        }
    }
}

/// `root.join(path)` with `.` and `..` folded away, without touching the filesystem.
fn lexical_join(root: &Path, path: &str) -> PathBuf {
    let mut out = PathBuf::new();
    for component in root.join(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Posix form of a relative, non-escaping config path; `None` otherwise.
pub fn display_relative(path: &str) -> Option<String> {
    normalize_relative(Path::new(path)).map(|p| to_posix(&p))
}

/// Clamp a requested pool size to a usable value.
pub fn effective_concurrency(requested: Option<usize>) -> usize {
    match requested {
        Some(n) if n > 0 => n,
        Some(n) => {
            tracing::warn!(requested = n, "concurrency must be positive, using default");
            DEFAULT_CONCURRENCY
        }
        None => DEFAULT_CONCURRENCY,
    }
}

impl ConfigFile {
    /// Validate the raw file into a [`ProjectConfig`] rooted at `root`.
    pub fn validate(self, root: &Path) -> Result<ProjectConfig> {
        if self.docs_dir.trim().is_empty() {
            return Err(DocpupError::config("docs_dir must not be empty"));
        }
        if self.indices_dir.trim().is_empty() {
            return Err(DocpupError::config("indices_dir must not be empty"));
        }
        if self.gitignore.section_header.trim().is_empty() {
            return Err(DocpupError::config("gitignore.section_header must not be empty"));
        }
        if self.repos.is_empty() {
            return Err(DocpupError::config("no repos configured"));
        }

        let scan = ScanConfig {
            include_markdown: self.scan.include_md,
            include_mdx: self.scan.include_mdx,
            include_hidden_directories: self.scan.include_hidden_dirs,
            excluded_directory_names: self.scan.exclude_dirs.iter().cloned().collect(),
            explicit_extensions: self
                .scan
                .extensions
                .as_deref()
                .map(normalize_extensions)
                .transpose()?,
        };

        let docs_root = lexical_join(root, &self.docs_dir);
        let indices_root = lexical_join(root, &self.indices_dir);

        let mut seen = HashSet::new();
        let mut repos = Vec::with_capacity(self.repos.len());
        for entry in self.repos {
            let repo = validate_repo(entry)?;
            if !seen.insert(repo.name.clone()) {
                return Err(DocpupError::config(format!(
                    "duplicate repo name '{}'",
                    repo.name
                )));
            }
            // A repo's output dir is reset on every run; it must not touch the indices.
            let output = docs_root.join(&repo.name);
            if output.starts_with(&indices_root) || indices_root.starts_with(&output) {
                return Err(DocpupError::config(format!(
                    "repo '{}': output directory {} overlaps indices_dir '{}'",
                    repo.name,
                    output.display(),
                    self.indices_dir
                )));
            }
            repos.push(repo);
        }

        Ok(ProjectConfig {
            root: root.to_path_buf(),
            docs_dir: self.docs_dir,
            indices_dir: self.indices_dir,
            concurrency: effective_concurrency(self.concurrency),
            gitignore: self.gitignore,
            scan,
            repos,
        })
    }
}

fn validate_repo(entry: RepoEntry) -> Result<RepoSpec> {
    let name = entry.name;
    if !REPO_NAME_RE.is_match(&name) || name == "." || name == ".." {
        return Err(DocpupError::config(format!(
            "invalid repo name '{name}': only letters, digits, '.', '_' and '-' are allowed"
        )));
    }
    if entry.repo.trim().is_empty() {
        return Err(DocpupError::config(format!("repo '{name}': missing repo URL")));
    }

    let source_paths = match (entry.source_path, entry.source_paths) {
        (Some(_), Some(_)) => {
            return Err(DocpupError::config(format!(
                "repo '{name}': set either source_path or source_paths, not both"
            )));
        }
        (Some(path), None) => vec![path],
        (None, Some(paths)) => paths,
        (None, None) => {
            return Err(DocpupError::config(format!(
                "repo '{name}': missing source_path"
            )));
        }
    };
    if source_paths.is_empty() {
        return Err(DocpupError::config(format!(
            "repo '{name}': source_paths must not be empty"
        )));
    }
    for path in &source_paths {
        if path.trim().is_empty() || !is_contained(path) {
            return Err(DocpupError::config(format!(
                "repo '{name}': source path '{path}' must be a relative path inside the repository"
            )));
        }
    }

    let preprocess = match entry.preprocess {
        Some(_) if source_paths.len() > 1 => {
            return Err(DocpupError::config(format!(
                "repo '{name}': preprocess requires exactly one source path"
            )));
        }
        Some(directive) => {
            validate_directive(&name, &directive)?;
            Some(directive.with_default_work_dir(&source_paths[0]))
        }
        None => None,
    };

    let scan_override = entry
        .scan
        .map(|over| -> Result<ScanOverride> {
            Ok(ScanOverride {
                include_markdown: over.include_md,
                include_mdx: over.include_mdx,
                include_hidden_directories: over.include_hidden_dirs,
                excluded_directory_names: over
                    .exclude_dirs
                    .map(|dirs| dirs.into_iter().collect::<BTreeSet<_>>()),
                explicit_extensions: over
                    .extensions
                    .as_deref()
                    .map(normalize_extensions)
                    .transpose()?,
            })
        })
        .transpose()?;

    Ok(RepoSpec {
        name,
        remote: entry.repo,
        source_paths,
        reference: entry.reference.filter(|r| !r.trim().is_empty()),
        preprocess,
        scan_override,
        content_type: entry.content_type,
    })
}

fn validate_directive(name: &str, directive: &PreprocessDirective) -> Result<()> {
    if let Some(work_dir) = directive.work_dir() {
        if !is_contained(work_dir) {
            return Err(DocpupError::config(format!(
                "repo '{name}': preprocess work_dir '{work_dir}' must stay inside the checkout"
            )));
        }
    }
    let output_dir = directive.output_dir();
    match normalize_relative(Path::new(output_dir)) {
        Some(p) if p.as_os_str().is_empty() => {
            return Err(DocpupError::config(format!(
                "repo '{name}': preprocess output_dir must not be the checkout root"
            )));
        }
        Some(_) => {}
        None => {
            return Err(DocpupError::config(format!(
                "repo '{name}': preprocess output_dir '{output_dir}' must stay inside the checkout"
            )));
        }
    }

    match directive {
        PreprocessDirective::Sphinx(sphinx) if sphinx.builder != SPHINX_MARKDOWN_BUILDER => {
            Err(DocpupError::config(format!(
                "repo '{name}': unsupported sphinx builder '{}' (only 'markdown' is supported)",
                sphinx.builder
            )))
        }
        PreprocessDirective::Html(html) => match &html.selector {
            Some(selector) if scraper::Selector::parse(selector).is_err() => {
                Err(DocpupError::config(format!(
                    "repo '{name}': invalid CSS selector '{selector}'"
                )))
            }
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}

/// Normalize a list of configured extensions to lowercase `.ext` form.
pub fn normalize_extensions(exts: &[String]) -> Result<BTreeSet<String>> {
    if exts.is_empty() {
        return Err(DocpupError::config("scan.extensions must not be empty when set"));
    }
    exts.iter().map(|e| normalize_extension(e)).collect()
}

/// Normalize one extension (`MD`, `.md`) to `.md`.
pub fn normalize_extension(ext: &str) -> Result<String> {
    let trimmed = ext.trim();
    if !EXTENSION_RE.is_match(trimmed) {
        return Err(DocpupError::config(format!(
            "invalid extension pattern '{ext}'"
        )));
    }
    let bare = trimmed.trim_start_matches('.').to_ascii_lowercase();
    Ok(format!(".{bare}"))
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Locate `docpup.toml` in `dir`.
pub fn find_config(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.is_file() {
        Ok(path)
    } else {
        Err(DocpupError::config(format!(
            "no {CONFIG_FILE_NAME} found in {} (run `docpup init` or pass --config)",
            dir.display()
        )))
    }
}

/// Load and validate the config at `path`.
pub fn load_config_from(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocpupError::io(path, e))?;
    let root = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let config = parse_config(&content, &root).map_err(|e| match e {
        DocpupError::Config { message } => {
            DocpupError::config(format!("{}: {message}", path.display()))
        }
        other => other,
    })?;

    tracing::debug!(?path, repos = config.repos.len(), "config loaded");
    Ok(config)
}

/// Parse and validate config text.
pub fn parse_config(content: &str, root: &Path) -> Result<ProjectConfig> {
    let file: ConfigFile =
        toml::from_str(content).map_err(|e| DocpupError::config(e.to_string()))?;
    file.validate(root)
}

/// Starter config written by `docpup init`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# docpup configuration
docs_dir = "documentation"
indices_dir = "documentation/indices"
concurrency = 2

[gitignore]
add_docs_dir = true
add_docs_sub_dirs = false
add_index_files = false
section_header = "docpup generated docs"

[scan]
include_md = true
include_mdx = true
include_hidden_dirs = false
exclude_dirs = ["node_modules"]
# extensions = [".md", ".rst"]

[[repos]]
name = "example"
repo = "https://github.com/example/example"
source_path = "docs"
# ref = "main"
# content_type = "docs"
"#;

/// Write a starter `docpup.toml` into `dir`. Refuses to overwrite.
pub fn init_config(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(DocpupError::config(format!(
            "{} already exists",
            path.display()
        )));
    }
    std::fs::write(&path, DEFAULT_CONFIG_TEMPLATE).map_err(|e| DocpupError::io(&path, e))?;
    tracing::info!(?path, "created default config file");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_PREPROCESS_OUTPUT_DIR;

    fn parse(content: &str) -> Result<ProjectConfig> {
        parse_config(content, Path::new("/project"))
    }

    fn err_message(content: &str) -> String {
        parse(content).unwrap_err().to_string()
    }

    #[test]
    fn template_parses() {
        let config = parse(DEFAULT_CONFIG_TEMPLATE).expect("template is valid");
        assert_eq!(config.repos.len(), 1);
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.repos[0].source_paths, vec!["docs".to_string()]);
        assert_eq!(config.repos[0].content_type, ContentType::Docs);
    }

    #[test]
    fn defaults_apply_when_sections_missing() {
        let config = parse(
            r#"
[[repos]]
name = "next"
repo = "https://github.com/vercel/next.js"
source_path = "docs"
"#,
        )
        .unwrap();

        assert_eq!(config.docs_dir, "documentation");
        assert_eq!(config.indices_dir, "documentation/indices");
        assert!(config.gitignore.add_docs_dir);
        assert_eq!(config.gitignore.section_header, DEFAULT_SECTION_HEADER);
        assert!(config.scan.include_markdown);
        assert!(config.scan.excluded_directory_names.contains("node_modules"));
        assert_eq!(config.repo_output_dir("next"), PathBuf::from("/project/documentation/next"));
    }

    #[test]
    fn full_repo_entry() {
        let config = parse(
            r#"
concurrency = 4

[scan]
extensions = ["MD", ".rst"]

[[repos]]
name = "py_lib.v2"
repo = "https://example.com/lib.git"
source_path = "docs"
ref = "v2.0"
content_type = "source"

[repos.preprocess]
kind = "sphinx"

[repos.scan]
include_hidden_dirs = true
exclude_dirs = ["_static"]
"#,
        )
        .unwrap();

        assert_eq!(config.concurrency, 4);
        let exts = config.scan.explicit_extensions.as_ref().unwrap();
        assert!(exts.contains(".md") && exts.contains(".rst"));

        let repo = &config.repos[0];
        assert_eq!(repo.reference.as_deref(), Some("v2.0"));
        assert_eq!(repo.content_type, ContentType::Source);
        let directive = repo.preprocess.as_ref().unwrap();
        assert_eq!(directive.work_dir(), Some("docs"));
        assert_eq!(directive.output_dir(), DEFAULT_PREPROCESS_OUTPUT_DIR);

        let effective = repo.scan_config(&config.scan);
        assert!(effective.include_hidden_directories);
        assert!(effective.excluded_directory_names.contains("_static"));
        assert!(!effective.excluded_directory_names.contains("node_modules"));
    }

    #[test]
    fn rejects_invalid_names() {
        let msg = err_message(
            r#"
[[repos]]
name = "bad name"
repo = "x"
source_path = "docs"
"#,
        );
        assert!(msg.contains("invalid repo name"));

        let msg = err_message(
            r#"
[[repos]]
name = ".."
repo = "x"
source_path = "docs"
"#,
        );
        assert!(msg.contains("invalid repo name"));
    }

    #[test]
    fn rejects_duplicate_names() {
        let msg = err_message(
            r#"
[[repos]]
name = "a"
repo = "x"
source_path = "docs"

[[repos]]
name = "a"
repo = "y"
source_path = "docs"
"#,
        );
        assert!(msg.contains("duplicate repo name 'a'"));
    }

    #[test]
    fn rejects_repo_output_overlapping_indices() {
        let msg = err_message(
            r#"
[[repos]]
name = "alpha"
repo = "x"
source_path = "docs"

[[repos]]
name = "indices"
repo = "y"
source_path = "docs"
"#,
        );
        assert!(msg.contains("repo 'indices'"), "{msg}");
        assert!(msg.contains("overlaps indices_dir"), "{msg}");

        // indices_dir nested below a repo's output dir
        let msg = err_message(
            r#"
indices_dir = "./documentation/next/idx"

[[repos]]
name = "next"
repo = "x"
source_path = "docs"
"#,
        );
        assert!(msg.contains("overlaps indices_dir"), "{msg}");

        // repo output nested below indices_dir
        let msg = err_message(
            r#"
docs_dir = "out/indices/../indices/docs"
indices_dir = "out/indices"

[[repos]]
name = "next"
repo = "x"
source_path = "docs"
"#,
        );
        assert!(msg.contains("overlaps indices_dir"), "{msg}");
    }

    #[test]
    fn sibling_indices_dir_is_accepted() {
        let config = parse(
            r#"
[[repos]]
name = "indices-archive"
repo = "x"
source_path = "docs"
"#,
        )
        .unwrap();
        assert_eq!(config.repos[0].name, "indices-archive");
    }

    #[test]
    fn rejects_preprocess_with_multiple_paths() {
        let msg = err_message(
            r#"
[[repos]]
name = "a"
repo = "x"
source_paths = ["docs", "guides"]

[repos.preprocess]
kind = "html"
"#,
        );
        assert!(msg.contains("exactly one source path"));
    }

    #[test]
    fn rejects_unsupported_builder() {
        let msg = err_message(
            r#"
[[repos]]
name = "a"
repo = "x"
source_path = "docs"

[repos.preprocess]
kind = "sphinx"
builder = "html"
"#,
        );
        assert!(msg.contains("unsupported sphinx builder"));
    }

    #[test]
    fn rejects_escaping_preprocess_paths() {
        let msg = err_message(
            r#"
[[repos]]
name = "a"
repo = "x"
source_path = "docs"

[repos.preprocess]
kind = "html"
output_dir = "../outside"
"#,
        );
        assert!(msg.contains("must stay inside the checkout"));
    }

    #[test]
    fn rejects_invalid_selector() {
        let msg = err_message(
            r#"
[[repos]]
name = "a"
repo = "x"
source_path = "docs"

[repos.preprocess]
kind = "html"
selector = "div[["
"#,
        );
        assert!(msg.contains("invalid CSS selector"));
    }

    #[test]
    fn rejects_bad_extensions() {
        let msg = err_message(
            r#"
[scan]
extensions = ["*.md"]

[[repos]]
name = "a"
repo = "x"
source_path = "docs"
"#,
        );
        assert!(msg.contains("invalid extension pattern"));
    }

    #[test]
    fn rejects_both_source_forms_and_escaping_paths() {
        let both = err_message(
            r#"
[[repos]]
name = "a"
repo = "x"
source_path = "docs"
source_paths = ["docs"]
"#,
        );
        assert!(both.contains("not both"));

        let escaping = err_message(
            r#"
[[repos]]
name = "a"
repo = "x"
source_path = "../docs"
"#,
        );
        assert!(escaping.contains("inside the repository"));
    }

    #[test]
    fn zero_concurrency_falls_back_to_default() {
        let config = parse(
            r#"
concurrency = 0

[[repos]]
name = "a"
repo = "x"
source_path = "docs"
"#,
        )
        .unwrap();
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
    }

    #[test]
    fn index_root_rendering() {
        let mut config = parse(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.index_root("next"), "./documentation/next");

        config.docs_dir = "./docs/".into();
        assert_eq!(config.index_root("next"), "./docs/next");

        config.docs_dir = "/var/docs/".into();
        assert_eq!(config.index_root("next"), "/var/docs/next");
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let path = init_config(tmp.path()).unwrap();
        assert!(path.ends_with(CONFIG_FILE_NAME));
        assert!(find_config(tmp.path()).is_ok());

        let err = init_config(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn load_prefixes_errors_with_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "repos = []").unwrap();

        let err = load_config_from(&path).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("no repos configured"));
        assert!(msg.contains(CONFIG_FILE_NAME));
    }
}
