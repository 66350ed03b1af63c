//! Idempotent `.gitignore` merging.
//!
//! Generated paths are grouped under a `# <section header>` comment. Lines
//! outside that section are never reordered or removed, and an entry that
//! already appears anywhere in the file (after trimming) is not added again.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use docpup_shared::{DocpupError, ProjectConfig, RepoSpec, Result};
use docpup_shared::config::display_relative;

pub const GITIGNORE_FILE: &str = ".gitignore";

/// Merge `entries` into `<root>/.gitignore` under `# <section_header>`.
///
/// Returns `true` when the file was written. Nothing is written when every
/// entry is empty or already present.
#[instrument(skip(entries), fields(root = %root.display(), entries = entries.len()))]
pub fn update_ignore(root: &Path, entries: &[String], section_header: &str) -> Result<bool> {
    let path = root.join(GITIGNORE_FILE);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(DocpupError::io(&path, e)),
    };

    let Some(merged) = merge_entries(&content, entries, section_header) else {
        debug!(path = %path.display(), "gitignore already up to date");
        return Ok(false);
    };

    std::fs::write(&path, &merged).map_err(|e| DocpupError::io(&path, e))?;
    info!(path = %path.display(), "updated gitignore");
    Ok(true)
}

/// Pure merge step: `None` when `content` needs no change.
///
/// The header line must match `# <section_header>` exactly. CRLF files stay CRLF.
pub fn merge_entries(content: &str, entries: &[String], section_header: &str) -> Option<String> {
    let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
    let present: HashSet<&str> = lines.iter().map(|l| l.trim()).collect();

    let mut seen = HashSet::new();
    let fresh: Vec<String> = entries
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty() && !present.contains(e) && seen.insert(*e))
        .map(str::to_string)
        .collect();
    if fresh.is_empty() {
        return None;
    }

    let header = format!("# {section_header}");
    let header_idx = match lines.iter().position(|l| *l == header) {
        Some(idx) => idx,
        None => {
            if lines.last().is_some_and(|l| !l.trim().is_empty()) {
                lines.push(String::new());
            }
            lines.push(header);
            lines.len() - 1
        }
    };

    let at = header_idx + 1;
    lines.splice(at..at, fresh);

    let mut out = lines.join(newline);
    let trimmed = out.trim_end_matches(['\r', '\n']).len();
    out.truncate(trimmed);
    out.push_str(newline);
    Some(out)
}

/// Entries to ignore for `repos`, according to the gitignore toggles.
///
/// A docs directory equal to the project root is never ignored wholesale;
/// per-repo entries are then bare `<name>/`.
pub fn derive_entries(config: &ProjectConfig, repos: &[RepoSpec]) -> Vec<String> {
    let flags = &config.gitignore;
    let mut entries = Vec::new();

    let docs = display_relative(&config.docs_dir);
    let indices = display_relative(&config.indices_dir);

    if flags.add_docs_dir {
        match docs.as_deref() {
            Some(d) if !d.is_empty() => entries.push(format!("{d}/")),
            _ => debug!(docs_dir = %config.docs_dir, "docs dir is not ignorable as a whole"),
        }
    }

    if flags.add_docs_sub_dirs {
        if let Some(d) = docs.as_deref() {
            entries.extend(repos.iter().map(|r| prefixed(d, &format!("{}/", r.name))));
        }
    }

    if flags.add_index_files {
        if let Some(i) = indices.as_deref() {
            entries.extend(repos.iter().map(|r| prefixed(i, &format!("{}-index.md", r.name))));
        }
    }

    entries
}

fn prefixed(dir: &str, rest: &str) -> String {
    if dir.is_empty() {
        rest.to_string()
    } else {
        format!("{dir}/{rest}")
    }
}

/// Absolute path of the project's `.gitignore`.
pub fn gitignore_path(config: &ProjectConfig) -> PathBuf {
    config.root.join(GITIGNORE_FILE)
}
