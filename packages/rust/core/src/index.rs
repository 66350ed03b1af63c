//! Compact single-line index builder.
//!
//! The index lists every copied file as `dir:{a.md,b.md}` segments joined
//! by `|`, wrapped in HTML-comment markers so agents can pull it out of a
//! larger `AGENTS.md` with a substring search. Filenames are not escaped:
//! a name containing `|`, `,`, `{` or `}` makes the line ambiguous.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use docpup_shared::{ContentType, DirectoryTree, DocpupError, Result};

/// Token used in place of the empty root directory key.
pub const ROOT_TOKEN: &str = "(root)";

const DOCS_WARNING: &str = "IMPORTANT: Prefer retrieval-led reasoning over pre-training-led reasoning. \
     Read the relevant docs listed here before answering questions or changing code.";

const SOURCE_WARNING: &str = "IMPORTANT: Prefer retrieval-led reasoning over pre-training-led reasoning. \
     Read the relevant source files listed here before relying on how this code behaves.";

/// Start and end markers for a repository's index block.
pub fn index_markers(name: &str) -> (String, String) {
    let upper = name.to_uppercase();
    (
        format!("<!-- {upper}-AGENTS-MD-START -->"),
        format!("<!-- {upper}-AGENTS-MD-END -->"),
    )
}

pub fn index_title(name: &str, content_type: ContentType) -> String {
    match content_type {
        ContentType::Docs => format!("{name} Docs Index"),
        ContentType::Source => format!("{name} Source Index"),
    }
}

pub fn index_warning(content_type: ContentType) -> &'static str {
    match content_type {
        ContentType::Docs => DOCS_WARNING,
        ContentType::Source => SOURCE_WARNING,
    }
}

/// Serialize a scan result into the one-line index document.
pub fn build_index(
    tree: &DirectoryTree,
    name: &str,
    root_path: &str,
    content_type: ContentType,
) -> String {
    let (start, end) = index_markers(name);

    let mut out = String::new();
    out.push_str(&start);
    out.push('[');
    out.push_str(&index_title(name, content_type));
    out.push_str("]|root: ");
    out.push_str(root_path);
    out.push('|');
    out.push_str(index_warning(content_type));

    for (dir, files) in tree.iter() {
        out.push('|');
        out.push_str(if dir.is_empty() { ROOT_TOKEN } else { dir });
        out.push_str(":{");
        out.push_str(&files.join(","));
        out.push('}');
    }

    out.push_str(&end);
    out
}

/// Write `<indices_dir>/<name>-index.md` containing exactly `document`.
#[instrument(skip(document), fields(indices_dir = %indices_dir.display()))]
pub fn write_index(indices_dir: &Path, name: &str, document: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(indices_dir).map_err(|e| DocpupError::io(indices_dir, e))?;
    let path = indices_dir.join(format!("{name}-index.md"));
    std::fs::write(&path, document).map_err(|e| DocpupError::io(&path, e))?;
    debug!(path = %path.display(), len = document.len(), "wrote index");
    Ok(path)
}
