//! Cleanup passes applied to htmd output.
//!
//! Passes run in [`PASSES`] order; each takes and returns the whole document.

use std::sync::LazyLock;

use regex::Regex;

type Pass = fn(&str) -> String;

const PASSES: [Pass; 4] = [
    collapse_blank_runs,
    strip_fence_class_prefix,
    blank_whitespace_only_lines,
    single_trailing_newline,
];

/// Apply every cleanup pass to converted Markdown.
pub(crate) fn run_pipeline(md: &str) -> String {
    PASSES
        .iter()
        .fold(md.to_string(), |doc, pass| pass(&doc))
}

/// At most two blank lines in a row.
fn collapse_blank_runs(md: &str) -> String {
    static BLANK_RUN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{4,}").expect("valid regex"));

    BLANK_RUN_RE.replace_all(md, "\n\n\n").into_owned()
}

/// Turn ```` ```language-py ```` (Sphinx/Pygments class names) into ```` ```py ````.
fn strip_fence_class_prefix(md: &str) -> String {
    static FENCE_CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^```(?:language-|lang-|highlight-)(\w+)").expect("valid regex")
    });

    FENCE_CLASS_RE.replace_all(md, "```$1").into_owned()
}

/// Empty out lines that contain only whitespace.
///
/// Trailing spaces on content lines are kept: they encode hard line breaks.
fn blank_whitespace_only_lines(md: &str) -> String {
    md.lines()
        .map(|line| if line.trim().is_empty() { "" } else { line })
        .collect::<Vec<_>>()
        .join("\n")
}

fn single_trailing_newline(md: &str) -> String {
    let mut out = md.trim_end_matches('\n').to_string();
    out.push('\n');
    out
}
