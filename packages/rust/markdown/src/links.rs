//! Anchor `href` rewriting for converted pages.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Matches an explicit URI scheme such as `https:`, `mailto:` or `data:`.
static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("valid regex"));

/// Point a relative link at the Markdown file generated for its target.
///
/// Empty hrefs, pure fragments, protocol-relative URLs and anything with a
/// scheme are returned unchanged. Otherwise a trailing `.html`/`.htm` on the
/// path (any case) becomes `.md`; query and fragment are kept verbatim.
pub fn rewrite_href(href: &str) -> Cow<'_, str> {
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("//")
        || SCHEME_RE.is_match(href)
    {
        return Cow::Borrowed(href);
    }

    let (before_fragment, fragment) = match href.find('#') {
        Some(i) => href.split_at(i),
        None => (href, ""),
    };
    let (path, query) = match before_fragment.find('?') {
        Some(i) => before_fragment.split_at(i),
        None => (before_fragment, ""),
    };

    let lower = path.to_ascii_lowercase();
    let stem = if lower.ends_with(".html") {
        &path[..path.len() - ".html".len()]
    } else if lower.ends_with(".htm") {
        &path[..path.len() - ".htm".len()]
    } else {
        return Cow::Borrowed(href);
    };

    Cow::Owned(format!("{stem}.md{query}{fragment}"))
}
