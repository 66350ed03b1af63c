//! HTML-to-Markdown conversion for preprocessed documentation pages.
//!
//! Picks the main content region of a page, drops `<script>`/`<style>`,
//! optionally rewrites relative `.html` links to `.md`, renders tables as
//! GFM pipe tables, and converts the rest with the `htmd` crate.

mod cleanup;
mod links;

use htmd::HtmlToMarkdown;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, instrument};

use docpup_shared::{DocpupError, Result};

pub use links::rewrite_href;

/// Content containers tried, in order, when no selector is configured.
pub const FALLBACK_SELECTORS: [&str; 6] =
    ["main", "article", "#content", ".content", ".document", "body"];

/// Elements with no closing tag.
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements dropped from the selection together with their content.
const STRIPPED_ELEMENTS: [&str; 2] = ["script", "style"];

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Options for the HTML-to-Markdown conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Explicit CSS selector for the content root.
    pub selector: Option<String>,
    /// Rewrite relative `.html`/`.htm` anchors to `.md`.
    pub rewrite_links: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            selector: None,
            rewrite_links: true,
        }
    }
}

/// Result of converting an HTML page to Markdown.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    /// The final Markdown content.
    pub markdown: String,
    /// Selector that chose the content root (`"body"` on fallback).
    pub content_root: String,
}

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

/// Convert one HTML document to Markdown.
///
/// 1. Select the content root (explicit selector, then fallbacks, then `<body>`)
/// 2. Re-serialize its children without scripts/styles, rewriting hrefs
/// 3. Swap tables for placeholders holding GFM pipe tables
/// 4. Convert HTML → Markdown via `htmd`
/// 5. Run the cleanup pipeline
#[instrument(skip_all, fields(selector = opts.selector.as_deref().unwrap_or("auto")))]
pub fn convert(html: &str, opts: &ConvertOptions) -> Result<ConvertResult> {
    let doc = Html::parse_document(html);
    let (root, content_root) = select_content_root(&doc, opts.selector.as_deref())?;

    let converter = markdown_converter();

    let mut tables = Vec::new();
    let mut content_html = String::with_capacity(html.len());
    render_children(root, opts, &converter, &mut content_html, &mut tables);

    let mut markdown = converter
        .convert(&content_html)
        .map_err(|e| DocpupError::Conversion(format!("htmd conversion failed: {e}")))?;

    for (i, table) in tables.iter().enumerate() {
        markdown = markdown.replacen(&table_placeholder(i), table.trim(), 1);
    }

    let markdown = cleanup::run_pipeline(&markdown);

    debug!(
        content_root = %content_root,
        tables = tables.len(),
        len = markdown.len(),
        "conversion complete"
    );

    Ok(ConvertResult {
        markdown,
        content_root,
    })
}

/// htmd defaults to ATX headings and fenced code blocks.
fn markdown_converter() -> HtmlToMarkdown {
    HtmlToMarkdown::builder()
        .skip_tags(STRIPPED_ELEMENTS.to_vec())
        .build()
}

/// Choose the element whose children become the page content.
fn select_content_root<'a>(
    doc: &'a Html,
    selector: Option<&str>,
) -> Result<(ElementRef<'a>, String)> {
    if let Some(sel_str) = selector {
        let parsed = Selector::parse(sel_str)
            .map_err(|e| DocpupError::Conversion(format!("invalid selector '{sel_str}': {e}")))?;
        if let Some(el) = doc.select(&parsed).next() {
            return Ok((el, sel_str.to_string()));
        }
        debug!(selector = sel_str, "selector matched nothing, using fallbacks");
    }

    for sel_str in FALLBACK_SELECTORS {
        if let Ok(parsed) = Selector::parse(sel_str) {
            if let Some(el) = doc.select(&parsed).next() {
                return Ok((el, sel_str.to_string()));
            }
        }
    }

    // html5ever always synthesizes <html>; only reachable for exotic input.
    Ok((doc.root_element(), "html".to_string()))
}

// ---------------------------------------------------------------------------
// Re-serialization
// ---------------------------------------------------------------------------

fn render_children(
    el: ElementRef<'_>,
    opts: &ConvertOptions,
    converter: &HtmlToMarkdown,
    out: &mut String,
    tables: &mut Vec<String>,
) {
    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            render_element(child_el, opts, converter, out, tables);
        } else if let Node::Text(text) = child.value() {
            push_escaped(out, text, false);
        }
    }
}

fn render_element(
    el: ElementRef<'_>,
    opts: &ConvertOptions,
    converter: &HtmlToMarkdown,
    out: &mut String,
    tables: &mut Vec<String>,
) {
    let name = el.value().name();

    if STRIPPED_ELEMENTS.contains(&name) {
        return;
    }

    if name == "table" {
        let md = html_table_to_markdown(&el, opts, converter);
        if !md.is_empty() {
            out.push_str("<p>");
            out.push_str(&table_placeholder(tables.len()));
            out.push_str("</p>");
            tables.push(md);
        }
        return;
    }

    out.push('<');
    out.push_str(name);
    for (attr, value) in el.value().attrs() {
        let value = if opts.rewrite_links && name == "a" && attr == "href" {
            rewrite_href(value)
        } else {
            value.into()
        };
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        push_escaped(out, &value, true);
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    render_children(el, opts, converter, out, tables);

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn push_escaped(out: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

// ---------------------------------------------------------------------------
// Table pre-processing
// ---------------------------------------------------------------------------

/// Token that survives htmd untouched (no Markdown-significant characters).
fn table_placeholder(index: usize) -> String {
    format!("DOCPUPTABLE{index}PLACEHOLDER")
}

/// Convert a single HTML table element to a GFM table string.
///
/// `htmd` 0.1 doesn't support table conversion, so we handle it manually.
/// Cell contents still go through htmd so links and emphasis survive.
fn html_table_to_markdown(
    table: &ElementRef,
    opts: &ConvertOptions,
    converter: &HtmlToMarkdown,
) -> String {
    let (Ok(tr_sel), Ok(cell_sel)) = (Selector::parse("tr"), Selector::parse("th, td")) else {
        return String::new();
    };

    let mut rows: Vec<Vec<String>> = Vec::new();

    for tr in table.select(&tr_sel) {
        let cells: Vec<String> = tr.select(&cell_sel).map(|cell| cell_markdown(cell, opts, converter)).collect();
        if !cells.is_empty() {
            rows.push(cells);
        }
    }

    if rows.is_empty() {
        return String::new();
    }

    // Determine column count from the widest row
    let col_count = rows.iter().map(Vec::len).max().unwrap_or(0);

    for row in &mut rows {
        row.resize(col_count, String::new());
    }

    // The first row is the header whether it holds <th> or <td> cells.
    let (header, body) = rows.split_at(1);

    let mut md = String::new();
    push_row(&mut md, &header[0]);
    push_row(&mut md, &vec!["---".to_string(); col_count]);
    for row in body {
        push_row(&mut md, row);
    }
    md
}

fn push_row(md: &mut String, cells: &[String]) {
    md.push_str("| ");
    md.push_str(&cells.join(" | "));
    md.push_str(" |\n");
}

/// Inline Markdown for one cell, collapsed to a single line with pipes escaped.
fn cell_markdown(
    cell: ElementRef<'_>,
    opts: &ConvertOptions,
    converter: &HtmlToMarkdown,
) -> String {
    let mut html = String::new();
    let mut nested = Vec::new();
    render_children(cell, opts, converter, &mut html, &mut nested);

    let mut md = converter.convert(&html).unwrap_or_else(|e| {
        debug!(error = %e, "cell conversion failed, keeping text");
        cell.text().collect()
    });
    for (i, table) in nested.iter().enumerate() {
        md = md.replacen(&table_placeholder(i), table, 1);
    }

    md.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
