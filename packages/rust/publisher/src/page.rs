//! Page rendering: splice new articles into the existing page, or build one.
//!
//! The page carries a single insertion marker. When the marker is present the
//! new articles go right after it; when it is missing (or there is no page
//! yet) a fresh page is built from the fixed template, whose header ends with
//! the marker, and closed with the footer.

use newsdesk_shared::MarkerPolicy;

/// Comment marking where new articles are inserted.
pub const INSERTION_MARKER: &str = "<!-- NEW_ARTICLES -->";

/// Fixed page header. Ends with [`INSERTION_MARKER`].
pub const PAGE_HEADER: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>The AI Daily</title>
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/@picocss/pico@1/css/pico.min.css">
    <style>
        body { max-width: 800px; margin: 0 auto; padding: 20px; }
        article { margin-bottom: 40px; padding: 20px; border-bottom: 1px solid #333; }
        .meta { color: #888; font-size: 0.9em; }
        .verdict { background: #1a1a1a; padding: 10px; border-left: 4px solid #00aaaa; margin: 15px 0; }
        .btn { text-decoration: none; color: #00aaaa; font-weight: bold; }
    </style>
</head>
<body>
    <nav><ul><li><strong>THE AI DAILY</strong></li></ul></nav>
    <main>
    <h1>Latest Intelligence</h1>
    <!-- NEW_ARTICLES -->"#;

/// Closing tags appended after a freshly built page.
pub const PAGE_FOOTER: &str = "</main></body></html>";

/// Which rendering path produced the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPath {
    /// The existing page had a marker; articles were spliced in.
    Spliced,
    /// No page or no marker; the page was rebuilt from the template.
    Template,
}

/// Output of [`render_page`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub html: String,
    pub path: RenderPath,
}

/// Insert `new_html` into `current` at the marker, or build a fresh page.
pub fn render_page(current: Option<&str>, new_html: &str, policy: MarkerPolicy) -> RenderedPage {
    if let Some(spliced) = current.and_then(|page| splice_at_marker(page, new_html, policy)) {
        return RenderedPage {
            html: spliced,
            path: RenderPath::Spliced,
        };
    }

    RenderedPage {
        html: build_fresh_page(new_html, policy),
        path: RenderPath::Template,
    }
}

/// Split `page` at the first marker and put `new_html` after it.
///
/// Returns `None` when the page has no marker.
pub fn splice_at_marker(page: &str, new_html: &str, policy: MarkerPolicy) -> Option<String> {
    let (prefix, suffix) = page.split_once(INSERTION_MARKER)?;

    let keep = match policy {
        MarkerPolicy::Retain => INSERTION_MARKER,
        MarkerPolicy::Consume => "",
    };

    let mut out =
        String::with_capacity(prefix.len() + keep.len() + 1 + new_html.len() + suffix.len());
    out.push_str(prefix);
    out.push_str(keep);
    out.push('\n');
    out.push_str(new_html);
    out.push_str(suffix);
    Some(out)
}

/// The template page holding only `new_html`.
pub fn build_fresh_page(new_html: &str, policy: MarkerPolicy) -> String {
    let mut page = splice_at_marker(PAGE_HEADER, new_html, policy)
        .unwrap_or_else(|| format!("{PAGE_HEADER}\n{new_html}"));
    page.push_str(PAGE_FOOTER);
    page
}
