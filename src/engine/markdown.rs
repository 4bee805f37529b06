// src/engine/markdown.rs
// =============================================================================
// HTML to markdown conversion, using the `htmd` crate.
//
// The content source decides how much of the page survives:
// - CleanedHtml skips page chrome (navigation, footers, forms, scripts...)
// - RawHtml keeps everything except scripts, styles and <head>
//
// render_page() renders with the preferred source. If that comes out blank
// (a page whose text lives entirely inside <nav>, say), it also renders the
// raw HTML and offers that as the alternate rendering.
// =============================================================================

use super::{MarkdownField, MarkdownOutput};
use crate::config::ContentSource;
use htmd::HtmlToMarkdown;

const CLEANED_SKIP_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "iframe", "svg", "canvas", "form",
    "button", "nav", "footer",
];

const RAW_SKIP_TAGS: &[&str] = &["head", "script", "style"];

pub fn render(html: &str, source: ContentSource) -> String {
    let skip = match source {
        ContentSource::CleanedHtml => CLEANED_SKIP_TAGS,
        ContentSource::RawHtml => RAW_SKIP_TAGS,
    };

    let converter = HtmlToMarkdown::builder().skip_tags(skip.to_vec()).build();

    match converter.convert(html) {
        Ok(markdown) => markdown.trim().to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "markdown conversion failed");
            String::new()
        }
    }
}

pub fn render_page(html: &str, source: ContentSource) -> MarkdownField {
    let raw = render(html, source);

    let alternate = if raw.is_empty() && source != ContentSource::RawHtml {
        Some(render(html, ContentSource::RawHtml)).filter(|md| !md.is_empty())
    } else {
        None
    };

    MarkdownField::Generated(MarkdownOutput {
        raw: Some(raw),
        alternate,
    })
}
