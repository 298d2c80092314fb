//! HTML preview page around converted SVG.

use crate::convert::Svg;
use crate::embed::preview::{PAGE_HTML, PageVars, RELOAD_JS, ReloadVars};
use crate::utils::html::escape;

/// Standalone preview page for `filename`.
///
/// The SVG is inlined without its XML prolog so it renders as part of the
/// document.
pub fn web_preview(filename: &str, svg: &Svg) -> String {
    render(filename, &svg.inline_markup(), None)
}

/// Preview page that reloads itself once the server moves past `revision`.
pub fn live_preview(filename: &str, svg: &Svg, revision: u64) -> String {
    render(filename, &svg.inline_markup(), Some(revision))
}

/// Page shown in place of the preview when conversion failed.
pub fn error_preview(filename: &str, message: &str, revision: Option<u64>) -> String {
    let body = format!(
        "<pre class=\"pspreview-error\">Failed to preview {}\n\n{}</pre>",
        escape(filename),
        escape(message)
    );
    render(filename, &body, revision)
}

fn render(filename: &str, body: &str, revision: Option<u64>) -> String {
    let script = revision
        .map(|revision| RELOAD_JS.render(&ReloadVars { revision }))
        .unwrap_or_default();

    PAGE_HTML.render(&PageVars {
        filename,
        body,
        script: &script,
    })
}
