//! Embedded static resources.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed variable injection
//! - `preview` - Preview page (page.html) and live reload script (reload.js)
//!
//! # Usage
//!
//! ```ignore
//! use embed::preview::{PAGE_HTML, PageVars};
//!
//! let html = PAGE_HTML.render(&PageVars {
//!     filename: "figure.eps",
//!     body: &svg_markup,
//!     script: "",
//! });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod preview {
    use super::{Template, TemplateVars};
    use crate::utils::html::escape;

    /// Route polled by the live reload script.
    pub const REVISION_PATH: &str = "/__pspreview/revision";

    /// Variables for page.html.
    ///
    /// `filename` is escaped on render; `body` and `script` are inserted as-is.
    pub struct PageVars<'a> {
        pub filename: &'a str,
        pub body: &'a str,
        pub script: &'a str,
    }

    impl TemplateVars for PageVars<'_> {
        fn apply(&self, content: &str) -> String {
            // Body goes in last and untouched: SVG text may contain anything.
            let Some((head, tail)) = content.split_once("__BODY__") else {
                return content.to_string();
            };
            let fill = |part: &str| {
                part.replace("__FILENAME__", &escape(self.filename))
                    .replace("__SCRIPT__", self.script)
            };

            let (head, tail) = (fill(head), fill(tail));
            let mut html = String::with_capacity(head.len() + self.body.len() + tail.len());
            html.push_str(&head);
            html.push_str(self.body);
            html.push_str(&tail);
            html
        }
    }

    /// Preview page wrapping inline SVG markup.
    pub const PAGE_HTML: Template<PageVars<'static>> =
        Template::new(include_str!("preview/page.html"));

    /// Variables for reload.js.
    pub struct ReloadVars {
        pub revision: u64,
    }

    impl TemplateVars for ReloadVars {
        fn apply(&self, content: &str) -> String {
            content
                .replace("__REVISION_PATH__", REVISION_PATH)
                .replace("__REVISION__", &self.revision.to_string())
        }
    }

    /// Polling script that reloads once the served revision moves on.
    pub const RELOAD_JS: Template<ReloadVars> = Template::new(include_str!("preview/reload.js"));
}
