//! Live preview: HTML page, session state, HTTP server and save watcher.
//!
//! # Module Structure
//!
//! ```text
//! preview/
//! ├── page.rs      # HTML around the converted SVG
//! ├── session.rs   # PreviewSession: page, svg, revision, reload flag
//! ├── server.rs    # tiny_http routes
//! └── watch.rs     # notify + debouncer → re-render
//! ```

pub mod page;
pub mod server;
pub mod session;
pub mod watch;

pub use page::web_preview;
pub use server::PreviewServer;
pub use session::{PreviewSession, error_detail};
