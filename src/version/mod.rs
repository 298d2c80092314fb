//! Version tracking and the startup what's-new notice.
//!
//! # Module Structure
//!
//! - `gate` - pure `should_notify(previous, current)` decision
//! - `record` - key-value store holding the last-seen version
//! - `notice` - startup flow wiring the store, gate, prompt and URL opener

pub mod gate;
pub mod notice;
pub mod record;

pub use notice::{
    NoticeOutcome, REQUIREMENTS_URL, SystemOpener, TerminalNotifier, UrlOpener, show_whats_new,
};
pub use record::JsonFileStore;

/// Version of the running binary.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");
