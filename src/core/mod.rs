//! Process-wide state shared between the server, the watcher and main.

mod state;

pub use state::{is_shutdown, register_server, setup_shutdown_handler};
