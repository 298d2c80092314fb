//! Process-wide shutdown state for preview mode.
//!
//! Ctrl+C behaves differently depending on whether a server is registered:
//! - before `register_server()`: exit immediately (nothing to tear down)
//! - after: unblock the request loop and stop the watcher

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crossbeam::channel::Sender;
use tiny_http::Server;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal for the watcher thread
static SHUTDOWN_TX: OnceLock<Sender<()>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        if let Some(tx) = SHUTDOWN_TX.get() {
            let _ = tx.send(());
        }

        if let Some(server) = SERVER.get() {
            crate::log!("preview"; "shutting down...");
            server.unblock();
        } else {
            // e.g. waiting at the notice prompt
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the HTTP server for graceful shutdown.
///
/// Call after binding, before entering the request loop.
pub fn register_server(server: Arc<Server>, shutdown_tx: Sender<()>) {
    let _ = SERVER.set(server);
    let _ = SHUTDOWN_TX.set(shutdown_tx);
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
