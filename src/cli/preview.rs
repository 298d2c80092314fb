//! `preview` command: serve a live-reloading page for one input file.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use crossbeam::channel;

use super::convert::report_failure;
use crate::config::PsConfig;
use crate::convert::GhostscriptCairo;
use crate::logger::status_success;
use crate::preview::{PreviewServer, PreviewSession, watch};
use crate::version::{SystemOpener, UrlOpener};
use crate::{debug, log};

pub fn serve_preview(config: &PsConfig, input: &Path) -> Result<()> {
    let converter = Arc::new(GhostscriptCairo::from_config(&config.convert));
    let session = Arc::new(PreviewSession::new(input, converter));

    // Attach the watcher before the first render so no save is missed.
    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    let watcher = if config.preview.watch {
        Some(watch::spawn(Arc::clone(&session), shutdown_rx)?)
    } else {
        None
    };

    match session.render() {
        Ok(revision) => status_success(&format!(
            "rendered {} (rev {})",
            session.filename(),
            revision
        )),
        Err(e) => report_failure(&e),
    }

    let server = PreviewServer::bind(config.preview.interface, config.preview.port, shutdown_tx)?;
    let url = server.url();
    log!("preview"; "{}", url);

    if config.preview.open
        && let Err(e) = SystemOpener.open(&url)
    {
        log!("preview"; "failed to open browser: {:#}", e);
    }

    server.run(Arc::clone(&session))?;

    if let Some(watcher) = watcher {
        watcher.join();
    }
    debug!("preview"; "stopped");
    Ok(())
}
