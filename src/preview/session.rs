//! State of one live preview.
//!
//! A session owns everything the server reads and the watcher writes: the
//! converter, the last rendered page, the raw SVG, a revision counter and
//! the pending-reload flag. Readers never block on a conversion in flight;
//! the lock is only taken to swap the finished result in.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use super::page::{error_preview, live_preview};
use crate::convert::{ConversionError, Converter, Svg};

/// Latest render result.
struct Rendered {
    page: String,
    svg: Option<Svg>,
}

pub struct PreviewSession {
    input: PathBuf,
    filename: String,
    converter: RwLock<Arc<dyn Converter>>,
    rendered: RwLock<Rendered>,
    /// Serializes renders so revisions are published in order.
    render_lock: Mutex<()>,
    revision: AtomicU64,
    reload: AtomicBool,
}

impl PreviewSession {
    /// New session for `input`. A render is pending until the first `render()`.
    pub fn new(input: impl Into<PathBuf>, converter: Arc<dyn Converter>) -> Self {
        let input = input.into();
        let filename = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());

        Self {
            rendered: RwLock::new(Rendered {
                page: error_preview(&filename, "not rendered yet", Some(0)),
                svg: None,
            }),
            input,
            filename,
            converter: RwLock::new(converter),
            render_lock: Mutex::new(()),
            revision: AtomicU64::new(0),
            reload: AtomicBool::new(true),
        }
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Mark the preview stale (the input was saved).
    pub fn request_reload(&self) {
        self.reload.store(true, Ordering::Release);
    }

    pub fn is_reload_pending(&self) -> bool {
        self.reload.load(Ordering::Acquire)
    }

    /// Replace the converter, e.g. after the config file changed.
    pub fn set_converter(&self, converter: Arc<dyn Converter>) {
        *self.converter.write() = converter;
    }

    /// Render only if a reload was requested since the last render.
    pub fn render_if_pending(&self) -> Option<Result<u64, ConversionError>> {
        self.is_reload_pending().then(|| self.render())
    }

    /// Convert the input and publish a new revision.
    ///
    /// A failed conversion publishes an error page instead and keeps the
    /// last good SVG. Either way the revision moves, so open pages refresh.
    pub fn render(&self) -> Result<u64, ConversionError> {
        let _guard = self.render_lock.lock();
        self.reload.store(false, Ordering::Release);

        let converter = Arc::clone(&self.converter.read());
        let result = converter.convert(&self.input);

        let revision = self.revision.load(Ordering::Acquire) + 1;
        let mut rendered = self.rendered.write();
        let outcome = match result {
            Ok(svg) => {
                rendered.page = live_preview(&self.filename, &svg, revision);
                rendered.svg = Some(svg);
                Ok(revision)
            }
            Err(e) => {
                rendered.page = error_preview(&self.filename, &error_detail(&e), Some(revision));
                Err(e)
            }
        };
        self.revision.store(revision, Ordering::Release);
        outcome
    }

    /// Current page HTML.
    pub fn page(&self) -> String {
        self.rendered.read().page.clone()
    }

    /// Last successfully converted SVG.
    pub fn svg(&self) -> Option<Svg> {
        self.rendered.read().svg.clone()
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }
}

/// Error text with its source chain and install hint.
pub fn error_detail(error: &ConversionError) -> String {
    use std::error::Error as _;

    let mut detail = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        detail.push_str(&format!("\ncaused by: {cause}"));
        source = cause.source();
    }
    if let Some(hint) = error.hint() {
        detail.push_str(&format!("\nhint: {hint}"));
    }
    detail
}
