//! Save-event watcher.
//!
//! ```text
//! notify → channel → Debouncer (300ms) → input saved?  → session.render()
//!                                       → config saved? → reload_config() → render
//! ```
//!
//! Only the parent directories are watched, so editors that save by
//! writing a temp file and renaming it over the input are still seen.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashMap;

use super::session::{PreviewSession, error_detail};
use crate::config::{cfg, reload_config};
use crate::convert::{Converter, GhostscriptCairo};
use crate::logger::{status_error, status_success};
use crate::utils::path::normalize_path;
use crate::{debug, log};

const DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

/// Pure debouncer: timing and per-path deduplication only.
pub struct Debouncer {
    changes: FxHashMap<PathBuf, ChangeKind>,
    last_event: Option<Instant>,
    window: Duration,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::with_window(Duration::from_millis(DEBOUNCE_MS))
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
            window,
        }
    }

    /// Add a notify event, keeping only paths accepted by `interesting`.
    ///
    /// Dedup rules per path:
    /// - Removed then Created/Modified: the file was restored, keep the new kind
    /// - Modified then Removed: keep Removed
    /// - Created then Removed: nothing happened, drop the path
    /// - otherwise the first event wins
    pub fn add_event(&mut self, event: &notify::Event, interesting: impl Fn(&Path) -> bool) {
        use notify::EventKind;
        use notify::event::ModifyKind;

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            // mtime/chmod noise
            EventKind::Modify(ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => ChangeKind::Modified,
            _ => return,
        };

        for path in &event.paths {
            let path = normalize_path(path);
            if !interesting(&path) {
                continue;
            }

            match (self.changes.get(&path).copied(), kind) {
                (None, _) => {
                    self.changes.insert(path, kind);
                }
                (Some(ChangeKind::Removed), ChangeKind::Created | ChangeKind::Modified) => {
                    self.changes.insert(path, kind);
                }
                (Some(ChangeKind::Modified), ChangeKind::Removed) => {
                    self.changes.insert(path, ChangeKind::Removed);
                }
                (Some(ChangeKind::Created), ChangeKind::Removed) => {
                    self.changes.remove(&path);
                }
                _ => {}
            }
            self.last_event = Some(Instant::now());
        }
    }

    /// Take the pending changes once the window has passed without events.
    pub fn take_if_ready(&mut self) -> Option<FxHashMap<PathBuf, ChangeKind>> {
        let last_event = self.last_event?;
        if last_event.elapsed() < self.window {
            return None;
        }

        self.last_event = None;
        let changes = std::mem::take(&mut self.changes);
        (!changes.is_empty()).then_some(changes)
    }

    /// Time until the window could settle.
    pub fn sleep_duration(&self) -> Duration {
        match self.last_event {
            Some(last) => self
                .window
                .saturating_sub(last.elapsed())
                .max(Duration::from_millis(1)),
            None => Duration::from_secs(3600),
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

/// Files the watcher reacts to.
struct Targets {
    input: PathBuf,
    config: Option<PathBuf>,
}

impl Targets {
    fn contains(&self, path: &Path) -> bool {
        path == self.input || self.config.as_deref() == Some(path)
    }

    /// Distinct parent directories to watch.
    fn roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = std::iter::once(&self.input)
            .chain(self.config.as_ref())
            .filter_map(|p| p.parent().map(Path::to_path_buf))
            .collect();
        roots.dedup();
        roots
    }
}

/// Running watcher thread.
pub struct WatchHandle {
    thread: JoinHandle<()>,
}

impl WatchHandle {
    pub fn join(self) {
        if self.thread.join().is_err() {
            log!("watch"; "watcher thread panicked");
        }
    }
}

/// Start watching the session's input (and the config file, if any).
///
/// The watcher is attached before returning, so saves that happen while
/// the caller is still binding the server are not lost.
pub fn spawn(session: Arc<PreviewSession>, shutdown_rx: Receiver<()>) -> Result<WatchHandle> {
    let config = cfg();
    let targets = Targets {
        input: normalize_path(session.input()),
        config: config
            .config_path
            .is_file()
            .then(|| normalize_path(&config.config_path)),
    };

    let (event_tx, event_rx) = channel::unbounded();
    let mut watcher: RecommendedWatcher =
        notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let _ = event_tx.send(res);
        })
        .context("failed to create file watcher")?;

    for root in targets.roots() {
        watcher
            .watch(&root, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", root.display()))?;
        debug!("watch"; "watching {}", root.display());
    }

    let thread = thread::Builder::new()
        .name("pspreview-watch".into())
        .spawn(move || {
            // Keep the watcher alive for the lifetime of the loop.
            let _watcher = watcher;
            run(&session, &targets, &event_rx, &shutdown_rx);
        })
        .context("failed to spawn watcher thread")?;

    Ok(WatchHandle { thread })
}

fn run(
    session: &PreviewSession,
    targets: &Targets,
    event_rx: &Receiver<notify::Result<notify::Event>>,
    shutdown_rx: &Receiver<()>,
) {
    let mut debouncer = Debouncer::new();

    loop {
        channel::select! {
            recv(event_rx) -> msg => match msg {
                Ok(Ok(event)) => debouncer.add_event(&event, |p| targets.contains(p)),
                Ok(Err(e)) => log!("watch"; "notify error: {}", e),
                Err(_) => break,
            },
            recv(shutdown_rx) -> _ => break,
            default(debouncer.sleep_duration()) => {}
        }

        if let Some(changes) = debouncer.take_if_ready() {
            handle_changes(session, targets, &changes, &reload_converter);
        }
    }
    debug!("watch"; "stopped");
}

/// Converter built from a freshly reloaded config, `None` if the file is unchanged.
type ReloadFn = dyn Fn() -> Result<Option<Arc<dyn Converter>>>;

fn reload_converter() -> Result<Option<Arc<dyn Converter>>> {
    if !reload_config()? {
        return Ok(None);
    }
    let converter: Arc<dyn Converter> = Arc::new(GhostscriptCairo::from_config(&cfg().convert));
    Ok(Some(converter))
}

fn handle_changes(
    session: &PreviewSession,
    targets: &Targets,
    changes: &FxHashMap<PathBuf, ChangeKind>,
    reload: &ReloadFn,
) {
    if let Some(config_path) = &targets.config
        && changes.contains_key(config_path)
    {
        match reload() {
            Ok(Some(converter)) => {
                log!("watch"; "config reloaded");
                session.set_converter(converter);
                session.request_reload();
            }
            Ok(None) => {}
            Err(e) => status_error("config reload failed", &format!("{e:#}")),
        }
    }

    match changes.get(&targets.input) {
        Some(ChangeKind::Removed) => {
            status_error(&format!("{} was removed", session.filename()), "");
            return;
        }
        Some(_) => session.request_reload(),
        None => {}
    }

    match session.render_if_pending() {
        Some(Ok(revision)) => {
            status_success(&format!("rendered {} (rev {})", session.filename(), revision));
        }
        Some(Err(e)) => {
            if let Some(program) = e.program() {
                log!("error"; "Failed to execute {}. Report bug with postscript file to dev.", program);
            }
            status_error(&format!("failed: {}", session.filename()), &error_detail(&e));
        }
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{ConversionError, Svg};
    use notify::event::{CreateKind, DataChange, EventKind, MetadataKind, ModifyKind, RemoveKind};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event(kind: EventKind, path: &str) -> notify::Event {
        notify::Event::new(kind).add_path(PathBuf::from(path))
    }

    fn modify() -> EventKind {
        EventKind::Modify(ModifyKind::Data(DataChange::Content))
    }

    fn any(_: &Path) -> bool {
        true
    }

    fn ready(debouncer: &mut Debouncer) -> FxHashMap<PathBuf, ChangeKind> {
        thread::sleep(Duration::from_millis(5));
        debouncer.take_if_ready().unwrap_or_default()
    }

    #[test]
    fn test_dedup_same_path() {
        let mut d = Debouncer::with_window(Duration::ZERO);
        d.add_event(&event(modify(), "/w/fig.eps"), any);
        d.add_event(&event(modify(), "/w/fig.eps"), any);

        let changes = ready(&mut d);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[Path::new("/w/fig.eps")], ChangeKind::Modified);
    }

    #[test]
    fn test_remove_then_create_is_restore() {
        let mut d = Debouncer::with_window(Duration::ZERO);
        d.add_event(&event(EventKind::Remove(RemoveKind::File), "/w/fig.eps"), any);
        d.add_event(&event(EventKind::Create(CreateKind::File), "/w/fig.eps"), any);

        let changes = ready(&mut d);
        assert_eq!(changes[Path::new("/w/fig.eps")], ChangeKind::Created);
    }

    #[test]
    fn test_modify_then_remove_is_remove() {
        let mut d = Debouncer::with_window(Duration::ZERO);
        d.add_event(&event(modify(), "/w/fig.eps"), any);
        d.add_event(&event(EventKind::Remove(RemoveKind::File), "/w/fig.eps"), any);

        let changes = ready(&mut d);
        assert_eq!(changes[Path::new("/w/fig.eps")], ChangeKind::Removed);
    }

    #[test]
    fn test_create_then_remove_cancels() {
        let mut d = Debouncer::with_window(Duration::ZERO);
        d.add_event(&event(EventKind::Create(CreateKind::File), "/w/fig.eps~"), any);
        d.add_event(&event(EventKind::Remove(RemoveKind::File), "/w/fig.eps~"), any);

        assert!(ready(&mut d).is_empty());
    }

    #[test]
    fn test_metadata_ignored() {
        let mut d = Debouncer::with_window(Duration::ZERO);
        let kind = EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime));
        d.add_event(&event(kind, "/w/fig.eps"), any);

        assert!(d.take_if_ready().is_none());
    }

    #[test]
    fn test_filter_drops_other_paths() {
        let mut d = Debouncer::with_window(Duration::ZERO);
        d.add_event(&event(modify(), "/w/other.eps"), |p| p.ends_with("fig.eps"));

        assert!(d.take_if_ready().is_none());
    }

    #[test]
    fn test_waits_out_window() {
        let mut d = Debouncer::with_window(Duration::from_secs(60));
        d.add_event(&event(modify(), "/w/fig.eps"), any);

        assert!(d.take_if_ready().is_none());
        assert!(d.sleep_duration() > Duration::from_secs(50));
    }

    #[test]
    fn test_idle_sleep() {
        let d = Debouncer::new();
        assert_eq!(d.sleep_duration(), Duration::from_secs(3600));
    }

    #[test]
    fn test_targets_roots_dedup() {
        let targets = Targets {
            input: PathBuf::from("/w/figs/fig.eps"),
            config: Some(PathBuf::from("/w/figs/pspreview.toml")),
        };
        assert_eq!(targets.roots(), vec![PathBuf::from("/w/figs")]);
        assert!(targets.contains(Path::new("/w/figs/pspreview.toml")));
        assert!(!targets.contains(Path::new("/w/figs/other.eps")));
    }

    /// Converter returning fixed markup and counting its calls.
    struct MarkupConverter {
        markup: &'static str,
        calls: AtomicUsize,
    }

    impl MarkupConverter {
        fn new(markup: &'static str) -> Arc<Self> {
            Arc::new(Self {
                markup,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Converter for MarkupConverter {
        fn convert(&self, _input: &Path) -> Result<Svg, ConversionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Svg::new(self.markup.as_bytes().to_vec()))
        }
    }

    fn targets() -> Targets {
        Targets {
            input: PathBuf::from("/w/fig.eps"),
            config: Some(PathBuf::from("/w/pspreview.toml")),
        }
    }

    fn changed(path: &str, kind: ChangeKind) -> FxHashMap<PathBuf, ChangeKind> {
        let mut changes = FxHashMap::default();
        changes.insert(PathBuf::from(path), kind);
        changes
    }

    fn unchanged_config() -> Result<Option<Arc<dyn Converter>>> {
        Ok(None)
    }

    /// Session that has already rendered once.
    fn rendered(converter: Arc<MarkupConverter>) -> PreviewSession {
        let session = PreviewSession::new("/w/fig.eps", converter);
        session.render().unwrap();
        session
    }

    #[test]
    fn test_input_save_renders_new_revision() {
        let converter = MarkupConverter::new("<svg/>");
        let session = rendered(Arc::clone(&converter));

        let changes = changed("/w/fig.eps", ChangeKind::Modified);
        handle_changes(&session, &targets(), &changes, &unchanged_config);

        assert_eq!(session.revision(), 2);
        assert_eq!(converter.calls.load(Ordering::SeqCst), 2);
        assert!(!session.is_reload_pending());
    }

    #[test]
    fn test_removed_input_skips_render() {
        let converter = MarkupConverter::new("<svg/>");
        let session = rendered(Arc::clone(&converter));

        let changes = changed("/w/fig.eps", ChangeKind::Removed);
        handle_changes(&session, &targets(), &changes, &unchanged_config);

        assert_eq!(session.revision(), 1);
        assert_eq!(converter.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_config_save_swaps_converter() {
        let session = rendered(MarkupConverter::new("<svg id=\"old\"/>"));
        let replacement = MarkupConverter::new("<svg id=\"new\"/>");
        let swapped: Arc<dyn Converter> = replacement.clone();

        let changes = changed("/w/pspreview.toml", ChangeKind::Modified);
        let reload = move || -> Result<Option<Arc<dyn Converter>>> { Ok(Some(Arc::clone(&swapped))) };
        handle_changes(&session, &targets(), &changes, &reload);

        assert_eq!(session.revision(), 2);
        assert_eq!(replacement.calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.svg().unwrap().as_bytes(), b"<svg id=\"new\"/>");
    }

    #[test]
    fn test_unchanged_config_keeps_revision() {
        let converter = MarkupConverter::new("<svg/>");
        let session = rendered(Arc::clone(&converter));

        let changes = changed("/w/pspreview.toml", ChangeKind::Modified);
        handle_changes(&session, &targets(), &changes, &unchanged_config);

        assert_eq!(session.revision(), 1);
        assert_eq!(converter.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_config_reload_keeps_converter() {
        let converter = MarkupConverter::new("<svg/>");
        let session = rendered(Arc::clone(&converter));

        let changes = changed("/w/pspreview.toml", ChangeKind::Modified);
        let reload = || -> Result<Option<Arc<dyn Converter>>> { anyhow::bail!("bad toml") };
        handle_changes(&session, &targets(), &changes, &reload);

        assert_eq!(session.revision(), 1);
        assert_eq!(converter.calls.load(Ordering::SeqCst), 1);
    }
}
