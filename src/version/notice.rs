//! Startup "what's new" notice.
//!
//! Runs once per process before any command:
//! read record → overwrite record → gate → prompt → open requirements URL.

use std::io::{self, IsTerminal, Write};

use anyhow::Result;
use owo_colors::OwoColorize;

use super::gate::should_notify;
use super::record::{RECORD_KEY, StateStore};
use crate::log;
use crate::utils::exec::Cmd;

/// Default target of the "See Requirements" action.
pub const REQUIREMENTS_URL: &str = "https://github.com/ahnafnafee/PostScript-Preview#requirements";

/// The single actionable choice offered by the notice.
pub const SEE_REQUIREMENTS: &str = "See Requirements";

/// How the notice played out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeOutcome {
    /// Gate said no; nothing shown.
    Skipped,
    /// Shown, no action taken.
    Dismissed,
    /// Shown and the requirements URL was opened.
    Opened,
}

/// Presents a message with a list of action titles.
///
/// Returns the chosen title, or `None` when dismissed.
pub trait Notifier {
    fn present(&self, message: &str, actions: &[&'static str]) -> Option<&'static str>;
}

/// Opens a URL with the system's default handler.
pub trait UrlOpener {
    fn open(&self, url: &str) -> Result<()>;
}

/// Record the running version and show the notice when the gate allows it.
///
/// The record is overwritten before the gate runs, whether or not the
/// notice fires. A failed write is logged and does not stop the flow.
pub fn show_whats_new(
    store: &dyn StateStore,
    notifier: &dyn Notifier,
    opener: &dyn UrlOpener,
    current: &str,
    url: &str,
) -> NoticeOutcome {
    let previous = store.get(RECORD_KEY);

    if let Err(e) = store.set(RECORD_KEY, current) {
        log!("notice"; "{:#}", anyhow::Error::from(e));
    }

    if !should_notify(previous.as_deref(), current) {
        return NoticeOutcome::Skipped;
    }

    let message = format!("pspreview v{current} — READ NEW REQUIREMENTS!");
    match notifier.present(&message, &[SEE_REQUIREMENTS]) {
        Some(SEE_REQUIREMENTS) => match opener.open(url) {
            Ok(()) => NoticeOutcome::Opened,
            Err(e) => {
                log!("notice"; "failed to open {}: {:#}", url, e);
                NoticeOutcome::Dismissed
            }
        },
        _ => NoticeOutcome::Dismissed,
    }
}

// ============================================================================
// Terminal implementations
// ============================================================================

/// Prints the notice and, on a TTY, asks whether to take the action.
///
/// Off a TTY the action cannot be chosen, so the target is printed instead.
pub struct TerminalNotifier {
    pub url: String,
}

impl Notifier for TerminalNotifier {
    fn present(&self, message: &str, actions: &[&'static str]) -> Option<&'static str> {
        log!("notice"; "{}", message.bold());

        let action = *actions.first()?;
        if !io::stdin().is_terminal() {
            log!("notice"; "{}: {}", action, self.url);
            return None;
        }

        eprint!("{action}? [y/N] ");
        io::stderr().flush().ok()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input).ok()?;
        is_yes(&input).then_some(action)
    }
}

/// Default no: only an explicit `y`/`yes` confirms.
fn is_yes(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    input == "y" || input == "yes"
}

/// Opens URLs via `open` (macOS), the URL protocol handler (Windows) or `xdg-open`.
pub struct SystemOpener;

impl UrlOpener for SystemOpener {
    fn open(&self, url: &str) -> Result<()> {
        opener_command(url).status()
    }
}

/// Platform command that opens `url` in the default handler.
pub fn opener_command(url: &str) -> Cmd {
    if cfg!(target_os = "macos") {
        Cmd::new("open").arg(url)
    } else if cfg!(windows) {
        Cmd::new("rundll32").args(["url.dll,FileProtocolHandler", url])
    } else {
        Cmd::new("xdg-open").arg(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::record::{MemoryStore, RecordError};
    use parking_lot::Mutex;

    /// Notifier that answers with a fixed choice and remembers the message.
    struct ScriptedNotifier {
        choice: Option<&'static str>,
        shown: Mutex<Vec<String>>,
    }

    impl ScriptedNotifier {
        fn choosing(choice: Option<&'static str>) -> Self {
            Self {
                choice,
                shown: Mutex::new(Vec::new()),
            }
        }
    }

    impl Notifier for ScriptedNotifier {
        fn present(&self, message: &str, actions: &[&'static str]) -> Option<&'static str> {
            assert_eq!(actions, &[SEE_REQUIREMENTS]);
            self.shown.lock().push(message.to_string());
            self.choice
        }
    }

    #[derive(Default)]
    struct RecordingOpener {
        opened: Mutex<Vec<String>>,
        fail: bool,
    }

    impl UrlOpener for RecordingOpener {
        fn open(&self, url: &str) -> Result<()> {
            if self.fail {
                anyhow::bail!("no browser");
            }
            self.opened.lock().push(url.to_string());
            Ok(())
        }
    }

    /// Store that cannot be written, as with a read-only data directory.
    struct ReadOnlyStore;

    impl StateStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), RecordError> {
            Err(RecordError::Io(
                "state.json".into(),
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            ))
        }
    }

    #[test]
    fn test_write_failure_still_notifies() {
        let notifier = ScriptedNotifier::choosing(Some(SEE_REQUIREMENTS));
        let opener = RecordingOpener::default();

        let outcome = show_whats_new(&ReadOnlyStore, &notifier, &opener, "0.3.0", REQUIREMENTS_URL);

        assert_eq!(outcome, NoticeOutcome::Opened);
        assert_eq!(notifier.shown.lock().len(), 1);
        assert_eq!(*opener.opened.lock(), vec![REQUIREMENTS_URL.to_string()]);
    }

    #[test]
    fn test_first_run_shows_and_records() {
        let store = MemoryStore::new();
        let notifier = ScriptedNotifier::choosing(None);
        let opener = RecordingOpener::default();

        let outcome = show_whats_new(&store, &notifier, &opener, "0.3.0", REQUIREMENTS_URL);

        assert_eq!(outcome, NoticeOutcome::Dismissed);
        assert_eq!(store.get(RECORD_KEY).as_deref(), Some("0.3.0"));
        let shown = notifier.shown.lock();
        assert_eq!(shown.len(), 1);
        assert!(shown[0].contains("v0.3.0"));
        assert!(opener.opened.lock().is_empty());
    }

    #[test]
    fn test_choice_opens_requirements() {
        let store = MemoryStore::with_entry(RECORD_KEY, "0.2.4");
        let notifier = ScriptedNotifier::choosing(Some(SEE_REQUIREMENTS));
        let opener = RecordingOpener::default();

        let outcome = show_whats_new(&store, &notifier, &opener, "0.3.0", REQUIREMENTS_URL);

        assert_eq!(outcome, NoticeOutcome::Opened);
        assert_eq!(*opener.opened.lock(), vec![REQUIREMENTS_URL.to_string()]);
    }

    #[test]
    fn test_patch_update_skipped_but_recorded() {
        let store = MemoryStore::with_entry(RECORD_KEY, "0.3.0");
        let notifier = ScriptedNotifier::choosing(Some(SEE_REQUIREMENTS));
        let opener = RecordingOpener::default();

        let outcome = show_whats_new(&store, &notifier, &opener, "0.3.2", REQUIREMENTS_URL);

        assert_eq!(outcome, NoticeOutcome::Skipped);
        assert!(notifier.shown.lock().is_empty());
        assert_eq!(store.get(RECORD_KEY).as_deref(), Some("0.3.2"));
    }

    #[test]
    fn test_downgrade_recorded() {
        let store = MemoryStore::with_entry(RECORD_KEY, "1.5.0");
        let notifier = ScriptedNotifier::choosing(None);
        let opener = RecordingOpener::default();

        let outcome = show_whats_new(&store, &notifier, &opener, "0.3.0", REQUIREMENTS_URL);

        assert_eq!(outcome, NoticeOutcome::Skipped);
        assert_eq!(store.get(RECORD_KEY).as_deref(), Some("0.3.0"));
    }

    #[test]
    fn test_second_run_is_quiet() {
        let store = MemoryStore::new();
        let notifier = ScriptedNotifier::choosing(None);
        let opener = RecordingOpener::default();

        show_whats_new(&store, &notifier, &opener, "0.3.0", REQUIREMENTS_URL);
        let outcome = show_whats_new(&store, &notifier, &opener, "0.3.0", REQUIREMENTS_URL);

        assert_eq!(outcome, NoticeOutcome::Skipped);
        assert_eq!(notifier.shown.lock().len(), 1);
    }

    #[test]
    fn test_open_failure_is_dismissed() {
        let store = MemoryStore::new();
        let notifier = ScriptedNotifier::choosing(Some(SEE_REQUIREMENTS));
        let opener = RecordingOpener {
            fail: true,
            ..Default::default()
        };

        let outcome = show_whats_new(&store, &notifier, &opener, "0.3.0", REQUIREMENTS_URL);
        assert_eq!(outcome, NoticeOutcome::Dismissed);
    }

    #[test]
    fn test_custom_url() {
        let store = MemoryStore::new();
        let notifier = ScriptedNotifier::choosing(Some(SEE_REQUIREMENTS));
        let opener = RecordingOpener::default();

        show_whats_new(&store, &notifier, &opener, "0.3.0", "https://example.com/reqs");
        assert_eq!(*opener.opened.lock(), vec!["https://example.com/reqs".to_string()]);
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("yep"));
    }

    #[test]
    fn test_opener_command_passes_url() {
        let cmd = opener_command(REQUIREMENTS_URL);
        assert!(
            cmd.get_args()
                .iter()
                .any(|a| a.to_string_lossy() == REQUIREMENTS_URL)
        );
    }
}
