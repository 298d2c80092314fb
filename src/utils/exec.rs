//! External command execution utilities.
//!
//! Provides a Builder-based API for running converter tools and the
//! platform URL opener with proper output handling.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! // Detached launch: only the exit status matters
//! Cmd::new("xdg-open").arg(url).status()?;
//!
//! // Raw output, caller inspects the status
//! let output = Cmd::new("ps2pdf").args(["-dEPSCrop", "in.eps", "out.pdf"]).output()?;
//! ```

use crate::log;
use anyhow::{Context, Result};
use regex::Regex;
use std::{
    ffi::{OsStr, OsString},
    io,
    process::{Command, Output, Stdio},
    sync::OnceLock,
};

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    filter: Option<&'static FilterRule>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Add a single argument. Empty arguments are dropped.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Set output filter for logging.
    pub fn filter(mut self, filter: &'static FilterRule) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Program name for error messages.
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Arguments as passed to the process.
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Spawn the process and collect its output without checking the exit status.
    ///
    /// Stdin is closed so tools that fall back to reading it never block.
    pub fn output(&self) -> io::Result<Output> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = cmd.output()?;
        if output.status.success() {
            let filter = self.filter.unwrap_or(&EMPTY_FILTER);
            filter.log(&self.program_name(), String::from_utf8_lossy(&output.stderr).trim());
        }
        Ok(output)
    }

    /// Run with all stdio detached and wait only for the exit status.
    ///
    /// For launchers whose children outlive them: nothing is captured, so a
    /// spawned browser holding inherited handles cannot keep this waiting.
    pub fn status(self) -> Result<()> {
        let name = self.program_name();
        let status = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("Failed to execute `{name}`"))?;

        if !status.success() {
            anyhow::bail!("`{name}` exited with {status}");
        }
        Ok(())
    }
}

// ============================================================================
// Output Filtering
// ============================================================================

/// Filter rule for command output logging.
///
/// Used to reduce noise by skipping known banners and warnings.
pub struct FilterRule {
    /// Prefixes to skip when logging output.
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    fn should_skip(&self, line: &str) -> bool {
        line.is_empty() || self.skip_prefixes.iter().any(|p| line.starts_with(p))
    }

    /// Keep lines that pass the filter, with ANSI codes stripped.
    pub fn apply(&self, output: &str) -> Vec<String> {
        output
            .lines()
            .map(|line| strip_ansi(line).trim().to_string())
            .filter(|line| !self.should_skip(line))
            .collect()
    }

    /// Log output lines that pass the filter.
    pub fn log(&self, name: &str, output: &str) {
        let lines = self.apply(output);
        if !lines.is_empty() {
            log!(name; "{}", lines.join("\n"));
        }
    }
}

/// Empty filter (no skipping).
pub const EMPTY_FILTER: FilterRule = FilterRule::new(&[]);

// ============================================================================
// Helpers
// ============================================================================

/// Strip ANSI escape codes from string.
fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid ANSI regex"));
    re.replace_all(s, "")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmd_builder() {
        let cmd = Cmd::new("pdftocairo")
            .arg("-svg")
            .args(["-f", "1"]);

        assert_eq!(cmd.program, OsString::from("pdftocairo"));
        assert_eq!(cmd.args.len(), 3);
        assert!(cmd.filter.is_none());
    }

    #[test]
    fn test_empty_args_filtered() {
        let cmd = Cmd::new("ps2pdf").arg("").args(["a", "", "b"]);
        assert_eq!(cmd.get_args().len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_status_does_not_wait_for_background_children() {
        let start = std::time::Instant::now();
        Cmd::new("sh").args(["-c", "sleep 4 & exit 0"]).status().unwrap();
        assert!(start.elapsed() < std::time::Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[test]
    fn test_status_reports_failure() {
        let err = Cmd::new("false").status().unwrap_err();
        assert!(err.to_string().contains("`false` exited"));
    }

    #[test]
    fn test_filter_rule() {
        let filter = FilterRule::new(&["GPL Ghostscript", "Syntax Warning"]);
        assert!(filter.should_skip("GPL Ghostscript 10.02.1 (2023-11-01)"));
        assert!(filter.should_skip("Syntax Warning: Invalid Font Weight"));
        assert!(!filter.should_skip("Error: /undefined in foo"));
        assert!(filter.should_skip(""));
    }

    #[test]
    fn test_filter_apply_strips_ansi() {
        let lines = EMPTY_FILTER.apply("\x1b[31mError\x1b[0m\n\n  ok  ");
        assert_eq!(lines, vec!["Error".to_string(), "ok".to_string()]);
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[31mRed\x1b[0m"), "Red");
        assert_eq!(strip_ansi("Plain text"), "Plain text");
    }

    #[cfg(unix)]
    #[test]
    fn test_simple_command() {
        let output = Cmd::new("echo").arg("hello").output().unwrap();
        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("hello"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_keeps_stderr() {
        let output = Cmd::new("sh")
            .args(["-c", "echo broken >&2; exit 3"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(3));
        assert!(String::from_utf8_lossy(&output.stderr).contains("broken"));
    }

    #[test]
    fn test_missing_program() {
        let err = Cmd::new("pspreview-no-such-program").status().unwrap_err();
        assert!(format!("{err}").contains("pspreview-no-such-program"));
    }
}
