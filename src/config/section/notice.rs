//! `[notice]` section configuration.
//!
//! Startup what's-new notice.
//!
//! # Example
//!
//! ```toml
//! [notice]
//! enable = true
//! url = "https://github.com/ahnafnafee/PostScript-Preview#requirements"
//! state_dir = ".pspreview"   # relative to the config file; default: per-user data dir
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::version::REQUIREMENTS_URL;

/// What's-new notice settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeConfig {
    /// Check the version record at startup.
    pub enable: bool,

    /// Target of the "See Requirements" action.
    pub url: String,

    /// Directory holding `state.json`; `None` uses the per-user data dir.
    pub state_dir: Option<PathBuf>,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            enable: true,
            url: REQUIREMENTS_URL.to_string(),
            state_dir: None,
        }
    }
}

impl NoticeConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.enable {
            return;
        }
        if !(self.url.starts_with("https://") || self.url.starts_with("http://")) {
            diag.error_with_hint(
                "notice.url",
                format!("`{}` is not an http(s) URL", self.url),
                "remove the field to use the default requirements page",
            );
        }
    }
}
