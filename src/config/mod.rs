//! Previewer configuration from `pspreview.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [convert], [preview], [notice]
//! ├── types/         # ConfigError, ConfigDiagnostics, global handle
//! ├── util.rs        # config file discovery
//! └── mod.rs         # PsConfig (this file)
//! ```
//!
//! The config file is optional: without one every section takes its
//! defaults. CLI flags are applied on top of whatever was loaded.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{ConvertConfig, NoticeConfig, PreviewConfig};
pub use types::{ConfigDiagnostics, ConfigError, cfg, init_config, reload_config};

use crate::{
    cli::{Cli, Commands, InputArgs},
    log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing pspreview.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PsConfig {
    /// CLI arguments reference (internal use only)
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file, whether or not it exists (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory relative paths in the config resolve against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Converter settings
    #[serde(default)]
    pub convert: ConvertConfig,

    /// Live preview server settings
    #[serde(default)]
    pub preview: PreviewConfig,

    /// What's-new notice settings
    #[serde(default)]
    pub notice: NoticeConfig,
}

impl PsConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file; a missing file means
    /// defaults, rooted at cwd.
    pub fn load(cli: &'static Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
                config.config_path = path;
                config
            }
            None => Self {
                config_path: cwd.join(&cli.config),
                root: cwd,
                ..Self::default()
            },
        };

        config.cli = Some(cli);
        config.finalize(cli);
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::from)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
    }

    /// Directory holding the version record.
    pub fn state_dir(&self) -> PathBuf {
        match &self.notice.state_dir {
            Some(dir) => self.root.join(dir),
            None => crate::version::record::default_state_dir(),
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply CLI options on top of the loaded file.
    fn finalize(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        if cli.no_notice {
            self.notice.enable = false;
        }

        match &cli.command {
            Commands::Convert { input, .. } | Commands::Render { input, .. } => {
                self.apply_input_args(input);
            }
            Commands::Preview {
                input,
                interface,
                port,
                watch,
                open,
            } => {
                self.apply_input_args(input);
                Self::update_option(&mut self.preview.interface, interface.as_ref());
                Self::update_option(&mut self.preview.port, port.as_ref());
                Self::update_option(&mut self.preview.watch, watch.as_ref());
                Self::update_option(&mut self.preview.open, open.as_ref());
            }
        }
    }

    fn apply_input_args(&mut self, args: &InputArgs) {
        Self::update_option(&mut self.convert.page, args.page.as_ref());
        Self::update_option(&mut self.convert.eps_crop, args.eps_crop.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate all sections, collecting every error before failing.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.convert.validate(&mut diag);
        self.preview.validate(&mut diag);
        self.notice.validate(&mut diag);

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse a config snippet.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PsConfig {
    let (parsed, ignored) = PsConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn leak_cli(args: &[&str]) -> &'static Cli {
        Box::leak(Box::new(Cli::parse_from(args)))
    }

    #[test]
    fn test_invalid_toml() {
        assert!(PsConfig::parse_with_ignored("[convert\npage = 1").is_err());
    }

    #[test]
    fn test_unknown_fields_collected() {
        let (config, ignored) =
            PsConfig::parse_with_ignored("[convert]\npage = 2\nzoom = 3\n[extra]\nx = 1").unwrap();
        assert_eq!(config.convert.page, 2);
        assert_eq!(ignored, vec!["convert.zoom".to_string(), "extra".to_string()]);
    }

    #[test]
    fn test_cli_overrides_convert() {
        let cli = leak_cli(&["pspreview", "convert", "a.eps", "--page", "4", "--eps-crop", "false"]);
        let mut config = test_parse_config("[convert]\npage = 2");
        config.finalize(cli);
        assert_eq!(config.convert.page, 4);
        assert!(!config.convert.eps_crop);
    }

    #[test]
    fn test_cli_overrides_preview() {
        let cli = leak_cli(&["pspreview", "preview", "a.eps", "-p", "9000", "-w", "false", "--open"]);
        let mut config = test_parse_config("[preview]\nport = 7000\nwatch = true");
        config.finalize(cli);
        assert_eq!(config.preview.port, 9000);
        assert!(!config.preview.watch);
        assert!(config.preview.open);
    }

    #[test]
    fn test_cli_without_flags_keeps_file_values() {
        let cli = leak_cli(&["pspreview", "render", "a.eps"]);
        let mut config = test_parse_config("[convert]\npage = 2\neps_crop = false");
        config.finalize(cli);
        assert_eq!(config.convert.page, 2);
        assert!(!config.convert.eps_crop);
        assert!(config.notice.enable);
    }

    #[test]
    fn test_no_notice_flag() {
        let cli = leak_cli(&["pspreview", "--no-notice", "render", "a.eps"]);
        let mut config = PsConfig::default();
        config.finalize(cli);
        assert!(!config.notice.enable);
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let config = test_parse_config("[convert]\npage = 0\nps2pdf = \"\"\n[preview]\nport = 0");
        let err = config.validate().unwrap_err();
        match err.downcast_ref::<ConfigError>() {
            Some(ConfigError::Diagnostics(diag)) => assert_eq!(diag.len(), 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_state_dir_relative_to_root() {
        let mut config = test_parse_config("[notice]\nstate_dir = \".pspreview\"");
        config.root = PathBuf::from("/work/figures");
        assert_eq!(config.state_dir(), PathBuf::from("/work/figures/.pspreview"));
    }

    #[test]
    fn test_state_dir_default() {
        let config = PsConfig::default();
        assert!(config.state_dir().ends_with("pspreview"));
    }
}
