//! pspreview - preview PostScript/EPS documents as SVG.

mod cli;
mod config;
mod convert;
mod core;
mod embed;
mod logger;
mod preview;
mod utils;
mod version;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{PsConfig, init_config};
use version::{CURRENT_VERSION, JsonFileStore, NoticeOutcome, SystemOpener, TerminalNotifier};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = init_config(PsConfig::load(cli)?);

    if config.notice.enable {
        run_notice(&config);
    }

    match &cli.command {
        Commands::Convert { input, output } => {
            cli::convert::convert_file(&config, &input.input, output.as_deref()).map(|_| ())
        }
        Commands::Render { input, output } => {
            cli::convert::render_file(&config, &input.input, output.as_deref()).map(|_| ())
        }
        Commands::Preview { input, .. } => cli::preview::serve_preview(&config, &input.input),
    }
}

/// Show the what's-new notice if this version warrants it.
fn run_notice(config: &PsConfig) {
    let store = JsonFileStore::new(config.state_dir());
    let notifier = TerminalNotifier {
        url: config.notice.url.clone(),
    };

    let outcome = version::show_whats_new(
        &store,
        &notifier,
        &SystemOpener,
        CURRENT_VERSION,
        &config.notice.url,
    );
    if outcome != NoticeOutcome::Skipped {
        debug!("notice"; "{:?} ({})", outcome, store.path().display());
    }
}
