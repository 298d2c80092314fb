//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// PostScript/EPS previewer CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: pspreview.toml, searched upward from cwd)
    #[arg(short = 'C', long, global = true, default_value = "pspreview.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Skip the what's-new notice for this run
    #[arg(long, global = true)]
    pub no_notice: bool,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Convert a PostScript/EPS file to SVG
    #[command(visible_alias = "c")]
    Convert {
        #[command(flatten)]
        input: InputArgs,

        /// Output SVG path (default: input with .svg extension)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Write a standalone HTML preview page
    #[command(visible_alias = "r")]
    Render {
        #[command(flatten)]
        input: InputArgs,

        /// Output HTML path (default: input with .html extension)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Serve a live preview that re-renders when the file is saved
    #[command(visible_alias = "p")]
    Preview {
        #[command(flatten)]
        input: InputArgs,

        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Re-render when the input file is saved
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,

        /// Open the preview in the default browser
        #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        open: Option<bool>,
    },
}

/// Input file and conversion overrides shared by all commands.
#[derive(clap::Args, Debug, Clone)]
pub struct InputArgs {
    /// PostScript or EPS file to convert
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Page to convert (1-based)
    #[arg(long)]
    pub page: Option<u32>,

    /// Crop to the EPS bounding box (ps2pdf -dEPSCrop)
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub eps_crop: Option<bool>,
}
