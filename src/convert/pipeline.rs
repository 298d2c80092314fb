//! `ps2pdf` → `pdftocairo` conversion.
//!
//! ```text
//! input.eps ──ps2pdf -dEPSCrop──▶ tmp/page.pdf ──pdftocairo -svg -f N -l N──▶ tmp/page.svg
//! ```
//!
//! Intermediates live in a private temp directory removed on drop, so a
//! failed step never leaves stray files behind.

use std::ffi::OsString;
use std::fs;
use std::path::Path;

use tempfile::TempDir;

use super::{ConversionError, Converter, Svg};
use crate::config::ConvertConfig;
use crate::debug;
use crate::utils::exec::{Cmd, FilterRule};

/// Ghostscript banner and Poppler font noise.
static TOOL_FILTER: FilterRule = FilterRule::new(&[
    "GPL Ghostscript",
    "Copyright (C)",
    "This software is supplied",
    "Syntax Warning:",
]);

const PDF_NAME: &str = "page.pdf";
const SVG_NAME: &str = "page.svg";

/// Converter backed by Ghostscript's `ps2pdf` and Poppler's `pdftocairo`.
#[derive(Debug, Clone)]
pub struct GhostscriptCairo {
    ps2pdf: String,
    pdftocairo: String,
    eps_crop: bool,
    page: u32,
}

impl GhostscriptCairo {
    pub fn from_config(config: &ConvertConfig) -> Self {
        Self {
            ps2pdf: config.ps2pdf.clone(),
            pdftocairo: config.pdftocairo.clone(),
            eps_crop: config.eps_crop,
            page: config.page.max(1),
        }
    }

    /// `ps2pdf [-dEPSCrop] <input> <pdf>`
    fn ps2pdf_cmd(&self, input: &Path, pdf: &Path) -> Cmd {
        let crop = if self.eps_crop { "-dEPSCrop" } else { "" };
        Cmd::new(&self.ps2pdf)
            .arg(crop)
            .arg(input)
            .arg(pdf)
            .filter(&TOOL_FILTER)
    }

    /// `pdftocairo -svg -f <page> -l <page> <pdf> <svg>`
    fn pdftocairo_cmd(&self, pdf: &Path, svg: &Path) -> Cmd {
        let page = self.page.to_string();
        Cmd::new(&self.pdftocairo)
            .args(["-svg", "-f", &page, "-l", &page])
            .arg(pdf)
            .arg(svg)
            .filter(&TOOL_FILTER)
    }
}

impl Converter for GhostscriptCairo {
    fn convert(&self, input: &Path) -> Result<Svg, ConversionError> {
        if !input.is_file() {
            return Err(ConversionError::MissingInput(input.to_path_buf()));
        }

        let scratch = tempfile::Builder::new()
            .prefix("pspreview-")
            .tempdir()
            .map_err(|e| ConversionError::Io(std::env::temp_dir(), e))?;
        let pdf = scratch.path().join(PDF_NAME);
        let svg = scratch.path().join(SVG_NAME);

        run_step(self.ps2pdf_cmd(input, &pdf))?;
        run_step(self.pdftocairo_cmd(&pdf, &svg))?;

        let bytes = fs::read(&svg).map_err(|e| ConversionError::Io(svg.clone(), e))?;
        debug!("convert"; "{} -> {} bytes of svg", input.display(), bytes.len());

        close(scratch);
        Ok(Svg::new(bytes))
    }
}

/// Run one pipeline step, mapping spawn and exit failures to typed errors.
fn run_step(cmd: Cmd) -> Result<(), ConversionError> {
    let program = cmd.program_name();
    if which::which(&program).is_err() {
        return Err(ConversionError::MissingBinary { program });
    }

    debug!("convert"; "{} {}", program, display_args(cmd.get_args()));

    let output = cmd.output().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConversionError::MissingBinary {
            program: program.clone(),
        },
        _ => ConversionError::Io(program.clone().into(), e),
    })?;

    if !output.status.success() {
        let stderr = TOOL_FILTER
            .apply(&String::from_utf8_lossy(&output.stderr))
            .join("\n");
        return Err(ConversionError::Failed {
            program,
            status: output.status,
            stderr,
        });
    }
    Ok(())
}

fn display_args(args: &[OsString]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove the scratch directory, logging instead of failing.
fn close(scratch: TempDir) {
    let path = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        debug!("convert"; "failed to remove {}: {}", path.display(), e);
    }
}
