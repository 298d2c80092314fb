//! One-shot commands: `convert` writes SVG, `render` writes the HTML page.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::PsConfig;
use crate::convert::{ConversionError, Converter, GhostscriptCairo, Svg};
use crate::log;
use crate::preview::{error_detail, web_preview};

/// Convert `input` to SVG and write it to `output` (default: `input.svg`).
pub fn convert_file(config: &PsConfig, input: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let converter = GhostscriptCairo::from_config(&config.convert);
    let svg = run_converter(&converter, input)?;

    let output = output_path(input, output, "svg");
    write_output(&output, svg.as_bytes())?;
    log!("convert"; "wrote {}", output.display());
    Ok(output)
}

/// Convert `input` and write a standalone preview page (default: `input.html`).
pub fn render_file(config: &PsConfig, input: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let converter = GhostscriptCairo::from_config(&config.convert);
    let svg = run_converter(&converter, input)?;

    let output = output_path(input, output, "html");
    write_output(&output, web_preview(&display_name(input), &svg).as_bytes())?;
    log!("render"; "wrote {}", output.display());
    Ok(output)
}

/// Run the converter, reporting a failed tool the way users are asked to file it.
pub fn run_converter(converter: &dyn Converter, input: &Path) -> Result<Svg> {
    converter.convert(input).map_err(|e| {
        report_failure(&e);
        anyhow::Error::new(e).context(format!("failed to convert {}", input.display()))
    })
}

pub fn report_failure(error: &ConversionError) {
    if let Some(program) = error.program() {
        log!("error"; "Failed to execute {}. Report bug with postscript file to dev.", program);
    }
    crate::debug!("error"; "{}", error_detail(error));
    if let Some(hint) = error.hint() {
        log!("hint"; "{}", hint);
    }
}

/// `output` if given, otherwise `input` with its extension replaced.
fn output_path(input: &Path, output: Option<&Path>, extension: &str) -> PathBuf {
    output.map_or_else(|| input.with_extension(extension), Path::to_path_buf)
}

fn display_name(input: &Path) -> String {
    input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string())
}

fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}
