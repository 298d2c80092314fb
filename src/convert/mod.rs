//! PostScript → SVG conversion.
//!
//! Conversion is delegated to external tools behind the [`Converter`]
//! capability, so everything above this module only sees SVG bytes or a
//! [`ConversionError`].
//!
//! - `pipeline` - `ps2pdf` + `pdftocairo` implementation

mod pipeline;

pub use pipeline::GhostscriptCairo;

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use thiserror::Error;

/// Converted SVG document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Svg(Vec<u8>);

impl Svg {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Markup suitable for inlining into HTML: UTF-8 (lossy) with any XML
    /// prolog, DOCTYPE or leading comments before `<svg` removed.
    pub fn inline_markup(&self) -> String {
        let text = String::from_utf8_lossy(&self.0);
        match text.find("<svg") {
            Some(start) => text[start..].trim_end().to_string(),
            None => text.trim().to_string(),
        }
    }
}

/// Conversion failures.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("input file `{0}` does not exist")]
    MissingInput(PathBuf),

    #[error("`{program}` not found in PATH")]
    MissingBinary { program: String },

    #[error("`{program}` failed with {status}{}", stderr_suffix(.stderr))]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("IO error on `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\n{stderr}")
    }
}

impl ConversionError {
    /// Program that failed, if the failure came from an external tool.
    pub fn program(&self) -> Option<&str> {
        match self {
            Self::MissingBinary { program } | Self::Failed { program, .. } => Some(program),
            Self::MissingInput(_) | Self::Io(..) => None,
        }
    }

    /// Install hint for a missing tool.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingBinary { program } if program.contains("ps2pdf") => {
                Some("install Ghostscript (provides ps2pdf)")
            }
            Self::MissingBinary { program } if program.contains("pdftocairo") => {
                Some("install Poppler (provides pdftocairo)")
            }
            _ => None,
        }
    }
}

/// Capability that turns a PostScript/EPS file into SVG.
pub trait Converter: Send + Sync {
    fn convert(&self, input: &Path) -> Result<Svg, ConversionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_markup_strips_prolog() {
        let svg = Svg::new(
            b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE svg>\n<svg xmlns=\"http://www.w3.org/2000/svg\"><g/></svg>\n"
                .to_vec(),
        );
        assert_eq!(
            svg.inline_markup(),
            "<svg xmlns=\"http://www.w3.org/2000/svg\"><g/></svg>"
        );
    }

    #[test]
    fn test_inline_markup_without_svg_tag() {
        let svg = Svg::new(b"  not svg  ".to_vec());
        assert_eq!(svg.inline_markup(), "not svg");
    }

    #[test]
    fn test_error_program_and_hint() {
        let err = ConversionError::MissingBinary {
            program: "ps2pdf".into(),
        };
        assert_eq!(err.program(), Some("ps2pdf"));
        assert!(err.hint().unwrap().contains("Ghostscript"));

        let err = ConversionError::MissingBinary {
            program: "/usr/bin/pdftocairo".into(),
        };
        assert!(err.hint().unwrap().contains("Poppler"));

        let err = ConversionError::MissingInput(PathBuf::from("a.eps"));
        assert_eq!(err.program(), None);
        assert_eq!(err.hint(), None);
    }

    #[test]
    fn test_missing_binary_display() {
        let err = ConversionError::MissingBinary {
            program: "pdftocairo".into(),
        };
        assert_eq!(err.to_string(), "`pdftocairo` not found in PATH");
    }
}
