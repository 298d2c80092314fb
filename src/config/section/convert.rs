//! `[convert]` section configuration.
//!
//! External tools used for the PostScript → PDF → SVG pipeline.
//!
//! # Example
//!
//! ```toml
//! [convert]
//! ps2pdf = "ps2pdf"           # Ghostscript wrapper (PS/EPS -> PDF)
//! pdftocairo = "pdftocairo"   # Poppler tool (PDF -> SVG)
//! eps_crop = true             # Crop to the EPS bounding box
//! page = 1                    # Page to convert (1-based)
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

/// Converter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// `ps2pdf` program name or path.
    pub ps2pdf: String,

    /// `pdftocairo` program name or path.
    pub pdftocairo: String,

    /// Pass `-dEPSCrop` to ps2pdf.
    pub eps_crop: bool,

    /// Page to convert (1-based).
    pub page: u32,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            ps2pdf: "ps2pdf".to_string(),
            pdftocairo: "pdftocairo".to_string(),
            eps_crop: true,
            page: 1,
        }
    }
}

impl ConvertConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.ps2pdf.trim().is_empty() {
            diag.error_with_hint(
                "convert.ps2pdf",
                "program name is empty",
                "remove the field to use `ps2pdf` from PATH",
            );
        }
        if self.pdftocairo.trim().is_empty() {
            diag.error_with_hint(
                "convert.pdftocairo",
                "program name is empty",
                "remove the field to use `pdftocairo` from PATH",
            );
        }
        if self.page == 0 {
            diag.error("convert.page", "pages are numbered from 1");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_convert_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.convert, ConvertConfig::default());
        assert_eq!(config.convert.ps2pdf, "ps2pdf");
        assert_eq!(config.convert.pdftocairo, "pdftocairo");
        assert!(config.convert.eps_crop);
        assert_eq!(config.convert.page, 1);
    }

    #[test]
    fn test_convert_override() {
        let config = test_parse_config(
            "[convert]\nps2pdf = \"/opt/gs/bin/ps2pdf\"\neps_crop = false\npage = 3",
        );
        assert_eq!(config.convert.ps2pdf, "/opt/gs/bin/ps2pdf");
        assert_eq!(config.convert.pdftocairo, "pdftocairo");
        assert!(!config.convert.eps_crop);
        assert_eq!(config.convert.page, 3);
    }

    #[test]
    fn test_convert_validate() {
        let mut diag = ConfigDiagnostics::new();
        ConvertConfig::default().validate(&mut diag);
        assert!(diag.is_empty());

        let config = ConvertConfig {
            ps2pdf: " ".into(),
            page: 0,
            ..Default::default()
        };
        config.validate(&mut diag);
        assert_eq!(diag.len(), 2);
    }
}
