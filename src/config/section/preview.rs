//! `[preview]` section configuration.
//!
//! Contains live preview server settings.
//!
//! # Example
//!
//! ```toml
//! [preview]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 5278                 # HTTP port number
//! watch = true                # Re-render when the input is saved
//! open = false                # Open the page in the default browser
//! ```

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

/// Live preview server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Network interface to bind.
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Re-render on save.
    pub watch: bool,

    /// Open the preview in the default browser once bound.
    pub open: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 5278,
            watch: true,
            open: false,
        }
    }
}

impl PreviewConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.port == 0 {
            diag.error("preview.port", "port must be between 1 and 65535");
        }
    }
}
