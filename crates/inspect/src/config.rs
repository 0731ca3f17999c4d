//! CLI configuration
//!
//! Optional TOML file with defaults for the command-line flags:
//!
//! ```toml
//! format = "json"
//! layout = "arm64-top-byte"
//! ```
//!
//! Flags given on the command line win over the file.

use clap::ValueEnum;
use nanval_core::LayoutKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How reports are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InspectConfig {
    #[serde(default)]
    pub format: Option<OutputFormat>,
    /// Pointer layout used to decode managed words
    #[serde(default)]
    pub layout: Option<LayoutKind>,
}

impl InspectConfig {
    /// Parse configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse config: {}", e))
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
        Self::from_toml(&content)
    }

    /// Effective output format given an optional command-line flag
    pub fn format(&self, flag: Option<OutputFormat>) -> OutputFormat {
        flag.or(self.format).unwrap_or_default()
    }

    /// Effective pointer layout given an optional command-line flag
    pub fn layout(&self, flag: Option<LayoutKind>) -> LayoutKind {
        flag.or(self.layout).unwrap_or_else(LayoutKind::native)
    }
}
