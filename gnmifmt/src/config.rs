//! gnmifmt configuration

use std::path::Path;

use gnmifmt_common::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration for the formatter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatterConfig {
    /// Output settings
    #[serde(default)]
    pub output: OutputSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How converted lines are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Time zone used for the `[timestamp]` column
    #[serde(default)]
    pub timezone: TimeZoneMode,

    /// Characters of a malformed line echoed with its diagnostic (0 disables)
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            timezone: TimeZoneMode::default(),
            preview_chars: default_preview_chars(),
        }
    }
}

/// Time zone for rendered timestamps
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeZoneMode {
    /// UTC, rendered with a `Z` suffix
    #[default]
    Utc,

    /// Host local time, rendered with a `+HH:MM` offset
    Local,
}

fn default_preview_chars() -> usize {
    200
}

impl FormatterConfig {
    /// Load configuration from a JSON5 file
    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Ok(gnmifmt_common::load_config(path)?)
    }
}
