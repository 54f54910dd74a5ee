// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON under the platform config directory
//! (`~/.config/geostamp/config.json` on Linux). Missing fields take their
//! defaults, so older files keep loading as fields are added.

use crate::constants;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Language used for overlay labels and remediation hints
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Locale {
    /// Simplified Chinese
    #[default]
    ZhCn,
    /// English
    En,
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zh" | "zh-cn" | "zh_cn" | "zhcn" => Ok(Locale::ZhCn),
            "en" | "en-us" | "en_us" => Ok(Locale::En),
            other => Err(format!("unsupported locale: {}", other)),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Overlay labels and remediation language
    pub locale: Locale,
    /// Bounded wait for a location fix, in milliseconds
    pub fix_timeout_ms: u64,
    /// Bounded wait for stream metadata and playback, in milliseconds
    pub priming_timeout_ms: u64,
    /// Font used to render the overlay
    pub font_path: Option<PathBuf>,
    /// Fixed UTC offset for the overlay clock; device local time when unset
    pub utc_offset_minutes: Option<i32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            fix_timeout_ms: constants::FIX_TIMEOUT.as_millis() as u64,
            priming_timeout_ms: constants::PRIMING_TIMEOUT.as_millis() as u64,
            font_path: None,
            utc_offset_minutes: None,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("geostamp").join("config.json"))
    }

    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Load from the default location, falling back to defaults
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
                Self::default()
            }
        }
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn fix_timeout(&self) -> Duration {
        Duration::from_millis(self.fix_timeout_ms)
    }

    pub fn priming_timeout(&self) -> Duration {
        Duration::from_millis(self.priming_timeout_ms)
    }
}
