//! Configuration handling for dropfs.
//!
//! Values come from the TOML config file, then `DROPFS_*` environment
//! variables, then command-line flags, each layer overriding the last.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use dropfs_core::{DEFAULT_MAX_TEXT_BYTES, Limits};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding `[sandbox] root`.
pub const ENV_ROOT: &str = "DROPFS_ROOT";
/// Environment variable overriding `[sandbox] max_text_bytes`.
pub const ENV_TEXT_LIMIT: &str = "DROPFS_TEXT_LIMIT_BYTES";
/// Environment variable overriding the config directory.
pub const ENV_CONFIG_DIR: &str = "DROPFS_CONFIG_DIR";

const SAMPLE_TOML: &str = r#"# dropfs configuration

[sandbox]
# Directory every operation is confined to. Must exist.
root = "/srv/dropfs"

# Largest text file cat/read/write will handle, in bytes.
max_text_bytes = 524288

[logging]
# trace, debug, info, warn or error
level = "info"

# Append logs here instead of stderr.
# file = "/var/log/dropfs.log"
"#;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Sandbox configuration
    #[serde(default)]
    pub sandbox: SandboxConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Sandbox-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SandboxConfig {
    /// Root directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Text size limit (bytes)
    #[serde(default = "default_max_text_bytes")]
    pub max_text_bytes: u64,
}

fn default_max_text_bytes() -> u64 {
    DEFAULT_MAX_TEXT_BYTES
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            root: None,
            max_text_bytes: default_max_text_bytes(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load from `path`, or the default location when `None`.
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load_from(path: Option<PathBuf>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::read_file(&path)?,
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::read_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn read_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse TOML config text.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `DROPFS_*` overrides looked up through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(root) = lookup(ENV_ROOT).filter(|v| !v.is_empty()) {
            self.sandbox.root = Some(PathBuf::from(root));
        }
        if let Some(limit) = lookup(ENV_TEXT_LIMIT) {
            self.sandbox.max_text_bytes = limit
                .trim()
                .parse()
                .with_context(|| format!("{ENV_TEXT_LIMIT} is not a byte count: {limit:?}"))?;
        }
        Ok(())
    }

    /// Size limits for the sandbox.
    #[must_use]
    pub fn limits(&self) -> Limits {
        Limits {
            max_text_bytes: self.sandbox.max_text_bytes,
        }
    }

    /// Default config file location.
    pub fn config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Commented sample configuration.
    #[must_use]
    pub fn sample_toml() -> &'static str {
        SAMPLE_TOML
    }
}

/// Get the XDG config directory for dropfs.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "dropfs").map(|dirs| dirs.config_dir().to_path_buf())
}
