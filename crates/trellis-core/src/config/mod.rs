//! Configuration management for Trellis.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `trellis.toml` file
//! 3. User config `~/.config/trellis/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

mod defaults;

pub use defaults::*;

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Root defaults for timeouts and slow thresholds.
    pub timing: TimingConfig,

    /// Options for the built-in tracing reporter.
    pub reporter: ReporterConfig,
}

impl RunnerConfig {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./trellis.toml` (project local)
    /// 2. `~/.config/trellis/config.toml` (user config)
    /// 3. Falls back to defaults
    ///
    /// Environment overrides are applied in every case.
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new(CONFIG_FILE_NAME).exists() {
            return Self::from_file(CONFIG_FILE_NAME);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(CONFIG_DIR_NAME).join(USER_CONFIG_FILE_NAME);
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from TOML text without consulting the environment.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(ms) = lookup(ENV_TIMEOUT).and_then(|v| v.trim().parse().ok()) {
            self.timing.timeout_ms = ms;
        }
        if let Some(ms) = lookup(ENV_SLOW).and_then(|v| v.trim().parse().ok()) {
            self.timing.slow_ms = ms;
        }
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Root timing defaults. A value of 0 disables the limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Default test timeout in milliseconds.
    pub timeout_ms: u64,

    /// Default slow threshold in milliseconds.
    pub slow_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            slow_ms: DEFAULT_SLOW_MS,
        }
    }
}

/// Options for [`TracingReporter`](crate::report::TracingReporter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// Log passing tests at `info` instead of `debug`.
    pub show_passes: bool,

    /// Log skipped tests at `info` instead of `debug`.
    pub show_skipped: bool,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            show_passes: DEFAULT_SHOW_PASSES,
            show_skipped: DEFAULT_SHOW_SKIPPED,
        }
    }
}
