//! Suite configuration loaded from `strobe.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strobe_common::SimTime;
use strobe_sim::KernelConfig;
use thiserror::Error;

/// Errors raised while loading or validating a suite configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config '{path}': {source}")]
    Io {
        /// Path that failed to open.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The file parsed but holds an unusable value.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level `strobe.toml` schema.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// The `[suite]` section.
    #[serde(default)]
    pub suite: SuiteSection,
}

/// Suite-wide defaults; individual scenarios may override the time limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteSection {
    /// Display name for the suite.
    #[serde(default = "default_name")]
    pub name: String,
    /// Default per-scenario time limit in nanoseconds. `None` runs each
    /// scenario until its event queue drains.
    #[serde(default)]
    pub time_limit_ns: Option<u64>,
    /// Zero-time iteration cap passed to every kernel.
    #[serde(default = "default_max_deltas")]
    pub max_deltas_per_step: u32,
    /// Seed for seeded stimulus sources.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Optional file every scenario's log is appended to.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_name() -> String {
    "strobe".to_string()
}

fn default_max_deltas() -> u32 {
    10_000
}

fn default_seed() -> u64 {
    1
}

impl Default for SuiteSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            time_limit_ns: None,
            max_deltas_per_step: default_max_deltas(),
            seed: default_seed(),
            log_file: None,
        }
    }
}

impl SuiteConfig {
    /// The kernel limits this configuration implies.
    pub fn kernel_config(&self) -> KernelConfig {
        KernelConfig {
            max_deltas_per_step: self.suite.max_deltas_per_step,
        }
    }

    /// The default scenario time limit, if one is configured.
    pub fn time_limit(&self) -> Option<SimTime> {
        self.suite.time_limit_ns.map(SimTime::from_ns)
    }
}

/// Reads and validates a configuration file.
pub fn load_config(path: &Path) -> Result<SuiteConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_config_from_str(&text)
}

/// Parses and validates configuration text.
pub fn load_config_from_str(text: &str) -> Result<SuiteConfig, ConfigError> {
    let config: SuiteConfig = toml::from_str(text)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &SuiteConfig) -> Result<(), ConfigError> {
    let suite = &config.suite;
    if suite.name.is_empty() {
        return Err(ConfigError::Invalid("suite name must not be empty".into()));
    }
    if suite.max_deltas_per_step == 0 {
        return Err(ConfigError::Invalid(
            "max_deltas_per_step must be at least 1".into(),
        ));
    }
    if suite.time_limit_ns == Some(0) {
        return Err(ConfigError::Invalid(
            "time_limit_ns must be positive when set".into(),
        ));
    }
    Ok(())
}
