// collateral-config/src/config.rs
// ============================================================================
// Module: Harness Configuration
// Description: Configuration loading and validation for the collateral harness.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: collateral-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Unknown keys are rejected. Collateral default overrides use the same
//! all-optional option set the suites accept, and are resolved once during
//! validation so malformed numbers fail before any suite runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use collateral_core::CollateralConfig;
use collateral_core::CollateralOpts;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "collateral-harness.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "COLLATERAL_HARNESS_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 256 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of enabled suites.
pub(crate) const MAX_ENABLED_SUITES: usize = 32;
/// Maximum length of a suite name.
pub(crate) const MAX_SUITE_NAME_LENGTH: usize = 64;
/// Maximum length of a case filter.
pub(crate) const MAX_FILTER_LENGTH: usize = 256;
/// Default fork genesis timestamp (2023-11-14T22:13:20Z).
pub const DEFAULT_GENESIS_TIMESTAMP: u64 = 1_700_000_000;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Harness configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    /// Fork settings.
    #[serde(default)]
    pub fork: ForkConfig,
    /// Overrides merged onto every suite's defaults table.
    #[serde(default)]
    pub defaults: CollateralOpts,
    /// Suite selection.
    #[serde(default)]
    pub suites: SuitesConfig,
    /// Suite event logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HarnessConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_config_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fork.validate()?;
        self.defaults
            .resolve(&CollateralConfig::default())
            .map_err(|err| ConfigError::Invalid(format!("defaults: {err}")))?;
        self.suites.validate()?;
        self.logging.validate()
    }
}

/// Fork settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForkConfig {
    /// Genesis block timestamp in unix seconds.
    #[serde(default = "default_genesis_timestamp")]
    pub genesis_timestamp: u64,
}

impl Default for ForkConfig {
    fn default() -> Self {
        Self { genesis_timestamp: DEFAULT_GENESIS_TIMESTAMP }
    }
}

impl ForkConfig {
    /// Validates fork settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.genesis_timestamp == 0 {
            return Err(ConfigError::Invalid("fork.genesis_timestamp must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Default genesis timestamp for serde.
const fn default_genesis_timestamp() -> u64 {
    DEFAULT_GENESIS_TIMESTAMP
}

/// Suite selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuitesConfig {
    /// Suites to run; empty means every built-in suite.
    #[serde(default)]
    pub enabled: Vec<String>,
    /// Only run cases whose `group: case` name contains this text.
    #[serde(default)]
    pub filter: Option<String>,
}

impl SuitesConfig {
    /// Validates suite selection.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled.len() > MAX_ENABLED_SUITES {
            return Err(ConfigError::Invalid("suites.enabled exceeds max entries".to_string()));
        }
        let mut seen = BTreeSet::new();
        for name in &self.enabled {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::Invalid(
                    "suites.enabled entries must be non-empty".to_string(),
                ));
            }
            if trimmed.len() > MAX_SUITE_NAME_LENGTH {
                return Err(ConfigError::Invalid(format!(
                    "suites.enabled entry exceeds {MAX_SUITE_NAME_LENGTH} characters"
                )));
            }
            if !seen.insert(trimmed) {
                return Err(ConfigError::Invalid(format!("suites.enabled repeats {trimmed}")));
            }
        }
        if let Some(filter) = &self.filter {
            if filter.trim().is_empty() {
                return Err(ConfigError::Invalid("suites.filter must be non-empty".to_string()));
            }
            if filter.len() > MAX_FILTER_LENGTH {
                return Err(ConfigError::Invalid("suites.filter exceeds max length".to_string()));
            }
        }
        Ok(())
    }
}

/// Event sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSink {
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to `logging.path`.
    File,
    /// No event output.
    #[default]
    None,
}

/// Suite event logging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Where events go.
    #[serde(default)]
    pub sink: LogSink,
    /// Output path for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl LoggingConfig {
    /// Validates logging settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (LogSink::File, Some(path)) => validate_path_string("logging.path", path),
            (LogSink::File, None) => {
                Err(ConfigError::Invalid("logging.sink = \"file\" requires logging.path".to_string()))
            }
            (_, Some(_)) => {
                Err(ConfigError::Invalid("logging.path requires logging.sink = \"file\"".to_string()))
            }
            (_, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the flag, then the environment, then the
/// default filename.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the environment path is too long.
pub fn resolve_config_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}
