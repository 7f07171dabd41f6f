//! Configuration system for the pipeline core.
//!
//! This module defines the configuration structures used to parameterize the core.
//! It provides:
//! 1. **Defaults:** Baseline constants (reset vector, feature set).
//! 2. **Structures:** General settings and the optional-feature switches.
//! 3. **Validation:** Checks that a deserialized configuration can actually run.
//!
//! Configuration is supplied as JSON (`Config::from_json`) or built with `Config::default()`.

use serde::Deserialize;

use crate::common::error::ConfigError;

/// Default configuration constants for the core.
mod defaults {
    /// Address the supervisor PC holds after reset.
    pub const RESET_ADDRESS: u32 = crate::common::constants::DEFAULT_RESET_ADDRESS;

    /// Optional units and behaviours that are present unless switched off.
    pub const FEATURE_ON: bool = true;

    /// The floating-point unit is absent unless switched on.
    pub const FPU: bool = false;
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use pipecore::config::Config;
///
/// let json = r#"{
///     "general": { "reset_address": 4096, "trace": true },
///     "features": { "divide": false, "compact": false }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.general.reset_address, 0x1000);
/// assert!(config.general.trace);
/// assert!(!config.features.divide);
/// assert!(config.features.user_mode);
/// assert!(!config.features.fpu);
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Optional features
    #[serde(default)]
    pub features: FeatureConfig,
}

impl Config {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed input and [`ConfigError::Invalid`] for a
    /// configuration that fails [`Config::validate`].
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for values the core cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.reset_address % crate::common::constants::INSTRUCTION_SIZE != 0 {
            return Err(ConfigError::Invalid {
                field: "general.reset_address",
                reason: format!(
                    "{:#010x} is not aligned to an instruction word",
                    self.general.reset_address
                ),
            });
        }
        Ok(())
    }

    /// Whether per-cycle tracing is on, either by configuration or the `always-trace` feature.
    pub const fn trace_enabled(&self) -> bool {
        cfg!(feature = "always-trace") || self.general.trace
    }
}

/// General core settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GeneralConfig {
    /// Supervisor PC after reset
    #[serde(default = "GeneralConfig::default_reset_address")]
    pub reset_address: u32,

    /// Emit a `trace!` event for every cycle's stage activity
    #[serde(default)]
    pub trace: bool,
}

impl GeneralConfig {
    /// Returns the default reset vector.
    fn default_reset_address() -> u32 {
        defaults::RESET_ADDRESS
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            reset_address: defaults::RESET_ADDRESS,
            trace: false,
        }
    }
}

/// Optional sub-units and behaviours.
///
/// The core must behave correctly under every combination of these switches.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct FeatureConfig {
    /// Separate user bank and User mode. When off, user ids alias the supervisor bank
    /// and the core never leaves Supervisor mode.
    #[serde(default = "FeatureConfig::default_on")]
    pub user_mode: bool,

    /// A divide unit is present.
    #[serde(default = "FeatureConfig::default_on")]
    pub divide: bool,

    /// A floating-point unit is present.
    #[serde(default = "FeatureConfig::default_fpu")]
    pub fpu: bool,

    /// The memory unit accepts a new operation while others are outstanding.
    #[serde(default = "FeatureConfig::default_on")]
    pub pipelined_memory: bool,

    /// Lock instructions bind the next bus operations together.
    #[serde(default = "FeatureConfig::default_on")]
    pub lock: bool,

    /// Compact two-instruction bundles are legal.
    #[serde(default = "FeatureConfig::default_on")]
    pub compact: bool,

    /// Unconditional jumps known at decode redirect fetch immediately.
    #[serde(default = "FeatureConfig::default_on")]
    pub early_branching: bool,
}

impl FeatureConfig {
    fn default_on() -> bool {
        defaults::FEATURE_ON
    }

    fn default_fpu() -> bool {
        defaults::FPU
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            user_mode: defaults::FEATURE_ON,
            divide: defaults::FEATURE_ON,
            fpu: defaults::FPU,
            pipelined_memory: defaults::FEATURE_ON,
            lock: defaults::FEATURE_ON,
            compact: defaults::FEATURE_ON,
            early_branching: defaults::FEATURE_ON,
        }
    }
}
