//! Layered configuration for linkage passes.
//!
//! Configuration is loaded with precedence: overrides > Env vars > Config file > Defaults
//!
//! # Example config file (linktally.toml)
//! ```toml
//! profile = "bounded-blocks"
//!
//! [tally]
//! workers = 8
//! max_block_size = 2000
//! on_pair_error = "abort"
//! ```
//!
//! Environment variables use the `LINKTALLY_` prefix and `__` for nesting,
//! e.g. `LINKTALLY_TALLY__WORKERS=4`.

mod defaults;
mod tuning;

pub use defaults::*;
pub use tuning::*;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Main configuration for a linkage pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkageConfig {
    /// Tuning preset
    pub profile: Profile,
    /// Per-setting overrides applied on top of the preset
    pub tally: TallyOverrides,
}

impl LinkageConfig {
    /// Load configuration with precedence: overrides > Env > File > Defaults
    ///
    /// # Arguments
    /// * `config_path` - Optional path to TOML config file
    /// * `overrides` - Caller overrides to apply on top
    pub fn load(
        config_path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(LinkageConfig::default()));

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment = figment.merge(Serialized::defaults(overrides));

        figment.extract().map_err(ConfigError::from)
    }

    /// Load from environment and optional config file only.
    pub fn from_env(config_path: Option<&str>) -> Result<Self, ConfigError> {
        Self::load(config_path, ConfigOverrides::default())
    }

    /// Resolve the profile preset and apply the explicit overrides.
    pub fn tuning(&self) -> TallyTuning {
        let mut tuning = TallyTuning::from_profile(self.profile);
        if let Some(workers) = self.tally.workers {
            tuning.workers = workers;
        }
        if let Some(threshold) = self.tally.parallel_threshold {
            tuning.parallel_threshold = threshold;
        }
        if let Some(max_block_size) = self.tally.max_block_size {
            tuning.max_block_size = Some(max_block_size);
        }
        if let Some(policy) = self.tally.on_pair_error {
            tuning.on_pair_error = policy;
        }
        tuning
    }
}

/// Optional settings that replace the profile's values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_threshold: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_block_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_pair_error: Option<PairErrorPolicy>,
}

/// Caller overrides that take precedence over file and env config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tally: Option<TallyOverrides>,
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}
