//! Configuration module for the roll engine.
//!
//! Loads the YAML configuration, interpolates environment variables, and
//! validates every section before any instrument is built.
//!
//! # Usage
//!
//! ```rust,ignore
//! use roll_engine::config::{Config, load_config};
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! // Per-instrument specs, validated
//! let specs = config.instrument_specs()?;
//! ```

mod instruments;
mod metrics;
mod pipeline;
mod storage;

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use instruments::InstrumentConfig;
pub use metrics::MetricsSection;
pub use pipeline::PipelineConfig;
pub use storage::StorageConfig;

use crate::application::use_cases::InstrumentSpec;
use crate::batch::BatchConfig;
use crate::domain::roll_calendar::MAX_ROLL_OFFSET_DAYS;
use crate::domain::validation::ValidationConfig;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "ROLL_ENGINE_CONFIG";

/// Configuration file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Contract and artifact locations.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Pipeline-wide settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Batch execution.
    #[serde(default)]
    pub batch: BatchConfig,
    /// Validation thresholds.
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Prometheus exporter.
    #[serde(default)]
    pub metrics: MetricsSection,
    /// Roll configuration per instrument code.
    #[serde(default)]
    pub instruments: BTreeMap<String, InstrumentConfig>,
}

impl Config {
    /// Resolve every configured instrument, in code order.
    ///
    /// # Errors
    ///
    /// Returns error for the first instrument whose configuration is invalid.
    pub fn instrument_specs(&self) -> Result<Vec<InstrumentSpec>, ConfigError> {
        self.instruments
            .iter()
            .map(|(code, instrument)| instrument.spec(code))
            .collect()
    }
}

// ============================================
// Configuration Loading
// ============================================

/// Path of the configuration file: `ROLL_ENGINE_CONFIG` or `config.yaml`.
#[must_use]
pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_ENV)
        .ok()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to [`config_path`].
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, str::to_string);

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load `.env` from the working directory or the closest ancestor holding one.
pub fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match cap.get(1).map(|m| std::env::var(m.as_str())) {
            Some(Ok(v)) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.storage.contracts_dir.trim().is_empty() || config.storage.output_dir.trim().is_empty()
    {
        return Err(ConfigError::ValidationError(
            "storage.contracts_dir and storage.output_dir must be set".to_string(),
        ));
    }

    if config.storage.contracts_dir == config.storage.output_dir {
        return Err(ConfigError::ValidationError(
            "storage.contracts_dir and storage.output_dir must be different".to_string(),
        ));
    }

    let window = i64::from(config.pipeline.roll_search_window_days);
    if window == 0 || window > MAX_ROLL_OFFSET_DAYS {
        return Err(ConfigError::ValidationError(format!(
            "pipeline.roll_search_window_days must be between 1 and {MAX_ROLL_OFFSET_DAYS}"
        )));
    }

    if config.batch.min_parallel_jobs == 0 {
        return Err(ConfigError::ValidationError(
            "batch.min_parallel_jobs must be at least 1".to_string(),
        ));
    }

    let coverage = config.validation.min_leg_coverage_pct;
    if coverage < Decimal::ZERO || coverage > Decimal::ONE_HUNDRED {
        return Err(ConfigError::ValidationError(
            "validation.min_leg_coverage_pct must be between 0 and 100".to_string(),
        ));
    }

    if config.validation.max_daily_move_pct <= Decimal::ZERO {
        return Err(ConfigError::ValidationError(
            "validation.max_daily_move_pct must be positive".to_string(),
        ));
    }

    if config.validation.min_roll_spacing_days < 0 {
        return Err(ConfigError::ValidationError(
            "validation.min_roll_spacing_days must be non-negative".to_string(),
        ));
    }

    if config.metrics.enabled {
        config.metrics.exporter_config()?;
    }

    config.instrument_specs()?;

    Ok(())
}
