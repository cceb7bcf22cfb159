//! Configuration Management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Movement sampling settings
    pub sampling: SamplingConfig,
    /// Stop detection settings
    pub stops: StopConfig,
    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,
}

/// Movement sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Positional tolerance in source units: rows that moved further than
    /// this from the last accepted sample are kept even within the same
    /// rounded time slot
    pub position_tolerance: f64,
}

/// Stop detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopConfig {
    /// Minimum stationary duration (source time units) for a run of
    /// position-identical points to be marked as a stop
    pub stop_threshold: f64,
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Pretty-print exported JSON
    pub pretty: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            position_tolerance: 2.0,
        }
    }
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            stop_threshold: 1.0,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.sampling.position_tolerance.is_finite()
            || self.sampling.position_tolerance <= 0.0
            || self.sampling.position_tolerance > 10_000.0
        {
            return Err(crate::Error::Config(format!(
                "position_tolerance must be a finite value in (0, 10000], got {}",
                self.sampling.position_tolerance
            )));
        }
        if self.stops.stop_threshold < 0.0 || !self.stops.stop_threshold.is_finite() {
            return Err(crate::Error::Config(format!(
                "stop_threshold must be a finite value >= 0, got {}",
                self.stops.stop_threshold
            )));
        }
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &PathBuf) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &PathBuf) -> Result<(), crate::Error> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".roomtrace").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }
}
