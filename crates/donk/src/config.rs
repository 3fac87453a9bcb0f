//! # Run Configuration
//!
//! One TOML file for a whole run: the tube under `[tube]`, stepping under
//! `[step]`.
//!
//! ```toml
//! [tube]
//! seed = 7
//!
//! [step]
//! speed = 12.0
//! ```

use std::path::Path;

use donk_procedural::TubeConfig;
use serde::{Deserialize, Serialize};

use crate::error::{DonkError, DonkResult};

/// Travel speed and timestep tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// Travel speed in tube units per second.
    pub speed: f32,
    /// Longest sub-step in seconds.
    pub max_step: f32,
    /// Most sub-steps one frame may be split into.
    pub max_substeps: u32,
    /// Time multiplier while boosting.
    pub time_dilation: f32,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            speed: 10.0,
            max_step: 0.020,
            max_substeps: 10,
            time_dilation: 8.0,
        }
    }
}

impl StepConfig {
    /// Checks every value is in range.
    ///
    /// # Errors
    ///
    /// Returns `DonkError::InvalidConfig` naming the first bad field.
    pub fn validate(&self) -> DonkResult<()> {
        for (name, value) in [
            ("speed", self.speed),
            ("max_step", self.max_step),
            ("time_dilation", self.time_dilation),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(DonkError::InvalidConfig(format!("{name} must be positive, got {value}")));
            }
        }
        if self.max_substeps == 0 {
            return Err(DonkError::InvalidConfig("max_substeps must be at least 1".into()));
        }
        Ok(())
    }
}

/// Everything a run needs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DonkConfig {
    /// Generation and streaming.
    pub tube: TubeConfig,
    /// Stepping.
    pub step: StepConfig,
}

impl DonkConfig {
    /// Parses a config from TOML text and validates both halves.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed TOML, or the first validation
    /// failure.
    pub fn from_toml_str(text: &str) -> DonkResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.tube.validate()?;
        config.step.validate()?;
        Ok(config)
    }

    /// Loads a config file.
    ///
    /// # Errors
    ///
    /// Returns `DonkError::Io` if the file cannot be read, otherwise the
    /// same errors as [`DonkConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> DonkResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DonkError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DonkConfig::default();
        assert!(config.step.validate().is_ok());
        assert!(config.tube.validate().is_ok());
        assert_eq!(config.step.max_substeps, 10);
    }

    #[test]
    fn test_sections_parse() {
        let config = DonkConfig::from_toml_str("[tube]\nseed = 7\n\n[step]\nspeed = 12.5\n").unwrap();
        assert_eq!(config.tube.seed, 7);
        assert_eq!(config.step.speed, 12.5);
        assert_eq!(config.step.time_dilation, 8.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            DonkConfig::from_toml_str("[step]\nmax_step = 0.0\n"),
            Err(DonkError::InvalidConfig(_))
        ));
        assert!(matches!(
            DonkConfig::from_toml_str("[tube]\nlook_ahead = 0\n"),
            Err(DonkError::Tube(_))
        ));
        assert!(matches!(DonkConfig::from_toml_str("[step\n"), Err(DonkError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            DonkConfig::load("/nonexistent/donk.toml"),
            Err(DonkError::Io { .. })
        ));
    }
}
