//! # Tube Configuration
//!
//! Tunables for generation and streaming, loaded from TOML.
//!
//! ```toml
//! seed = 2
//! start_level = "steel"
//! look_ahead = 30
//! ring_spacing = 40.0
//! ```
//!
//! Every field has a default, so a config file only names what it changes.

use std::path::Path;

use donk_core::RunSeed;
use serde::{Deserialize, Serialize};

use crate::error::{TubeError, TubeResult};
use crate::nav::Level;

/// Configuration for tube generation and streaming.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TubeConfig {
    /// Seed for the run. Same seed, same tube.
    pub seed: u64,
    /// Level the run starts at.
    pub start_level: String,
    /// Segment count assumed before the first ring.
    pub initial_segments: u32,
    /// Rings kept alive from the current ring forward.
    pub look_ahead: usize,
    /// Maximum rings generated per tick.
    pub rings_per_tick: usize,
    /// Distance between adjacent 1-wide segments around the circumference.
    pub x_spacing: f32,
    /// Distance between ring centers along the travel axis.
    pub ring_spacing: f32,
    /// Arc length to radius conversion: `radius = segments / ar_factor`.
    pub ar_factor: f32,
    /// Rings per tile, wall and trench-middle section.
    pub section_length: usize,
    /// Depth of trench floors below the tube wall.
    pub trench_depth: f32,
    /// Depth at the far edge of a transition ring.
    pub transition_depth: f32,
    /// Rings whose center falls this far behind the player are culled.
    pub cull_offset: f32,
}

impl Default for TubeConfig {
    fn default() -> Self {
        Self {
            seed: 2,
            start_level: Level::Steel.name().to_owned(),
            initial_segments: 20,
            look_ahead: 30,
            rings_per_tick: 1,
            x_spacing: 2.0,
            ring_spacing: 40.0,
            ar_factor: std::f32::consts::PI,
            section_length: 3,
            trench_depth: 2.5,
            transition_depth: 3.0,
            cull_offset: 40.0,
        }
    }
}

impl TubeConfig {
    /// Production config: the tuning the game ships with.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Test config: a short window so streaming behavior shows up quickly.
    #[must_use]
    pub fn test() -> Self {
        Self {
            seed: 12345,
            look_ahead: 8,
            ..Self::default()
        }
    }

    /// Parses a config from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// Returns `TubeError::Parse` for malformed TOML and
    /// `TubeError::InvalidConfig` / `TubeError::UnknownLevel` for bad values.
    pub fn from_toml_str(text: &str) -> TubeResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file and validates it.
    ///
    /// # Errors
    ///
    /// Returns `TubeError::Io` if the file cannot be read, otherwise the
    /// same errors as [`TubeConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> TubeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TubeError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Serializes the config as TOML.
    ///
    /// # Errors
    ///
    /// Returns `TubeError::Serialize` if serialization fails.
    pub fn to_toml_string(&self) -> TubeResult<String> {
        Ok(toml::to_string(self)?)
    }

    /// Checks every value is in range.
    ///
    /// # Errors
    ///
    /// Returns `TubeError::InvalidConfig` naming the first bad field, or
    /// `TubeError::UnknownLevel` for an unknown `start_level`.
    pub fn validate(&self) -> TubeResult<()> {
        if self.look_ahead == 0 {
            return Err(TubeError::InvalidConfig("look_ahead must be at least 1".into()));
        }
        if self.rings_per_tick == 0 {
            return Err(TubeError::InvalidConfig("rings_per_tick must be at least 1".into()));
        }
        if self.section_length == 0 {
            return Err(TubeError::InvalidConfig("section_length must be at least 1".into()));
        }
        if self.initial_segments == 0 {
            return Err(TubeError::InvalidConfig("initial_segments must be at least 1".into()));
        }
        for (name, value) in [
            ("x_spacing", self.x_spacing),
            ("ring_spacing", self.ring_spacing),
            ("ar_factor", self.ar_factor),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(TubeError::InvalidConfig(format!("{name} must be positive, got {value}")));
            }
        }
        if !(self.cull_offset.is_finite() && self.cull_offset >= 0.0) {
            return Err(TubeError::InvalidConfig(format!(
                "cull_offset must be non-negative, got {}",
                self.cull_offset
            )));
        }
        self.level()?;
        Ok(())
    }

    /// The run seed.
    #[inline]
    #[must_use]
    pub const fn run_seed(&self) -> RunSeed {
        RunSeed::new(self.seed)
    }

    /// The start level.
    ///
    /// # Errors
    ///
    /// Returns `TubeError::UnknownLevel` if `start_level` names no level.
    pub fn level(&self) -> TubeResult<Level> {
        self.start_level.parse()
    }
}
