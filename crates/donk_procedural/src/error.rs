//! # Tube Error Types
//!
//! Errors that can occur while configuring the tube or loading segment
//! manifests. Ring generation itself never fails: missing tiles and
//! geometry discontinuities are recovered where they happen.

use thiserror::Error;

/// Errors that can occur in the tube system.
#[derive(Error, Debug)]
pub enum TubeError {
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A config file or segment manifest could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file that failed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A config file or segment manifest is not valid TOML for its schema.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A config could not be written back out as TOML.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A level name that matches no known level.
    #[error("unknown level: {0}")]
    UnknownLevel(String),
}

/// Result type for tube operations.
pub type TubeResult<T> = Result<T, TubeError>;
