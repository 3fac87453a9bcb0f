//! # Runtime Error Types

use thiserror::Error;

use donk_procedural::TubeError;

/// Errors that can occur while setting up a run.
#[derive(Error, Debug)]
pub enum DonkError {
    /// The tube rejected its configuration.
    #[error(transparent)]
    Tube(#[from] TubeError),

    /// A stepping value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A config file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file that failed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A config file is not valid TOML for its schema.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for runtime operations.
pub type DonkResult<T> = Result<T, DonkError>;
