//! Error types for the compass HUD library

use thiserror::Error;

/// Errors raised while configuring the overlay pipeline.
///
/// The per-tick pipeline itself has no failure path: malformed sensor
/// samples are skipped and a denied camera permission is a view, not an error.
#[derive(Debug, Error)]
pub enum HudError {
    /// A setting is outside its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The settings file is not valid TOML or does not match the schema.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// The settings could not be serialized.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The settings file could not be read or written.
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HudError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}

/// Result type for compass HUD operations.
pub type Result<T> = std::result::Result<T, HudError>;
