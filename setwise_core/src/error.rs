//! Error types for the setwise_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for setwise_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workout definition is unusable (empty, bad ordering, unknown id)
    #[error("Workout error: {0}")]
    Workout(String),

    /// Session store rejected or failed a request
    #[error("Session store error: {0}")]
    Store(String),

    /// Schedule transition failed
    #[error("Schedule error: {0}")]
    Schedule(String),

    /// Kudos feed could not produce a phrase
    #[error("Kudos error: {0}")]
    Kudos(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
