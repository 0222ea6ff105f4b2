//! Error types for cache configuration
//!
//! Cache operations themselves cannot fail; only loading configuration can.

use thiserror::Error;

// == Config Error Enum ==
/// Unified error type for configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration document is not valid JSON or has unknown fields
    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// Environment variable holds a value that does not parse
    #[error("Invalid value {value:?} for {name}")]
    InvalidVar { name: String, value: String },
}

// == Result Type Alias ==
/// Convenience Result type for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;
