//! Code4Care Error Types
//!
//! Centralized error handling using thiserror for type-safe errors.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Code4Care
#[derive(Error, Debug)]
pub enum Code4CareError {
    #[error("SOS error: {0}")]
    Sos(#[from] SosError),

    #[error("Emergency error: {0}")]
    Emergency(#[from] EmergencyError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejected SOS controller operations
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SosError {
    #[error("SOS is already armed ({remaining}s remaining)")]
    AlreadyArmed { remaining: u32 },

    #[error("SOS is not armed")]
    NotArmed,

    #[error("No async runtime available to drive the SOS countdown")]
    NoRuntime,
}

/// Emergency desk errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EmergencyError {
    #[error("Unknown emergency service '{name}'")]
    UnknownService { name: String },

    #[error("Unavailable while SOS is active")]
    SosActive,

    #[error(transparent)]
    Sos(#[from] SosError),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Failed to serialize configuration: {0}")]
    SerializeError(String),

    #[error("Configuration I/O error: {0}")]
    IoError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for Code4Care operations
pub type Result<T> = std::result::Result<T, Code4CareError>;

/// Result type alias for SOS controller operations
pub type SosResult<T> = std::result::Result<T, SosError>;

/// Result type alias for emergency desk operations
pub type EmergencyResult<T> = std::result::Result<T, EmergencyError>;

/// Result type alias for Config operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
