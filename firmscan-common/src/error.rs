//! Common error types for firmscan

use thiserror::Error;

/// Common result type for firmscan operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the firmscan crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested source identifier is not registered
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
