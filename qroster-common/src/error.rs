//! Common error types for qroster

use thiserror::Error;

/// Common result type for qroster operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared by the roster store, configuration and startup code
#[derive(Error, Debug)]
pub enum Error {
    /// Record store failure (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem failure (QR directory, database directory, config file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Stored timestamp column could not be parsed
    #[error("Invalid stored timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Requested record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
