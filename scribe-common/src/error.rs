//! Common error types for scribe

use thiserror::Error;

/// Common result type for scribe operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the scribe crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed progress or result channel message
    #[error("Protocol error: {0}")]
    Protocol(String),
}
