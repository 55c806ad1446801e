//! Error types for scribe-ingest
//!
//! Pipeline stages surface one `IngestError` each. Strategy internals use
//! `anyhow` and are folded into the matching variant with their full cause
//! chain rendered into the message.

use crate::models::ModelTier;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline error type
#[derive(Debug, Error)]
pub enum IngestError {
    /// Input path does not exist or is not a regular file
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// Input is empty, too small to repair, or undecodable
    #[error("Invalid audio: {0}")]
    InvalidAudio(String),

    /// Every conversion strategy failed
    #[error("Conversion failed after {attempts} strategies: {last_error}")]
    ConversionFailed { attempts: usize, last_error: String },

    /// Neither the requested nor the default tier could be loaded
    #[error("Model load failed for tier {tier}: {reason}")]
    ResourceLoadFatal { tier: ModelTier, reason: String },

    /// Recognizer call failed
    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    /// Configuration file could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Pipeline stage the error originated in, used as a log field
    pub fn stage(&self) -> &'static str {
        match self {
            IngestError::InputNotFound(_) => "input",
            IngestError::InvalidAudio(_) => "validation",
            IngestError::ConversionFailed { .. } => "conversion",
            IngestError::ResourceLoadFatal { .. } => "model_load",
            IngestError::InferenceFailed(_) => "inference",
            IngestError::Config(_) => "config",
            IngestError::Io(_) => "io",
        }
    }
}

impl From<scribe_common::Error> for IngestError {
    fn from(err: scribe_common::Error) -> Self {
        match err {
            scribe_common::Error::Io(e) => IngestError::Io(e),
            other => IngestError::Config(other.to_string()),
        }
    }
}

/// Convenience Result type using scribe-ingest IngestError
pub type Result<T> = std::result::Result<T, IngestError>;
