//! scribe-ingest library interface
//!
//! Audio ingestion, repair and conversion plus the progress-reporting model
//! load that wraps transcription. Exposed as a library for integration tests
//! and embedders; `main.rs` is the command-line front end.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

pub use crate::config::IngestConfig;
pub use crate::error::{IngestError, Result};
pub use crate::models::ModelTier;
pub use crate::workflow::{TranscriptionOrchestrator, TranscriptionOutcome, TranscriptionRequest};
