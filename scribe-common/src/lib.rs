//! # Scribe Common Library
//!
//! Shared code for the scribe binaries including:
//! - Error types
//! - Configuration file resolution and logging settings
//! - Progress and result channel wire protocol
//! - Transcript types and SRT subtitle serialization

pub mod config;
pub mod error;
pub mod events;
pub mod subtitle;
pub mod transcript;

pub use error::{Error, Result};
pub use events::ProgressEvent;
pub use transcript::{Segment, TranscriptionResult};
