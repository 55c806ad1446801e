//! Transcription workflow
//!
//! Validation → conversion/repair → model load with progress → inference →
//! result emission, with temporary assets cleaned up on every path.

pub mod orchestrator;

pub use orchestrator::{TranscriptionOrchestrator, TranscriptionOutcome, TranscriptionRequest};
