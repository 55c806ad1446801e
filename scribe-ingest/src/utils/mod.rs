//! Utility modules for scribe-ingest

pub mod audio_decoder;
pub mod resampler;
