//! Test Helper Utilities
//!
//! Shared utilities for testing scribe-ingest

#![allow(dead_code)]

pub mod audio_generator;
pub mod doubles;
pub mod log_capture;

// Re-export commonly used items
pub use audio_generator::{
    generate_test_wav, raw_pcm_bytes, write_raw_pcm, write_silent_mp3, AudioConfig,
};
pub use log_capture::{capture_logs, LogCapture};
