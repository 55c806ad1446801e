//! Data models for scribe-ingest

pub mod audio_asset;
pub mod conversion_attempt;
pub mod decoding_options;
pub mod model_tier;

pub use audio_asset::{has_riff_wave_magic, AudioAsset, ContainerFormat, TargetProfile};
pub use conversion_attempt::{AttemptOutcome, ConversionAttempt};
pub use decoding_options::DecodingOptions;
pub use model_tier::ModelTier;
