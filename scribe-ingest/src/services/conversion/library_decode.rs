//! In-process conversion: symphonia decode, mono mixdown, rubato resample

use super::{export_temporary_wav, ConversionRequest, ConversionStrategy};
use crate::models::{AudioAsset, TargetProfile};
use crate::utils::audio_decoder::{decode_audio_file, DecodeMode};
use crate::utils::resampler::resample_mono;
use anyhow::{ensure, Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct LibraryDecodeStrategy {
    timeout: Duration,
}

impl LibraryDecodeStrategy {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ConversionStrategy for LibraryDecodeStrategy {
    fn name(&self) -> &str {
        "library-decode"
    }

    fn timeout(&self, _request: &ConversionRequest) -> Option<Duration> {
        Some(self.timeout)
    }

    async fn attempt(
        &self,
        request: &ConversionRequest,
        cancel: &CancellationToken,
    ) -> Result<AudioAsset> {
        let source = request.source.clone();
        let profile = request.profile;
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || decode_and_export(&source, profile, &cancel))
            .await
            .context("Library decode task panicked")?
    }
}

fn decode_and_export(
    source: &Path,
    profile: TargetProfile,
    cancel: &CancellationToken,
) -> Result<AudioAsset> {
    let decoded = decode_audio_file(source, DecodeMode::Strict, Some(cancel))?;
    debug!(
        sample_rate = decoded.sample_rate,
        channels = decoded.channels,
        frames = decoded.frames(),
        "Decoded source for library conversion"
    );

    ensure!(!cancel.is_cancelled(), "Library conversion cancelled before resampling");

    let source_rate = decoded.sample_rate;
    let samples = resample_mono(decoded.samples, source_rate, profile.sample_rate)?;
    export_temporary_wav(&samples, profile)
}
