//! Last-resort conversion: lenient decode and naive decimation
//!
//! Keeps every Nth sample with N = floor(source_rate / target_rate). No
//! anti-aliasing filter is applied, and a source rate below the target is
//! rejected rather than upsampled.

use super::{export_temporary_wav, ConversionRequest, ConversionStrategy};
use crate::models::{AudioAsset, TargetProfile};
use crate::utils::audio_decoder::{decode_audio_file, DecodeMode};
use crate::utils::resampler::{decimate, decimation_step};
use anyhow::{ensure, Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub struct RawDecimationStrategy {
    timeout: Duration,
}

impl RawDecimationStrategy {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ConversionStrategy for RawDecimationStrategy {
    fn name(&self) -> &str {
        "raw-decimation"
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
        tokio::task::spawn_blocking(move || decimate_and_export(&source, profile, &cancel))
            .await
            .context("Decimation task panicked")?
    }
}

fn decimate_and_export(
    source: &Path,
    profile: TargetProfile,
    cancel: &CancellationToken,
) -> Result<AudioAsset> {
    let decoded = decode_audio_file(source, DecodeMode::Lenient, Some(cancel))?;
    ensure!(!decoded.samples.is_empty(), "Lenient decode recovered no samples");

    let step = decimation_step(decoded.sample_rate, profile.sample_rate)?;
    if decoded.sample_rate % profile.sample_rate != 0 {
        warn!(
            source_rate = decoded.sample_rate,
            target_rate = profile.sample_rate,
            step,
            "Non-integer rate ratio, decimated audio will play at a shifted speed"
        );
    }

    let samples = decimate(&decoded.samples, step);
    debug!(
        input_frames = decoded.frames(),
        output_frames = samples.len(),
        step,
        "Decimated audio"
    );

    export_temporary_wav(&samples, profile)
}
