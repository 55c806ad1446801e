//! Ordered audio conversion with per-strategy timeout and fallthrough
//!
//! Each strategy turns an arbitrary source file into a WAV in the target
//! profile. The chain tries them in order and stops at the first one whose
//! output exists and is non-empty:
//!
//! 1. `ffmpeg` subprocess
//! 2. In-process symphonia decode + rubato resample
//! 3. Lenient decode + naive decimation (lossy, last resort)

mod ffmpeg;
mod library_decode;
mod raw_decimation;

pub use ffmpeg::FfmpegStrategy;
pub use library_decode::LibraryDecodeStrategy;
pub use raw_decimation::RawDecimationStrategy;

use crate::config::ConversionConfig;
use crate::error::IngestError;
use crate::models::{AttemptOutcome, AudioAsset, ConversionAttempt, TargetProfile};
use crate::utils::audio_decoder::write_pcm16_wav;
use anyhow::{ensure, Context};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Input to one conversion run
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub source: PathBuf,
    pub profile: TargetProfile,
    /// Shorter external-tool budget used when routing webm input
    pub fast_path: bool,
}

/// One interchangeable conversion algorithm
#[async_trait]
pub trait ConversionStrategy: Send + Sync {
    /// Name used in logs and attempt records
    fn name(&self) -> &str;

    /// Wall-clock budget for one attempt, `None` for unbounded
    fn timeout(&self, request: &ConversionRequest) -> Option<Duration>;

    /// Produce a WAV asset in `request.profile`
    ///
    /// `cancel` fires when the attempt's budget runs out; work that outlives
    /// the dropped future (blocking decode threads) must stop on it.
    async fn attempt(
        &self,
        request: &ConversionRequest,
        cancel: &CancellationToken,
    ) -> anyhow::Result<AudioAsset>;
}

/// Ordered, short-circuiting list of conversion strategies
pub struct ConversionChain {
    strategies: Vec<Box<dyn ConversionStrategy>>,
}

impl ConversionChain {
    pub fn new(strategies: Vec<Box<dyn ConversionStrategy>>) -> Self {
        Self { strategies }
    }

    /// ffmpeg, then library decode, then raw decimation
    pub fn standard(config: &ConversionConfig) -> Self {
        Self::new(vec![
            Box::new(FfmpegStrategy::new(
                config.ffmpeg_path.clone(),
                config.timeout(),
                config.webm_timeout(),
            )),
            Box::new(LibraryDecodeStrategy::new(config.library_timeout())),
            Box::new(RawDecimationStrategy::new(config.library_timeout())),
        ])
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Convert `source` to the target profile
    ///
    /// Returns the first verified output. When every strategy fails the
    /// error carries the terminal cause of the last one.
    pub async fn convert(
        &self,
        source: &Path,
        profile: TargetProfile,
        fast_path: bool,
    ) -> Result<AudioAsset, IngestError> {
        let request = ConversionRequest {
            source: source.to_path_buf(),
            profile,
            fast_path,
        };

        info!(
            path = %source.display(),
            fast_path,
            strategies = ?self.strategy_names(),
            "Starting audio conversion"
        );

        let mut last_error = String::from("no conversion strategies configured");
        let mut attempts = 0usize;

        for strategy in &self.strategies {
            attempts += 1;
            let started_at = Utc::now();
            let timeout = strategy.timeout(&request);
            debug!(strategy = strategy.name(), timeout = ?timeout, "Trying conversion strategy");

            let cancel = CancellationToken::new();
            let result = match timeout {
                Some(limit) => tokio::time::timeout(limit, strategy.attempt(&request, &cancel))
                    .await
                    .ok(),
                None => Some(strategy.attempt(&request, &cancel).await),
            };
            if result.is_none() {
                cancel.cancel();
            }

            let outcome = match result {
                None => {
                    last_error = format!(
                        "{} timed out after {}s",
                        strategy.name(),
                        timeout.map(|t| t.as_secs_f64()).unwrap_or_default()
                    );
                    AttemptOutcome::TimedOut
                }
                Some(Err(e)) => {
                    last_error = format!("{}: {:#}", strategy.name(), e);
                    AttemptOutcome::Failure {
                        reason: format!("{:#}", e),
                    }
                }
                Some(Ok(asset)) => match verify_output(&asset) {
                    Ok(bytes) => {
                        ConversionAttempt::new(
                            strategy.name(),
                            started_at,
                            timeout,
                            AttemptOutcome::Success {
                                path: asset.path().to_path_buf(),
                                bytes,
                            },
                        )
                        .log();
                        return Ok(asset);
                    }
                    Err(e) => {
                        asset.discard();
                        last_error = format!("{}: {:#}", strategy.name(), e);
                        AttemptOutcome::Failure {
                            reason: format!("{:#}", e),
                        }
                    }
                },
            };

            ConversionAttempt::new(strategy.name(), started_at, timeout, outcome).log();
        }

        error!(
            path = %source.display(),
            attempts,
            last_error = %last_error,
            "All conversion strategies failed"
        );
        Err(IngestError::ConversionFailed {
            attempts,
            last_error,
        })
    }
}

/// Produced file must exist and hold at least one byte
fn verify_output(asset: &AudioAsset) -> anyhow::Result<u64> {
    let bytes = asset
        .file_size()
        .with_context(|| format!("Output file missing: {}", asset.path().display()))?;
    ensure!(bytes > 0, "Output file is empty: {}", asset.path().display());
    Ok(bytes)
}

/// Write mono samples at the profile rate into a fresh temporary WAV
fn export_temporary_wav(samples: &[f32], profile: TargetProfile) -> anyhow::Result<AudioAsset> {
    ensure!(
        profile.channels == 1 && profile.bits_per_sample == 16,
        "In-process export supports mono 16-bit output only"
    );
    let output = tempfile::Builder::new()
        .prefix("scribe-converted-")
        .suffix(".wav")
        .tempfile()
        .context("Failed to create temporary WAV file")?
        .into_temp_path();
    write_pcm16_wav(&output, samples, profile.sample_rate)?;
    Ok(AudioAsset::temporary(output, profile))
}
