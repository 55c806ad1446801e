//! External-tool conversion through an `ffmpeg` subprocess

use super::{ConversionRequest, ConversionStrategy};
use crate::models::AudioAsset;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Runs `ffmpeg -i <src> -ar <rate> -ac <channels> -c:a <pcm> -y <out>`
///
/// The child is killed when the attempt future is dropped, so the chain's
/// timeout hard-stops a hung conversion.
pub struct FfmpegStrategy {
    ffmpeg_path: PathBuf,
    timeout: Duration,
    fast_path_timeout: Duration,
}

impl FfmpegStrategy {
    pub fn new(ffmpeg_path: PathBuf, timeout: Duration, fast_path_timeout: Duration) -> Self {
        Self {
            ffmpeg_path,
            timeout,
            fast_path_timeout,
        }
    }
}

/// ffmpeg PCM codec name for a bit depth
fn pcm_codec(bits_per_sample: u16) -> Result<&'static str> {
    Ok(match bits_per_sample {
        8 => "pcm_u8",
        16 => "pcm_s16le",
        24 => "pcm_s24le",
        32 => "pcm_s32le",
        other => bail!("Unsupported PCM bit depth: {}", other),
    })
}

#[async_trait]
impl ConversionStrategy for FfmpegStrategy {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn timeout(&self, request: &ConversionRequest) -> Option<Duration> {
        Some(if request.fast_path {
            self.fast_path_timeout
        } else {
            self.timeout
        })
    }

    async fn attempt(
        &self,
        request: &ConversionRequest,
        // The child is killed when this future is dropped
        _cancel: &CancellationToken,
    ) -> Result<AudioAsset> {
        let codec = pcm_codec(request.profile.bits_per_sample)?;

        let output = tempfile::Builder::new()
            .prefix("scribe-ffmpeg-")
            .suffix(".wav")
            .tempfile()
            .context("Failed to create temporary WAV file")?
            .into_temp_path();

        debug!(
            ffmpeg = %self.ffmpeg_path.display(),
            input = %request.source.display(),
            output = %output.display(),
            "Running ffmpeg"
        );

        let result = Command::new(&self.ffmpeg_path)
            .arg("-hide_banner")
            .args(["-loglevel", "error"])
            .arg("-i")
            .arg(&request.source)
            .arg("-ar")
            .arg(request.profile.sample_rate.to_string())
            .arg("-ac")
            .arg(request.profile.channels.to_string())
            .args(["-c:a", codec])
            .arg("-y")
            .arg(&*output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to spawn {}", self.ffmpeg_path.display()))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            bail!("ffmpeg exited with {}: {}", result.status, stderr.trim());
        }

        Ok(AudioAsset::temporary(output, request.profile))
    }
}
