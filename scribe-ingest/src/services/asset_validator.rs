//! Input classification and audio sanity checks
//!
//! **Routing:**
//! - empty file of any kind: invalid
//! - `.mp3`: accepted provisionally, converted later by the orchestrator
//! - `.webm`: converted immediately on the fast path; failure is invalid
//! - anything else: treated as WAV. Missing RIFF/WAVE magic triggers header
//!   repair (or rejection when the file is too small to hold real audio)
//!
//! Files with an unrecognized extension are sniffed by content first, so an
//! MP3 or WebM stream saved as `.bin` takes the right route. A sniffed MP3 or
//! WebM must also open and decode its first packet; short magic sequences
//! such as `FF FB` occur in raw PCM, which then goes down the repair route.
//!
//! The decoded WAV must hold at least one frame. A near-silent peak is only
//! reported.

use crate::config::ConversionConfig;
use crate::error::IngestError;
use crate::models::{has_riff_wave_magic, AudioAsset, ContainerFormat, TargetProfile};
use crate::services::conversion::ConversionChain;
use crate::services::header_repairer;
use crate::utils::audio_decoder::{
    decode_audio_file, decode_wav_file, probe_audio_file, DecodeMode, DecodedAudio,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Bytes read for magic detection and content sniffing
const SNIFF_LEN: usize = 64;
/// Bytes holding the RIFF/WAVE magic
const MAGIC_LEN: usize = 12;

/// Stream facts gathered while inspecting a WAV-like asset
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: usize,
    pub frames: usize,
    pub peak_amplitude: f32,
}

/// Outcome of a successful validation
#[derive(Debug)]
pub struct ValidatedAsset {
    /// Caller's input file, never deleted by the pipeline
    pub original: PathBuf,
    /// Format the routing decision was based on
    pub format: ContainerFormat,
    /// Converted or repaired file that replaces the original for inference
    pub active_override: Option<AudioAsset>,
    /// Original still has to go through the conversion chain
    pub needs_lazy_conversion: bool,
    /// Present when the asset was decoded during validation
    pub info: Option<AudioInfo>,
}

impl ValidatedAsset {
    fn accepted(original: &Path, format: ContainerFormat) -> Self {
        Self {
            original: original.to_path_buf(),
            format,
            active_override: None,
            needs_lazy_conversion: false,
            info: None,
        }
    }
}

/// Classifies and checks input files
pub struct AssetValidator {
    chain: Arc<ConversionChain>,
    profile: TargetProfile,
    min_repairable_bytes: u64,
    silence_threshold: f32,
}

impl AssetValidator {
    pub fn new(chain: Arc<ConversionChain>, config: &ConversionConfig) -> Self {
        Self {
            chain,
            profile: TargetProfile::SPEECH,
            min_repairable_bytes: config.min_repairable_bytes,
            silence_threshold: config.silence_threshold,
        }
    }

    /// Validate `path`, converting or repairing as its format requires
    pub async fn validate(&self, path: &Path) -> Result<ValidatedAsset, IngestError> {
        info!(path = %path.display(), "Validating audio file");

        let file_size = std::fs::metadata(path)?.len();
        debug!(path = %path.display(), file_size, "Input size");
        if file_size == 0 {
            return Err(IngestError::InvalidAudio(format!(
                "{} is empty",
                path.display()
            )));
        }

        let header = read_header(path)?;
        let format = match ContainerFormat::from_extension(path) {
            ContainerFormat::Unknown => self.classify_by_content(path, &header).await,
            by_extension => by_extension,
        };

        match format {
            ContainerFormat::Mp3 => {
                info!(path = %path.display(), "MP3 input accepted, conversion deferred");
                Ok(ValidatedAsset {
                    needs_lazy_conversion: true,
                    ..ValidatedAsset::accepted(path, format)
                })
            }
            ContainerFormat::Webm => self.validate_webm(path).await,
            ContainerFormat::Wav | ContainerFormat::Unknown => {
                self.validate_wav_like(path, format, file_size, &header).await
            }
        }
    }

    /// Magic-byte guess, kept only when the decoder can open it as that container
    async fn classify_by_content(&self, path: &Path, header: &[u8]) -> ContainerFormat {
        let sniffed = ContainerFormat::sniff(header);
        debug!(path = %path.display(), sniffed = %sniffed, "Classified by content");
        if !matches!(sniffed, ContainerFormat::Mp3 | ContainerFormat::Webm) {
            return sniffed;
        }

        let probe_path = path.to_path_buf();
        let confirmed = tokio::task::spawn_blocking(move || probe_audio_file(&probe_path)).await;
        match confirmed {
            Ok(Ok(())) => sniffed,
            Ok(Err(e)) => {
                warn!(
                    path = %path.display(),
                    sniffed = %sniffed,
                    error = %format!("{:#}", e),
                    "Magic bytes not confirmed by decoder, treating as raw audio"
                );
                ContainerFormat::Unknown
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Container probe task failed");
                ContainerFormat::Unknown
            }
        }
    }

    async fn validate_webm(&self, path: &Path) -> Result<ValidatedAsset, IngestError> {
        info!(path = %path.display(), "WebM input, converting on the fast path");
        let converted = self
            .chain
            .convert(path, self.profile, true)
            .await
            .map_err(|e| IngestError::InvalidAudio(format!("WebM conversion failed: {}", e)))?;

        Ok(ValidatedAsset {
            active_override: Some(converted),
            ..ValidatedAsset::accepted(path, ContainerFormat::Webm)
        })
    }

    async fn validate_wav_like(
        &self,
        path: &Path,
        format: ContainerFormat,
        file_size: u64,
        header: &[u8],
    ) -> Result<ValidatedAsset, IngestError> {
        let mut validated = ValidatedAsset::accepted(path, format);

        if !has_riff_wave_magic(&header[..header.len().min(MAGIC_LEN)]) {
            warn!(path = %path.display(), header = ?&header[..header.len().min(MAGIC_LEN)], "RIFF/WAVE header missing");
            if file_size <= self.min_repairable_bytes {
                return Err(IngestError::InvalidAudio(format!(
                    "{} lacks a WAV header and is too small to repair ({} bytes)",
                    path.display(),
                    file_size
                )));
            }

            let source = path.to_path_buf();
            let profile = self.profile;
            let repaired = tokio::task::spawn_blocking(move || {
                header_repairer::repair_file(&source, profile)
            })
            .await
            .map_err(|e| IngestError::InvalidAudio(format!("Header repair task failed: {}", e)))?
            .map_err(|e| IngestError::InvalidAudio(format!("Header repair failed: {:#}", e)))?;

            info!(repaired = %repaired.path().display(), "Using repaired file");
            validated.active_override = Some(repaired);
        }

        let inspect_path = validated
            .active_override
            .as_ref()
            .map(|asset| asset.path().to_path_buf())
            .unwrap_or_else(|| path.to_path_buf());

        match self.inspect(inspect_path).await {
            Ok(info) => {
                validated.info = Some(info);
                Ok(validated)
            }
            Err(e) => {
                if let Some(repaired) = validated.active_override.take() {
                    repaired.discard();
                }
                Err(e)
            }
        }
    }

    /// Decode with symphonia, falling back to hound, and check the content
    async fn inspect(&self, path: PathBuf) -> Result<AudioInfo, IngestError> {
        let decoded = decode_for_inspection(path).await?;

        if decoded.frames() == 0 {
            return Err(IngestError::InvalidAudio(
                "Audio stream contains no frames".to_string(),
            ));
        }

        let info = AudioInfo {
            sample_rate: decoded.sample_rate,
            channels: decoded.channels,
            frames: decoded.frames(),
            peak_amplitude: decoded.peak_amplitude(),
        };

        info!(
            sample_rate = info.sample_rate,
            channels = info.channels,
            frames = info.frames,
            peak = info.peak_amplitude,
            "Audio stream readable"
        );
        if info.peak_amplitude < self.silence_threshold {
            warn!(
                peak = info.peak_amplitude,
                threshold = self.silence_threshold,
                "Very low signal level, recording may be silent"
            );
        }

        Ok(info)
    }
}

async fn decode_for_inspection(path: PathBuf) -> Result<DecodedAudio, IngestError> {
    let primary_path = path.clone();
    let primary = tokio::task::spawn_blocking(move || {
        decode_audio_file(&primary_path, DecodeMode::Strict, None)
    })
    .await
    .map_err(|e| IngestError::InvalidAudio(format!("Decode task failed: {}", e)))?;

    let primary = match primary {
        Ok(decoded) => return Ok(decoded),
        Err(primary) => primary,
    };
    warn!(path = %path.display(), error = %format!("{:#}", primary), "General decoder failed, trying WAV reader");

    tokio::task::spawn_blocking(move || decode_wav_file(&path))
        .await
        .map_err(|e| IngestError::InvalidAudio(format!("WAV reader task failed: {}", e)))?
        .map_err(|fallback| {
            IngestError::InvalidAudio(format!(
                "Undecodable audio ({:#}; WAV reader: {:#})",
                primary, fallback
            ))
        })
}

fn read_header(path: &Path) -> Result<Vec<u8>, IngestError> {
    let mut file = std::fs::File::open(path)?;
    let mut header = Vec::with_capacity(SNIFF_LEN);
    file.by_ref().take(SNIFF_LEN as u64).read_to_end(&mut header)?;
    Ok(header)
}
