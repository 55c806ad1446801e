//! Audio assets flowing through the ingest pipeline
//!
//! An asset is either the caller's original file, which the pipeline never
//! deletes, or a temporary file it produced and owns until `discard()`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, warn};

/// Container family, as far as routing decisions care
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Wav,
    Mp3,
    Webm,
    Unknown,
}

impl ContainerFormat {
    /// Classify by file extension (case-insensitive)
    pub fn from_extension(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("wav") | Some("wave") => ContainerFormat::Wav,
            Some("mp3") => ContainerFormat::Mp3,
            Some("webm") => ContainerFormat::Webm,
            _ => ContainerFormat::Unknown,
        }
    }

    /// Classify by leading magic bytes
    pub fn sniff(header: &[u8]) -> Self {
        if has_riff_wave_magic(header) {
            return ContainerFormat::Wav;
        }
        match infer::get(header).map(|kind| kind.extension()) {
            Some("mp3") => ContainerFormat::Mp3,
            Some("webm") => ContainerFormat::Webm,
            Some("wav") => ContainerFormat::Wav,
            _ => ContainerFormat::Unknown,
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContainerFormat::Wav => "wav",
            ContainerFormat::Mp3 => "mp3",
            ContainerFormat::Webm => "webm",
            ContainerFormat::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// `RIFF....WAVE` in the first 12 bytes
pub fn has_riff_wave_magic(header: &[u8]) -> bool {
    matches!(
        header,
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..]
    )
}

/// Waveform shape every converted asset is normalized to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetProfile {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl TargetProfile {
    /// Mono, 16 kHz, 16-bit PCM
    pub const SPEECH: TargetProfile = TargetProfile {
        sample_rate: 16_000,
        channels: 1,
        bits_per_sample: 16,
    };

    /// Bytes per sample frame
    pub fn block_align(&self) -> u16 {
        self.channels * self.bits_per_sample / 8
    }

    /// Bytes per second of audio
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }

    /// Equivalent hound spec for integer PCM output
    pub fn wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format: hound::SampleFormat::Int,
        }
    }
}

impl Default for TargetProfile {
    fn default() -> Self {
        TargetProfile::SPEECH
    }
}

/// Who owns the file behind an asset
#[derive(Debug)]
pub enum AssetStorage {
    /// Caller's input file
    Original,
    /// Pipeline-produced file, removed on discard or drop
    Temporary(TempPath),
}

/// One audio file the pipeline may run inference on
#[derive(Debug)]
pub struct AudioAsset {
    path: PathBuf,
    pub format: ContainerFormat,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub bit_depth: Option<u16>,
    pub has_valid_header: bool,
    storage: AssetStorage,
}

impl AudioAsset {
    /// Wrap the caller's input file
    pub fn original(path: impl Into<PathBuf>, format: ContainerFormat) -> Self {
        Self {
            path: path.into(),
            format,
            sample_rate: None,
            channels: None,
            bit_depth: None,
            has_valid_header: false,
            storage: AssetStorage::Original,
        }
    }

    /// Take ownership of a produced WAV file in the given profile
    pub fn temporary(temp: TempPath, profile: TargetProfile) -> Self {
        Self {
            path: temp.to_path_buf(),
            format: ContainerFormat::Wav,
            sample_rate: Some(profile.sample_rate),
            channels: Some(profile.channels),
            bit_depth: Some(profile.bits_per_sample),
            has_valid_header: true,
            storage: AssetStorage::Temporary(temp),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self.storage, AssetStorage::Temporary(_))
    }

    /// Current size on disk
    pub fn file_size(&self) -> std::io::Result<u64> {
        std::fs::metadata(&self.path).map(|m| m.len())
    }

    /// True when the file exists and holds at least one byte
    pub fn is_readable_non_empty(&self) -> bool {
        std::fs::metadata(&self.path)
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false)
    }

    /// Release the asset, deleting it only if the pipeline owns it
    ///
    /// Deletion failures are logged and swallowed.
    pub fn discard(self) {
        match self.storage {
            AssetStorage::Original => {
                debug!(path = %self.path.display(), "Keeping original input file");
            }
            AssetStorage::Temporary(temp) => match temp.close() {
                Ok(()) => debug!(path = %self.path.display(), "Removed temporary audio file"),
                Err(e) => warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove temporary audio file"
                ),
            },
        }
    }
}
