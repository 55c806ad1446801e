//! Audio Test Fixture Generator
//!
//! Utilities for generating WAV files and headerless PCM streams

use std::path::{Path, PathBuf};

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Peak level of the tone, 0.0 for digital silence
    pub amplitude: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 0.5,
            sample_rate: 16_000,
            channels: 1,
            amplitude: 0.3,
        }
    }
}

/// 440 Hz tone sample at frame `i`
fn tone_sample(i: usize, config: &AudioConfig) -> i16 {
    let t = i as f32 / config.sample_rate as f32;
    (config.amplitude * (2.0 * std::f32::consts::PI * 440.0 * t).sin() * i16::MAX as f32) as i16
}

/// Generate a 16-bit WAV file with a 440 Hz tone
pub fn generate_test_wav(path: &Path, config: &AudioConfig) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total_frames = (config.duration_seconds * config.sample_rate as f64) as usize;

    for i in 0..total_frames {
        let sample = tone_sample(i, config);
        for _ in 0..config.channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

/// `frames` of headerless little-endian mono PCM16 tone
pub fn raw_pcm_bytes(frames: usize) -> Vec<u8> {
    let config = AudioConfig::default();
    (0..frames)
        .flat_map(|i| tone_sample(i, &config).to_le_bytes())
        .collect()
}

/// Write `frames` of headerless little-endian mono PCM16
pub fn write_raw_pcm(path: &Path, frames: usize) -> anyhow::Result<PathBuf> {
    std::fs::write(path, raw_pcm_bytes(frames))?;
    Ok(path.to_path_buf())
}

/// MPEG-1 Layer III, 128 kbit/s, 44.1 kHz, stereo, no CRC, no padding
const MP3_FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x00];
/// `144 * 128000 / 44100`, rounded down
const MP3_FRAME_LEN: usize = 417;

/// Write `frames` silent MP3 frames (all-zero side info and main data)
pub fn write_silent_mp3(path: &Path, frames: usize) -> anyhow::Result<PathBuf> {
    let mut bytes = Vec::with_capacity(frames * MP3_FRAME_LEN);
    for _ in 0..frames {
        bytes.extend_from_slice(&MP3_FRAME_HEADER);
        bytes.resize(bytes.len() + MP3_FRAME_LEN - MP3_FRAME_HEADER.len(), 0);
    }
    std::fs::write(path, bytes)?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_simple_wav() {
        let temp_dir = TempDir::new().unwrap();
        let wav_path = temp_dir.path().join("test.wav");

        generate_test_wav(&wav_path, &AudioConfig::default()).unwrap();

        let reader = hound::WavReader::open(&wav_path).unwrap();
        assert_eq!(reader.duration(), 8000);
    }

    #[test]
    fn test_raw_pcm_has_no_header() {
        let temp_dir = TempDir::new().unwrap();
        let raw_path = temp_dir.path().join("test.raw");

        write_raw_pcm(&raw_path, 1000).unwrap();

        let bytes = std::fs::read(&raw_path).unwrap();
        assert_eq!(bytes.len(), 2000);
        assert_ne!(&bytes[0..4], b"RIFF");
    }

    #[test]
    fn test_silent_mp3_frames_are_contiguous() {
        let temp_dir = TempDir::new().unwrap();
        let mp3_path = temp_dir.path().join("silence.mp3");

        write_silent_mp3(&mp3_path, 3).unwrap();

        let bytes = std::fs::read(&mp3_path).unwrap();
        assert_eq!(bytes.len(), 3 * MP3_FRAME_LEN);
        assert_eq!(&bytes[MP3_FRAME_LEN..MP3_FRAME_LEN + 4], &MP3_FRAME_HEADER);
    }
}
