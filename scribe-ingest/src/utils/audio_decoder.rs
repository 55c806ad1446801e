//! Audio decoding utilities
//!
//! Decode audio files to mono f32 PCM with symphonia, fall back to hound for
//! WAV files symphonia rejects, and export PCM16 WAV with hound.

use anyhow::{bail, Context, Result};
use std::path::Path;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Decoded audio result
#[derive(Debug)]
pub struct DecodedAudio {
    /// Mono audio samples (f32, range [-1.0, 1.0])
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Original channel count
    pub channels: usize,
    /// Source bit depth, when the container reports one
    pub bits_per_sample: Option<u32>,
    /// Duration in seconds
    pub duration_seconds: f64,
}

impl DecodedAudio {
    /// Number of mono frames
    pub fn frames(&self) -> usize {
        self.samples.len()
    }

    /// Largest absolute sample value
    pub fn peak_amplitude(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
    }
}

/// How packet-level decode errors are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Any decode error fails the whole file
    Strict,
    /// Corrupt packets are skipped; stream errors end decoding early
    Lenient,
}

/// Container opened on its first real audio track, decoder ready
struct OpenedTrack {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: usize,
    bits_per_sample: Option<u32>,
}

fn open_track(file_path: &Path) -> Result<OpenedTrack> {
    let file = std::fs::File::open(file_path)
        .with_context(|| format!("Failed to open audio file: {}", file_path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = file_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .with_context(|| format!("Failed to probe audio file: {}", file_path.display()))?;

    let format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found in file")?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Sample rate unknown")?;
    let channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .context("Channels unknown")?;
    let bits_per_sample = track.codec_params.bits_per_sample;

    let decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .with_context(|| format!("Failed to create decoder for: {}", file_path.display()))?;

    Ok(OpenedTrack {
        format,
        decoder,
        track_id,
        sample_rate,
        channels,
        bits_per_sample,
    })
}

/// Check that a file opens as a supported container and its first packet decodes
///
/// Used to confirm a magic-byte guess before routing a file by it.
pub fn probe_audio_file(file_path: &Path) -> Result<()> {
    let mut opened = open_track(file_path)?;
    loop {
        let packet = opened
            .format
            .next_packet()
            .with_context(|| format!("No packet readable in: {}", file_path.display()))?;
        if packet.track_id() != opened.track_id {
            continue;
        }
        opened
            .decoder
            .decode(&packet)
            .with_context(|| format!("First packet undecodable in: {}", file_path.display()))?;
        return Ok(());
    }
}

/// Decode an audio file to mono f32 PCM samples
///
/// **Algorithm:**
/// 1. Probe the container with symphonia (extension used as a hint)
/// 2. Pick the first track with a real codec
/// 3. Decode every packet of that track
/// 4. Average channels down to mono
///
/// In `Lenient` mode corrupt packets are skipped and a mid-stream read error
/// ends decoding with whatever was recovered. A cancelled `cancel` token
/// stops decoding at the next packet boundary with an error.
pub fn decode_audio_file(
    file_path: &Path,
    mode: DecodeMode,
    cancel: Option<&CancellationToken>,
) -> Result<DecodedAudio> {
    debug!(path = %file_path.display(), mode = ?mode, "Decoding audio file");

    let OpenedTrack {
        mut format,
        mut decoder,
        track_id,
        sample_rate,
        channels: channel_count,
        bits_per_sample,
    } = open_track(file_path)?;

    debug!(
        path = %file_path.display(),
        sample_rate,
        channels = channel_count,
        bits_per_sample = ?bits_per_sample,
        "Audio file info"
    );

    let mut all_samples: Vec<f32> = Vec::new();
    let mut skipped_packets = 0usize;

    loop {
        if cancel.is_some_and(|token| token.is_cancelled()) {
            bail!("Decoding cancelled: {}", file_path.display());
        }

        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) if mode == DecodeMode::Lenient => {
                warn!(path = %file_path.display(), error = %e, "Stream error, keeping decoded prefix");
                break;
            }
            Err(e) => bail!("Error reading packet: {}", e),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(_)) if mode == DecodeMode::Lenient => {
                skipped_packets += 1;
                continue;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to decode packet in: {}", file_path.display())
                })
            }
        };

        all_samples.extend(convert_to_mono_f32(&decoded));
    }

    if skipped_packets > 0 {
        warn!(path = %file_path.display(), skipped_packets, "Skipped corrupt packets");
    }

    let duration_seconds = all_samples.len() as f64 / sample_rate as f64;

    debug!(
        path = %file_path.display(),
        total_samples = all_samples.len(),
        duration_seconds = format!("{:.2}", duration_seconds),
        "Audio decoding complete"
    );

    Ok(DecodedAudio {
        samples: all_samples,
        sample_rate,
        channels: channel_count,
        bits_per_sample,
        duration_seconds,
    })
}

/// Decode a RIFF/WAVE file with hound, mixing down to mono
pub fn decode_wav_file(file_path: &Path) -> Result<DecodedAudio> {
    let mut reader = hound::WavReader::open(file_path)
        .with_context(|| format!("Failed to open WAV file: {}", file_path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .context("Failed to read float WAV samples")?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1) as u32)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()
                .context("Failed to read integer WAV samples")?
        }
    };

    let samples: Vec<f32> = interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();
    let duration_seconds = samples.len() as f64 / spec.sample_rate.max(1) as f64;

    debug!(
        path = %file_path.display(),
        sample_rate = spec.sample_rate,
        channels,
        frames = samples.len(),
        "WAV decoding complete"
    );

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
        channels,
        bits_per_sample: Some(spec.bits_per_sample as u32),
        duration_seconds,
    })
}

/// Write mono f32 samples as a 16-bit PCM WAV file
///
/// Samples are clamped to [-1.0, 1.0] before quantization.
pub fn write_pcm16_wav(file_path: &Path, samples: &[f32], sample_rate: u32) -> Result<u64> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(file_path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", file_path.display()))?;

    for sample in samples {
        let quantized = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        writer
            .write_sample(quantized)
            .context("Failed to write WAV sample")?;
    }
    writer.finalize().context("Failed to finalize WAV file")?;

    let bytes = std::fs::metadata(file_path)
        .with_context(|| format!("Failed to stat WAV file: {}", file_path.display()))?
        .len();
    debug!(path = %file_path.display(), bytes, frames = samples.len(), "WAV file written");
    Ok(bytes)
}

/// Convert audio buffer to mono f32 samples
fn convert_to_mono_f32(decoded: &AudioBufferRef) -> Vec<f32> {
    match decoded {
        AudioBufferRef::F32(buf) => mix_to_mono(&**buf),
        AudioBufferRef::U8(buf) => mix_to_mono(&**buf),
        AudioBufferRef::U16(buf) => mix_to_mono(&**buf),
        AudioBufferRef::U24(buf) => mix_to_mono(&**buf),
        AudioBufferRef::U32(buf) => mix_to_mono(&**buf),
        AudioBufferRef::S8(buf) => mix_to_mono(&**buf),
        AudioBufferRef::S16(buf) => mix_to_mono(&**buf),
        AudioBufferRef::S24(buf) => mix_to_mono(&**buf),
        AudioBufferRef::S32(buf) => mix_to_mono(&**buf),
        AudioBufferRef::F64(buf) => mix_to_mono(&**buf),
    }
}

/// Average all channels of a planar buffer
fn mix_to_mono<S>(buf: &AudioBuffer<S>) -> Vec<f32>
where
    S: Sample,
    f32: FromSample<S>,
{
    let num_channels = buf.spec().channels.count();
    let num_frames = buf.frames();
    let mut mono = Vec::with_capacity(num_frames);

    for frame_idx in 0..num_frames {
        let mut sum = 0.0f32;
        for ch in 0..num_channels {
            sum += f32::from_sample(buf.chan(ch)[frame_idx]);
        }
        mono.push(sum / num_channels as f32);
    }

    mono
}
