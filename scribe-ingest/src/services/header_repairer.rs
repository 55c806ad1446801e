//! WAV header synthesis for headerless PCM streams
//!
//! Input bytes are treated as raw little-endian PCM in the target profile
//! (mono, 16 kHz, 16-bit). The repaired file is the canonical 44-byte
//! RIFF/WAVE header followed by the untouched payload.

use crate::models::{AudioAsset, TargetProfile};
use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

/// Size of the canonical PCM header
pub const WAV_HEADER_LEN: usize = 44;

/// Build the 44-byte RIFF/WAVE header describing `data_len` payload bytes
///
/// Fails when the payload cannot be described by the 32-bit RIFF size field.
pub fn synthesize_header(data_len: usize, profile: TargetProfile) -> Result<[u8; WAV_HEADER_LEN]> {
    let data_size = u32::try_from(data_len)
        .ok()
        .filter(|size| size.checked_add(36).is_some())
        .with_context(|| format!("Payload of {} bytes exceeds the RIFF size limit", data_len))?;

    let mut header = [0u8; WAV_HEADER_LEN];
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&(36 + data_size).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM
    header[22..24].copy_from_slice(&profile.channels.to_le_bytes());
    header[24..28].copy_from_slice(&profile.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&profile.byte_rate().to_le_bytes());
    header[32..34].copy_from_slice(&profile.block_align().to_le_bytes());
    header[34..36].copy_from_slice(&profile.bits_per_sample.to_le_bytes());
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    Ok(header)
}

/// Prefix `payload` with a synthesized header
pub fn repair_bytes(payload: &[u8], profile: TargetProfile) -> Result<Vec<u8>> {
    let header = synthesize_header(payload.len(), profile)?;
    let mut repaired = Vec::with_capacity(WAV_HEADER_LEN + payload.len());
    repaired.extend_from_slice(&header);
    repaired.extend_from_slice(payload);
    Ok(repaired)
}

/// Repair a headerless file into a new temporary WAV asset
///
/// Works on a private copy of the source, which is removed afterwards
/// whether or not the repair succeeded. The source itself is never modified.
pub fn repair_file(source: &Path, profile: TargetProfile) -> Result<AudioAsset> {
    info!(path = %source.display(), "Synthesizing WAV header for headerless input");

    let working_copy = tempfile::Builder::new()
        .prefix("scribe-raw-")
        .suffix(".pcm")
        .tempfile()
        .context("Failed to create working copy for header repair")?
        .into_temp_path();
    std::fs::copy(source, &working_copy)
        .with_context(|| format!("Failed to copy {} for repair", source.display()))?;

    let result = repair_working_copy(&working_copy, profile);

    let copy_path = working_copy.to_path_buf();
    if let Err(e) = working_copy.close() {
        warn!(path = %copy_path.display(), error = %e, "Failed to remove repair working copy");
    }

    result
}

fn repair_working_copy(working_copy: &Path, profile: TargetProfile) -> Result<AudioAsset> {
    let payload = std::fs::read(working_copy)
        .with_context(|| format!("Failed to read {}", working_copy.display()))?;
    if payload.is_empty() {
        bail!("Nothing to repair: payload is empty");
    }

    let header = synthesize_header(payload.len(), profile)?;

    let mut output = tempfile::Builder::new()
        .prefix("scribe-repaired-")
        .suffix(".wav")
        .tempfile()
        .context("Failed to create repaired WAV file")?;
    output.write_all(&header).context("Failed to write WAV header")?;
    output.write_all(&payload).context("Failed to write PCM payload")?;
    output.flush().context("Failed to flush repaired WAV file")?;

    let repaired = AudioAsset::temporary(output.into_temp_path(), profile);
    debug!(
        path = %repaired.path().display(),
        payload_bytes = payload.len(),
        "Repaired WAV written"
    );
    Ok(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = synthesize_header(2000, TargetProfile::SPEECH).unwrap();
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(header[4..8].try_into().unwrap()), 2036);
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(u32::from_le_bytes(header[16..20].try_into().unwrap()), 16);
        assert_eq!(u16::from_le_bytes(header[20..22].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(header[22..24].try_into().unwrap()), 1);
        assert_eq!(u32::from_le_bytes(header[24..28].try_into().unwrap()), 16_000);
        assert_eq!(u32::from_le_bytes(header[28..32].try_into().unwrap()), 32_000);
        assert_eq!(u16::from_le_bytes(header[32..34].try_into().unwrap()), 2);
        assert_eq!(u16::from_le_bytes(header[34..36].try_into().unwrap()), 16);
        assert_eq!(&header[36..40], b"data");
        assert_eq!(u32::from_le_bytes(header[40..44].try_into().unwrap()), 2000);
    }

    #[test]
    fn test_repair_bytes_keeps_payload() {
        let payload = vec![7u8; 1200];
        let repaired = repair_bytes(&payload, TargetProfile::SPEECH).unwrap();
        assert_eq!(repaired.len(), WAV_HEADER_LEN + payload.len());
        assert_eq!(&repaired[WAV_HEADER_LEN..], payload.as_slice());
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let too_big = u32::MAX as usize;
        assert!(synthesize_header(too_big, TargetProfile::SPEECH).is_err());
    }
}
