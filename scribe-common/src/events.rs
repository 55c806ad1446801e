//! Progress and result channel wire protocol
//!
//! **Progress channel (stderr):** one JSON object per line, discriminated by
//! `type`, e.g. `{"type":"modelLoadingProgress","progress":0.42}`. Log lines
//! share the stream, so decoders skip anything that is not a protocol object.
//!
//! **Result channel (stdout):** the transcript between two sentinel lines and,
//! when requested, SRT subtitles between a second pair.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Opening sentinel line of the transcript block
pub const TRANSCRIPT_BEGIN: &str = "DÉBUT_TEXTE_TRANSCRIPTION";
/// Closing sentinel line of the transcript block
pub const TRANSCRIPT_END: &str = "FIN_TEXTE_TRANSCRIPTION";
/// Opening sentinel line of the subtitle block
pub const SUBTITLES_BEGIN: &str = "DÉBUT_SRT";
/// Closing sentinel line of the subtitle block
pub const SUBTITLES_END: &str = "FIN_SRT";

/// Structured progress message emitted on the diagnostic stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ProgressEvent {
    /// Estimated fraction of the model load completed, in `[0, 1]`
    ModelLoadingProgress { progress: f64 },
}

impl ProgressEvent {
    /// Model loading progress, clamped to `[0, 1]`
    pub fn model_loading(fraction: f64) -> Self {
        let progress = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        ProgressEvent::ModelLoadingProgress { progress }
    }

    /// Fraction carried by the event
    pub fn fraction(&self) -> f64 {
        match self {
            ProgressEvent::ModelLoadingProgress { progress } => *progress,
        }
    }

    /// Encode as a single line (without trailing newline)
    pub fn to_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Protocol(e.to_string()))
    }
}

/// Decode one line of the diagnostic stream
///
/// Returns `Ok(None)` for log lines and foreign JSON, and an error for a
/// protocol message whose fraction lies outside `[0, 1]`.
pub fn parse_progress_line(line: &str) -> Result<Option<ProgressEvent>> {
    let trimmed = line.trim();
    if !trimmed.starts_with('{') {
        return Ok(None);
    }

    let event: ProgressEvent = match serde_json::from_str(trimmed) {
        Ok(event) => event,
        Err(_) => return Ok(None),
    };

    let fraction = event.fraction();
    if !(0.0..=1.0).contains(&fraction) {
        return Err(Error::Protocol(format!(
            "progress fraction out of range: {}",
            fraction
        )));
    }

    Ok(Some(event))
}

/// Write the transcript block to the result channel
pub fn write_transcript<W: Write>(out: &mut W, text: &str) -> std::io::Result<()> {
    write_block(out, TRANSCRIPT_BEGIN, text, TRANSCRIPT_END)
}

/// Write the subtitle block to the result channel
pub fn write_subtitles<W: Write>(out: &mut W, srt: &str) -> std::io::Result<()> {
    write_block(out, SUBTITLES_BEGIN, srt, SUBTITLES_END)
}

fn write_block<W: Write>(out: &mut W, begin: &str, body: &str, end: &str) -> std::io::Result<()> {
    writeln!(out, "{}", begin)?;
    writeln!(out, "{}", body)?;
    writeln!(out, "{}", end)?;
    out.flush()
}

/// Extract the transcript from captured result-channel output
pub fn extract_transcript(output: &str) -> Option<String> {
    extract_block(output, TRANSCRIPT_BEGIN, TRANSCRIPT_END)
}

/// Extract the SRT subtitles from captured result-channel output
pub fn extract_subtitles(output: &str) -> Option<String> {
    extract_block(output, SUBTITLES_BEGIN, SUBTITLES_END)
}

fn extract_block(output: &str, begin: &str, end: &str) -> Option<String> {
    let open = format!("{}\n", begin);
    let body_start = find_line_start(output, &open)? + open.len();

    let close = format!("\n{}", end);
    let body_len = output[body_start..].find(&close)?;

    Some(output[body_start..body_start + body_len].to_string())
}

/// Byte offset of `needle` where it begins a line
fn find_line_start(haystack: &str, needle: &str) -> Option<usize> {
    if haystack.starts_with(needle) {
        return Some(0);
    }
    haystack
        .find(&format!("\n{}", needle))
        .map(|pos| pos + 1)
}
