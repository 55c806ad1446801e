//! SRT subtitle serialization
//!
//! Each block is the 1-based index, the `start --> end` timing line, the
//! trimmed segment text and a blank separator line.

use crate::transcript::Segment;

/// Format seconds as an SRT timestamp (`HH:MM:SS,mmm`).
///
/// Rounds to the nearest millisecond. Negative and non-finite inputs clamp
/// to zero. Hours are not wrapped at 24.
///
/// # Examples
///
/// ```
/// use scribe_common::subtitle::format_timestamp;
///
/// assert_eq!(format_timestamp(0.0), "00:00:00,000");
/// assert_eq!(format_timestamp(1.5), "00:00:01,500");
/// assert_eq!(format_timestamp(3725.042), "01:02:05,042");
/// ```
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Serialize segments as SRT text
///
/// # Examples
///
/// ```
/// use scribe_common::subtitle::generate_srt;
/// use scribe_common::Segment;
///
/// let srt = generate_srt(&[Segment::new(0.0, 1.5, " hello ")]);
/// assert_eq!(srt, "1\n00:00:00,000 --> 00:00:01,500\nhello\n\n");
/// ```
pub fn generate_srt(segments: &[Segment]) -> String {
    let mut srt = String::new();
    for (index, segment) in segments.iter().enumerate() {
        srt.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_timestamp(segment.start),
            format_timestamp(segment.end),
            segment.text.trim()
        ));
    }
    srt
}
