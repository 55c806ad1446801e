//! Transcript types shared between the pipeline and its consumers

use serde::{Deserialize, Serialize};

/// One timed span of recognized speech
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start offset in seconds
    pub start: f64,
    /// End offset in seconds (never before `start`)
    pub end: f64,
    pub text: String,
}

impl Segment {
    /// Create a segment, swapping the bounds if they arrive reversed
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Full recognizer output
///
/// Segments are kept in insertion order, which is chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub text: String,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl TranscriptionResult {
    /// True when the text is empty after trimming
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Replace blank text with `placeholder`
    ///
    /// Returns true if the placeholder was applied.
    pub fn apply_empty_placeholder(&mut self, placeholder: &str) -> bool {
        if self.is_blank() {
            self.text = placeholder.to_string();
            true
        } else {
            false
        }
    }

    /// Ensure segments are in chronological order and well-formed
    pub fn normalize_segments(&mut self) {
        for segment in &mut self.segments {
            if segment.end < segment.start {
                std::mem::swap(&mut segment.start, &mut segment.end);
            }
        }
        // Stable sort keeps insertion order among equal start times
        self.segments
            .sort_by(|a, b| a.start.total_cmp(&b.start));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_new_orders_bounds() {
        let segment = Segment::new(3.0, 1.0, "late");
        assert_eq!(segment.start, 1.0);
        assert_eq!(segment.end, 3.0);
    }

    #[test]
    fn test_apply_empty_placeholder() {
        let mut result = TranscriptionResult {
            text: "   \n ".to_string(),
            segments: Vec::new(),
        };
        assert!(result.apply_empty_placeholder("[silence]"));
        assert_eq!(result.text, "[silence]");

        let mut spoken = TranscriptionResult {
            text: " bonjour ".to_string(),
            segments: Vec::new(),
        };
        assert!(!spoken.apply_empty_placeholder("[silence]"));
        assert_eq!(spoken.text, " bonjour ");
    }

    #[test]
    fn test_normalize_segments_is_stable() {
        let mut result = TranscriptionResult {
            text: "a b c".to_string(),
            segments: vec![
                Segment::new(2.0, 3.0, "c"),
                Segment::new(0.0, 1.0, "a"),
                Segment::new(2.0, 2.5, "d"),
            ],
        };
        result.normalize_segments();
        let texts: Vec<&str> = result.segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_deserialize_ignores_extra_fields() {
        let json = r#"{
            "text": " Bonjour.",
            "language": "fr",
            "segments": [
                {"id": 0, "start": 0.0, "end": 1.2, "text": " Bonjour.", "tokens": [1, 2]}
            ]
        }"#;
        let result: TranscriptionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].end, 1.2);
    }
}
