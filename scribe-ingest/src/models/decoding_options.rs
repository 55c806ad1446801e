//! Fixed decoding configuration handed to the recognizer

use serde::{Deserialize, Serialize};

/// Recognizer decoding parameters
///
/// Defaults reproduce a deterministic French transcription setup: greedy
/// temperature, beam search of 5, aggressive repetition filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodingOptions {
    /// Language hint (ISO 639-1)
    pub language: String,
    /// "transcribe" or "translate"
    pub task: String,
    pub fp16: bool,
    pub temperature: f32,
    pub best_of: u32,
    pub beam_size: u32,
    pub no_speech_threshold: f32,
    pub logprob_threshold: f32,
    pub compression_ratio_threshold: f32,
    pub word_timestamps: bool,
    /// Text primed into the decoder context
    pub initial_prompt: Option<String>,
}

impl Default for DecodingOptions {
    fn default() -> Self {
        Self {
            language: "fr".to_string(),
            task: "transcribe".to_string(),
            fp16: false,
            temperature: 0.0,
            best_of: 5,
            beam_size: 5,
            no_speech_threshold: 0.6,
            logprob_threshold: -1.0,
            compression_ratio_threshold: 1.2,
            word_timestamps: true,
            initial_prompt: Some(
                "Ceci est un enregistrement audio à transcrire fidèlement en français.".to_string(),
            ),
        }
    }
}
