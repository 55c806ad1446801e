//! Configuration for scribe-ingest
//!
//! Loaded from TOML (see `scribe_common::config` for file resolution), then
//! patched from environment variables. Every key is optional.
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [model]
//! default_tier = "base"
//! estimated_load_seconds = 20
//!
//! [conversion]
//! ffmpeg_path = "/usr/bin/ffmpeg"
//! timeout_seconds = 60
//!
//! [transcription]
//! command = "whisper"
//! python = "python3"
//! model_dir = "/var/cache/whisper"
//! language = "fr"
//! ```

use crate::error::Result;
use crate::models::{DecodingOptions, ModelTier};
use scribe_common::config::{env_override, ConfigResolver, LoggingConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Application name used for config discovery (`~/.config/scribe/config.toml`)
pub const APP_NAME: &str = "scribe";

/// Overrides `[conversion] ffmpeg_path`
pub const FFMPEG_PATH_ENV_VAR: &str = "SCRIBE_FFMPEG_PATH";
/// Overrides `[transcription] command`
pub const WHISPER_COMMAND_ENV_VAR: &str = "SCRIBE_WHISPER_COMMAND";
/// Overrides `[transcription] python`
pub const PYTHON_ENV_VAR: &str = "SCRIBE_PYTHON";
/// Overrides `[transcription] model_dir`
pub const MODEL_DIR_ENV_VAR: &str = "SCRIBE_MODEL_DIR";

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
}

impl IngestConfig {
    /// Resolve, parse and apply environment overrides
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let mut config: IngestConfig = ConfigResolver::new(APP_NAME).load(cli_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Patch fields from `SCRIBE_*` environment variables
    pub fn apply_env_overrides(&mut self) {
        if let Some(path) = env_override(FFMPEG_PATH_ENV_VAR) {
            info!(path = %path, "ffmpeg path overridden from environment");
            self.conversion.ffmpeg_path = PathBuf::from(path);
        }
        if let Some(command) = env_override(WHISPER_COMMAND_ENV_VAR) {
            info!(command = %command, "Recognizer command overridden from environment");
            self.transcription.command = PathBuf::from(command);
        }
        if let Some(python) = env_override(PYTHON_ENV_VAR) {
            info!(python = %python, "Model interpreter overridden from environment");
            self.transcription.python = PathBuf::from(python);
        }
        if let Some(dir) = env_override(MODEL_DIR_ENV_VAR) {
            info!(dir = %dir, "Model directory overridden from environment");
            self.transcription.model_dir = Some(PathBuf::from(dir));
        }
    }
}

/// `[model]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Tier retried when the requested one fails to load
    pub default_tier: ModelTier,
    /// Expected load duration driving the progress estimate
    pub estimated_load_seconds: f64,
    /// Progress emission cadence
    pub progress_interval_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default_tier: ModelTier::FALLBACK_DEFAULT,
            estimated_load_seconds: 20.0,
            progress_interval_ms: 1000,
        }
    }
}

impl ModelConfig {
    pub fn estimated_load(&self) -> Duration {
        Duration::from_secs_f64(self.estimated_load_seconds.max(0.001))
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms.max(1))
    }
}

/// `[conversion]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub ffmpeg_path: PathBuf,
    /// Budget for the external tool on the generic path
    pub timeout_seconds: u64,
    /// Budget for the external tool when routing webm input
    pub webm_timeout_seconds: u64,
    /// Budget for each in-process decode strategy
    pub library_timeout_seconds: u64,
    /// Headerless files at or below this size are rejected instead of repaired
    pub min_repairable_bytes: u64,
    /// Peak amplitude below which the input is reported as silent
    pub silence_threshold: f32,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            timeout_seconds: 60,
            webm_timeout_seconds: 30,
            library_timeout_seconds: 300,
            min_repairable_bytes: 1000,
            silence_threshold: 0.01,
        }
    }
}

impl ConversionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn webm_timeout(&self) -> Duration {
        Duration::from_secs(self.webm_timeout_seconds)
    }

    pub fn library_timeout(&self) -> Duration {
        Duration::from_secs(self.library_timeout_seconds)
    }
}

/// `[transcription]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Recognizer command-line tool
    pub command: PathBuf,
    /// Interpreter running the model warm-up
    pub python: PathBuf,
    /// Download root for model weights; the recognizer's cache when unset
    pub model_dir: Option<PathBuf>,
    /// Text emitted when the recognizer returns nothing
    pub empty_text_placeholder: String,
    #[serde(flatten)]
    pub decoding: DecodingOptions,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            command: PathBuf::from("whisper"),
            python: PathBuf::from("python3"),
            model_dir: None,
            empty_text_placeholder: "[Aucune parole détectée dans l'enregistrement]".to_string(),
            decoding: DecodingOptions::default(),
        }
    }
}

impl TranscriptionConfig {
    /// Model directory shared by load and transcribe
    ///
    /// Falls back to `<cache>/whisper`, the recognizer's own download root.
    pub fn resolved_model_dir(&self) -> PathBuf {
        self.model_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("whisper")
        })
    }
}
