//! Recognizer backed by the `whisper` command-line tool
//!
//! **Load:** checks that the tool runs, then runs the warm-up interpreter so
//! the tier's weights are fetched into the model directory. A tier that cannot
//! be downloaded or deserialized fails here, inside the progress session,
//! rather than during transcription.
//!
//! **Transcribe:** runs the tool against that same model directory with JSON
//! output into a scratch directory and parses `{text, segments}` from
//! `<stem>.json`.

use crate::models::{DecodingOptions, ModelTier};
use crate::services::model_loader::{ModelLoader, Transcriber};
use anyhow::{bail, ensure, Context, Result};
use scribe_common::TranscriptionResult;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Fetches and deserializes one tier; argv is `<tier> <download_root>`
const WARMUP_SCRIPT: &str = "import sys, whisper; \
whisper.load_model(sys.argv[1], device='cpu', download_root=sys.argv[2])";

/// Loader for the `whisper` CLI
#[derive(Debug, Clone)]
pub struct WhisperCliLoader {
    command: PathBuf,
    python: PathBuf,
    model_dir: PathBuf,
}

impl WhisperCliLoader {
    pub fn new(command: PathBuf, python: PathBuf, model_dir: PathBuf) -> Self {
        Self {
            command,
            python,
            model_dir,
        }
    }

    fn check_command(&self) -> Result<()> {
        let status = Command::new(&self.command)
            .arg("--help")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("Recognizer command not runnable: {}", self.command.display()))?;
        ensure!(
            status.success(),
            "Recognizer command {} exited with {}",
            self.command.display(),
            status
        );
        Ok(())
    }

    fn warm_up(&self, tier: ModelTier) -> Result<()> {
        std::fs::create_dir_all(&self.model_dir).with_context(|| {
            format!("Failed to create model directory {}", self.model_dir.display())
        })?;

        let output = Command::new(&self.python)
            .arg("-c")
            .arg(WARMUP_SCRIPT)
            .arg(tier.as_str())
            .arg(&self.model_dir)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Model interpreter not runnable: {}", self.python.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "Model {} failed to load ({}): {}",
                tier,
                output.status,
                stderr.trim()
            );
        }
        Ok(())
    }
}

impl ModelLoader for WhisperCliLoader {
    type Model = WhisperCliModel;

    fn load(&self, tier: ModelTier) -> Result<WhisperCliModel> {
        self.check_command()?;
        self.warm_up(tier)?;

        info!(tier = %tier, model_dir = %self.model_dir.display(), "Model weights available");
        Ok(WhisperCliModel {
            command: self.command.clone(),
            model_dir: self.model_dir.clone(),
            tier,
        })
    }
}

/// A tier whose weights are present in `model_dir`
#[derive(Debug, Clone)]
pub struct WhisperCliModel {
    command: PathBuf,
    model_dir: PathBuf,
    tier: ModelTier,
}

impl Transcriber for WhisperCliModel {
    fn transcribe(&self, audio: &Path, options: &DecodingOptions) -> Result<TranscriptionResult> {
        let output_dir = tempfile::Builder::new()
            .prefix("scribe-whisper-")
            .tempdir()
            .context("Failed to create recognizer output directory")?;

        let mut command = Command::new(&self.command);
        command
            .arg(audio)
            .arg("--model")
            .arg(self.tier.as_str())
            .arg("--model_dir")
            .arg(&self.model_dir)
            .arg("--output_dir")
            .arg(output_dir.path())
            .args(["--output_format", "json", "--verbose", "False"])
            .args(decoding_args(options));

        debug!(command = ?command, "Running recognizer");

        let output = command
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute {}", self.command.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("Recognizer exited with {}: {}", output.status, stderr.trim());
        }

        let stem = audio
            .file_stem()
            .context("Audio path has no file name")?
            .to_string_lossy();
        let json_path = output_dir.path().join(format!("{}.json", stem));
        let json = std::fs::read_to_string(&json_path)
            .with_context(|| format!("Failed to read recognizer output: {}", json_path.display()))?;

        parse_transcription_json(&json)
    }
}

/// Parse recognizer JSON output, ordering segments chronologically
pub fn parse_transcription_json(json: &str) -> Result<TranscriptionResult> {
    let mut result: TranscriptionResult =
        serde_json::from_str(json).context("Failed to parse recognizer JSON")?;
    result.normalize_segments();
    Ok(result)
}

/// Command-line flags for a decoding configuration
pub fn decoding_args(options: &DecodingOptions) -> Vec<String> {
    let mut args = vec![
        "--language".to_string(),
        options.language.clone(),
        "--task".to_string(),
        options.task.clone(),
        "--fp16".to_string(),
        python_bool(options.fp16),
        "--temperature".to_string(),
        options.temperature.to_string(),
        // Single decoding pass at the configured temperature
        "--temperature_increment_on_fallback".to_string(),
        "None".to_string(),
        "--best_of".to_string(),
        options.best_of.to_string(),
        "--beam_size".to_string(),
        options.beam_size.to_string(),
        "--no_speech_threshold".to_string(),
        options.no_speech_threshold.to_string(),
        "--logprob_threshold".to_string(),
        options.logprob_threshold.to_string(),
        "--compression_ratio_threshold".to_string(),
        options.compression_ratio_threshold.to_string(),
        "--word_timestamps".to_string(),
        python_bool(options.word_timestamps),
    ];
    if let Some(prompt) = &options.initial_prompt {
        args.push("--initial_prompt".to_string());
        args.push(prompt.clone());
    }
    args
}

fn python_bool(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}
