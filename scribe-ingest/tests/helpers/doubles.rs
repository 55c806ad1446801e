//! Test doubles for conversion strategies, the model loader and progress sinks

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use scribe_common::{ProgressEvent, Segment, TranscriptionResult};
use scribe_ingest::models::{AudioAsset, DecodingOptions, ModelTier};
use scribe_ingest::services::conversion::{ConversionRequest, ConversionStrategy};
use scribe_ingest::services::{ModelLoader, ProgressSink, Transcriber};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Progress sink
// ---------------------------------------------------------------------------

/// Records every emitted fraction in order
#[derive(Default)]
pub struct RecordingSink {
    fractions: Mutex<Vec<f64>>,
}

impl RecordingSink {
    pub fn fractions(&self) -> Vec<f64> {
        self.fractions.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: &ProgressEvent) {
        self.fractions.lock().unwrap().push(event.fraction());
    }
}

// ---------------------------------------------------------------------------
// Conversion strategies
// ---------------------------------------------------------------------------

/// What a scripted strategy does when attempted
#[derive(Debug, Clone)]
pub enum StrategyBehavior {
    /// Write a short valid WAV in the requested profile
    Succeed,
    /// Return an error with this message
    Fail(String),
    /// Return an asset whose file is empty
    ZeroByte,
    /// Sleep this long before succeeding
    Hang(Duration),
    /// Spin on a blocking thread until the attempt is cancelled
    BlockUntilCancelled,
}

/// Strategy double that counts its attempts
pub struct ScriptedStrategy {
    name: String,
    behavior: StrategyBehavior,
    timeout: Option<Duration>,
    calls: Arc<AtomicUsize>,
    tokens: Arc<Mutex<Vec<CancellationToken>>>,
    worker_stopped: Arc<AtomicBool>,
}

impl ScriptedStrategy {
    pub fn new(name: &str, behavior: StrategyBehavior) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            timeout: None,
            calls: Arc::new(AtomicUsize::new(0)),
            tokens: Arc::new(Mutex::new(Vec::new())),
            worker_stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Shared attempt counter, readable after the strategy is boxed
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Cancellation tokens handed to each attempt
    pub fn tokens(&self) -> Arc<Mutex<Vec<CancellationToken>>> {
        Arc::clone(&self.tokens)
    }

    /// Set once a `BlockUntilCancelled` worker thread has exited
    pub fn worker_stopped(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.worker_stopped)
    }
}

/// Write 0.1 s of a quiet tone as a temporary WAV asset
pub fn temporary_wav(request: &ConversionRequest) -> Result<AudioAsset> {
    let path = tempfile::Builder::new()
        .prefix("scribe-test-")
        .suffix(".wav")
        .tempfile()?
        .into_temp_path();
    let mut writer = hound::WavWriter::create(&path, request.profile.wav_spec())?;
    for i in 0..(request.profile.sample_rate / 10) {
        writer.write_sample(((i % 50) as i16 - 25) * 200)?;
    }
    writer.finalize()?;
    Ok(AudioAsset::temporary(path, request.profile))
}

#[async_trait]
impl ConversionStrategy for ScriptedStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self, _request: &ConversionRequest) -> Option<Duration> {
        self.timeout
    }

    async fn attempt(
        &self,
        request: &ConversionRequest,
        cancel: &CancellationToken,
    ) -> Result<AudioAsset> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().unwrap().push(cancel.clone());
        match &self.behavior {
            StrategyBehavior::Succeed => temporary_wav(request),
            StrategyBehavior::Fail(message) => bail!("{}", message),
            StrategyBehavior::ZeroByte => {
                let path = tempfile::NamedTempFile::new()?.into_temp_path();
                Ok(AudioAsset::temporary(path, request.profile))
            }
            StrategyBehavior::Hang(duration) => {
                tokio::time::sleep(*duration).await;
                temporary_wav(request)
            }
            StrategyBehavior::BlockUntilCancelled => {
                let cancel = cancel.clone();
                let stopped = Arc::clone(&self.worker_stopped);
                tokio::task::spawn_blocking(move || {
                    while !cancel.is_cancelled() {
                        std::thread::sleep(Duration::from_millis(5));
                    }
                    stopped.store(true, Ordering::SeqCst);
                })
                .await?;
                bail!("worker cancelled")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Model loader
// ---------------------------------------------------------------------------

/// Loader double with per-tier outcomes and an attempt log
pub struct ScriptedLoader {
    failing_tiers: HashSet<ModelTier>,
    attempts: Arc<Mutex<Vec<ModelTier>>>,
    load_delay: Duration,
    transcriber: FakeTranscriber,
}

impl ScriptedLoader {
    /// Every tier loads
    pub fn new(transcriber: FakeTranscriber) -> Self {
        Self {
            failing_tiers: HashSet::new(),
            attempts: Arc::new(Mutex::new(Vec::new())),
            load_delay: Duration::ZERO,
            transcriber,
        }
    }

    pub fn failing(mut self, tier: ModelTier) -> Self {
        self.failing_tiers.insert(tier);
        self
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// Shared log of tiers attempted, in order
    pub fn attempts(&self) -> Arc<Mutex<Vec<ModelTier>>> {
        Arc::clone(&self.attempts)
    }
}

impl ModelLoader for ScriptedLoader {
    type Model = FakeTranscriber;

    fn load(&self, tier: ModelTier) -> Result<FakeTranscriber> {
        self.attempts.lock().unwrap().push(tier);
        if !self.load_delay.is_zero() {
            std::thread::sleep(self.load_delay);
        }
        if self.failing_tiers.contains(&tier) {
            return Err(anyhow!("scripted load failure for {}", tier));
        }
        Ok(self.transcriber.clone())
    }
}

/// Recognizer double returning a fixed result
#[derive(Debug, Clone)]
pub struct FakeTranscriber {
    result: std::result::Result<TranscriptionResult, String>,
    seen: Arc<Mutex<Vec<SeenAudio>>>,
}

/// What the recognizer observed about its input
#[derive(Debug, Clone)]
pub struct SeenAudio {
    pub path: PathBuf,
    pub bytes: u64,
    pub language: String,
}

impl FakeTranscriber {
    pub fn returning(text: &str, segments: Vec<Segment>) -> Self {
        Self {
            result: Ok(TranscriptionResult {
                text: text.to_string(),
                segments,
            }),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn seen(&self) -> Arc<Mutex<Vec<SeenAudio>>> {
        Arc::clone(&self.seen)
    }
}

impl Transcriber for FakeTranscriber {
    fn transcribe(&self, audio: &Path, options: &DecodingOptions) -> Result<TranscriptionResult> {
        let bytes = std::fs::metadata(audio).map(|m| m.len()).unwrap_or(0);
        self.seen.lock().unwrap().push(SeenAudio {
            path: audio.to_path_buf(),
            bytes,
            language: options.language.clone(),
        });
        self.result.clone().map_err(|message| anyhow!(message))
    }
}
