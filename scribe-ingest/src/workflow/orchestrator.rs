//! End-to-end transcription of one audio file
//!
//! **Sequence:**
//! 1. Normalize the input path and check it exists
//! 2. Validate (may convert webm or repair a headerless WAV)
//! 3. Resolve the active asset: validator override, else lazy MP3
//!    conversion, else the original
//! 4. Check the active asset is readable and non-empty
//! 5. Load the recognizer (progress reporting + tier fallback)
//! 6. Transcribe, substitute the placeholder for empty text
//! 7. Write the transcript block, then the SRT block if requested
//!
//! A temporary active asset is discarded on every path once step 3 has
//! produced it. The original input is never deleted.

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::models::{AudioAsset, DecodingOptions, ModelTier, TargetProfile};
use crate::services::asset_validator::{AssetValidator, ValidatedAsset};
use crate::services::conversion::ConversionChain;
use crate::services::model_loader::{ModelLoader, ResourceLoadFallback, Transcriber};
use crate::services::progress_observer::ProgressSink;
use scribe_common::events::{write_subtitles, write_transcript};
use scribe_common::subtitle::generate_srt;
use scribe_common::TranscriptionResult;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Characters of the transcript echoed to the log
const LOG_PREVIEW_CHARS: usize = 100;

/// One transcription job
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    pub audio_path: PathBuf,
    pub tier: ModelTier,
    pub generate_srt: bool,
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct TranscriptionOutcome {
    pub result: TranscriptionResult,
    /// Tier that actually loaded (differs from the request after fallback)
    pub tier_used: ModelTier,
    /// Whether the empty-text placeholder replaced the recognizer output
    pub placeholder_applied: bool,
    pub subtitles: Option<String>,
}

/// Sequences validation, conversion, model loading and inference
pub struct TranscriptionOrchestrator<L: ModelLoader> {
    validator: AssetValidator,
    chain: Arc<ConversionChain>,
    loader: ResourceLoadFallback<L>,
    decoding: DecodingOptions,
    empty_text_placeholder: String,
    profile: TargetProfile,
}

impl<L: ModelLoader> TranscriptionOrchestrator<L> {
    /// Orchestrator with the standard conversion chain
    pub fn new(config: &IngestConfig, loader: L, sink: Arc<dyn ProgressSink>) -> Self {
        let chain = Arc::new(ConversionChain::standard(&config.conversion));
        Self::with_chain(config, chain, loader, sink)
    }

    /// Orchestrator with a caller-supplied conversion chain
    pub fn with_chain(
        config: &IngestConfig,
        chain: Arc<ConversionChain>,
        loader: L,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            validator: AssetValidator::new(Arc::clone(&chain), &config.conversion),
            chain,
            loader: ResourceLoadFallback::new(
                loader,
                config.model.default_tier,
                sink,
                config.model.estimated_load(),
                config.model.progress_interval(),
            ),
            decoding: config.transcription.decoding.clone(),
            empty_text_placeholder: config.transcription.empty_text_placeholder.clone(),
            profile: TargetProfile::SPEECH,
        }
    }

    /// Run the full pipeline, writing result blocks to `out`
    pub async fn run<W: Write>(
        &self,
        request: &TranscriptionRequest,
        out: &mut W,
    ) -> Result<TranscriptionOutcome, IngestError> {
        let input = normalize_path(&request.audio_path)?;
        info!(path = %input.display(), tier = %request.tier, srt = request.generate_srt, "Starting transcription");

        if !input.is_file() {
            error!(path = %input.display(), "Input file not found");
            return Err(IngestError::InputNotFound(input));
        }

        let validated = self.validator.validate(&input).await?;
        let active = self.resolve_active_asset(validated).await?;
        info!(
            active = %active.path().display(),
            temporary = active.is_temporary(),
            "Active audio asset resolved"
        );

        let outcome = self.transcribe_active(&active, request, out).await;
        active.discard();
        outcome
    }

    async fn resolve_active_asset(&self, validated: ValidatedAsset) -> Result<AudioAsset, IngestError> {
        if let Some(active) = validated.active_override {
            return Ok(active);
        }

        if validated.needs_lazy_conversion {
            info!(path = %validated.original.display(), "Converting deferred input");
            return self
                .chain
                .convert(&validated.original, self.profile, false)
                .await;
        }

        let mut original = AudioAsset::original(validated.original, validated.format);
        if let Some(info) = validated.info {
            original.sample_rate = Some(info.sample_rate);
            original.channels = u16::try_from(info.channels).ok();
            original.has_valid_header = true;
        }
        Ok(original)
    }

    async fn transcribe_active<W: Write>(
        &self,
        active: &AudioAsset,
        request: &TranscriptionRequest,
        out: &mut W,
    ) -> Result<TranscriptionOutcome, IngestError> {
        if !active.is_readable_non_empty() {
            return Err(IngestError::InvalidAudio(format!(
                "Active asset is missing or empty: {}",
                active.path().display()
            )));
        }
        debug!(bytes = ?active.file_size().ok(), "Active asset size");

        let loaded = self.loader.load(request.tier).await?;
        let tier_used = loaded.tier;
        let model = Arc::new(loaded.model);

        info!(tier = %tier_used, path = %active.path().display(), "Running inference");
        let audio_path = active.path().to_path_buf();
        let options = self.decoding.clone();
        let mut result = tokio::task::spawn_blocking(move || model.transcribe(&audio_path, &options))
            .await
            .map_err(|e| IngestError::InferenceFailed(format!("Inference task failed: {}", e)))?
            .map_err(|e| {
                error!(error = %format!("{:#}", e), "Inference failed");
                IngestError::InferenceFailed(format!("{:#}", e))
            })?;

        let placeholder_applied = result.apply_empty_placeholder(&self.empty_text_placeholder);
        if placeholder_applied {
            info!("No speech detected, emitting placeholder text");
        }

        let preview: String = result.text.chars().take(LOG_PREVIEW_CHARS).collect();
        info!(
            chars = result.text.chars().count(),
            segments = result.segments.len(),
            preview = %preview,
            "Transcription complete"
        );

        write_transcript(out, &result.text)?;

        let subtitles = if request.generate_srt {
            let srt = generate_srt(&result.segments);
            write_subtitles(out, &srt)?;
            debug!(blocks = result.segments.len(), "Subtitles written");
            Some(srt)
        } else {
            None
        };

        Ok(TranscriptionOutcome {
            result,
            tier_used,
            placeholder_applied,
            subtitles,
        })
    }
}

/// Absolute form of `path`, relative paths resolved against the working directory
fn normalize_path(path: &Path) -> Result<PathBuf, IngestError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
