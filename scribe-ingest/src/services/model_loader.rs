//! Recognizer loading with progress reporting and tier fallback
//!
//! The recognizer itself is an external collaborator behind two traits:
//! `ModelLoader` performs the slow, blocking load of a tier and yields a
//! `Transcriber` that runs blocking inference on a file.

use crate::error::IngestError;
use crate::models::{DecodingOptions, ModelTier};
use crate::services::progress_observer::{ProgressObserver, ProgressSink};
use anyhow::Context;
use scribe_common::TranscriptionResult;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Loaded recognizer
pub trait Transcriber: Send + Sync + 'static {
    /// Blocking inference on one audio file
    fn transcribe(&self, audio: &Path, options: &DecodingOptions) -> anyhow::Result<TranscriptionResult>;
}

/// Blocking loader for one capability tier
pub trait ModelLoader: Send + Sync + 'static {
    type Model: Transcriber;

    fn load(&self, tier: ModelTier) -> anyhow::Result<Self::Model>;
}

/// A model together with the tier that actually loaded
#[derive(Debug)]
pub struct LoadedModel<M> {
    pub model: M,
    pub tier: ModelTier,
    /// Load attempts made, 1 or 2
    pub attempts: usize,
}

/// Loads a requested tier, retrying once with the default tier on failure
///
/// Every `load()` runs under its own progress session, which is stopped
/// exactly once after the final attempt.
pub struct ResourceLoadFallback<L: ModelLoader> {
    loader: Arc<L>,
    default_tier: ModelTier,
    sink: Arc<dyn ProgressSink>,
    estimated_load: Duration,
    progress_interval: Duration,
}

impl<L: ModelLoader> ResourceLoadFallback<L> {
    pub fn new(
        loader: L,
        default_tier: ModelTier,
        sink: Arc<dyn ProgressSink>,
        estimated_load: Duration,
        progress_interval: Duration,
    ) -> Self {
        Self {
            loader: Arc::new(loader),
            default_tier,
            sink,
            estimated_load,
            progress_interval,
        }
    }

    /// Load `requested`, falling back to the default tier once
    pub async fn load(&self, requested: ModelTier) -> Result<LoadedModel<L::Model>, IngestError> {
        let mut observer = ProgressObserver::new(
            Arc::clone(&self.sink),
            self.estimated_load,
            self.progress_interval,
        );
        observer.start();

        let result = self.load_with_fallback(requested).await;

        observer.stop().await;
        result
    }

    async fn load_with_fallback(&self, requested: ModelTier) -> Result<LoadedModel<L::Model>, IngestError> {
        info!(tier = %requested, "Loading recognizer model");

        let first_error = match self.load_tier(requested).await {
            Ok(model) => {
                info!(tier = %requested, "Model loaded");
                return Ok(LoadedModel {
                    model,
                    tier: requested,
                    attempts: 1,
                });
            }
            Err(e) => e,
        };

        if requested == self.default_tier {
            error!(tier = %requested, error = %format!("{:#}", first_error), "Default model failed to load");
            return Err(IngestError::ResourceLoadFatal {
                tier: requested,
                reason: format!("{:#}", first_error),
            });
        }

        warn!(
            requested = %requested,
            fallback = %self.default_tier,
            error = %format!("{:#}", first_error),
            "Model failed to load, falling back to default tier"
        );

        match self.load_tier(self.default_tier).await {
            Ok(model) => {
                info!(tier = %self.default_tier, "Fallback model loaded");
                Ok(LoadedModel {
                    model,
                    tier: self.default_tier,
                    attempts: 2,
                })
            }
            Err(e) => {
                error!(tier = %self.default_tier, error = %format!("{:#}", e), "Fallback model failed to load");
                Err(IngestError::ResourceLoadFatal {
                    tier: self.default_tier,
                    reason: format!("{:#} (after {} failed: {:#})", e, requested, first_error),
                })
            }
        }
    }

    async fn load_tier(&self, tier: ModelTier) -> anyhow::Result<L::Model> {
        let loader = Arc::clone(&self.loader);
        tokio::task::spawn_blocking(move || loader.load(tier))
            .await
            .context("Model load task panicked")?
    }
}
