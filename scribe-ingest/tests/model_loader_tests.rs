//! Model loading with tier fallback
//!
//! Attempt ordering, the fatal cases and the progress stream each load
//! produces.

mod helpers;

use helpers::doubles::{FakeTranscriber, RecordingSink, ScriptedLoader};
use scribe_ingest::services::ResourceLoadFallback;
use scribe_ingest::{IngestError, ModelTier};
use std::sync::Arc;
use std::time::Duration;

fn fallback(loader: ScriptedLoader, sink: &Arc<RecordingSink>) -> ResourceLoadFallback<ScriptedLoader> {
    ResourceLoadFallback::new(
        loader,
        ModelTier::FALLBACK_DEFAULT,
        sink.clone(),
        Duration::from_millis(500),
        Duration::from_millis(20),
    )
}

fn terminal_samples(sink: &RecordingSink) -> usize {
    sink.fractions().iter().filter(|f| **f == 1.0).count()
}

#[tokio::test]
async fn test_requested_tier_loads() {
    let sink = Arc::new(RecordingSink::default());
    let loader = ScriptedLoader::new(FakeTranscriber::returning("ok", Vec::new()));
    let attempts = loader.attempts();

    let loaded = fallback(loader, &sink).load(ModelTier::Medium).await.unwrap();

    assert_eq!(loaded.tier, ModelTier::Medium);
    assert_eq!(loaded.attempts, 1);
    assert_eq!(*attempts.lock().unwrap(), vec![ModelTier::Medium]);
    assert_eq!(terminal_samples(&sink), 1);
}

#[tokio::test]
async fn test_failed_tier_falls_back_to_default() {
    let sink = Arc::new(RecordingSink::default());
    let loader = ScriptedLoader::new(FakeTranscriber::returning("ok", Vec::new()))
        .failing(ModelTier::Medium);
    let attempts = loader.attempts();

    let loaded = fallback(loader, &sink).load(ModelTier::Medium).await.unwrap();

    assert_eq!(loaded.tier, ModelTier::Base);
    assert_eq!(loaded.attempts, 2);
    assert_eq!(*attempts.lock().unwrap(), vec![ModelTier::Medium, ModelTier::Base]);

    let fractions = sink.fractions();
    assert_eq!(terminal_samples(&sink), 1);
    assert_eq!(*fractions.last().unwrap(), 1.0);
}

#[tokio::test]
async fn test_default_tier_failure_is_fatal_without_retry() {
    let sink = Arc::new(RecordingSink::default());
    let loader = ScriptedLoader::new(FakeTranscriber::returning("ok", Vec::new()))
        .failing(ModelTier::Base);
    let attempts = loader.attempts();

    let err = fallback(loader, &sink).load(ModelTier::Base).await.unwrap_err();

    assert!(matches!(err, IngestError::ResourceLoadFatal { tier: ModelTier::Base, .. }));
    assert_eq!(err.stage(), "model_load");
    assert_eq!(*attempts.lock().unwrap(), vec![ModelTier::Base]);
    assert_eq!(terminal_samples(&sink), 1);
}

#[tokio::test]
async fn test_both_tiers_failing_is_fatal() {
    let sink = Arc::new(RecordingSink::default());
    let loader = ScriptedLoader::new(FakeTranscriber::returning("ok", Vec::new()))
        .failing(ModelTier::Large)
        .failing(ModelTier::Base);
    let attempts = loader.attempts();

    let err = fallback(loader, &sink).load(ModelTier::Large).await.unwrap_err();

    match err {
        IngestError::ResourceLoadFatal { tier, reason } => {
            assert_eq!(tier, ModelTier::Base);
            assert!(reason.contains("large"));
        }
        other => panic!("Expected ResourceLoadFatal, got {:?}", other),
    }
    assert_eq!(attempts.lock().unwrap().len(), 2);
    assert_eq!(terminal_samples(&sink), 1);
}

#[tokio::test]
async fn test_slow_load_reports_intermediate_progress() {
    let sink = Arc::new(RecordingSink::default());
    let loader = ScriptedLoader::new(FakeTranscriber::returning("ok", Vec::new()))
        .with_load_delay(Duration::from_millis(200));

    fallback(loader, &sink).load(ModelTier::Small).await.unwrap();

    let fractions = sink.fractions();
    assert!(fractions.len() > 3, "expected ticks during load: {:?}", fractions);
    assert!(fractions[0] > 0.0 && fractions[0] < 0.1);
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(terminal_samples(&sink), 1);
}
