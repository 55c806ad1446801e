//! scribe-ingest - transcribe one audio file
//!
//! Validates, repairs or converts the input to mono 16 kHz PCM16, loads the
//! recognizer while streaming progress JSON on stderr, and prints the
//! transcript (and optionally SRT subtitles) between sentinel lines on stdout.
//!
//! Exit codes: 0 on success, 1 on any pipeline failure, 2 on usage errors.

use anyhow::Context;
use clap::Parser;
use scribe_common::config::LoggingConfig;
use scribe_ingest::services::{StderrProgressSink, WhisperCliLoader};
use scribe_ingest::{IngestConfig, ModelTier, TranscriptionOrchestrator, TranscriptionRequest};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing::{error, info, info_span, Instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Command-line arguments for scribe-ingest
#[derive(Parser, Debug)]
#[command(name = "scribe-ingest")]
#[command(about = "Transcribe an audio file, repairing or converting it as needed")]
#[command(version)]
struct Args {
    /// Audio file to transcribe
    audio_file: PathBuf,

    /// Also emit SRT subtitles
    #[arg(long)]
    generate_srt: bool,

    /// Model size to load
    #[arg(long, value_enum, default_value_t = ModelTier::REQUESTED_DEFAULT)]
    model: ModelTier,

    /// Configuration file (overrides SCRIBE_CONFIG and discovered files)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = IngestConfig::load(args.config.as_deref());
    let logging = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    if let Err(e) = init_tracing(&logging) {
        eprintln!("Failed to initialize logging: {:#}", e);
        return ExitCode::FAILURE;
    }

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(stage = e.stage(), error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let run_id = Uuid::new_v4();
    let span = info_span!("run", %run_id);

    async move {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            git = env!("GIT_HASH"),
            built = env!("BUILD_TIMESTAMP"),
            profile = env!("BUILD_PROFILE"),
            "Starting scribe-ingest"
        );

        let loader = WhisperCliLoader::new(
            config.transcription.command.clone(),
            config.transcription.python.clone(),
            config.transcription.resolved_model_dir(),
        );
        let orchestrator =
            TranscriptionOrchestrator::new(&config, loader, Arc::new(StderrProgressSink));

        let request = TranscriptionRequest {
            audio_path: args.audio_file,
            tier: args.model,
            generate_srt: args.generate_srt,
        };

        let mut stdout = std::io::stdout();
        match orchestrator.run(&request, &mut stdout).await {
            Ok(outcome) => {
                info!(tier = %outcome.tier_used, "Transcription finished");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(stage = e.stage(), error = %e, "Transcription failed");
                ExitCode::FAILURE
            }
        }
    }
    .instrument(span)
    .await
}

/// Install the global subscriber: stderr by default, or the configured file
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "scribe_ingest={level},scribe_common={level}",
            level = logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false),
                )
                .try_init()?;
        }
        None => {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()?;
        }
    }

    Ok(())
}
