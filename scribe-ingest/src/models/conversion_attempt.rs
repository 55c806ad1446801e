//! Record of one conversion strategy run
//!
//! Attempts are logged as they finish and never persisted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// How a strategy run ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Produced a non-empty file
    Success { path: PathBuf, bytes: u64 },
    /// Returned an error or produced an unusable file
    Failure { reason: String },
    /// Exceeded its wall-clock budget
    TimedOut,
}

/// One strategy run inside a conversion chain
#[derive(Debug, Clone, Serialize)]
pub struct ConversionAttempt {
    pub strategy_name: String,
    pub started_at: DateTime<Utc>,
    pub timeout_seconds: Option<u64>,
    pub outcome: AttemptOutcome,
}

impl ConversionAttempt {
    pub fn new(
        strategy_name: &str,
        started_at: DateTime<Utc>,
        timeout: Option<Duration>,
        outcome: AttemptOutcome,
    ) -> Self {
        Self {
            strategy_name: strategy_name.to_string(),
            started_at,
            timeout_seconds: timeout.map(|t| t.as_secs()),
            outcome,
        }
    }

    /// Milliseconds between start and now
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }

    /// Emit the attempt as a structured log event
    pub fn log(&self) {
        let elapsed_ms = self.elapsed_ms();
        match &self.outcome {
            AttemptOutcome::Success { path, bytes } => info!(
                strategy = %self.strategy_name,
                path = %path.display(),
                bytes,
                elapsed_ms,
                "Conversion strategy succeeded"
            ),
            AttemptOutcome::Failure { reason } => warn!(
                strategy = %self.strategy_name,
                elapsed_ms,
                reason = %reason,
                "Conversion strategy failed"
            ),
            AttemptOutcome::TimedOut => warn!(
                strategy = %self.strategy_name,
                timeout_seconds = ?self.timeout_seconds,
                "Conversion strategy timed out"
            ),
        }
    }
}
