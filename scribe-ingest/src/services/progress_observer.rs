//! Time-based progress estimation around a blocking model load
//!
//! The load reports nothing while it runs, so progress is simulated from
//! elapsed time: `min(0.95, elapsed / estimated_total)` on every tick.
//!
//! **Guarantees per session:**
//! - a first sample (0.01) is emitted synchronously by `start()`
//! - samples never decrease
//! - `stop()` emits exactly one final 1.0, and nothing is emitted after it
//!
//! State machine: `Idle → Running → Stopped`.

use scribe_common::ProgressEvent;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// First sample of every session
pub const INITIAL_FRACTION: f64 = 0.01;
/// Highest value the estimator reports before the load completes
pub const ESTIMATE_CEILING: f64 = 0.95;
/// Bounded wait for the background task on `stop()`
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Destination for progress events
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: &ProgressEvent);
}

/// Writes one JSON line per event to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrProgressSink;

impl ProgressSink for StderrProgressSink {
    fn emit(&self, event: &ProgressEvent) {
        match event.to_line() {
            Ok(line) => {
                let mut stderr = std::io::stderr().lock();
                if let Err(e) = writeln!(stderr, "{}", line).and_then(|_| stderr.flush()) {
                    debug!(error = %e, "Failed to write progress line");
                }
            }
            Err(e) => warn!(error = %e, "Failed to encode progress event"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverState {
    Idle,
    Running,
    Stopped,
}

struct EmitterState {
    last: f64,
    closed: bool,
}

/// Serializes emission so samples stay ordered and end with a single 1.0
struct Emitter {
    sink: Arc<dyn ProgressSink>,
    state: Mutex<EmitterState>,
}

impl Emitter {
    fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            sink,
            state: Mutex::new(EmitterState {
                last: 0.0,
                closed: false,
            }),
        }
    }

    /// Emit an intermediate sample; false once the session is closed
    fn emit(&self, fraction: f64) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if state.closed {
            return false;
        }
        let fraction = fraction.min(ESTIMATE_CEILING).max(state.last);
        state.last = fraction;
        self.sink.emit(&ProgressEvent::model_loading(fraction));
        true
    }

    /// Emit the final 1.0 unless already done
    fn finish(&self) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if state.closed {
            return;
        }
        state.closed = true;
        state.last = 1.0;
        self.sink.emit(&ProgressEvent::model_loading(1.0));
    }
}

/// Background progress reporter for one load session
pub struct ProgressObserver {
    emitter: Arc<Emitter>,
    estimated_total: Duration,
    interval: Duration,
    state: ObserverState,
    started_at: Option<Instant>,
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
}

impl ProgressObserver {
    pub fn new(sink: Arc<dyn ProgressSink>, estimated_total: Duration, interval: Duration) -> Self {
        Self {
            emitter: Arc::new(Emitter::new(sink)),
            estimated_total: estimated_total.max(Duration::from_millis(1)),
            interval: interval.max(Duration::from_millis(1)),
            state: ObserverState::Idle,
            started_at: None,
            cancel: CancellationToken::new(),
            worker: None,
        }
    }

    pub fn state(&self) -> ObserverState {
        self.state
    }

    /// Time since `start()`, zero before it
    pub fn elapsed(&self) -> Duration {
        self.started_at.map(|t| t.elapsed()).unwrap_or_default()
    }

    /// Emit the first sample and launch the ticker
    ///
    /// Must be called from within a tokio runtime. Calling it again is a
    /// no-op.
    pub fn start(&mut self) {
        if self.state != ObserverState::Idle {
            warn!(state = ?self.state, "Progress observer already started");
            return;
        }

        let started_at = Instant::now();
        self.started_at = Some(started_at);
        self.state = ObserverState::Running;
        self.emitter.emit(INITIAL_FRACTION);

        let emitter = Arc::clone(&self.emitter);
        let cancel = self.cancel.clone();
        let estimated_total = self.estimated_total;
        let interval = self.interval;

        self.worker = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(started_at + interval, interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let fraction = started_at.elapsed().as_secs_f64() / estimated_total.as_secs_f64();
                        if !emitter.emit(fraction) {
                            break;
                        }
                    }
                }
            }
            debug!("Progress ticker exited");
        }));

        debug!(
            estimated_total_ms = estimated_total.as_millis() as u64,
            interval_ms = interval.as_millis() as u64,
            "Progress observer started"
        );
    }

    /// Stop the ticker and emit the final 1.0
    ///
    /// The ticker gets at most `JOIN_TIMEOUT` to exit before it is aborted.
    /// Only the first call emits.
    pub async fn stop(&mut self) {
        if self.state == ObserverState::Stopped {
            return;
        }

        self.cancel.cancel();
        if let Some(mut worker) = self.worker.take() {
            if tokio::time::timeout(JOIN_TIMEOUT, &mut worker).await.is_err() {
                warn!("Progress ticker did not exit in time, aborting");
                worker.abort();
            }
        }

        self.state = ObserverState::Stopped;
        self.emitter.finish();
        debug!(elapsed_ms = self.elapsed().as_millis() as u64, "Progress observer stopped");
    }
}

impl Drop for ProgressObserver {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
