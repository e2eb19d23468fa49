//! Repeating capture → classify → display loop.
//!
//! [`GestureRecognizer::start`] spawns a task that runs one cycle at a time:
//! grab a frame (through the optional pre-filter), classify it, map the top
//! label to a [`Gesture`] and send it to the display channel. Capture and
//! classify run together on the blocking pool under a single timeout. When
//! the timeout fires the job is left to finish on its own and its result is
//! thrown away. Whatever happens, the next cycle starts after a fixed delay.
//!
//! Failures never leave the loop. They are logged and the display keeps
//! showing the previous outcome.

mod cycle;
mod stats;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use crate::capture::{FrameFilter, FrameSource};
use crate::classifier::Classifier;
use crate::gesture::{Gesture, LabelTable};

use self::cycle::CycleRunner;
pub use self::cycle::CycleReport;
pub use self::stats::{LoopStats, StatsSnapshot};

/// Pause between the end of one cycle and the start of the next.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

/// Upper bound on capture + classify for one cycle.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Loop timing, pre-filter and decision table.
#[derive(Debug, Clone)]
pub struct RecognizerSettings {
    pub delay: Duration,
    pub timeout: Duration,
    pub filter: Option<FrameFilter>,
    pub table: LabelTable,
}

impl Default for RecognizerSettings {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            timeout: DEFAULT_TIMEOUT,
            filter: Some(FrameFilter::Saturation(1.0)),
            table: LabelTable::default(),
        }
    }
}

/// Errors from controlling the loop.
#[derive(Debug, thiserror::Error)]
pub enum RecognizerError {
    #[error("Recognizer is already running")]
    AlreadyRunning,

    #[error("Recognizer must be started from within a tokio runtime")]
    NoRuntime,
}

pub struct GestureRecognizer<S, C> {
    runner: Arc<Mutex<CycleRunner<S, C>>>,
    delay: Duration,
    stats: Arc<LoopStats>,
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl<S: FrameSource, C: Classifier> GestureRecognizer<S, C> {
    /// Outcomes are sent on `results`, typically the sender from
    /// [`spawn_display`](crate::display::spawn_display).
    pub fn new(
        source: S,
        classifier: C,
        settings: RecognizerSettings,
        results: mpsc::Sender<Gesture>,
    ) -> Self {
        let runner = CycleRunner::new(
            source,
            classifier,
            settings.filter,
            settings.table,
            settings.timeout,
            results,
        );
        let (stop_tx, _) = watch::channel(false);
        Self {
            runner: Arc::new(Mutex::new(runner)),
            delay: settings.delay,
            stats: Arc::new(LoopStats::default()),
            stop_tx,
            task: None,
        }
    }

    /// Begin cycling. Returns immediately.
    pub fn start(&mut self) -> Result<(), RecognizerError> {
        if self.is_running() {
            return Err(RecognizerError::AlreadyRunning);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| RecognizerError::NoRuntime)?;

        self.stop_tx.send_replace(false);
        let stop_rx = self.stop_tx.subscribe();
        let runner = Arc::clone(&self.runner);
        let stats = Arc::clone(&self.stats);
        let delay = self.delay;

        self.task = Some(runtime.spawn(run_loop(runner, stats, delay, stop_rx)));
        log::info!("Gesture recognizer started (delay {:?})", delay);
        Ok(())
    }

    /// Stop scheduling new cycles. A cycle already in progress finishes
    /// normally and may still deliver its outcome.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// Wait for the loop task to exit after [`stop`](Self::stop).
    pub async fn join(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::error!("Recognizer task failed: {}", e);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Run a single cycle now. Waits for a cycle already running in the loop.
    pub async fn run_cycle(&self) -> CycleReport {
        let report = self.runner.lock().await.run_cycle().await;
        self.stats.record(&report);
        report
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

async fn run_loop<S: FrameSource, C: Classifier>(
    runner: Arc<Mutex<CycleRunner<S, C>>>,
    stats: Arc<LoopStats>,
    delay: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        if *stop_rx.borrow_and_update() {
            break;
        }

        let report = runner.lock().await.run_cycle().await;
        stats.record(&report);
        log::debug!("Cycle finished: {:?}", report);

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            changed = stop_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    log::info!("Gesture recognizer stopped ({})", stats.snapshot());
}
