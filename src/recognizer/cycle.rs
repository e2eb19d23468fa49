//! One capture → classify → map → deliver iteration.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::capture::{CaptureError, FrameFilter, FrameSource};
use crate::classifier::{Classifier, ClassifierError};
use crate::gesture::{Classification, Gesture, LabelTable};

/// What happened in one cycle. Only `Delivered` reaches the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleReport {
    /// An outcome was computed and handed to the display channel
    Delivered(Gesture),
    /// The classifier returned no entries
    NoResult,
    /// Capture + classify didn't finish within the timeout
    TimedOut,
    CaptureFailed,
    ClassifyFailed,
    /// The previous cycle's work is still running; nothing was started
    Busy,
}

#[derive(Debug)]
enum WorkError {
    Capture(CaptureError),
    Classify(ClassifierError),
}

type WorkResult = Result<Vec<Classification>, WorkError>;

/// Owns the source/classifier pair and the outstanding blocking job, if any.
pub(crate) struct CycleRunner<S, C> {
    source: Arc<Mutex<S>>,
    classifier: Arc<Mutex<C>>,
    filter: Option<FrameFilter>,
    table: LabelTable,
    timeout: Duration,
    results: mpsc::Sender<Gesture>,
    pending: Option<JoinHandle<WorkResult>>,
}

impl<S: FrameSource, C: Classifier> CycleRunner<S, C> {
    pub(crate) fn new(
        source: S,
        classifier: C,
        filter: Option<FrameFilter>,
        table: LabelTable,
        timeout: Duration,
        results: mpsc::Sender<Gesture>,
    ) -> Self {
        Self {
            source: Arc::new(Mutex::new(source)),
            classifier: Arc::new(Mutex::new(classifier)),
            filter,
            table,
            timeout,
            results,
            pending: None,
        }
    }

    pub(crate) async fn run_cycle(&mut self) -> CycleReport {
        // A timed-out job keeps running on the blocking pool. Don't start a
        // second one on top of it.
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                log::warn!("Previous capture/classify still running, skipping cycle");
                self.pending = Some(handle);
                return CycleReport::Busy;
            }
            log::debug!("Discarding late result from a timed-out cycle");
        }

        let source = Arc::clone(&self.source);
        let classifier = Arc::clone(&self.classifier);
        let filter = self.filter;
        let mut handle = tokio::task::spawn_blocking(move || {
            capture_and_classify(&source, &classifier, filter.as_ref())
        });

        let outcome = match tokio::time::timeout(self.timeout, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                log::warn!("Capture/classify timed out after {:?}", self.timeout);
                self.pending = Some(handle);
                return CycleReport::TimedOut;
            }
        };

        let ranked = match outcome {
            Ok(Ok(ranked)) => ranked,
            Ok(Err(WorkError::Capture(e))) => {
                log::warn!("Capture failed: {}", e);
                return CycleReport::CaptureFailed;
            }
            Ok(Err(WorkError::Classify(e))) => {
                log::warn!("Classification failed: {}", e);
                return CycleReport::ClassifyFailed;
            }
            Err(e) => {
                log::error!("Capture/classify task panicked: {}", e);
                return CycleReport::ClassifyFailed;
            }
        };

        for entry in &ranked {
            log::debug!("  {}", entry);
        }

        let Some(gesture) = self.table.decide(&ranked) else {
            log::warn!("Classifier returned no results");
            return CycleReport::NoResult;
        };

        // The display only ever shows the newest glyph, so a backed-up sink
        // loses outcomes rather than stalling the loop.
        match self.results.try_send(gesture) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                log::warn!("Display is falling behind, dropping outcome {}", gesture);
            }
            Err(TrySendError::Closed(_)) => {
                log::debug!("Display closed, dropping outcome {}", gesture);
            }
        }
        CycleReport::Delivered(gesture)
    }
}

fn capture_and_classify<S: FrameSource, C: Classifier>(
    source: &Mutex<S>,
    classifier: &Mutex<C>,
    filter: Option<&FrameFilter>,
) -> WorkResult {
    let frame = lock(source).capture(filter).map_err(WorkError::Capture)?;
    lock(classifier).classify(&frame).map_err(WorkError::Classify)
}

/// A panic inside a previous job poisons the lock; the data is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
