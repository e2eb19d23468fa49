//! Display sinks for gesture outcomes.
//!
//! Outcomes are handed to a single display task through a channel, so the
//! sink itself never has to be shared between tasks.

use std::io::Write;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::gesture::Gesture;

/// Glyph shown before the first outcome arrives.
pub const PENDING_GLYPH: &str = "⏳";

/// Channel capacity between the recognizer and the display task.
const DISPLAY_CHANNEL_CAPACITY: usize = 8;

/// Renders outcomes. No state, no validation.
pub trait DisplaySink: Send + 'static {
    /// Called once before the first outcome.
    fn show_pending(&mut self) {}

    fn show(&mut self, gesture: Gesture);
}

/// Writes one glyph per line to a terminal (or any writer).
pub struct TerminalDisplay<W: Write + Send + 'static> {
    out: W,
    show_label: bool,
}

impl TerminalDisplay<std::io::Stdout> {
    pub fn stdout(show_label: bool) -> Self {
        Self::new(std::io::stdout(), show_label)
    }
}

impl<W: Write + Send + 'static> TerminalDisplay<W> {
    pub fn new(out: W, show_label: bool) -> Self {
        Self { out, show_label }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            log::warn!("Failed to write to display: {}", e);
        }
    }
}

impl<W: Write + Send + 'static> DisplaySink for TerminalDisplay<W> {
    fn show_pending(&mut self) {
        self.write_line(PENDING_GLYPH);
    }

    fn show(&mut self, gesture: Gesture) {
        let line = if self.show_label {
            format!("{} {}", gesture.glyph(), gesture)
        } else {
            gesture.glyph().to_string()
        };
        self.write_line(&line);
    }
}

/// Run `sink` on its own task. Outcomes sent on the returned channel are shown
/// in order; the task exits once every sender is dropped and returns the sink.
pub fn spawn_display<S: DisplaySink>(mut sink: S) -> (mpsc::Sender<Gesture>, JoinHandle<S>) {
    let (tx, mut rx) = mpsc::channel::<Gesture>(DISPLAY_CHANNEL_CAPACITY);
    let handle = tokio::spawn(async move {
        sink.show_pending();
        while let Some(gesture) = rx.recv().await {
            log::debug!("Display: {}", gesture);
            sink.show(gesture);
        }
        sink
    });
    (tx, handle)
}
