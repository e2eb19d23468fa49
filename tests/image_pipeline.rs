//! End-to-end: images on disk → replayed classifier → terminal display.

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gesture_loop::capture::{FrameFilter, ImageSequenceSource};
use gesture_loop::classifier::ReplayClassifier;
use gesture_loop::display::{spawn_display, TerminalDisplay};
use gesture_loop::gesture::{Gesture, LabelTable};
use gesture_loop::recognizer::{CycleReport, GestureRecognizer, RecognizerSettings};
use tempfile::TempDir;

const REPLAY: &str = r#"
[[frames]]
results = [
    { label = "fist-UB-RHand", confidence = 0.92 },
    { label = "no-hand", confidence = 0.05 },
    { label = "FIVE-UB-RHand", confidence = 0.03 },
]

[[frames]]
error = "inference failed"

[[frames]]
results = [{ label = "FIVE-UB-RHand", confidence = 0.81 }]

[[frames]]
results = [
    { label = "no-hand", confidence = 0.40 },
    { label = "fist-UB-RHand", confidence = 0.30 },
]
"#;

/// Cloneable writer so the test can read what the display printed.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

fn write_frames(dir: &Path, count: usize) {
    for i in 0..count {
        let img = image::RgbImage::from_pixel(8, 6, image::Rgb([40 * i as u8, 120, 200]));
        img.save(dir.join(format!("frame_{:02}.png", i))).unwrap();
    }
}

#[tokio::test]
async fn test_replayed_cycles_render_glyphs() {
    let dir = TempDir::new().unwrap();
    write_frames(dir.path(), 2);

    let source = ImageSequenceSource::from_dir(dir.path()).unwrap();
    let classifier = ReplayClassifier::from_toml(REPLAY, Path::new("replay.toml")).unwrap();
    let settings = RecognizerSettings {
        delay: Duration::from_millis(5),
        timeout: Duration::from_secs(2),
        filter: Some(FrameFilter::Saturation(1.0)),
        table: LabelTable::default(),
    };

    let buffer = SharedBuffer::default();
    let (results, display) = spawn_display(TerminalDisplay::new(buffer.clone(), false));
    let recognizer = GestureRecognizer::new(source, classifier, settings, results);

    let mut reports = Vec::new();
    for _ in 0..4 {
        reports.push(recognizer.run_cycle().await);
    }
    assert_eq!(
        reports,
        vec![
            CycleReport::Delivered(Gesture::Fist),
            CycleReport::ClassifyFailed,
            CycleReport::Delivered(Gesture::OpenHand),
            CycleReport::Delivered(Gesture::Empty),
        ]
    );

    drop(recognizer);
    display.await.unwrap();

    // The failed cycle leaves no trace: the fist stays up until the open hand.
    assert_eq!(buffer.text(), "⏳\n👊\n🖐\n❎\n");
}

#[tokio::test]
async fn test_missing_image_is_capture_failure() {
    let dir = TempDir::new().unwrap();
    write_frames(dir.path(), 1);
    let path = dir.path().join("frame_00.png");

    let source = ImageSequenceSource::open(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let classifier = ReplayClassifier::from_toml(REPLAY, Path::new("replay.toml")).unwrap();
    let (results, _display) = spawn_display(TerminalDisplay::new(SharedBuffer::default(), false));
    let recognizer =
        GestureRecognizer::new(source, classifier, RecognizerSettings::default(), results);

    assert_eq!(recognizer.run_cycle().await, CycleReport::CaptureFailed);
}
