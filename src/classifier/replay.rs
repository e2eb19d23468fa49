//! Replays recorded classifier output from a TOML file.
//!
//! ```toml
//! [[frames]]
//! results = [
//!     { label = "fist-UB-RHand", confidence = 0.92 },
//!     { label = "no-hand", confidence = 0.05 },
//! ]
//!
//! [[frames]]
//! delay_ms = 2500          # simulate a slow model
//! error = "model busy"     # or a failed inference
//! ```
//!
//! Each `classify` call consumes the next frame entry and wraps around.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::{Classifier, ClassifierError};
use crate::capture::Frame;
use crate::gesture::{rank_top_k, Classification, TOP_K};

#[derive(Debug, Deserialize, Default)]
pub struct ReplayFile {
    #[serde(default)]
    pub frames: Vec<ReplayFrame>,
}

/// One recorded classifier response.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub results: Vec<ReplayEntry>,
    /// Sleep this long before answering
    #[serde(default)]
    pub delay_ms: u64,
    /// Fail with this message instead of answering
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayEntry {
    pub label: String,
    pub confidence: f32,
}

#[derive(Debug)]
pub struct ReplayClassifier {
    frames: Vec<ReplayFrame>,
    next: usize,
}

impl ReplayClassifier {
    pub fn new(frames: Vec<ReplayFrame>) -> Self {
        Self { frames, next: 0 }
    }

    /// Parse a replay file from TOML text.
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ClassifierError> {
        let file: ReplayFile = toml::from_str(content).map_err(|e| ClassifierError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if file.frames.is_empty() {
            return Err(ClassifierError::Parse {
                path: path.to_path_buf(),
                message: "no [[frames]] entries".to_string(),
            });
        }
        Ok(Self::new(file.frames))
    }

    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        let content = std::fs::read_to_string(path).map_err(|e| ClassifierError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content, path)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl Classifier for ReplayClassifier {
    fn classify(&mut self, _frame: &Frame) -> Result<Vec<Classification>, ClassifierError> {
        if self.frames.is_empty() {
            return Ok(Vec::new());
        }
        let entry = &self.frames[self.next];
        self.next = (self.next + 1) % self.frames.len();

        if entry.delay_ms > 0 {
            std::thread::sleep(Duration::from_millis(entry.delay_ms));
        }
        if let Some(message) = &entry.error {
            return Err(ClassifierError::Inference(message.clone()));
        }

        let results = entry
            .results
            .iter()
            .map(|r| Classification::new(r.label.clone(), r.confidence))
            .collect();
        Ok(rank_top_k(results, TOP_K))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[frames]]
results = [
    { label = "no-hand", confidence = 0.05 },
    { label = "fist-UB-RHand", confidence = 0.92 },
    { label = "FIVE-UB-RHand", confidence = 0.02 },
    { label = "other", confidence = 0.01 },
]

[[frames]]
error = "model busy"

[[frames]]
"#;

    fn classifier() -> ReplayClassifier {
        ReplayClassifier::from_toml(SAMPLE, Path::new("replay.toml")).unwrap()
    }

    #[test]
    fn test_parses_frames() {
        assert_eq!(classifier().len(), 3);
    }

    #[test]
    fn test_results_are_ranked_and_truncated() {
        let mut c = classifier();
        let ranked = c.classify(&Frame::solid(1, 1, [0, 0, 0])).unwrap();
        assert_eq!(ranked.len(), TOP_K);
        assert_eq!(ranked[0].label, "fist-UB-RHand");
        assert_eq!(ranked[1].label, "no-hand");
    }

    #[test]
    fn test_error_entry_and_wraparound() {
        let mut c = classifier();
        let frame = Frame::solid(1, 1, [0, 0, 0]);
        c.classify(&frame).unwrap();
        assert!(matches!(
            c.classify(&frame),
            Err(ClassifierError::Inference(msg)) if msg == "model busy"
        ));
        assert!(c.classify(&frame).unwrap().is_empty());
        // Back to the first frame
        assert_eq!(c.classify(&frame).unwrap()[0].label, "fist-UB-RHand");
    }

    #[test]
    fn test_no_frames_is_parse_error() {
        let err = ReplayClassifier::from_toml("", Path::new("empty.toml")).unwrap_err();
        assert!(matches!(err, ClassifierError::Parse { .. }));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = ReplayClassifier::from_toml("[[frames]\n", Path::new("bad.toml")).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }
}
