//! Image classification backends.
//!
//! A [`Classifier`] takes one frame and returns the top-ranked
//! `(label, confidence)` pairs, best first, at most [`TOP_K`](crate::gesture::TOP_K).
//!
//! Backends:
//! - [`ReplayClassifier`]: recorded results from a TOML file
//! - `OnnxClassifier` (feature `onnx`): ONNX Runtime model

#[cfg(feature = "onnx")]
mod onnx;
pub mod preprocess;
mod replay;

use std::path::PathBuf;

use crate::capture::Frame;
use crate::gesture::Classification;

#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;
pub use replay::{ReplayClassifier, ReplayFile, ReplayFrame};

/// Square input side used by the hand model when none is configured.
pub const DEFAULT_INPUT_SIZE: u32 = 227;

/// Largest square input the preprocessing accepts.
pub const MAX_INPUT_SIZE: u32 = 4096;

/// Runs a frame through a fixed, pre-loaded model.
///
/// `classify` may block for as long as inference takes. The recognizer calls
/// it from the blocking pool, one frame at a time.
pub trait Classifier: Send + 'static {
    /// Rank the frame against the model's labels, best first.
    fn classify(&mut self, frame: &Frame) -> Result<Vec<Classification>, ClassifierError>;
}

impl Classifier for Box<dyn Classifier> {
    fn classify(&mut self, frame: &Frame) -> Result<Vec<Classification>, ClassifierError> {
        (**self).classify(frame)
    }
}

/// Errors that can occur while loading or running a classifier.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Labels file {0} contains no labels")]
    NoLabels(PathBuf),

    #[error("Model produced {scores} scores but {labels} labels are configured")]
    LabelMismatch { scores: usize, labels: usize },

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Read a newline-separated labels file. Blank lines and `#` comments are skipped.
pub fn load_labels(path: &std::path::Path) -> Result<Vec<String>, ClassifierError> {
    let content = std::fs::read_to_string(path).map_err(|e| ClassifierError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let labels: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect();
    if labels.is_empty() {
        return Err(ClassifierError::NoLabels(path.to_path_buf()));
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_labels_skips_blank_and_comments() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labels.txt");
        std::fs::write(&path, "# hand model\nfist-UB-RHand\n\n  FIVE-UB-RHand \nno-hand\n").unwrap();

        let labels = load_labels(&path).unwrap();
        assert_eq!(labels, vec!["fist-UB-RHand", "FIVE-UB-RHand", "no-hand"]);
    }

    #[test]
    fn test_load_labels_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("labels.txt");
        std::fs::write(&path, "\n# nothing\n").unwrap();
        assert!(matches!(load_labels(&path), Err(ClassifierError::NoLabels(_))));
    }

    #[test]
    fn test_label_mismatch_display() {
        let err = ClassifierError::LabelMismatch {
            scores: 4,
            labels: 3,
        };
        assert_eq!(
            err.to_string(),
            "Model produced 4 scores but 3 labels are configured"
        );
    }
}
