//! ONNX Runtime classifier.
//!
//! Expects a single-input image classification model taking a
//! `1×3×N×N` float tensor (RGB, 0..1) and producing one score per label.

use std::path::Path;

use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;

use super::preprocess::{center_crop_chw, rank_scores};
use super::{load_labels, Classifier, ClassifierError};
use crate::capture::Frame;
use crate::gesture::Classification;

pub struct OnnxClassifier {
    session: Session,
    labels: Vec<String>,
    input_size: u32,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("labels", &self.labels)
            .field("input_size", &self.input_size)
            .finish_non_exhaustive()
    }
}

impl OnnxClassifier {
    /// Load the model and its labels file.
    pub fn load(model_path: &Path, labels_path: &Path, input_size: u32) -> Result<Self, ClassifierError> {
        if !model_path.exists() {
            return Err(ClassifierError::ModelNotFound(model_path.to_path_buf()));
        }
        let labels = load_labels(labels_path)?;

        let session = Session::builder()
            .map_err(|e| ClassifierError::Inference(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ClassifierError::Inference(format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(2)
            .map_err(|e| ClassifierError::Inference(format!("Failed to set threads: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| {
                ClassifierError::Inference(format!(
                    "Failed to load model from {}: {}",
                    model_path.display(),
                    e
                ))
            })?;

        log::info!(
            "Loaded model {} ({} labels, {}x{} input)",
            model_path.display(),
            labels.len(),
            input_size,
            input_size
        );

        Ok(Self {
            session,
            labels,
            input_size,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&mut self, frame: &Frame) -> Result<Vec<Classification>, ClassifierError> {
        let size = self.input_size as usize;
        let input = center_crop_chw(frame, self.input_size);
        let array = Array4::from_shape_vec((1, 3, size, size), input)
            .map_err(|e| ClassifierError::Inference(format!("Failed to create input array: {}", e)))?;
        let tensor = Tensor::from_array(array)
            .map_err(|e| ClassifierError::Inference(format!("Failed to create tensor: {}", e)))?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        if outputs.len() == 0 {
            return Err(ClassifierError::Inference("model returned no outputs".to_string()));
        }
        let (_shape, scores) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Inference(format!("Failed to extract output: {}", e)))?;

        rank_scores(&self.labels, scores)
    }
}
