//! Model input/output helpers that don't depend on a runtime.

use crate::capture::Frame;
use crate::gesture::{rank_top_k, Classification, TOP_K};

use super::ClassifierError;

/// Center-crop the frame to a square and scale it to `size`×`size`.
///
/// Returns planar CHW floats in 0.0..=1.0 (R plane, then G, then B), the layout
/// image classifiers exported from common training tools expect.
/// Sampling is nearest-neighbour.
pub fn center_crop_chw(frame: &Frame, size: u32) -> Vec<f32> {
    let side = frame.width.min(frame.height);
    let plane = size as usize * size as usize;
    if side == 0 {
        return vec![0.0; plane * 3];
    }
    let x0 = (frame.width - side) / 2;
    let y0 = (frame.height - side) / 2;
    let scale = side as f32 / size as f32;

    let mut out = vec![0.0f32; plane * 3];
    for y in 0..size {
        let src_y = y0 + ((y as f32 + 0.5) * scale) as u32;
        let src_y = src_y.min(y0 + side - 1);
        for x in 0..size {
            let src_x = x0 + ((x as f32 + 0.5) * scale) as u32;
            let src_x = src_x.min(x0 + side - 1);
            let [r, g, b] = frame.pixel(src_x, src_y);
            let idx = y as usize * size as usize + x as usize;
            out[idx] = r as f32 / 255.0;
            out[plane + idx] = g as f32 / 255.0;
            out[2 * plane + idx] = b as f32 / 255.0;
        }
    }
    out
}

/// True if `scores` already look like probabilities (each in 0..=1, summing to ~1).
pub fn is_probability_distribution(scores: &[f32]) -> bool {
    if scores.is_empty() {
        return false;
    }
    let in_range = scores.iter().all(|s| (0.0..=1.0).contains(s));
    let sum: f32 = scores.iter().sum();
    in_range && (sum - 1.0).abs() < 1e-3
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![0.0; logits.len()];
    }
    exps.into_iter().map(|v| v / sum).collect()
}

/// Pair raw model scores with labels and keep the ranked top entries.
pub fn rank_scores(labels: &[String], scores: &[f32]) -> Result<Vec<Classification>, ClassifierError> {
    if labels.len() != scores.len() {
        return Err(ClassifierError::LabelMismatch {
            scores: scores.len(),
            labels: labels.len(),
        });
    }
    let probs = if is_probability_distribution(scores) {
        scores.to_vec()
    } else {
        softmax(scores)
    };
    let pairs = labels
        .iter()
        .zip(probs)
        .map(|(label, p)| Classification::new(label.clone(), p))
        .collect();
    Ok(rank_top_k(pairs, TOP_K))
}
