// src/classifier.rs
use tracing::debug;

use crate::error::{RecognizerError, Result};
use crate::landmarks::FRAME_FEATURE_LEN;

/// Outcome of one window inference: the winning label index and its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub index: usize,
    pub score: f32,
}

/// A sequence model scoring a full window of frame feature vectors,
/// oldest frame first, into one probability per label in label-set order.
/// Synchronous and CPU bound; called from the recognition worker.
pub trait SequenceClassifier {
    fn name(&self) -> &str;
    fn num_labels(&self) -> usize;
    fn infer(&mut self, window: &[&[f32]]) -> Result<Vec<f32>>;
}

/// Index of the highest score; ties go to the first occurrence.
pub fn argmax(scores: &[f32]) -> Option<Prediction> {
    let mut best: Option<Prediction> = None;
    for (index, &score) in scores.iter().enumerate() {
        match best {
            Some(current) if score <= current.score => {}
            _ => best = Some(Prediction { index, score }),
        }
    }
    best
}

/// Simulation-grade stand-in for a trained sequence model. Each label owns
/// a template vector; a window is scored by the distance between its mean
/// frame and each template, sharpened into a probability distribution.
pub struct CentroidClassifier {
    templates: Vec<Vec<f32>>,
    contrast: f32,
}

impl CentroidClassifier {
    /// One pseudo-random template per label, deterministic for a seed.
    pub fn seeded(num_labels: usize, seed: u64) -> Self {
        let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(1);
        let templates = (0..num_labels)
            .map(|_| {
                (0..FRAME_FEATURE_LEN)
                    .map(|_| next_unit(&mut state))
                    .collect()
            })
            .collect();
        Self {
            templates,
            contrast: 400.0,
        }
    }

    /// Explicit templates, one per label. `contrast` scales distances
    /// before normalization; larger values sharpen the distribution.
    pub fn with_templates(templates: Vec<Vec<f32>>, contrast: f32) -> Self {
        Self {
            templates,
            contrast,
        }
    }
}

impl SequenceClassifier for CentroidClassifier {
    fn name(&self) -> &str {
        "centroid"
    }

    fn num_labels(&self) -> usize {
        self.templates.len()
    }

    fn infer(&mut self, window: &[&[f32]]) -> Result<Vec<f32>> {
        if self.templates.is_empty() {
            return Err(RecognizerError::Inference("no label templates".into()));
        }
        let dims = self.templates[0].len();

        let mut mean = vec![0.0f32; dims];
        for frame in window {
            for (slot, &value) in mean.iter_mut().zip(frame.iter()) {
                *slot += value;
            }
        }
        if !window.is_empty() {
            let count = window.len() as f32;
            for slot in &mut mean {
                *slot /= count;
            }
        }

        let distances: Vec<f32> = self
            .templates
            .iter()
            .map(|template| {
                template
                    .iter()
                    .zip(&mean)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f32>()
                    / dims as f32
            })
            .collect();

        // Shift by the minimum distance so the winner maps to exp(0).
        let nearest = distances.iter().cloned().fold(f32::INFINITY, f32::min);
        let weights: Vec<f32> = distances
            .iter()
            .map(|d| (-(d - nearest) * self.contrast).exp())
            .collect();
        let total: f32 = weights.iter().sum();
        let scores: Vec<f32> = weights.iter().map(|w| w / total).collect();
        debug!(labels = scores.len(), frames = window.len(), "scored window");
        Ok(scores)
    }
}

fn next_unit(state: &mut u64) -> f32 {
    // xorshift64*
    *state ^= *state >> 12;
    *state ^= *state << 25;
    *state ^= *state >> 27;
    let bits = state.wrapping_mul(0x2545_F491_4F6C_DD1D);
    ((bits >> 40) as f32) / ((1u64 << 24) as f32)
}
