// src/lib.rs
//! Sign-language gesture recognition from streaming landmark detectors.
//!
//! Three detector streams (hands, pose, face) are fused into fixed-length
//! feature frames, collected into a sliding window, scored by a sequence
//! classifier, and stabilized into a short output sentence.

pub mod classifier;
pub mod config;
pub mod data;
pub mod detector;
pub mod engine;
pub mod error;
pub mod features;
pub mod landmarks;
pub mod output;
pub mod overlay;
pub mod sim;
pub mod stabilizer;
pub mod window;

pub use classifier::{CentroidClassifier, Prediction, SequenceClassifier};
pub use config::RecognizerConfig;
pub use engine::{EngineHandle, RecognitionEngine};
pub use error::{RecognizerError, Result};
