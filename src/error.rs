// src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecognizerError {
    #[error("feature vector length mismatch: got {got}, expected {expected}")]
    FeatureLength { got: usize, expected: usize },

    #[error("classifier returned {got} scores for {expected} labels")]
    ScoreLength { got: usize, expected: usize },

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("detector channel closed")]
    ChannelClosed,

    #[error("recognition worker panicked")]
    WorkerPanicked,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("export error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, RecognizerError>;
