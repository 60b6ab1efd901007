// src/detector.rs
use image::DynamicImage;

use crate::error::Result;
use crate::landmarks::LandmarkSet;

/// The three landmark streams feeding the recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectorKind {
    Hands,
    Pose,
    Face,
}

impl DetectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::Hands => "hands",
            DetectorKind::Pose => "pose",
            DetectorKind::Face => "face",
        }
    }
}

/// One detector callback's payload: the landmark set plus the source frame
/// geometry and timing needed downstream.
#[derive(Debug, Clone)]
pub struct LandmarkFrame {
    pub kind: DetectorKind,
    pub landmarks: LandmarkSet,
    pub image_width: u32,
    pub image_height: u32,
    pub timestamp_ms: i64,
}

/// Message every detector backend delivers over its result channel, one
/// independent stream per detector.
#[derive(Debug, Clone)]
pub enum DetectorEvent {
    Result(LandmarkFrame),
    Failure { kind: DetectorKind, message: String },
}

/// A live-stream landmark backend. Implementations process frames in
/// submission order and deliver results asynchronously over the event
/// channel handed to them at construction. Inter-detector ordering is
/// unspecified.
pub trait Landmarker: Send {
    fn kind(&self) -> DetectorKind;
    fn submit_frame(&mut self, frame: &DynamicImage, timestamp_ms: i64) -> Result<()>;
}

/// Single-slot holder of the most recent result from one detector,
/// carrying the source frame geometry alongside the landmarks. Replaced
/// wholesale on every update; the version only grows.
#[derive(Debug, Default)]
pub struct SourceCell {
    landmarks: LandmarkSet,
    image_width: u32,
    image_height: u32,
    version: u64,
    timestamp_ms: i64,
}

impl SourceCell {
    pub fn update(&mut self, frame: LandmarkFrame) {
        self.landmarks = frame.landmarks;
        self.image_width = frame.image_width;
        self.image_height = frame.image_height;
        self.timestamp_ms = frame.timestamp_ms;
        self.version += 1;
    }

    /// Empties the slot after a detector failure; the stream contributes
    /// zero blocks until it recovers.
    pub fn clear(&mut self) {
        self.landmarks = LandmarkSet::default();
        self.version += 1;
    }

    pub fn landmarks(&self) -> &LandmarkSet {
        &self.landmarks
    }

    /// Source frame geometry of the held result, (width, height) pixels.
    pub fn image_size(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    pub fn has_value(&self) -> bool {
        !self.landmarks.is_empty()
    }

    /// True when this slot's result lags `newest_ms` by more than the
    /// tolerance. A tolerance of zero disables the check.
    pub fn is_stale(&self, newest_ms: i64, tolerance_ms: i64) -> bool {
        tolerance_ms > 0 && self.has_value() && newest_ms - self.timestamp_ms > tolerance_ms
    }
}
