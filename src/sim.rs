// src/sim.rs
use std::sync::mpsc::{self, Sender, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::Utc;
use image::{DynamicImage, Rgb, RgbImage};
use nalgebra::Vector2;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::config::DetectorTuning;
use crate::detector::{DetectorEvent, DetectorKind, LandmarkFrame, Landmarker};
use crate::error::{RecognizerError, Result};
use crate::landmarks::{
    pose_landmark, LandmarkPoint, LandmarkSet, FACE_LANDMARK_COUNT, HAND_LANDMARK_COUNT,
    MAX_TRACKED_HANDS, POSE_LANDMARK_COUNT,
};

/// One frame off the synthetic capture device.
pub struct CapturedFrame {
    pub id: Uuid,
    pub image: DynamicImage,
    pub timestamp_ms: i64,
}

/// Stand-in for a camera. Produces a moving gradient so consecutive frames
/// differ, stamped with wall-clock capture time.
pub struct SyntheticFrameSource {
    width: u32,
    height: u32,
    frame_index: u64,
}

impl SyntheticFrameSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_index: 0,
        }
    }

    pub fn next_frame(&mut self) -> CapturedFrame {
        let tick = self.frame_index;
        self.frame_index += 1;
        let shade = (tick % 200) as u8;
        let image = RgbImage::from_fn(self.width, self.height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, shade])
        });

        let frame = CapturedFrame {
            id: Uuid::new_v4(),
            image: DynamicImage::ImageRgb8(image),
            timestamp_ms: Utc::now().timestamp_millis(),
        };
        trace!(frame = %frame.id, tick, "synthetic frame captured");
        frame
    }
}

struct FramePing {
    timestamp_ms: i64,
    width: u32,
    height: u32,
}

/// Asynchronous landmark detector backed by a synthesizer instead of a
/// vision model. Each instance runs its own worker thread; frame submission
/// never blocks, and a frame arriving while the worker is busy is dropped
/// so only the latest one is processed.
pub struct SimulatedLandmarker {
    kind: DetectorKind,
    feed: Option<SyncSender<FramePing>>,
    worker: Option<JoinHandle<()>>,
    dropped: u64,
}

impl SimulatedLandmarker {
    pub fn spawn(
        kind: DetectorKind,
        tuning: DetectorTuning,
        seed: u64,
        results: Sender<DetectorEvent>,
    ) -> Result<Self> {
        let (feed_tx, feed_rx) = mpsc::sync_channel::<FramePing>(1);
        let latency = Duration::from_millis(2 + seed % 5);

        let worker = thread::Builder::new()
            .name(format!("sim-{}", kind.as_str()))
            .spawn(move || {
                debug!(kind = kind.as_str(), ?tuning, "simulated landmarker online");
                let mut rng = SimRng::new(seed);
                let mut tick: u64 = 0;
                while let Ok(ping) = feed_rx.recv() {
                    thread::sleep(latency);
                    let landmarks = synthesize(kind, tick, &mut rng, &tuning);
                    tick += 1;
                    let event = DetectorEvent::Result(LandmarkFrame {
                        kind,
                        landmarks,
                        image_width: ping.width,
                        image_height: ping.height,
                        timestamp_ms: ping.timestamp_ms,
                    });
                    if results.send(event).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            kind,
            feed: Some(feed_tx),
            worker: Some(worker),
            dropped: 0,
        })
    }

    /// Frames skipped because the worker was still busy with an earlier one.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped
    }

    /// Stops accepting frames and waits for the worker to finish.
    pub fn shutdown(&mut self) -> Result<()> {
        self.feed.take();
        if let Some(worker) = self.worker.take() {
            worker.join().map_err(|_| RecognizerError::WorkerPanicked)?;
        }
        Ok(())
    }
}

impl Landmarker for SimulatedLandmarker {
    fn kind(&self) -> DetectorKind {
        self.kind
    }

    fn submit_frame(&mut self, frame: &DynamicImage, timestamp_ms: i64) -> Result<()> {
        let feed = self.feed.as_ref().ok_or(RecognizerError::ChannelClosed)?;
        let ping = FramePing {
            timestamp_ms,
            width: frame.width(),
            height: frame.height(),
        };
        match feed.try_send(ping) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                trace!(kind = self.kind.as_str(), "worker busy, frame dropped");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(RecognizerError::ChannelClosed),
        }
    }
}

impl Drop for SimulatedLandmarker {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn synthesize(kind: DetectorKind, tick: u64, rng: &mut SimRng, tuning: &DetectorTuning) -> LandmarkSet {
    let t = tick as f32 * 0.033;
    match kind {
        DetectorKind::Hands => synthesize_hands(t, rng, tuning.max_instances.min(MAX_TRACKED_HANDS)),
        DetectorKind::Pose => synthesize_pose(t, rng),
        DetectorKind::Face => synthesize_face(t, rng),
    }
}

fn synthesize_hands(t: f32, rng: &mut SimRng, max_hands: usize) -> LandmarkSet {
    // The signer's hands periodically leave the frame.
    if (t * 0.23).sin() < -0.85 {
        return LandmarkSet::default();
    }

    let mut instances = Vec::with_capacity(max_hands);
    for hand in 0..max_hands {
        let phase = hand as f32 * 1.5;
        let wrist = Vector2::new(
            0.35 + 0.3 * hand as f32 + 0.08 * (t * 0.5 + phase).cos(),
            0.6 + 0.1 * (t + phase).sin(),
        );

        let mut points = Vec::with_capacity(HAND_LANDMARK_COUNT);
        points.push(LandmarkPoint::new(wrist.x, wrist.y, 0.0));
        for finger in 0..5 {
            let spread = (finger as f32 - 2.0) * 0.025;
            for joint in 0..4 {
                let reach = 0.02 + joint as f32 * 0.018;
                points.push(LandmarkPoint::new(
                    wrist.x + spread + rng.jitter(0.004),
                    wrist.y - reach + rng.jitter(0.004),
                    -0.01 * joint as f32,
                ));
            }
        }
        instances.push(points);
    }
    LandmarkSet { instances }
}

fn synthesize_pose(t: f32, rng: &mut SimRng) -> LandmarkSet {
    let head = Vector2::new(0.5 + 0.01 * (t * 0.7).sin(), 0.22);
    let mut points = Vec::with_capacity(POSE_LANDMARK_COUNT);
    for i in 0..POSE_LANDMARK_COUNT {
        let drop = i as f32 / POSE_LANDMARK_COUNT as f32;
        points.push(LandmarkPoint::new(
            head.x + rng.jitter(0.02),
            head.y + drop * 0.6 + rng.jitter(0.02),
            0.0,
        ));
    }
    points[pose_landmark::LEFT_SHOULDER] = LandmarkPoint::new(0.3, 0.4, 0.0);
    points[pose_landmark::RIGHT_SHOULDER] = LandmarkPoint::new(0.7, 0.4, 0.0);
    points[pose_landmark::LEFT_ELBOW] = LandmarkPoint::new(0.35, 0.5 + 0.05 * t.sin(), 0.0);
    points[pose_landmark::RIGHT_ELBOW] =
        LandmarkPoint::new(0.65, 0.5 + 0.05 * (t + 1.5).sin(), 0.0);
    points[pose_landmark::LEFT_WRIST] =
        LandmarkPoint::new(0.4 + 0.1 * (t * 0.5).cos(), 0.6 + 0.1 * t.sin(), 0.0);
    points[pose_landmark::RIGHT_WRIST] =
        LandmarkPoint::new(0.6 - 0.1 * (t * 0.5 + 1.0).cos(), 0.6 + 0.1 * (t + 1.5).sin(), 0.0);
    LandmarkSet::single(points)
}

fn synthesize_face(t: f32, rng: &mut SimRng) -> LandmarkSet {
    let center = Vector2::new(0.5 + 0.01 * (t * 0.7).sin(), 0.28);
    let points = (0..FACE_LANDMARK_COUNT)
        .map(|i| {
            let angle = i as f32 / FACE_LANDMARK_COUNT as f32 * std::f32::consts::TAU;
            LandmarkPoint::new(
                center.x + 0.09 * angle.cos() + rng.jitter(0.002),
                center.y + 0.12 * angle.sin() + rng.jitter(0.002),
                0.0,
            )
        })
        .collect();
    LandmarkSet::single(points)
}

/// xorshift64*, enough randomness for landmark jitter.
struct SimRng {
    state: u64,
}

impl SimRng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.max(1),
        }
    }

    fn next_f32(&mut self) -> f32 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        let bits = self.state.wrapping_mul(0x2545_F491_4F6C_DD1D);
        (bits >> 40) as f32 / (1u64 << 24) as f32
    }

    fn jitter(&mut self, scale: f32) -> f32 {
        (self.next_f32() - 0.5) * scale
    }
}
