// src/bin/pipeline_check.rs
use std::sync::mpsc;
use std::time::Duration;

use sign_tracker::classifier::{CentroidClassifier, Prediction, SequenceClassifier};
use sign_tracker::config::RecognizerConfig;
use sign_tracker::detector::{DetectorEvent, DetectorKind, LandmarkFrame, Landmarker};
use sign_tracker::engine::RecognitionEngine;
use sign_tracker::features::{self, FrameFeatures};
use sign_tracker::landmarks::{
    LandmarkPoint, LandmarkSet, FRAME_FEATURE_LEN, HAND_LANDMARK_COUNT,
};
use sign_tracker::sim::{SimulatedLandmarker, SyntheticFrameSource};
use sign_tracker::stabilizer::VoteStabilizer;
use sign_tracker::window::SequenceWindow;

fn main() {
    println!("Checking recognition pipeline stages...\n");
    let mut failures = 0u32;

    // Configuration
    let config = RecognizerConfig::default();
    match config.validate() {
        Ok(()) => println!("✓ Default configuration valid"),
        Err(e) => {
            println!("✗ Default configuration rejected: {e}");
            failures += 1;
        }
    }

    // Feature assembly
    let hands = LandmarkSet::single(vec![LandmarkPoint::new(0.5, 0.5, 0.1); HAND_LANDMARK_COUNT]);
    match features::assemble(&hands, &LandmarkSet::default(), &LandmarkSet::default()) {
        Ok(frame) => {
            let values = frame.as_slice();
            let first_hand_filled = values[..63].iter().all(|v| *v != 0.0);
            let rest_zero = values[63..].iter().all(|v| *v == 0.0);
            if values.len() == FRAME_FEATURE_LEN && first_hand_filled && rest_zero {
                println!("✓ Feature assembly lays out {FRAME_FEATURE_LEN} scalars");
            } else {
                println!("✗ Feature layout wrong");
                failures += 1;
            }
        }
        Err(e) => {
            println!("✗ Feature assembly failed: {e}");
            failures += 1;
        }
    }

    // Sliding window
    let mut window = SequenceWindow::new(30);
    let mut build_failed = false;
    for i in 0..29 {
        match FrameFeatures::new(vec![i as f32; FRAME_FEATURE_LEN]) {
            Ok(frame) => window.push(frame),
            Err(_) => build_failed = true,
        }
    }
    let not_ready_early = !window.is_ready();
    for i in 29..31 {
        match FrameFeatures::new(vec![i as f32; FRAME_FEATURE_LEN]) {
            Ok(frame) => window.push(frame),
            Err(_) => build_failed = true,
        }
    }
    let oldest_evicted = window.snapshot().first().map(|row| row[0]) == Some(1.0);
    if !build_failed && not_ready_early && window.is_ready() && window.len() == 30 && oldest_evicted
    {
        println!("✓ Window holds 30 frames and evicts the oldest");
    } else {
        println!("✗ Window bookkeeping wrong");
        failures += 1;
    }

    // Classifier
    let mut classifier = CentroidClassifier::seeded(3, 7);
    let rows = vec![vec![0.25f32; FRAME_FEATURE_LEN]; 30];
    let refs: Vec<&[f32]> = rows.iter().map(|row| row.as_slice()).collect();
    match classifier.infer(&refs) {
        Ok(scores) => {
            let total: f32 = scores.iter().sum();
            if scores.len() == 3 && (total - 1.0).abs() < 1e-3 && scores.iter().all(|s| s.is_finite())
            {
                println!("✓ Classifier emits a 3-label distribution");
            } else {
                println!("✗ Classifier scores malformed: {scores:?}");
                failures += 1;
            }
        }
        Err(e) => {
            println!("✗ Classifier failed: {e}");
            failures += 1;
        }
    }

    // Stabilizer
    let mut stabilizer = VoteStabilizer::new(5, 0.3, 5);
    let mut committed = None;
    for _ in 0..5 {
        committed = stabilizer.record(Prediction {
            index: 1,
            score: 0.8,
        });
    }
    if committed == Some(1) {
        println!("✓ Stabilizer commits after five agreeing votes");
    } else {
        println!("✗ Stabilizer did not commit: {committed:?}");
        failures += 1;
    }

    // Engine over a full window
    let (ui_tx, _ui_rx) = mpsc::channel();
    match RecognitionEngine::new(
        RecognizerConfig::default(),
        Box::new(CentroidClassifier::seeded(3, 7)),
        ui_tx,
    ) {
        Ok(mut engine) => {
            let mut inferred = false;
            for i in 0..30i64 {
                let event = DetectorEvent::Result(LandmarkFrame {
                    kind: DetectorKind::Hands,
                    landmarks: LandmarkSet::single(vec![
                        LandmarkPoint::new(0.4, 0.4, 0.0);
                        HAND_LANDMARK_COUNT
                    ]),
                    image_width: 640,
                    image_height: 480,
                    timestamp_ms: i * 33,
                });
                match engine.handle_event(event) {
                    Ok(outcome) => inferred = outcome.inferred,
                    Err(e) => {
                        println!("✗ Engine cycle failed: {e}");
                        failures += 1;
                        break;
                    }
                }
            }
            if inferred && engine.cycle() == 30 {
                println!("✓ Engine infers once the 30th frame lands");
            } else {
                println!("✗ Engine never reached inference");
                failures += 1;
            }
        }
        Err(e) => {
            println!("✗ Engine construction failed: {e}");
            failures += 1;
        }
    }

    // Simulated detector round trip
    let (results_tx, results_rx) = mpsc::channel();
    match SimulatedLandmarker::spawn(
        DetectorKind::Hands,
        RecognizerConfig::default().hands,
        5,
        results_tx,
    ) {
        Ok(mut landmarker) => {
            let mut source = SyntheticFrameSource::new(320, 240);
            let frame = source.next_frame();
            let detector: &mut dyn Landmarker = &mut landmarker;
            match detector.submit_frame(&frame.image, frame.timestamp_ms) {
                Ok(()) => match results_rx.recv_timeout(Duration::from_secs(2)) {
                    Ok(DetectorEvent::Result(result)) if result.kind == DetectorKind::Hands => {
                        println!("✓ Simulated landmarker round trip");
                    }
                    Ok(_) => {
                        println!("✗ Unexpected detector event");
                        failures += 1;
                    }
                    Err(e) => {
                        println!("✗ No detector result: {e}");
                        failures += 1;
                    }
                },
                Err(e) => {
                    println!("✗ Frame submission failed: {e}");
                    failures += 1;
                }
            }
            if let Err(e) = landmarker.shutdown() {
                println!("✗ Landmarker shutdown failed: {e}");
                failures += 1;
            }
        }
        Err(e) => {
            println!("✗ Landmarker spawn failed: {e}");
            failures += 1;
        }
    }

    if failures == 0 {
        println!("\nAll pipeline stages check out");
    } else {
        println!("\n{failures} stage(s) failed");
        std::process::exit(1);
    }
}
