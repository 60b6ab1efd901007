// src/main.rs
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::Context;

use sign_tracker::classifier::CentroidClassifier;
use sign_tracker::config::RecognizerConfig;
use sign_tracker::data::SessionExporter;
use sign_tracker::detector::{DetectorKind, Landmarker};
use sign_tracker::engine;
use sign_tracker::output::{self, ConsoleSink};
use sign_tracker::sim::{SimulatedLandmarker, SyntheticFrameSource};

fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    if let Err(e) = run() {
        eprintln!("Error running recognizer: {e:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let frames: u64 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(240);

    let config = RecognizerConfig::load(Path::new("sign_tracker.json"))
        .context("loading configuration")?;

    println!("=== Sign Recognition Demo ===");
    println!("Labels: {}", config.actions.join(", "));
    println!(
        "Window: {} frames, consensus of {}",
        config.window_len, config.consensus_len
    );
    println!("Capture: {frames} synthetic frames at ~30 fps");
    println!("=============================\n");

    let exporter = SessionExporter::new(&config.export_dir, None);
    let classifier = CentroidClassifier::seeded(config.actions.len(), 7);
    let hands_tuning = config.hands.clone();
    let pose_tuning = config.pose.clone();
    let face_tuning = config.face.clone();

    let (handle, ui_rx) = engine::spawn(config, Box::new(classifier), Some(exporter))
        .context("starting recognition worker")?;

    let mut hands =
        SimulatedLandmarker::spawn(DetectorKind::Hands, hands_tuning, 11, handle.events())
            .context("starting hand landmarker")?;
    let mut pose = SimulatedLandmarker::spawn(DetectorKind::Pose, pose_tuning, 23, handle.events())
        .context("starting pose landmarker")?;
    let mut face = SimulatedLandmarker::spawn(DetectorKind::Face, face_tuning, 37, handle.events())
        .context("starting face landmarker")?;

    let ui_thread = thread::spawn(move || {
        let mut sink = ConsoleSink::new();
        output::drive_sink(&ui_rx, &mut sink);
        sink
    });

    let mut source = SyntheticFrameSource::new(640, 480);
    {
        let detectors: &mut [&mut dyn Landmarker] = &mut [&mut hands, &mut pose, &mut face];
        for _ in 0..frames {
            let frame = source.next_frame();
            for detector in detectors.iter_mut() {
                detector.submit_frame(&frame.image, frame.timestamp_ms)?;
            }
            thread::sleep(Duration::from_millis(33));
        }
    }

    println!(
        "\nDropped frames: hands {}, pose {}, face {}",
        hands.dropped_frames(),
        pose.dropped_frames(),
        face.dropped_frames()
    );
    hands.shutdown()?;
    pose.shutdown()?;
    face.shutdown()?;

    let mut engine = handle.join()?;
    println!("Recognition cycles: {}", engine.cycle());
    let sentence = engine.sentence_text();
    if sentence.is_empty() {
        println!("Final sentence: (none committed)");
    } else {
        println!("Final sentence: {sentence}");
    }

    if let Some(exporter) = engine.take_exporter() {
        let csv_path = exporter.export_csv().context("writing predictions CSV")?;
        let report_path = exporter.generate_report().context("writing session report")?;
        println!("✓ Predictions exported: {}", csv_path.display());
        println!("✓ Report generated: {}", report_path.display());
    }

    drop(engine);
    let sink = ui_thread
        .join()
        .map_err(|_| anyhow::anyhow!("display thread panicked"))?;
    println!("Overlay frames displayed: {}", sink.overlay_frames());

    Ok(())
}
