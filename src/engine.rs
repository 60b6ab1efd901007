// src/engine.rs
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, warn};

use crate::classifier::{argmax, Prediction, SequenceClassifier};
use crate::config::RecognizerConfig;
use crate::data::{PredictionRecord, SessionExporter};
use crate::detector::{DetectorEvent, DetectorKind, SourceCell};
use crate::error::{RecognizerError, Result};
use crate::features;
use crate::landmarks::LandmarkSet;
use crate::output::UiEvent;
use crate::stabilizer::VoteStabilizer;
use crate::window::SequenceWindow;

/// What one detector event did to the recognizer state.
#[derive(Debug, Default)]
pub struct CycleOutcome {
    /// A feature frame was appended to the window.
    pub appended: bool,
    /// The classifier ran on a full window.
    pub inferred: bool,
    /// Raw argmax over the classifier scores, before any gating.
    pub prediction: Option<Prediction>,
    /// Label committed to the sentence this cycle, if any.
    pub committed: Option<String>,
}

/// Fuses the three landmark streams into feature frames, runs the windowed
/// classifier, and stabilizes its votes into a sentence.
///
/// Every detector result advances one full cycle. Sources are merged
/// keep-latest: each stream only overwrites its own slot, and a slot whose
/// result has fallen too far behind the newest one is zeroed for the cycle
/// rather than reused.
pub struct RecognitionEngine {
    config: RecognizerConfig,
    hands: SourceCell,
    pose: SourceCell,
    face: SourceCell,
    window: SequenceWindow,
    stabilizer: VoteStabilizer,
    classifier: Box<dyn SequenceClassifier + Send>,
    ui_tx: Sender<UiEvent>,
    exporter: Option<SessionExporter>,
    cycle: u64,
}

impl RecognitionEngine {
    pub fn new(
        config: RecognizerConfig,
        classifier: Box<dyn SequenceClassifier + Send>,
        ui_tx: Sender<UiEvent>,
    ) -> Result<Self> {
        config.validate()?;
        if classifier.num_labels() != config.actions.len() {
            return Err(RecognizerError::InvalidConfig(format!(
                "classifier {} scores {} labels but config names {}",
                classifier.name(),
                classifier.num_labels(),
                config.actions.len()
            )));
        }

        Ok(Self {
            window: SequenceWindow::new(config.window_len),
            stabilizer: VoteStabilizer::new(
                config.consensus_len,
                config.commit_threshold,
                config.sentence_cap,
            ),
            config,
            hands: SourceCell::default(),
            pose: SourceCell::default(),
            face: SourceCell::default(),
            classifier,
            ui_tx,
            exporter: None,
            cycle: 0,
        })
    }

    pub fn with_exporter(mut self, exporter: SessionExporter) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// The committed labels joined into display text.
    pub fn sentence_text(&self) -> String {
        self.stabilizer
            .sentence()
            .filter_map(|index| self.config.actions.get(index).map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn take_exporter(&mut self) -> Option<SessionExporter> {
        self.exporter.take()
    }

    /// Applies one detector event and runs a recognition cycle on it.
    pub fn handle_event(&mut self, event: DetectorEvent) -> Result<CycleOutcome> {
        match event {
            DetectorEvent::Result(frame) => {
                let _ = self.ui_tx.send(UiEvent::Overlay(frame.clone()));
                match frame.kind {
                    DetectorKind::Hands => self.hands.update(frame),
                    DetectorKind::Pose => self.pose.update(frame),
                    DetectorKind::Face => self.face.update(frame),
                }
                self.run_cycle()
            }
            DetectorEvent::Failure { kind, message } => {
                error!(kind = kind.as_str(), error = %message, "detector failure");
                match kind {
                    DetectorKind::Hands => self.hands.clear(),
                    DetectorKind::Pose => self.pose.clear(),
                    DetectorKind::Face => self.face.clear(),
                }
                Ok(CycleOutcome::default())
            }
        }
    }

    fn run_cycle(&mut self) -> Result<CycleOutcome> {
        self.cycle += 1;
        let mut outcome = CycleOutcome::default();

        let newest_ms = [&self.hands, &self.pose, &self.face]
            .iter()
            .filter(|cell| cell.has_value())
            .map(|cell| cell.timestamp_ms())
            .max()
            .unwrap_or(0);
        let skew = self.config.max_source_skew_ms;
        let empty = LandmarkSet::default();

        let hands = Self::fresh_or_empty(&self.hands, newest_ms, skew, &empty);
        let pose = Self::fresh_or_empty(&self.pose, newest_ms, skew, &empty);
        let face = Self::fresh_or_empty(&self.face, newest_ms, skew, &empty);

        let frame = features::assemble(hands, pose, face)?;
        self.window.push(frame);
        outcome.appended = true;

        if !self.window.is_ready() {
            return Ok(outcome);
        }

        let scores = {
            let snapshot = self.window.snapshot();
            match self.classifier.infer(&snapshot) {
                Ok(scores) => scores,
                Err(err) => {
                    warn!(cycle = self.cycle, error = %err, "inference failed, window kept");
                    return Ok(outcome);
                }
            }
        };
        if scores.len() != self.config.actions.len() {
            let err = RecognizerError::ScoreLength {
                got: scores.len(),
                expected: self.config.actions.len(),
            };
            warn!(cycle = self.cycle, error = %err, "discarding malformed scores");
            return Ok(outcome);
        }
        outcome.inferred = true;

        let prediction = match argmax(&scores) {
            Some(prediction) => prediction,
            None => return Ok(outcome),
        };
        outcome.prediction = Some(prediction);

        if prediction.score <= self.config.confidence_floor {
            debug!(
                cycle = self.cycle,
                score = prediction.score,
                "best score below confidence floor"
            );
            return Ok(outcome);
        }

        let label = self
            .config
            .actions
            .get(prediction.index)
            .cloned()
            .unwrap_or_default();
        let committed = self.stabilizer.record(prediction).is_some();
        let sentence = self.sentence_text();
        if committed {
            info!(label = %label, sentence = %sentence, "label committed");
            let _ = self.ui_tx.send(UiEvent::Sentence(sentence.clone()));
            outcome.committed = Some(label.clone());
        }

        if let Some(exporter) = self.exporter.as_mut() {
            exporter.add(PredictionRecord {
                timestamp_ms: newest_ms,
                cycle: self.cycle,
                label,
                score: prediction.score,
                committed,
                sentence,
            });
        }

        Ok(outcome)
    }

    fn fresh_or_empty<'a>(
        cell: &'a SourceCell,
        newest_ms: i64,
        skew: i64,
        empty: &'a LandmarkSet,
    ) -> &'a LandmarkSet {
        if cell.is_stale(newest_ms, skew) {
            debug!(
                lag_ms = newest_ms - cell.timestamp_ms(),
                "source stale, zeroing its block"
            );
            empty
        } else {
            cell.landmarks()
        }
    }
}

/// Sender half of the recognition worker plus its join handle.
pub struct EngineHandle {
    events: Sender<DetectorEvent>,
    worker: JoinHandle<RecognitionEngine>,
}

impl EngineHandle {
    /// Clones the event sender for a detector to feed.
    pub fn events(&self) -> Sender<DetectorEvent> {
        self.events.clone()
    }

    pub fn submit(&self, event: DetectorEvent) -> Result<()> {
        self.events
            .send(event)
            .map_err(|_| RecognizerError::ChannelClosed)
    }

    /// Closes the event channel and waits for the worker to drain.
    pub fn join(self) -> Result<RecognitionEngine> {
        drop(self.events);
        self.worker
            .join()
            .map_err(|_| RecognizerError::WorkerPanicked)
    }
}

/// Runs a [`RecognitionEngine`] on its own worker thread. Detector streams
/// send [`DetectorEvent`]s through the returned handle; overlay and sentence
/// updates come back on the [`UiEvent`] receiver.
pub fn spawn(
    config: RecognizerConfig,
    classifier: Box<dyn SequenceClassifier + Send>,
    exporter: Option<SessionExporter>,
) -> Result<(EngineHandle, Receiver<UiEvent>)> {
    let (ui_tx, ui_rx) = mpsc::channel();
    let (event_tx, event_rx) = mpsc::channel();

    let mut engine = RecognitionEngine::new(config, classifier, ui_tx)?;
    if let Some(exporter) = exporter {
        engine = engine.with_exporter(exporter);
    }

    let worker = thread::Builder::new()
        .name("recognition-worker".into())
        .spawn(move || {
            while let Ok(event) = event_rx.recv() {
                if let Err(err) = engine.handle_event(event) {
                    error!(error = %err, "recognition cycle failed");
                }
            }
            engine
        })?;

    Ok((
        EngineHandle {
            events: event_tx,
            worker,
        },
        ui_rx,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::LandmarkFrame;
    use crate::landmarks::{LandmarkPoint, HAND_LANDMARK_COUNT};

    struct FixedClassifier {
        labels: usize,
        scores: Vec<f32>,
    }

    impl SequenceClassifier for FixedClassifier {
        fn name(&self) -> &str {
            "fixed"
        }

        fn num_labels(&self) -> usize {
            self.labels
        }

        fn infer(&mut self, _window: &[&[f32]]) -> Result<Vec<f32>> {
            Ok(self.scores.clone())
        }
    }

    struct FailingClassifier;

    impl SequenceClassifier for FailingClassifier {
        fn name(&self) -> &str {
            "failing"
        }

        fn num_labels(&self) -> usize {
            3
        }

        fn infer(&mut self, _window: &[&[f32]]) -> Result<Vec<f32>> {
            Err(RecognizerError::Inference("backend offline".into()))
        }
    }

    fn hand_event(timestamp_ms: i64) -> DetectorEvent {
        let points = vec![LandmarkPoint::new(0.4, 0.4, 0.0); HAND_LANDMARK_COUNT];
        DetectorEvent::Result(LandmarkFrame {
            kind: DetectorKind::Hands,
            landmarks: LandmarkSet::single(points),
            image_width: 640,
            image_height: 480,
            timestamp_ms,
        })
    }

    fn short_window_config() -> RecognizerConfig {
        RecognizerConfig {
            window_len: 1,
            ..RecognizerConfig::default()
        }
    }

    #[test]
    fn label_count_mismatch_is_rejected() {
        let (ui_tx, _ui_rx) = mpsc::channel();
        let classifier = Box::new(FixedClassifier {
            labels: 5,
            scores: vec![0.2; 5],
        });
        let err = RecognitionEngine::new(RecognizerConfig::default(), classifier, ui_tx)
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        assert!(err.contains("5"), "mentions the classifier width: {err}");
    }

    #[test]
    fn commit_emits_a_sentence_event() {
        let (ui_tx, ui_rx) = mpsc::channel();
        let classifier = Box::new(FixedClassifier {
            labels: 3,
            scores: vec![0.05, 0.9, 0.05],
        });
        let mut engine =
            RecognitionEngine::new(short_window_config(), classifier, ui_tx).unwrap();

        let mut committed = None;
        for i in 0..5 {
            let outcome = engine.handle_event(hand_event(i * 33)).unwrap();
            assert!(outcome.appended);
            assert!(outcome.inferred);
            committed = outcome.committed;
        }
        assert_eq!(committed.as_deref(), Some("thanks"));
        assert_eq!(engine.sentence_text(), "thanks");

        let sentences: Vec<String> = ui_rx
            .try_iter()
            .filter_map(|event| match event {
                UiEvent::Sentence(text) => Some(text),
                UiEvent::Overlay(_) => None,
            })
            .collect();
        assert_eq!(sentences, vec!["thanks".to_string()]);
    }

    #[test]
    fn floor_gated_predictions_stay_out_of_the_export() {
        let (ui_tx, _ui_rx) = mpsc::channel();
        let classifier = Box::new(FixedClassifier {
            labels: 3,
            scores: vec![0.09, 0.05, 0.02],
        });
        let mut engine = RecognitionEngine::new(short_window_config(), classifier, ui_tx)
            .unwrap()
            .with_exporter(SessionExporter::new("unused", Some("t".into())));

        for i in 0..10 {
            let outcome = engine.handle_event(hand_event(i * 33)).unwrap();
            assert!(outcome.inferred);
            assert!(outcome.committed.is_none());
        }
        assert_eq!(engine.sentence_text(), "");
        let exporter = engine.take_exporter().unwrap();
        assert_eq!(exporter.record_count(), 0);
    }

    #[test]
    fn inference_failure_keeps_the_window_and_cycle_going() {
        let (ui_tx, _ui_rx) = mpsc::channel();
        let mut engine = RecognitionEngine::new(
            short_window_config(),
            Box::new(FailingClassifier),
            ui_tx,
        )
        .unwrap();

        for i in 0..3 {
            let outcome = engine.handle_event(hand_event(i * 33)).unwrap();
            assert!(outcome.appended);
            assert!(!outcome.inferred);
        }
        assert_eq!(engine.cycle(), 3);
    }

    #[test]
    fn detector_failure_clears_only_that_source() {
        let (ui_tx, _ui_rx) = mpsc::channel();
        let classifier = Box::new(FixedClassifier {
            labels: 3,
            scores: vec![0.05, 0.9, 0.05],
        });
        let mut engine =
            RecognitionEngine::new(short_window_config(), classifier, ui_tx).unwrap();

        engine.handle_event(hand_event(0)).unwrap();
        let outcome = engine
            .handle_event(DetectorEvent::Failure {
                kind: DetectorKind::Hands,
                message: "camera unplugged".into(),
            })
            .unwrap();
        assert!(!outcome.appended, "failures do not advance the window");
        assert_eq!(engine.cycle(), 1);
    }

    #[test]
    fn spawned_worker_returns_the_engine_on_join() {
        let classifier = Box::new(FixedClassifier {
            labels: 3,
            scores: vec![0.05, 0.9, 0.05],
        });
        let (handle, ui_rx) = spawn(short_window_config(), classifier, None).unwrap();
        for i in 0..5 {
            handle.submit(hand_event(i * 33)).unwrap();
        }
        let engine = handle.join().unwrap();
        assert_eq!(engine.cycle(), 5);
        assert_eq!(engine.sentence_text(), "thanks");
        assert!(ui_rx.try_iter().count() >= 5);
    }
}
