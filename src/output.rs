// src/output.rs
use std::sync::mpsc::Receiver;

use tracing::trace;

use crate::detector::LandmarkFrame;

/// Events the recognition worker pushes toward the display side.
#[derive(Debug, Clone)]
pub enum UiEvent {
    /// Fresh landmarks for overlay drawing.
    Overlay(LandmarkFrame),
    /// The output sentence changed.
    Sentence(String),
}

/// Anything that can present recognizer output to a user.
pub trait DisplaySink {
    fn display_overlay(&mut self, frame: &LandmarkFrame);
    fn display_text(&mut self, sentence: &str);
}

/// Terminal sink. Overlay traffic is only counted; the sentence is printed
/// when it actually changes.
#[derive(Default)]
pub struct ConsoleSink {
    overlay_frames: u64,
    last_sentence: Option<String>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overlay_frames(&self) -> u64 {
        self.overlay_frames
    }

    pub fn last_sentence(&self) -> Option<&str> {
        self.last_sentence.as_deref()
    }
}

impl DisplaySink for ConsoleSink {
    fn display_overlay(&mut self, frame: &LandmarkFrame) {
        self.overlay_frames += 1;
        trace!(
            kind = frame.kind.as_str(),
            instances = frame.landmarks.instance_count(),
            "overlay frame"
        );
    }

    fn display_text(&mut self, sentence: &str) {
        if self.last_sentence.as_deref() == Some(sentence) {
            return;
        }
        println!("  sentence: {sentence}");
        self.last_sentence = Some(sentence.to_string());
    }
}

/// Feeds a sink from the engine's event channel until the sender side hangs
/// up.
pub fn drive_sink(events: &Receiver<UiEvent>, sink: &mut dyn DisplaySink) {
    while let Ok(event) = events.recv() {
        match event {
            UiEvent::Overlay(frame) => sink.display_overlay(&frame),
            UiEvent::Sentence(sentence) => sink.display_text(&sentence),
        }
    }
}
