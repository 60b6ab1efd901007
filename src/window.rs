// src/window.rs
use std::collections::VecDeque;

use crate::features::FrameFeatures;

/// Rolling window of the most recent frame feature vectors. Bounded to
/// `capacity` elements; the oldest is evicted first.
#[derive(Debug)]
pub struct SequenceWindow {
    frames: VecDeque<FrameFeatures>,
    capacity: usize,
}

impl SequenceWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, frame: FrameFeatures) {
        self.frames.push_back(frame);
        while self.frames.len() > self.capacity {
            self.frames.pop_front();
        }
    }

    /// True once the window holds a full sequence. Checked after trimming,
    /// so this fires on every push from the capacity-th onward.
    pub fn is_ready(&self) -> bool {
        self.frames.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Borrowed view of the window, oldest frame first.
    pub fn snapshot(&self) -> Vec<&[f32]> {
        self.frames.iter().map(|frame| frame.as_slice()).collect()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
