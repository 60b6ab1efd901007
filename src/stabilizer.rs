// src/stabilizer.rs
use std::collections::VecDeque;

use tracing::debug;

use crate::classifier::Prediction;

/// Where the stabilizer sits relative to the consensus rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilizerPhase {
    /// Fewer recorded predictions than the consensus length.
    Accumulating,
    /// Enough history to evaluate the consensus rule on every record.
    Evaluating,
}

/// Temporal voting over raw predictions. A label is committed to the
/// output sentence only when the last `consensus_len` recorded predictions
/// all agree with the newest one, its score beats the commit threshold,
/// and it is not a repeat of the last committed label. Committing clears
/// the history; the sentence keeps its most recent `sentence_cap` labels.
#[derive(Debug)]
pub struct VoteStabilizer {
    consensus_len: usize,
    commit_threshold: f32,
    sentence_cap: usize,
    history: Vec<usize>,
    sentence: VecDeque<usize>,
}

impl VoteStabilizer {
    pub fn new(consensus_len: usize, commit_threshold: f32, sentence_cap: usize) -> Self {
        Self {
            consensus_len,
            commit_threshold,
            sentence_cap,
            history: Vec::new(),
            sentence: VecDeque::new(),
        }
    }

    pub fn phase(&self) -> StabilizerPhase {
        if self.history.len() < self.consensus_len {
            StabilizerPhase::Accumulating
        } else {
            StabilizerPhase::Evaluating
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn sentence(&self) -> impl Iterator<Item = usize> + '_ {
        self.sentence.iter().copied()
    }

    pub fn sentence_len(&self) -> usize {
        self.sentence.len()
    }

    pub fn last_committed(&self) -> Option<usize> {
        self.sentence.back().copied()
    }

    /// Records one above-floor prediction. Returns the committed label
    /// index when the consensus rule passes, None otherwise.
    pub fn record(&mut self, prediction: Prediction) -> Option<usize> {
        self.history.push(prediction.index);

        if self.history.len() < self.consensus_len {
            return None;
        }
        let tail = &self.history[self.history.len() - self.consensus_len..];
        if !tail.iter().all(|&recorded| recorded == prediction.index) {
            return None;
        }
        if prediction.score <= self.commit_threshold {
            return None;
        }
        if self.sentence.back() == Some(&prediction.index) {
            return None;
        }

        self.sentence.push_back(prediction.index);
        while self.sentence.len() > self.sentence_cap {
            self.sentence.pop_front();
        }
        self.history.clear();
        debug!(
            label = prediction.index,
            score = prediction.score,
            "committed label"
        );
        Some(prediction.index)
    }

    /// Drops all voting state, including the sentence.
    pub fn reset(&mut self) {
        self.history.clear();
        self.sentence.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predict(index: usize, score: f32) -> Prediction {
        Prediction { index, score }
    }

    fn stabilizer() -> VoteStabilizer {
        VoteStabilizer::new(5, 0.3, 5)
    }

    #[test]
    fn unanimous_run_above_threshold_commits() {
        let mut votes = stabilizer();
        for _ in 0..4 {
            assert_eq!(votes.record(predict(0, 0.35)), None);
        }
        assert_eq!(votes.record(predict(0, 0.35)), Some(0));
        assert_eq!(votes.history_len(), 0, "history clears on commit");
        assert_eq!(votes.phase(), StabilizerPhase::Accumulating);
    }

    #[test]
    fn one_disagreement_blocks_the_commit() {
        let mut votes = stabilizer();
        for index in [0, 0, 0, 1, 0] {
            assert_eq!(votes.record(predict(index, 0.9)), None);
        }
        assert_eq!(votes.sentence_len(), 0);
    }

    #[test]
    fn score_at_threshold_does_not_commit() {
        let mut votes = stabilizer();
        for _ in 0..5 {
            assert_eq!(votes.record(predict(0, 0.3)), None);
        }
        // History keeps growing until a later evaluation succeeds.
        assert_eq!(votes.record(predict(0, 0.31)), Some(0));
    }

    #[test]
    fn repeat_of_last_committed_label_is_suppressed() {
        let mut votes = stabilizer();
        for _ in 0..5 {
            votes.record(predict(0, 0.5));
        }
        assert_eq!(votes.last_committed(), Some(0));
        for _ in 0..5 {
            assert_eq!(votes.record(predict(0, 0.5)), None);
        }
        assert_eq!(votes.sentence_len(), 1);
    }

    #[test]
    fn different_label_can_follow_a_commit() {
        let mut votes = stabilizer();
        for _ in 0..5 {
            votes.record(predict(0, 0.5));
        }
        // History was cleared, so label 1 needs its own full run.
        for _ in 0..4 {
            assert_eq!(votes.record(predict(1, 0.5)), None);
        }
        assert_eq!(votes.record(predict(1, 0.5)), Some(1));
        let sentence: Vec<usize> = votes.sentence().collect();
        assert_eq!(sentence, vec![0, 1]);
    }

    #[test]
    fn sentence_is_bounded_with_front_eviction() {
        let mut votes = stabilizer();
        for label in [0, 1, 0, 1, 0, 1, 0] {
            for _ in 0..5 {
                votes.record(predict(label, 0.9));
            }
        }
        assert_eq!(votes.sentence_len(), 5);
        let sentence: Vec<usize> = votes.sentence().collect();
        assert_eq!(sentence, vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn phase_tracks_history_depth() {
        let mut votes = stabilizer();
        assert_eq!(votes.phase(), StabilizerPhase::Accumulating);
        for index in [0, 1, 0, 1] {
            votes.record(predict(index, 0.9));
        }
        assert_eq!(votes.phase(), StabilizerPhase::Accumulating);
        votes.record(predict(0, 0.9));
        assert_eq!(votes.phase(), StabilizerPhase::Evaluating);
    }

    #[test]
    fn reset_drops_everything() {
        let mut votes = stabilizer();
        for _ in 0..5 {
            votes.record(predict(0, 0.5));
        }
        votes.reset();
        assert_eq!(votes.sentence_len(), 0);
        assert_eq!(votes.history_len(), 0);
    }
}
