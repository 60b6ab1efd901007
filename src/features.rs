// src/features.rs
use crate::error::{RecognizerError, Result};
use crate::landmarks::{
    LandmarkSet, FACE_BLOCK_LEN, FACE_LANDMARK_COUNT, FRAME_FEATURE_LEN, HAND_BLOCK_LEN,
    POSE_BLOCK_LEN, POSE_LANDMARK_COUNT,
};

/// A flat per-frame feature vector: hand block, pose block, face block.
/// Length is always exactly FRAME_FEATURE_LEN; the constructor rejects
/// anything else.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameFeatures(Vec<f32>);

impl FrameFeatures {
    pub fn new(values: Vec<f32>) -> Result<Self> {
        if values.len() != FRAME_FEATURE_LEN {
            return Err(RecognizerError::FeatureLength {
                got: values.len(),
                expected: FRAME_FEATURE_LEN,
            });
        }
        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// (x, y, z) per landmark per hand, in detector order. Pads short input
/// with zeros and cuts anything past the two tracked hands.
pub fn hand_block(hands: &LandmarkSet) -> Vec<f32> {
    let mut block = Vec::with_capacity(HAND_BLOCK_LEN);
    for hand in &hands.instances {
        for point in hand {
            block.extend_from_slice(&[point.x, point.y, point.z]);
        }
    }
    block.resize(HAND_BLOCK_LEN, 0.0);
    block
}

/// (x, y, z) per landmark of the first detected pose. The tail of the
/// block holds the reserved per-landmark visibility slots; no detector
/// populates them, so they are always zero.
pub fn pose_block(pose: &LandmarkSet) -> Vec<f32> {
    let mut block = Vec::with_capacity(POSE_BLOCK_LEN);
    if let Some(points) = pose.first() {
        for point in points.iter().take(POSE_LANDMARK_COUNT) {
            block.extend_from_slice(&[point.x, point.y, point.z]);
        }
    }
    block.resize(POSE_BLOCK_LEN, 0.0);
    block
}

/// (x, y, z) for up to the first 468 landmarks of the first detected face;
/// landmarks beyond that are dropped, short input is zero padded.
pub fn face_block(face: &LandmarkSet) -> Vec<f32> {
    let mut block = Vec::with_capacity(FACE_BLOCK_LEN);
    if let Some(points) = face.first() {
        for point in points.iter().take(FACE_LANDMARK_COUNT) {
            block.extend_from_slice(&[point.x, point.y, point.z]);
        }
    }
    block.resize(FACE_BLOCK_LEN, 0.0);
    block
}

/// Combines the latest hand, pose, and face sets into one frame feature
/// vector. An absent detector contributes an all-zero block.
pub fn assemble(
    hands: &LandmarkSet,
    pose: &LandmarkSet,
    face: &LandmarkSet,
) -> Result<FrameFeatures> {
    let mut combined = Vec::with_capacity(FRAME_FEATURE_LEN);
    combined.extend(hand_block(hands));
    combined.extend(pose_block(pose));
    combined.extend(face_block(face));
    FrameFeatures::new(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::LandmarkPoint;

    fn points(count: usize, value: f32) -> Vec<LandmarkPoint> {
        (0..count)
            .map(|_| LandmarkPoint::new(value, value, value))
            .collect()
    }

    fn two_hands(value: f32) -> LandmarkSet {
        LandmarkSet {
            instances: vec![points(21, value), points(21, value)],
        }
    }

    #[test]
    fn assembled_vector_is_always_full_length() {
        let empty = LandmarkSet::default();
        let frame = assemble(&empty, &empty, &empty).unwrap();
        assert_eq!(frame.len(), FRAME_FEATURE_LEN);

        let frame = assemble(
            &two_hands(0.5),
            &LandmarkSet::single(points(33, 0.4)),
            &LandmarkSet::single(points(468, 0.3)),
        )
        .unwrap();
        assert_eq!(frame.len(), FRAME_FEATURE_LEN);
    }

    #[test]
    fn absent_detectors_contribute_zero_blocks() {
        let empty = LandmarkSet::default();
        let frame = assemble(&empty, &empty, &empty).unwrap();
        assert!(frame.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn hands_only_fills_first_block_and_nothing_else() {
        let empty = LandmarkSet::default();
        let frame = assemble(&two_hands(0.5), &empty, &empty).unwrap();
        let values = frame.as_slice();
        assert!(values[..HAND_BLOCK_LEN].iter().all(|&v| v == 0.5));
        assert!(values[HAND_BLOCK_LEN..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn single_hand_pads_second_slot() {
        let one_hand = LandmarkSet::single(points(21, 0.7));
        let block = hand_block(&one_hand);
        assert_eq!(block.len(), HAND_BLOCK_LEN);
        assert!(block[..63].iter().all(|&v| v == 0.7));
        assert!(block[63..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn extra_hands_are_truncated() {
        let three_hands = LandmarkSet {
            instances: vec![points(21, 0.1), points(21, 0.2), points(21, 0.9)],
        };
        let block = hand_block(&three_hands);
        assert_eq!(block.len(), HAND_BLOCK_LEN);
        // The third hand must not appear anywhere in the block.
        assert!(block.iter().all(|&v| v != 0.9));
    }

    #[test]
    fn pose_visibility_slots_stay_zero() {
        let pose = LandmarkSet::single(points(33, 0.4));
        let block = pose_block(&pose);
        assert_eq!(block.len(), POSE_BLOCK_LEN);
        assert!(block[..99].iter().all(|&v| v == 0.4));
        assert!(
            block[99..].iter().all(|&v| v == 0.0),
            "reserved visibility slots must stay zero"
        );
    }

    #[test]
    fn overlong_pose_never_leaks_into_visibility_slots() {
        let pose = LandmarkSet::single(points(40, 0.4));
        let block = pose_block(&pose);
        assert_eq!(block.len(), POSE_BLOCK_LEN);
        assert!(block[99..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn face_landmarks_beyond_468_are_dropped() {
        let mut long_face = points(468, 0.3);
        long_face.extend(points(32, 0.8));
        let truncated = face_block(&LandmarkSet::single(long_face));
        let exact = face_block(&LandmarkSet::single(points(468, 0.3)));
        assert_eq!(truncated, exact);
    }

    #[test]
    fn wrong_length_is_rejected() {
        let err = FrameFeatures::new(vec![0.0; 100]).unwrap_err();
        assert!(err.to_string().contains("100"));
    }
}
