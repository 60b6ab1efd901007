// src/landmarks.rs
use once_cell::sync::Lazy;

pub const HAND_LANDMARK_COUNT: usize = 21;
pub const POSE_LANDMARK_COUNT: usize = 33;
pub const FACE_LANDMARK_COUNT: usize = 468;
pub const MAX_TRACKED_HANDS: usize = 2;

/// Scalar widths of the three blocks of a frame feature vector, in the
/// order they are laid out: hands, then pose, then face.
pub const HAND_BLOCK_LEN: usize = MAX_TRACKED_HANDS * HAND_LANDMARK_COUNT * 3; // 126
pub const POSE_BLOCK_LEN: usize = POSE_LANDMARK_COUNT * 4; // 132
pub const FACE_BLOCK_LEN: usize = FACE_LANDMARK_COUNT * 3; // 1404
pub const FRAME_FEATURE_LEN: usize = HAND_BLOCK_LEN + POSE_BLOCK_LEN + FACE_BLOCK_LEN; // 1662

/// A normalized keypoint reported by a vision detector. x and y are in
/// [0, 1] relative to the source image; z is unconstrained depth.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// One detector's output for a frame: zero or more detected instances
/// (0-2 hands, 0-1 pose, 0-1 face), each an ordered point list. Replaced
/// wholesale on every detector callback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkSet {
    pub instances: Vec<Vec<LandmarkPoint>>,
}

impl LandmarkSet {
    pub fn single(points: Vec<LandmarkPoint>) -> Self {
        Self {
            instances: vec![points],
        }
    }

    pub fn first(&self) -> Option<&[LandmarkPoint]> {
        self.instances.first().map(|points| points.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

/// Hand landmark indices, as numbered by the detector.
pub mod hand_landmark {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_TIP: usize = 20;
}

/// Body landmark indices, as numbered by the detector.
pub mod pose_landmark {
    pub const NOSE: usize = 0;
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_ELBOW: usize = 13;
    pub const RIGHT_ELBOW: usize = 14;
    pub const LEFT_WRIST: usize = 15;
    pub const RIGHT_WRIST: usize = 16;
    pub const LEFT_HIP: usize = 23;
    pub const RIGHT_HIP: usize = 24;
}

/// Hand skeleton edges for overlay drawing.
pub static HAND_CONNECTIONS: Lazy<Vec<(usize, usize)>> = Lazy::new(|| {
    vec![
        (0, 1),
        (1, 2),
        (2, 3),
        (3, 4),
        (0, 5),
        (5, 6),
        (6, 7),
        (7, 8),
        (5, 9),
        (9, 10),
        (10, 11),
        (11, 12),
        (9, 13),
        (13, 14),
        (14, 15),
        (15, 16),
        (13, 17),
        (0, 17),
        (17, 18),
        (18, 19),
        (19, 20),
    ]
});

/// Body skeleton edges for overlay drawing.
pub static POSE_CONNECTIONS: Lazy<Vec<(usize, usize)>> = Lazy::new(|| {
    vec![
        (0, 1),
        (1, 2),
        (2, 3),
        (3, 7),
        (0, 4),
        (4, 5),
        (5, 6),
        (6, 8),
        (9, 10),
        (11, 12),
        (11, 13),
        (13, 15),
        (15, 17),
        (15, 19),
        (15, 21),
        (17, 19),
        (12, 14),
        (14, 16),
        (16, 18),
        (16, 20),
        (16, 22),
        (18, 20),
        (11, 23),
        (12, 24),
        (23, 24),
        (23, 25),
        (24, 26),
        (25, 27),
        (26, 28),
        (27, 29),
        (28, 30),
        (29, 31),
        (30, 32),
        (27, 31),
        (28, 32),
    ]
});

/// Face oval edges, the compact subset of the mesh drawn as an outline.
pub static FACE_OVAL_CONNECTIONS: Lazy<Vec<(usize, usize)>> = Lazy::new(|| {
    vec![
        (10, 338),
        (338, 297),
        (297, 332),
        (332, 284),
        (284, 251),
        (251, 389),
        (389, 356),
        (356, 454),
        (454, 323),
        (323, 361),
        (361, 288),
        (288, 397),
        (397, 365),
        (365, 379),
        (379, 378),
        (378, 400),
        (400, 377),
        (377, 152),
        (152, 148),
        (148, 176),
        (176, 149),
        (149, 150),
        (150, 136),
        (136, 172),
        (172, 58),
        (58, 132),
        (132, 93),
        (93, 234),
        (234, 127),
        (127, 162),
        (162, 21),
        (21, 54),
        (54, 103),
        (103, 67),
        (67, 109),
        (109, 10),
    ]
});
