//! Per-frame skeleton model consumed from the external pose estimator.

pub mod replay;

use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::geometry::Point;

pub use replay::ReplayPoseSource;

/// Body joints the exercise profiles can reference.
///
/// Each joint knows its index in the 33-landmark MediaPipe pose topology so
/// adapters can build snapshots straight from landmark arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Nose,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    pub const ALL: [Joint; 13] = [
        Joint::Nose,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    pub fn landmark_index(&self) -> usize {
        match self {
            Joint::Nose => 0,
            Joint::LeftShoulder => 11,
            Joint::RightShoulder => 12,
            Joint::LeftElbow => 13,
            Joint::RightElbow => 14,
            Joint::LeftWrist => 15,
            Joint::RightWrist => 16,
            Joint::LeftHip => 23,
            Joint::RightHip => 24,
            Joint::LeftKnee => 25,
            Joint::RightKnee => 26,
            Joint::LeftAnkle => 27,
            Joint::RightAnkle => 28,
        }
    }
}

/// One joint's observation for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointSample {
    pub x: f64,
    pub y: f64,
    /// Detection confidence in [0, 1].
    pub visibility: f64,
}

impl JointSample {
    pub fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self { x, y, visibility }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// All joints observed in a single frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseSnapshot {
    joints: HashMap<Joint, JointSample>,
}

impl PoseSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from a MediaPipe landmark array of `(x, y, visibility)`.
    /// Landmarks outside the known joint set are ignored.
    pub fn from_landmarks(landmarks: &[(f64, f64, f64)]) -> Self {
        let joints = Joint::ALL
            .iter()
            .filter_map(|joint| {
                landmarks
                    .get(joint.landmark_index())
                    .map(|&(x, y, visibility)| (*joint, JointSample::new(x, y, visibility)))
            })
            .collect();
        Self { joints }
    }

    pub fn with_joint(mut self, joint: Joint, sample: JointSample) -> Self {
        self.joints.insert(joint, sample);
        self
    }

    pub fn insert(&mut self, joint: Joint, sample: JointSample) {
        self.joints.insert(joint, sample);
    }

    pub fn get(&self, joint: Joint) -> Option<&JointSample> {
        self.joints.get(&joint)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

/// What the pose estimator produced for one video frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PoseFrame {
    Detected(PoseSnapshot),
    /// No body was found in the frame.
    Absent,
}

impl PoseFrame {
    pub fn snapshot(&self) -> Option<&PoseSnapshot> {
        match self {
            PoseFrame::Detected(snapshot) => Some(snapshot),
            PoseFrame::Absent => None,
        }
    }
}

/// Synchronous source of pose frames. `Ok(None)` marks the end of the stream.
pub trait PoseSource {
    fn next_frame(&mut self) -> Result<Option<PoseFrame>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_from_landmarks_maps_mediapipe_indices() {
        let mut landmarks = vec![(0.0, 0.0, 0.0); 33];
        landmarks[25] = (0.4, 0.6, 0.95);
        landmarks[11] = (0.3, 0.2, 0.8);

        let snapshot = PoseSnapshot::from_landmarks(&landmarks);

        assert_eq!(snapshot.len(), Joint::ALL.len());
        assert_eq!(
            snapshot.get(Joint::LeftKnee),
            Some(&JointSample::new(0.4, 0.6, 0.95))
        );
        assert_eq!(snapshot.get(Joint::LeftShoulder).map(|s| s.visibility), Some(0.8));
    }

    #[test]
    fn short_landmark_array_only_fills_known_prefix() {
        let landmarks = vec![(0.5, 0.5, 1.0); 12];
        let snapshot = PoseSnapshot::from_landmarks(&landmarks);

        assert!(snapshot.get(Joint::Nose).is_some());
        assert!(snapshot.get(Joint::LeftShoulder).is_some());
        assert!(snapshot.get(Joint::RightShoulder).is_none());
    }

    #[test]
    fn joint_names_serialize_in_snake_case() {
        let snapshot = PoseSnapshot::new().with_joint(Joint::LeftHip, JointSample::new(0.1, 0.2, 0.9));
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"left_hip\""), "unexpected encoding: {json}");
    }
}
