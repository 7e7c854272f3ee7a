use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::pose::Joint;

/// Visibility a joint must exceed before its position is trusted.
pub const DEFAULT_VISIBILITY_CUTOFF: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum ExerciseKind {
    #[serde(rename = "squat")]
    #[value(name = "squat")]
    Squat,
    #[serde(rename = "push-up")]
    #[value(name = "push-up", alias = "pushup")]
    PushUp,
}

impl ExerciseKind {
    /// Name stored with workout records.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::Squat => "squat",
            ExerciseKind::PushUp => "push-up",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormViolation {
    TooDeep,
    StraightenBack,
    KeepBodyStraight,
}

/// Three joints whose middle member is the angle vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JointTriple {
    pub first: Joint,
    pub vertex: Joint,
    pub last: Joint,
}

impl JointTriple {
    pub const fn new(first: Joint, vertex: Joint, last: Joint) -> Self {
        Self {
            first,
            vertex,
            last,
        }
    }

    pub fn joints(&self) -> [Joint; 3] {
        [self.first, self.vertex, self.last]
    }
}

/// An angle that flags a violation when it drops below `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleLimit {
    pub threshold: f64,
    pub violation: FormViolation,
}

/// When the posture limit on the secondary angle is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureGate {
    /// Only while the limb is contracted.
    Contracted,
    Always,
}

/// Joint selection and thresholds for one exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseProfile {
    pub kind: ExerciseKind,
    /// Drives phase detection and progress.
    pub primary: JointTriple,
    /// Checked against the posture limit.
    pub secondary: JointTriple,
    pub extended_threshold: f64,
    pub contracted_threshold: f64,
    /// Primary angle below which the movement is unsafe.
    pub danger: Option<AngleLimit>,
    pub posture: AngleLimit,
    pub posture_gate: PostureGate,
    pub visibility_cutoff: f64,
}

impl ExerciseProfile {
    pub fn squat() -> Self {
        Self {
            kind: ExerciseKind::Squat,
            primary: JointTriple::new(Joint::LeftHip, Joint::LeftKnee, Joint::LeftAnkle),
            secondary: JointTriple::new(Joint::LeftShoulder, Joint::LeftHip, Joint::LeftKnee),
            extended_threshold: 170.0,
            contracted_threshold: 100.0,
            danger: Some(AngleLimit {
                threshold: 60.0,
                violation: FormViolation::TooDeep,
            }),
            posture: AngleLimit {
                threshold: 100.0,
                violation: FormViolation::StraightenBack,
            },
            posture_gate: PostureGate::Contracted,
            visibility_cutoff: DEFAULT_VISIBILITY_CUTOFF,
        }
    }

    pub fn push_up() -> Self {
        Self {
            kind: ExerciseKind::PushUp,
            primary: JointTriple::new(Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist),
            secondary: JointTriple::new(Joint::LeftShoulder, Joint::LeftHip, Joint::LeftAnkle),
            extended_threshold: 160.0,
            contracted_threshold: 90.0,
            danger: None,
            posture: AngleLimit {
                threshold: 150.0,
                violation: FormViolation::KeepBodyStraight,
            },
            posture_gate: PostureGate::Always,
            visibility_cutoff: DEFAULT_VISIBILITY_CUTOFF,
        }
    }

    pub fn builtin(kind: ExerciseKind) -> Self {
        match kind {
            ExerciseKind::Squat => Self::squat(),
            ExerciseKind::PushUp => Self::push_up(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut thresholds = vec![
            ("extended_threshold", self.extended_threshold),
            ("contracted_threshold", self.contracted_threshold),
            ("posture.threshold", self.posture.threshold),
        ];
        if let Some(danger) = &self.danger {
            thresholds.push(("danger.threshold", danger.threshold));
        }

        for (field, value) in thresholds {
            if !value.is_finite() || !(0.0..=180.0).contains(&value) {
                bail!("{field} must be an angle within [0, 180] (got {value})");
            }
        }

        if self.contracted_threshold >= self.extended_threshold {
            bail!(
                "contracted_threshold ({}) must be below extended_threshold ({})",
                self.contracted_threshold,
                self.extended_threshold
            );
        }

        if !(0.0..=1.0).contains(&self.visibility_cutoff) {
            bail!(
                "visibility_cutoff must be within [0, 1] (got {})",
                self.visibility_cutoff
            );
        }

        Ok(())
    }

    /// Every joint either angle needs, without duplicates.
    pub fn required_joints(&self) -> Vec<Joint> {
        let mut joints = Vec::with_capacity(6);
        for joint in self.primary.joints().into_iter().chain(self.secondary.joints()) {
            if !joints.contains(&joint) {
                joints.push(joint);
            }
        }
        joints
    }
}
