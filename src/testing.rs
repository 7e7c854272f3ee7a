//! Synthetic poses and recording sinks for unit tests.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use anyhow::Result;

use crate::{
    exercise::{ExerciseProfile, JointTriple},
    feedback::{Cue, CueSink},
    models::CompletedWorkoutRecord,
    pose::{Joint, JointSample, PoseSnapshot},
    workout::RecordSink,
};

/// Cue sink that remembers every cue it was asked to play.
#[derive(Clone, Default)]
pub(crate) struct RecordingCues {
    played: Rc<RefCell<Vec<Cue>>>,
}

impl RecordingCues {
    pub(crate) fn played(&self) -> Vec<Cue> {
        self.played.borrow().clone()
    }
}

impl CueSink for RecordingCues {
    fn play(&self, cue: Cue) -> Result<()> {
        self.played.borrow_mut().push(cue);
        Ok(())
    }
}

/// Record sink that keeps saved records in memory.
#[derive(Clone, Default)]
pub(crate) struct RecordingSink {
    saved: Rc<RefCell<Vec<CompletedWorkoutRecord>>>,
}

impl RecordingSink {
    pub(crate) fn saved(&self) -> Vec<CompletedWorkoutRecord> {
        self.saved.borrow().clone()
    }
}

impl RecordSink for RecordingSink {
    fn save(&self, record: &CompletedWorkoutRecord) -> Result<()> {
        self.saved.borrow_mut().push(record.clone());
        Ok(())
    }
}

const ARM: f64 = 0.2;

/// Builds a fully visible snapshot whose primary and secondary angles equal
/// the requested values for `profile`.
pub(crate) fn pose_with_angles(profile: &ExerciseProfile, primary: f64, secondary: f64) -> PoseSnapshot {
    let mut positions: HashMap<Joint, (f64, f64)> = HashMap::new();
    place_triple(&mut positions, &profile.primary, primary);
    place_triple(&mut positions, &profile.secondary, secondary);

    let mut snapshot = PoseSnapshot::new();
    for (joint, (x, y)) in positions {
        snapshot.insert(joint, JointSample::new(x, y, 0.99));
    }
    snapshot
}

fn place_triple(positions: &mut HashMap<Joint, (f64, f64)>, triple: &JointTriple, degrees: f64) {
    let vertex = match positions.get(&triple.vertex) {
        Some(&p) => p,
        None => {
            let anchor = positions
                .get(&triple.first)
                .or_else(|| positions.get(&triple.last))
                .copied();
            let p = match anchor {
                Some((x, y)) => (x + 0.25, y),
                None => (0.5, 0.5),
            };
            positions.insert(triple.vertex, p);
            p
        }
    };

    let first = positions.get(&triple.first).copied();
    let last = positions.get(&triple.last).copied();
    match (first, last) {
        (None, None) => {
            let last = (vertex.0, vertex.1 + ARM);
            positions.insert(triple.last, last);
            positions.insert(triple.first, arm_at(vertex, last, degrees));
        }
        (Some(first), None) => {
            positions.insert(triple.last, arm_at(vertex, first, degrees));
        }
        (None, Some(last)) => {
            positions.insert(triple.first, arm_at(vertex, last, degrees));
        }
        (Some(_), Some(_)) => {}
    }
}

/// Point one arm length from `vertex`, rotated `degrees` away from `reference`.
fn arm_at(vertex: (f64, f64), reference: (f64, f64), degrees: f64) -> (f64, f64) {
    let (dx, dy) = (reference.0 - vertex.0, reference.1 - vertex.1);
    let len = (dx * dx + dy * dy).sqrt();
    let (ux, uy) = (dx / len, dy / len);
    let (sin, cos) = degrees.to_radians().sin_cos();
    (
        vertex.0 + ARM * (ux * cos - uy * sin),
        vertex.1 + ARM * (ux * sin + uy * cos),
    )
}
