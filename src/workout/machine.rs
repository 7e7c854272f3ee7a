use std::time::Instant;

use crate::{
    exercise::{ExerciseProfile, FormViolation, FrameFeatures, PostureGate},
    feedback::{FeedbackEmitter, FeedbackEvent},
};

use super::state::{RepPhase, RepState};

/// What a single frame did to the repetition state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepEvent {
    Violation(FormViolation),
    /// Extended → Contracted; a new repetition attempt began.
    Descended,
    GoodRep,
    BadRep,
    /// The good rep just counted completed the set's target.
    SetTargetReached,
}

/// Two-phase repetition counter driven once per frame.
pub struct RepStateMachine {
    profile: ExerciseProfile,
    target_reps: u32,
}

impl RepStateMachine {
    pub fn new(profile: ExerciseProfile, target_reps: u32) -> Self {
        Self {
            profile,
            target_reps,
        }
    }

    pub fn profile(&self) -> &ExerciseProfile {
        &self.profile
    }

    pub fn target_reps(&self) -> u32 {
        self.target_reps
    }

    /// Applies one frame's features: violation check, then descent, then
    /// rep completion.
    pub fn step(
        &self,
        state: &mut RepState,
        features: &FrameFeatures,
        emitter: &FeedbackEmitter,
        now: Instant,
    ) -> Vec<RepEvent> {
        let mut events = Vec::new();

        let violation = if state.feedback.is_none() && !state.mistake_flagged {
            self.detect_violation(state.phase, features)
        } else {
            None
        };
        if let Some(violation) = violation {
            state.mistake_flagged = true;
            let notice = emitter.emit(FeedbackEvent::Violation(violation));
            state.show_feedback(&notice, now);
            events.push(RepEvent::Violation(violation));
        }

        match state.phase {
            RepPhase::Extended if features.primary_angle < self.profile.contracted_threshold => {
                state.phase = RepPhase::Contracted;
                // A violation raised on this frame belongs to the rep starting here.
                if violation.is_none() {
                    state.mistake_flagged = false;
                    state.clear_feedback();
                }
                events.push(RepEvent::Descended);
            }
            RepPhase::Contracted if features.primary_angle > self.profile.extended_threshold => {
                state.phase = RepPhase::Extended;
                state.total_reps += 1;

                // The flag belongs to the rep that just ended.
                if std::mem::take(&mut state.mistake_flagged) {
                    state.bad_reps += 1;
                    emitter.emit(FeedbackEvent::BadRep);
                    events.push(RepEvent::BadRep);
                } else {
                    state.good_reps += 1;
                    if state.good_reps >= self.target_reps {
                        events.push(RepEvent::SetTargetReached);
                    } else {
                        let notice = emitter.emit(FeedbackEvent::GoodRep);
                        state.show_feedback(&notice, now);
                        events.push(RepEvent::GoodRep);
                    }
                }
            }
            _ => {}
        }

        events
    }

    fn detect_violation(&self, phase: RepPhase, features: &FrameFeatures) -> Option<FormViolation> {
        if let Some(danger) = &self.profile.danger {
            if features.primary_angle < danger.threshold {
                return Some(danger.violation);
            }
        }

        let posture_applies = match self.profile.posture_gate {
            PostureGate::Contracted => phase == RepPhase::Contracted,
            PostureGate::Always => true,
        };
        if posture_applies && features.secondary_angle < self.profile.posture.threshold {
            return Some(self.profile.posture.violation);
        }

        None
    }
}
