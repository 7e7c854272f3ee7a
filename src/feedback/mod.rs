//! Turns workout events into on-screen messages and audio cues.

use anyhow::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::exercise::FormViolation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackEvent {
    Violation(FormViolation),
    GoodRep,
    BadRep,
    SetComplete,
    WorkoutComplete,
}

/// Audio cue identifiers. Settings map each one to a sound file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    TooDeep,
    StraightenBack,
    KeepBodyStraight,
    GoodRep,
    BadRep,
    SetComplete,
    WorkoutComplete,
}

impl Cue {
    pub const ALL: [Cue; 7] = [
        Cue::TooDeep,
        Cue::StraightenBack,
        Cue::KeepBodyStraight,
        Cue::GoodRep,
        Cue::BadRep,
        Cue::SetComplete,
        Cue::WorkoutComplete,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Positive,
    Negative,
    Celebration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackNotice {
    pub event: FeedbackEvent,
    pub message: &'static str,
    pub severity: Severity,
    pub cue: Cue,
    /// Shown in the feedback slot and cleared after the display duration.
    /// Non-transient notices are announced by their cue (and overlay) only.
    pub transient: bool,
}

pub fn notice_for(event: FeedbackEvent) -> FeedbackNotice {
    let (message, severity, cue, transient) = match event {
        FeedbackEvent::Violation(FormViolation::TooDeep) => {
            ("TOO DEEP", Severity::Negative, Cue::TooDeep, true)
        }
        FeedbackEvent::Violation(FormViolation::StraightenBack) => {
            ("STRAIGHTEN BACK", Severity::Negative, Cue::StraightenBack, true)
        }
        FeedbackEvent::Violation(FormViolation::KeepBodyStraight) => {
            ("KEEP BODY STRAIGHT", Severity::Negative, Cue::KeepBodyStraight, true)
        }
        FeedbackEvent::GoodRep => ("GOOD", Severity::Positive, Cue::GoodRep, true),
        FeedbackEvent::BadRep => ("BAD REP", Severity::Negative, Cue::BadRep, false),
        FeedbackEvent::SetComplete => ("SET COMPLETE!", Severity::Positive, Cue::SetComplete, false),
        FeedbackEvent::WorkoutComplete => (
            "ALL SETS COMPLETE!!",
            Severity::Celebration,
            Cue::WorkoutComplete,
            false,
        ),
    };

    FeedbackNotice {
        event,
        message,
        severity,
        cue,
        transient,
    }
}

/// Plays audio cues without blocking the caller.
pub trait CueSink {
    fn play(&self, cue: Cue) -> Result<()>;
}

/// Cue sink that discards every cue.
pub struct SilentCues;

impl CueSink for SilentCues {
    fn play(&self, _cue: Cue) -> Result<()> {
        Ok(())
    }
}

pub struct FeedbackEmitter {
    sink: Box<dyn CueSink>,
}

impl FeedbackEmitter {
    pub fn new(sink: Box<dyn CueSink>) -> Self {
        Self { sink }
    }

    pub fn silent() -> Self {
        Self::new(Box::new(SilentCues))
    }

    /// Maps the event and fires its cue. Playback failures are logged only.
    pub fn emit(&self, event: FeedbackEvent) -> FeedbackNotice {
        let notice = notice_for(event);
        debug!("feedback {:?}: {}", notice.event, notice.message);
        if let Err(err) = self.sink.play(notice.cue) {
            warn!("failed to play cue {:?}: {err:#}", notice.cue);
        }
        notice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingCues;
    use anyhow::anyhow;

    #[test]
    fn violations_are_transient_negative_messages() {
        let notice = notice_for(FeedbackEvent::Violation(FormViolation::StraightenBack));
        assert_eq!(notice.message, "STRAIGHTEN BACK");
        assert_eq!(notice.severity, Severity::Negative);
        assert_eq!(notice.cue, Cue::StraightenBack);
        assert!(notice.transient);
    }

    #[test]
    fn set_and_workout_completion_are_not_transient() {
        assert!(!notice_for(FeedbackEvent::SetComplete).transient);
        let done = notice_for(FeedbackEvent::WorkoutComplete);
        assert!(!done.transient);
        assert_eq!(done.severity, Severity::Celebration);
    }

    #[test]
    fn every_cue_is_reachable_from_an_event() {
        let events = [
            FeedbackEvent::Violation(FormViolation::TooDeep),
            FeedbackEvent::Violation(FormViolation::StraightenBack),
            FeedbackEvent::Violation(FormViolation::KeepBodyStraight),
            FeedbackEvent::GoodRep,
            FeedbackEvent::BadRep,
            FeedbackEvent::SetComplete,
            FeedbackEvent::WorkoutComplete,
        ];
        let cues: Vec<Cue> = events.iter().map(|e| notice_for(*e).cue).collect();
        assert_eq!(cues, Cue::ALL.to_vec());
    }

    #[test]
    fn emitter_forwards_cue_to_sink() {
        let cues = RecordingCues::default();
        let emitter = FeedbackEmitter::new(Box::new(cues.clone()));

        let notice = emitter.emit(FeedbackEvent::GoodRep);

        assert_eq!(notice.message, "GOOD");
        assert_eq!(cues.played(), vec![Cue::GoodRep]);
    }

    struct BrokenSpeaker;

    impl CueSink for BrokenSpeaker {
        fn play(&self, _cue: Cue) -> Result<()> {
            Err(anyhow!("no output device"))
        }
    }

    #[test]
    fn playback_failure_still_returns_notice() {
        let emitter = FeedbackEmitter::new(Box::new(BrokenSpeaker));
        let notice = emitter.emit(FeedbackEvent::BadRep);
        assert_eq!(notice.cue, Cue::BadRep);
    }
}
