use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::{
    exercise::{extract_features, ExerciseProfile},
    feedback::{FeedbackEmitter, FeedbackEvent},
    models::{CompletedWorkoutRecord, SetResult},
    pose::PoseSnapshot,
};
use crate::{log_error, log_info};

use super::{
    config::{SessionTiming, WorkoutConfig},
    machine::{RepEvent, RepStateMachine},
    state::{ActiveFeedback, RepPhase, RepState, SessionPhase},
};

const ENABLE_LOGS: bool = true;

/// Receives the record of a workout that finished naturally.
pub trait RecordSink {
    fn save(&self, record: &CompletedWorkoutRecord) -> Result<()>;
}

/// Session-level outcome of one processed frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Rep(RepEvent),
    SetCompleted { set_index: u32, result: SetResult },
    RestEnded { next_set: u32 },
    WorkoutCompleted,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSnapshot {
    pub exercise: &'static str,
    pub phase: RepPhase,
    pub session_phase: SessionPhase,
    pub set_index: u32,
    pub total_sets: u32,
    pub target_reps: u32,
    pub total_reps: u32,
    pub good_reps: u32,
    pub bad_reps: u32,
    pub progress: f64,
    pub feedback: Option<ActiveFeedback>,
    /// Whole seconds left on the rest or finish countdown, rounded up.
    pub countdown_secs: Option<u64>,
    pub set_results: Vec<SetResult>,
}

/// Runs one workout: feeds frames to the rep machine and moves between
/// exercising, resting and finished.
pub struct WorkoutController {
    machine: RepStateMachine,
    config: WorkoutConfig,
    timing: SessionTiming,
    state: RepState,
    emitter: FeedbackEmitter,
    sink: Box<dyn RecordSink>,
    record: Option<CompletedWorkoutRecord>,
}

impl WorkoutController {
    pub fn new(
        profile: ExerciseProfile,
        config: WorkoutConfig,
        emitter: FeedbackEmitter,
        sink: Box<dyn RecordSink>,
        timing: SessionTiming,
    ) -> Result<Self> {
        profile
            .validate()
            .with_context(|| format!("invalid {} profile", profile.kind.as_str()))?;
        if config.target_reps == 0 || config.total_sets == 0 {
            bail!("target reps and total sets must be positive");
        }
        if !(timing.smoothing > 0.0 && timing.smoothing <= 1.0) {
            bail!("smoothing factor must be within (0, 1] (got {})", timing.smoothing);
        }

        log_info!(
            "starting {} workout: {} sets of {} reps, {}s rest",
            profile.kind.as_str(),
            config.total_sets,
            config.target_reps,
            config.rest_secs
        );

        Ok(Self {
            machine: RepStateMachine::new(profile, config.target_reps),
            config,
            timing,
            state: RepState::new(),
            emitter,
            sink,
            record: None,
        })
    }

    pub fn state(&self) -> &RepState {
        &self.state
    }

    pub fn config(&self) -> &WorkoutConfig {
        &self.config
    }

    /// Processes one frame. `pose` is `None` when no body was detected.
    pub fn process_frame(&mut self, pose: Option<&PoseSnapshot>, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        match self.state.session_phase {
            SessionPhase::Exercising => {
                let features = pose.and_then(|pose| extract_features(pose, self.machine.profile()));
                let raw = features.map_or(0.0, |features| features.progress);
                self.state.smooth_progress(raw, self.timing.smoothing);

                if let Some(features) = features {
                    let rep_events =
                        self.machine
                            .step(&mut self.state, &features, &self.emitter, now);
                    for event in rep_events {
                        if let RepEvent::Violation(violation) = event {
                            log_info!("set {}: {:?}", self.state.set_index, violation);
                        }
                        events.push(SessionEvent::Rep(event));
                        if event == RepEvent::SetTargetReached {
                            events.push(self.complete_set(now));
                        }
                    }
                }
            }
            SessionPhase::Resting => {
                let rested = self
                    .state
                    .rest_elapsed(now)
                    .is_some_and(|elapsed| elapsed >= self.config.rest_duration());
                if rested {
                    self.state.begin_next_set();
                    log_info!("rest over, starting set {}", self.state.set_index);
                    events.push(SessionEvent::RestEnded {
                        next_set: self.state.set_index,
                    });
                }
            }
            SessionPhase::Finished => {
                let counted_down = self
                    .state
                    .finish_elapsed(now)
                    .is_some_and(|elapsed| elapsed >= self.timing.finish_countdown);
                if counted_down && self.record.is_none() {
                    self.finalize();
                    events.push(SessionEvent::WorkoutCompleted);
                }
            }
        }

        self.state.expire_feedback(now, self.timing.feedback_display);
        events
    }

    pub fn snapshot(&self, now: Instant) -> WorkoutSnapshot {
        let countdown = match self.state.session_phase {
            SessionPhase::Exercising => None,
            SessionPhase::Resting => self
                .state
                .rest_elapsed(now)
                .map(|elapsed| self.config.rest_duration().saturating_sub(elapsed)),
            SessionPhase::Finished if self.record.is_none() => self
                .state
                .finish_elapsed(now)
                .map(|elapsed| self.timing.finish_countdown.saturating_sub(elapsed)),
            SessionPhase::Finished => None,
        };

        WorkoutSnapshot {
            exercise: self.machine.profile().kind.as_str(),
            phase: self.state.phase,
            session_phase: self.state.session_phase,
            set_index: self.state.set_index,
            total_sets: self.config.total_sets,
            target_reps: self.config.target_reps,
            total_reps: self.state.total_reps,
            good_reps: self.state.good_reps,
            bad_reps: self.state.bad_reps,
            progress: self.state.smoothed_progress,
            feedback: self.state.feedback.clone(),
            countdown_secs: countdown.map(ceil_secs),
            set_results: self.state.set_results.clone(),
        }
    }

    pub fn completed_record(&self) -> Option<&CompletedWorkoutRecord> {
        self.record.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.record.is_some()
    }

    /// Ends the workout early. Nothing is persisted; the sets finished so far
    /// are returned for reporting.
    pub fn abort(self) -> Vec<SetResult> {
        if self.record.is_none() {
            log_info!(
                "workout aborted during set {} after {} completed set(s)",
                self.state.set_index,
                self.state.set_results.len()
            );
        }
        self.state.set_results
    }

    fn complete_set(&mut self, now: Instant) -> SessionEvent {
        let result = self.state.record_set();
        let set_index = self.state.set_index;

        if set_index < self.config.total_sets {
            self.emitter.emit(FeedbackEvent::SetComplete);
            self.state.begin_rest(now);
            log_info!(
                "set {set_index}/{} complete ({} good, {} bad), resting {}s",
                self.config.total_sets,
                result.good,
                result.bad,
                self.config.rest_secs
            );
        } else {
            self.emitter.emit(FeedbackEvent::WorkoutComplete);
            self.state.begin_finish(now);
            log_info!(
                "final set complete ({} good, {} bad), finishing",
                result.good,
                result.bad
            );
        }

        SessionEvent::SetCompleted { set_index, result }
    }

    fn finalize(&mut self) {
        let record = CompletedWorkoutRecord::new(
            self.machine.profile().kind.as_str(),
            self.config.target_reps,
            self.config.total_sets,
            self.config.rest_secs,
            Utc::now(),
            self.state.set_results.clone(),
        );

        log_info!(
            "workout {} complete: {} good, {} bad over {} sets",
            record.id,
            record.total_good(),
            record.total_bad(),
            record.sets.len()
        );
        if let Err(err) = self.sink.save(&record) {
            log_error!("failed to save workout record {}: {err:#}", record.id);
        }

        self.record = Some(record);
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::Cue;
    use crate::testing::{pose_with_angles, RecordingCues, RecordingSink};
    use anyhow::anyhow;

    struct Harness {
        controller: WorkoutController,
        sink: RecordingSink,
        cues: RecordingCues,
        profile: ExerciseProfile,
        start: Instant,
    }

    impl Harness {
        fn squat(target_reps: u32, total_sets: u32, rest_secs: u32) -> Self {
            let profile = ExerciseProfile::squat();
            let sink = RecordingSink::default();
            let cues = RecordingCues::default();
            let controller = WorkoutController::new(
                profile.clone(),
                WorkoutConfig {
                    target_reps,
                    total_sets,
                    rest_secs,
                },
                FeedbackEmitter::new(Box::new(cues.clone())),
                Box::new(sink.clone()),
                SessionTiming::default(),
            )
            .unwrap();

            Self {
                controller,
                sink,
                cues,
                profile,
                start: Instant::now(),
            }
        }

        fn at(&self, millis: u64) -> Instant {
            self.start + Duration::from_millis(millis)
        }

        fn frame(&mut self, millis: u64, primary: f64, secondary: f64) -> Vec<SessionEvent> {
            let pose = pose_with_angles(&self.profile, primary, secondary);
            let now = self.at(millis);
            self.controller.process_frame(Some(&pose), now)
        }

        /// One clean rep spread over three frames starting at `millis`.
        fn good_rep(&mut self, millis: u64) {
            self.frame(millis, 175.0, 170.0);
            self.frame(millis + 100, 90.0, 170.0);
            self.frame(millis + 200, 178.0, 170.0);
        }
    }

    #[test]
    fn set_completion_starts_rest_and_keeps_counters_until_rest_ends() {
        let mut h = Harness::squat(2, 3, 30);
        h.good_rep(0);
        h.good_rep(1_000);

        let snapshot = h.controller.snapshot(h.at(1_200));
        assert_eq!(snapshot.session_phase, SessionPhase::Resting);
        assert_eq!(snapshot.set_results, vec![SetResult { good: 2, bad: 0 }]);
        assert_eq!(snapshot.countdown_secs, Some(30));

        // Reps during rest are ignored.
        h.good_rep(10_000);
        let snapshot = h.controller.snapshot(h.at(10_200));
        assert_eq!((snapshot.good_reps, snapshot.set_index), (2, 1));
        assert_eq!(snapshot.countdown_secs, Some(21));

        let events = h.frame(31_200, 175.0, 170.0);
        assert_eq!(events, vec![SessionEvent::RestEnded { next_set: 2 }]);
        let state = h.controller.state();
        assert_eq!(state.session_phase, SessionPhase::Exercising);
        assert_eq!((state.total_reps, state.good_reps, state.bad_reps), (0, 0, 0));
        assert_eq!(state.phase, RepPhase::Extended);
        assert_eq!(state.set_index, 2);
        assert_eq!(h.cues.played(), vec![Cue::GoodRep, Cue::SetComplete]);
    }

    #[test]
    fn single_set_workout_persists_one_record_after_countdown() {
        let mut h = Harness::squat(1, 1, 30);
        h.good_rep(0);
        assert_eq!(h.controller.state().session_phase, SessionPhase::Finished);

        h.frame(9_000, 175.0, 170.0);
        assert!(h.sink.saved().is_empty());
        assert_eq!(h.controller.snapshot(h.at(9_000)).countdown_secs, Some(2));

        let events = h.frame(10_200, 175.0, 170.0);
        assert_eq!(events, vec![SessionEvent::WorkoutCompleted]);
        h.frame(20_000, 175.0, 170.0);

        let saved = h.sink.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].exercise, "squat");
        assert_eq!(saved[0].sets, vec![SetResult { good: 1, bad: 0 }]);
        assert_eq!(h.controller.completed_record(), Some(&saved[0]));
        assert!(h.controller.is_complete());
        assert_eq!(h.cues.played(), vec![Cue::WorkoutComplete]);
    }

    #[test]
    fn bad_reps_do_not_complete_a_set() {
        let mut h = Harness::squat(1, 2, 30);
        h.frame(0, 175.0, 170.0);
        h.frame(100, 55.0, 170.0);
        h.frame(200, 178.0, 170.0);

        let state = h.controller.state();
        assert_eq!(state.session_phase, SessionPhase::Exercising);
        assert_eq!((state.total_reps, state.bad_reps), (1, 1));

        h.good_rep(3_000);
        assert_eq!(
            h.controller.state().set_results,
            vec![SetResult { good: 1, bad: 1 }]
        );
    }

    #[test]
    fn aborting_never_persists() {
        let mut h = Harness::squat(1, 1, 30);
        h.good_rep(0);
        h.frame(5_000, 175.0, 170.0);

        let sets = h.controller.abort();

        assert_eq!(sets, vec![SetResult { good: 1, bad: 0 }]);
        assert!(h.sink.saved().is_empty());
    }

    #[test]
    fn missing_pose_leaves_counters_alone_and_decays_progress() {
        let mut h = Harness::squat(5, 3, 30);
        h.frame(0, 175.0, 170.0);
        h.frame(100, 90.0, 170.0);
        let before = h.controller.state().clone();

        for i in 0..10 {
            let now = h.at(200 + i * 33);
            h.controller.process_frame(None, now);
        }

        let state = h.controller.state();
        assert_eq!(state.phase, before.phase);
        assert_eq!(state.total_reps, before.total_reps);
        assert!(state.smoothed_progress < before.smoothed_progress);
    }

    #[test]
    fn feedback_clears_after_display_time_even_without_pose() {
        let mut h = Harness::squat(5, 3, 30);
        h.good_rep(0);
        assert!(h.controller.state().feedback.is_some());

        let (at_ttl, past_ttl) = (h.at(2_200), h.at(2_201));
        h.controller.process_frame(None, at_ttl);
        assert!(h.controller.state().feedback.is_some());
        h.controller.process_frame(None, past_ttl);
        assert!(h.controller.state().feedback.is_none());
    }

    #[test]
    fn invalid_profile_is_rejected() {
        let mut profile = ExerciseProfile::squat();
        profile.extended_threshold = 90.0;
        let result = WorkoutController::new(
            profile,
            WorkoutConfig::default(),
            FeedbackEmitter::silent(),
            Box::new(RecordingSink::default()),
            SessionTiming::default(),
        );
        assert!(result.is_err());
    }

    struct FailingSink;

    impl RecordSink for FailingSink {
        fn save(&self, _record: &CompletedWorkoutRecord) -> Result<()> {
            Err(anyhow!("disk full"))
        }
    }

    #[test]
    fn sink_failure_still_completes_the_workout() {
        let profile = ExerciseProfile::squat();
        let mut controller = WorkoutController::new(
            profile.clone(),
            WorkoutConfig {
                target_reps: 1,
                total_sets: 1,
                rest_secs: 30,
            },
            FeedbackEmitter::silent(),
            Box::new(FailingSink),
            SessionTiming::default(),
        )
        .unwrap();
        let start = Instant::now();
        for (i, angle) in [175.0, 90.0, 178.0].into_iter().enumerate() {
            let pose = pose_with_angles(&profile, angle, 170.0);
            controller.process_frame(Some(&pose), start + Duration::from_millis(i as u64 * 100));
        }

        controller.process_frame(None, start + Duration::from_secs(11));

        assert!(controller.is_complete());
    }
}
