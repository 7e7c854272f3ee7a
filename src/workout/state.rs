use serde::Serialize;
use std::time::{Duration, Instant};

use crate::{
    feedback::{FeedbackNotice, Severity},
    models::SetResult,
};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum RepPhase {
    /// Top position; no repetition in progress.
    #[default]
    Extended,
    Contracted,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    #[default]
    Exercising,
    Resting,
    Finished,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveFeedback {
    pub message: &'static str,
    pub severity: Severity,
    #[serde(skip)]
    pub shown_at: Instant,
}

/// Mutable per-workout state, owned by the workout controller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepState {
    pub phase: RepPhase,
    pub total_reps: u32,
    pub good_reps: u32,
    pub bad_reps: u32,
    /// 1-based index of the set in progress.
    pub set_index: u32,
    pub mistake_flagged: bool,
    pub feedback: Option<ActiveFeedback>,
    pub smoothed_progress: f64,
    pub session_phase: SessionPhase,
    pub set_results: Vec<SetResult>,
    #[serde(skip)]
    pub rest_started_at: Option<Instant>,
    #[serde(skip)]
    pub finish_started_at: Option<Instant>,
}

impl Default for RepState {
    fn default() -> Self {
        Self {
            phase: RepPhase::Extended,
            total_reps: 0,
            good_reps: 0,
            bad_reps: 0,
            set_index: 1,
            mistake_flagged: false,
            feedback: None,
            smoothed_progress: 0.0,
            session_phase: SessionPhase::Exercising,
            set_results: Vec::new(),
            rest_started_at: None,
            finish_started_at: None,
        }
    }
}

impl RepState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_feedback(&mut self, notice: &FeedbackNotice, now: Instant) {
        self.feedback = Some(ActiveFeedback {
            message: notice.message,
            severity: notice.severity,
            shown_at: now,
        });
    }

    pub fn clear_feedback(&mut self) {
        self.feedback = None;
    }

    /// Clears the active message once it has been visible longer than `ttl`.
    pub fn expire_feedback(&mut self, now: Instant, ttl: Duration) -> bool {
        let expired = self
            .feedback
            .as_ref()
            .is_some_and(|active| now.saturating_duration_since(active.shown_at) > ttl);
        if expired {
            self.feedback = None;
        }
        expired
    }

    /// Exponential smoothing of the raw progress, kept within [0, 100].
    pub fn smooth_progress(&mut self, raw: f64, factor: f64) {
        let raw = raw.clamp(0.0, 100.0);
        let next = (1.0 - factor) * self.smoothed_progress + factor * raw;
        self.smoothed_progress = next.clamp(0.0, 100.0);
    }

    /// Appends the current set's counts to the results.
    pub fn record_set(&mut self) -> SetResult {
        let result = SetResult {
            good: self.good_reps,
            bad: self.bad_reps,
        };
        self.set_results.push(result);
        result
    }

    pub fn begin_rest(&mut self, now: Instant) {
        self.session_phase = SessionPhase::Resting;
        self.rest_started_at = Some(now);
    }

    pub fn begin_finish(&mut self, now: Instant) {
        self.session_phase = SessionPhase::Finished;
        self.finish_started_at = Some(now);
    }

    pub fn begin_next_set(&mut self) {
        self.session_phase = SessionPhase::Exercising;
        self.total_reps = 0;
        self.good_reps = 0;
        self.bad_reps = 0;
        self.set_index += 1;
        self.phase = RepPhase::Extended;
        self.mistake_flagged = false;
        self.feedback = None;
        self.rest_started_at = None;
    }

    pub fn rest_elapsed(&self, now: Instant) -> Option<Duration> {
        self.rest_started_at
            .map(|anchor| now.saturating_duration_since(anchor))
    }

    pub fn finish_elapsed(&self, now: Instant) -> Option<Duration> {
        self.finish_started_at
            .map(|anchor| now.saturating_duration_since(anchor))
    }
}
