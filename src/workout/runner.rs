use std::{
    thread,
    time::{Duration, Instant},
};

use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;

use crate::{
    models::{CompletedWorkoutRecord, SetResult},
    pose::PoseSource,
};
use crate::log_info;

use super::controller::{SessionEvent, WorkoutController, WorkoutSnapshot};

const ENABLE_LOGS: bool = true;

/// Assigns each frame its capture instant.
pub trait FrameClock {
    fn tick(&mut self) -> Instant;
}

/// Fixed-rate clock for recorded poses. In real-time mode `tick` sleeps until
/// the frame's instant so countdowns play out at wall-clock pace.
pub struct ReplayClock {
    start: Instant,
    interval: Duration,
    frame: u32,
    realtime: bool,
}

impl ReplayClock {
    pub fn new(fps: f64, realtime: bool) -> Result<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            bail!("frame rate must be positive (got {fps})");
        }
        Ok(Self {
            start: Instant::now(),
            interval: Duration::from_secs_f64(1.0 / fps),
            frame: 0,
            realtime,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl FrameClock for ReplayClock {
    fn tick(&mut self) -> Instant {
        let at = self.start + self.interval * self.frame;
        self.frame = self.frame.saturating_add(1);

        if self.realtime {
            let wait = at.saturating_duration_since(Instant::now());
            if !wait.is_zero() {
                thread::sleep(wait);
            }
        }
        at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    Cancelled,
    StreamEnded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(CompletedWorkoutRecord),
    Aborted {
        reason: AbortReason,
        frames: u64,
        sets: Vec<SetResult>,
    },
}

/// Feeds frames from `source` to `controller` until the workout completes,
/// the stream ends or `cancel` fires. `on_frame` sees every frame's events
/// and the resulting snapshot.
pub fn run_workout<S, C, F>(
    source: &mut S,
    mut controller: WorkoutController,
    clock: &mut C,
    cancel: &CancellationToken,
    mut on_frame: F,
) -> Result<RunOutcome>
where
    S: PoseSource + ?Sized,
    C: FrameClock + ?Sized,
    F: FnMut(&[SessionEvent], &WorkoutSnapshot),
{
    let mut frames: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            log_info!("stop requested after {frames} frames");
            return Ok(aborted(controller, AbortReason::Cancelled, frames));
        }

        let Some(frame) = source
            .next_frame()
            .with_context(|| format!("failed to read pose frame {}", frames + 1))?
        else {
            log_info!("pose stream ended after {frames} frames");
            return Ok(aborted(controller, AbortReason::StreamEnded, frames));
        };
        frames += 1;

        let now = clock.tick();
        let events = controller.process_frame(frame.snapshot(), now);
        on_frame(&events, &controller.snapshot(now));

        if let Some(record) = controller.completed_record() {
            return Ok(RunOutcome::Completed(record.clone()));
        }
    }
}

fn aborted(controller: WorkoutController, reason: AbortReason, frames: u64) -> RunOutcome {
    RunOutcome::Aborted {
        reason,
        frames,
        sets: controller.abort(),
    }
}
