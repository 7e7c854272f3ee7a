use std::time::Duration;

use serde::Serialize;

use crate::log_warn;

const ENABLE_LOGS: bool = true;

/// Per-workout targets supplied at launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutConfig {
    pub target_reps: u32,
    pub total_sets: u32,
    pub rest_secs: u32,
}

impl Default for WorkoutConfig {
    fn default() -> Self {
        Self {
            target_reps: 5,
            total_sets: 3,
            rest_secs: 30,
        }
    }
}

impl WorkoutConfig {
    /// Parses launch arguments. Each value that is missing, unparsable or
    /// not positive falls back to its own default.
    pub fn from_raw(reps: Option<&str>, sets: Option<&str>, rest: Option<&str>) -> Self {
        let defaults = Self::default();
        Self {
            target_reps: positive_or("reps", reps, defaults.target_reps),
            total_sets: positive_or("sets", sets, defaults.total_sets),
            rest_secs: positive_or("rest", rest, defaults.rest_secs),
        }
    }

    pub fn rest_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.rest_secs))
    }
}

fn positive_or(name: &str, raw: Option<&str>, default: u32) -> u32 {
    let Some(raw) = raw else {
        return default;
    };

    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => u32::try_from(value).unwrap_or_else(|_| {
            log_warn!("{name}={value} is too large, using default {default}");
            default
        }),
        Ok(value) => {
            log_warn!("{name}={value} must be positive, using default {default}");
            default
        }
        Err(_) => {
            log_warn!("{name}={raw:?} is not a number, using default {default}");
            default
        }
    }
}

/// Clock-driven behaviour shared by every workout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionTiming {
    /// How long a transient feedback message stays visible.
    pub feedback_display: Duration,
    /// Delay between the final set and the completed record.
    pub finish_countdown: Duration,
    /// Weight of the newest raw progress sample.
    pub smoothing: f64,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            feedback_display: Duration::from_secs(2),
            finish_countdown: Duration::from_secs(10),
            smoothing: 0.2,
        }
    }
}
