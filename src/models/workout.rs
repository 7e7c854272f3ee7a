use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Good and bad rep counts of one completed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetResult {
    pub good: u32,
    pub bad: u32,
}

/// A workout that ran through its final set and finish countdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedWorkoutRecord {
    pub id: String,
    pub exercise: String,
    pub target_reps: u32,
    pub total_sets: u32,
    pub rest_secs: u32,
    pub recorded_at: DateTime<Utc>,
    pub sets: Vec<SetResult>,
}

impl CompletedWorkoutRecord {
    pub fn new(
        exercise: &str,
        target_reps: u32,
        total_sets: u32,
        rest_secs: u32,
        recorded_at: DateTime<Utc>,
        sets: Vec<SetResult>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            exercise: exercise.to_string(),
            target_reps,
            total_sets,
            rest_secs,
            recorded_at,
            sets,
        }
    }

    pub fn total_good(&self) -> u32 {
        self.sets.iter().map(|set| set.good).sum()
    }

    pub fn total_bad(&self) -> u32 {
        self.sets.iter().map(|set| set.bad).sum()
    }
}
