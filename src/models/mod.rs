mod workout;

pub use workout::{CompletedWorkoutRecord, SetResult};
