mod config;
mod controller;
mod machine;
mod runner;
mod state;

pub use config::{SessionTiming, WorkoutConfig};
pub use controller::{RecordSink, SessionEvent, WorkoutController, WorkoutSnapshot};
pub use machine::{RepEvent, RepStateMachine};
pub use runner::{run_workout, AbortReason, FrameClock, ReplayClock, RunOutcome};
pub use state::{ActiveFeedback, RepPhase, RepState, SessionPhase};
