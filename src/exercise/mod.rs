pub mod features;
pub mod profile;

pub use features::{extract_features, progress_percent, FrameFeatures};
pub use profile::{
    AngleLimit, ExerciseKind, ExerciseProfile, FormViolation, JointTriple, PostureGate,
};
