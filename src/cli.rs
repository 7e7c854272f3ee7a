use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::exercise::ExerciseKind;

/// Pose-based repetition counter for squats and push-ups
#[derive(Parser, Debug)]
#[command(name = "formcoach")]
#[command(author, version, about = "Counts reps and checks form from pose landmarks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a workout against a recorded pose stream (JSON lines)
    Train {
        exercise: ExerciseKind,

        /// Reps per set (default 5)
        #[arg(allow_negative_numbers = true)]
        reps: Option<String>,

        /// Number of sets (default 3)
        #[arg(allow_negative_numbers = true)]
        sets: Option<String>,

        /// Rest between sets in seconds (default 30)
        #[arg(allow_negative_numbers = true)]
        rest: Option<String>,

        /// Pose recording, one JSON object per frame
        #[arg(long)]
        poses: PathBuf,

        /// Frame rate of the recording
        #[arg(long, default_value_t = 30.0)]
        fps: f64,

        /// Pace replay at wall-clock speed
        #[arg(long)]
        realtime: bool,

        #[arg(long, default_value = "formcoach.db")]
        db: PathBuf,

        #[arg(long, default_value = "formcoach.json")]
        settings: PathBuf,

        /// Disable audio cues
        #[arg(long)]
        mute: bool,
    },

    /// Show stored workouts for an exercise, newest first
    History {
        exercise: ExerciseKind,

        #[arg(long, default_value = "formcoach.db")]
        db: PathBuf,

        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    /// Write a settings file with the default cues and thresholds
    InitSettings { path: PathBuf },
}
