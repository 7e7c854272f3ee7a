pub mod audio;
pub mod cli;
pub mod db;
pub mod exercise;
pub mod feedback;
pub mod geometry;
pub mod models;
pub mod pose;
pub mod settings;
mod utils;
pub mod workout;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use std::{path::PathBuf, thread};
use tokio_util::sync::CancellationToken;

use audio::CuePlayer;
use cli::{Cli, Commands};
use db::Database;
use exercise::ExerciseKind;
use feedback::{notice_for, FeedbackEmitter, FeedbackEvent};
use pose::ReplayPoseSource;
use settings::SettingsStore;
use workout::{
    run_workout, ReplayClock, RepEvent, RunOutcome, SessionEvent, SessionTiming, WorkoutConfig,
    WorkoutController, WorkoutSnapshot,
};

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    match Cli::parse().command {
        Commands::Train {
            exercise,
            reps,
            sets,
            rest,
            poses,
            fps,
            realtime,
            db,
            settings,
            mute,
        } => {
            let config = WorkoutConfig::from_raw(reps.as_deref(), sets.as_deref(), rest.as_deref());
            let replay = ReplaySettings {
                poses,
                fps,
                realtime,
            };
            train(exercise, config, replay, db, settings, mute)
        }
        Commands::History { exercise, db, limit } => history(exercise, db, limit),
        Commands::InitSettings { path } => {
            SettingsStore::write_defaults(&path)?;
            println!("wrote default settings to {}", path.display());
            Ok(())
        }
    }
}

struct ReplaySettings {
    poses: PathBuf,
    fps: f64,
    realtime: bool,
}

fn train(
    exercise: ExerciseKind,
    config: WorkoutConfig,
    replay: ReplaySettings,
    db_path: PathBuf,
    settings_path: PathBuf,
    mute: bool,
) -> Result<()> {
    let settings = SettingsStore::load(settings_path)?;
    let database = Database::new(db_path)?;

    let emitter = if mute {
        FeedbackEmitter::silent()
    } else {
        FeedbackEmitter::new(Box::new(CuePlayer::new(settings.cues().clone())))
    };
    let controller = WorkoutController::new(
        settings.profile(exercise),
        config,
        emitter,
        Box::new(database.clone()),
        SessionTiming::default(),
    )?;

    let mut source = ReplayPoseSource::open(&replay.poses)?;
    let mut clock = ReplayClock::new(replay.fps, replay.realtime)?;
    let cancel = CancellationToken::new();
    watch_for_interrupt(cancel.clone())?;

    let outcome = run_workout(&mut source, controller, &mut clock, &cancel, print_events)?;

    match outcome {
        RunOutcome::Completed(record) => {
            println!(
                "workout saved: {} good, {} bad over {} sets",
                record.total_good(),
                record.total_bad(),
                record.sets.len()
            );
        }
        RunOutcome::Aborted {
            reason,
            frames,
            sets,
        } => {
            println!(
                "workout not saved ({reason:?} after {frames} frames, {} set(s) finished)",
                sets.len()
            );
        }
    }

    // Dropping the last handle drains queued writes before the worker exits.
    drop(database);
    Ok(())
}

fn print_events(events: &[SessionEvent], snapshot: &WorkoutSnapshot) {
    for event in events {
        match event {
            SessionEvent::Rep(RepEvent::Violation(violation)) => {
                println!("  ! {}", notice_for(FeedbackEvent::Violation(*violation)).message);
            }
            SessionEvent::Rep(RepEvent::GoodRep | RepEvent::SetTargetReached) => {
                println!(
                    "  rep {} good ({}/{})",
                    snapshot.total_reps, snapshot.good_reps, snapshot.target_reps
                );
            }
            SessionEvent::Rep(RepEvent::BadRep) => {
                println!("  rep {} bad", snapshot.total_reps);
            }
            SessionEvent::Rep(RepEvent::Descended) => {}
            SessionEvent::SetCompleted { set_index, result } => {
                let done = if *set_index == snapshot.total_sets {
                    FeedbackEvent::WorkoutComplete
                } else {
                    FeedbackEvent::SetComplete
                };
                println!(
                    "{} set {set_index}/{}: {} good, {} bad",
                    notice_for(done).message,
                    snapshot.total_sets,
                    result.good,
                    result.bad
                );
            }
            SessionEvent::RestEnded { next_set } => println!("set {next_set} starting"),
            SessionEvent::WorkoutCompleted => println!("workout complete"),
        }
    }
}

/// Cancels `token` on Ctrl-C.
fn watch_for_interrupt(token: CancellationToken) -> Result<()> {
    thread::Builder::new()
        .name("ctrl-c".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("Failed to start signal runtime: {err}");
                    return;
                }
            };
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("interrupt received, stopping workout");
                    token.cancel();
                }
            });
        })
        .context("failed to spawn interrupt watcher")?;
    Ok(())
}

fn history(exercise: ExerciseKind, db_path: PathBuf, limit: u32) -> Result<()> {
    let database = Database::new(db_path)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    let records =
        runtime.block_on(database.list_records_by_exercise(exercise.as_str(), limit))?;
    if records.is_empty() {
        println!(
            "no {} workouts recorded in {}",
            exercise.as_str(),
            database.path().display()
        );
        return Ok(());
    }

    for record in records {
        let sets: Vec<String> = record
            .sets
            .iter()
            .map(|set| format!("{}/{}", set.good, set.bad))
            .collect();
        println!(
            "{}  {}x{} rest {}s  good/bad per set: {}",
            record.recorded_at.format("%Y-%m-%d %H:%M"),
            record.total_sets,
            record.target_reps,
            record.rest_secs,
            sets.join(" ")
        );
    }
    Ok(())
}
