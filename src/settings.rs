use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    exercise::{ExerciseKind, ExerciseProfile},
    feedback::Cue,
};
use crate::log_warn;

const ENABLE_LOGS: bool = true;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueSettings {
    pub enabled: bool,
    /// Playback volume in [0, 1].
    pub volume: f32,
    pub sounds: BTreeMap<Cue, PathBuf>,
}

impl Default for CueSettings {
    fn default() -> Self {
        let sounds = Cue::ALL
            .iter()
            .map(|cue| (*cue, default_sound_path(*cue)))
            .collect();
        Self {
            enabled: true,
            volume: 0.8,
            sounds,
        }
    }
}

impl CueSettings {
    pub fn sound_for(&self, cue: Cue) -> Option<&Path> {
        self.sounds.get(&cue).map(PathBuf::as_path)
    }
}

fn default_sound_path(cue: Cue) -> PathBuf {
    let name = match cue {
        Cue::TooDeep => "too_deep",
        Cue::StraightenBack => "straighten_back",
        Cue::KeepBodyStraight => "keep_body_straight",
        Cue::GoodRep => "good",
        Cue::BadRep => "bad_rep",
        Cue::SetComplete => "set_complete",
        Cue::WorkoutComplete => "workout_complete",
    };
    PathBuf::from("sound").join(format!("{name}.wav"))
}

/// Threshold overrides layered over a built-in exercise profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileTuning {
    pub extended_threshold: Option<f64>,
    pub contracted_threshold: Option<f64>,
    pub danger_threshold: Option<f64>,
    pub posture_threshold: Option<f64>,
    pub visibility_cutoff: Option<f64>,
}

impl ProfileTuning {
    fn apply(&self, mut profile: ExerciseProfile) -> ExerciseProfile {
        if let Some(value) = self.extended_threshold {
            profile.extended_threshold = value;
        }
        if let Some(value) = self.contracted_threshold {
            profile.contracted_threshold = value;
        }
        if let (Some(value), Some(danger)) = (self.danger_threshold, profile.danger.as_mut()) {
            danger.threshold = value;
        }
        if let Some(value) = self.posture_threshold {
            profile.posture.threshold = value;
        }
        if let Some(value) = self.visibility_cutoff {
            profile.visibility_cutoff = value;
        }
        profile
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOverrides {
    pub squat: Option<ProfileTuning>,
    pub push_up: Option<ProfileTuning>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub cues: CueSettings,
    pub profiles: ProfileOverrides,
}

pub struct SettingsStore {
    path: PathBuf,
    data: UserSettings,
}

impl SettingsStore {
    /// Loads settings from `path`. A missing file yields defaults, and so
    /// does a file that fails to parse (with a warning).
    pub fn load(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log_warn!("ignoring unparsable settings {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cues(&self) -> &CueSettings {
        &self.data.cues
    }

    /// The built-in profile for `kind` with any configured overrides. An
    /// override that produces an invalid profile is dropped.
    pub fn profile(&self, kind: ExerciseKind) -> ExerciseProfile {
        let builtin = ExerciseProfile::builtin(kind);
        let tuning = match kind {
            ExerciseKind::Squat => self.data.profiles.squat.as_ref(),
            ExerciseKind::PushUp => self.data.profiles.push_up.as_ref(),
        };
        let Some(tuning) = tuning else {
            return builtin;
        };

        let tuned = tuning.apply(builtin.clone());
        match tuned.validate() {
            Ok(()) => tuned,
            Err(err) => {
                log_warn!(
                    "ignoring {} overrides in {}: {err:#}",
                    kind.as_str(),
                    self.path.display()
                );
                builtin
            }
        }
    }

    /// Writes the default settings to `path`, refusing to replace a file.
    pub fn write_defaults(path: &Path) -> Result<()> {
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        persist(path, &UserSettings::default())
    }
}

fn persist(path: &Path, data: &UserSettings) -> Result<()> {
    let serialized = serde_json::to_string_pretty(data)?;
    fs::write(path, serialized)
        .with_context(|| format!("Failed to write settings to {}", path.display()))
}
