use anyhow::{anyhow, Context, Result};
use rodio::{OutputStream, OutputStreamHandle};
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, Sender},
        Mutex,
    },
    thread,
};

use crate::{
    feedback::{Cue, CueSink},
    settings::CueSettings,
};
use crate::{log_info, log_warn};

const ENABLE_LOGS: bool = true;

/// Plays cue sound files on a dedicated audio thread.
///
/// The output stream is opened on first use. Each cue gets its own detached
/// sink, so a new cue mixes over one that is still playing.
pub struct CuePlayer {
    settings: CueSettings,
    tx: Mutex<Option<Sender<PathBuf>>>,
}

impl CuePlayer {
    pub fn new(settings: CueSettings) -> Self {
        Self {
            settings,
            tx: Mutex::new(None),
        }
    }

    fn ensure_thread(&self) -> Result<Sender<PathBuf>> {
        let mut guard = self
            .tx
            .lock()
            .map_err(|_| anyhow!("cue player lock poisoned"))?;
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<PathBuf>();
        let volume = self.settings.volume.clamp(0.0, 1.0);

        // rodio's output stream is not Send, so it lives and dies on this thread.
        thread::Builder::new()
            .name("cue-player".to_string())
            .spawn(move || {
                let mut output: Option<(OutputStream, OutputStreamHandle)> = None;

                while let Ok(path) = rx.recv() {
                    if let Err(err) = play_file(&mut output, &path, volume) {
                        log_warn!("cue {} not played: {err:#}", path.display());
                    }
                }
                log_info!("cue player stopped");
            })
            .context("failed to spawn cue player thread")?;

        *guard = Some(tx.clone());
        Ok(tx)
    }
}

fn play_file(
    output: &mut Option<(OutputStream, OutputStreamHandle)>,
    path: &Path,
    volume: f32,
) -> Result<()> {
    if output.is_none() {
        let opened = OutputStream::try_default().context("Failed to create audio output stream")?;
        *output = Some(opened);
    }
    let Some((_, handle)) = output.as_ref() else {
        return Ok(());
    };

    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let sink = handle
        .play_once(BufReader::new(file))
        .context("failed to decode cue")?;
    sink.set_volume(volume);
    sink.detach();
    Ok(())
}

impl CueSink for CuePlayer {
    fn play(&self, cue: Cue) -> Result<()> {
        if !self.settings.enabled {
            return Ok(());
        }
        let Some(path) = self.settings.sound_for(cue) else {
            return Ok(());
        };

        let tx = self.ensure_thread()?;
        tx.send(path.to_path_buf())
            .map_err(|_| anyhow!("cue player thread has exited"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread_started(player: &CuePlayer) -> bool {
        player.tx.lock().unwrap().is_some()
    }

    #[test]
    fn disabled_cues_never_start_the_audio_thread() {
        let player = CuePlayer::new(CueSettings {
            enabled: false,
            ..CueSettings::default()
        });

        for cue in Cue::ALL {
            player.play(cue).unwrap();
        }
        assert!(!thread_started(&player));
    }

    #[test]
    fn unmapped_cue_is_skipped() {
        let mut settings = CueSettings::default();
        settings.sounds.clear();
        let player = CuePlayer::new(settings);

        player.play(Cue::GoodRep).unwrap();

        assert!(!thread_started(&player));
    }
}
