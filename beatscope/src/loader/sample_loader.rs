use std::path::{Path, PathBuf};

use crate::audio::SampleBuffer;
use crate::sequencer::DrumSound;

// <project_dir>/<sound>.wav
pub fn kit_path(project_dir: &Path, sound: DrumSound) -> PathBuf {
    project_dir.join(format!("{}.wav", sound.name()))
}

// Load a WAV from disk, prepare for registration with the engine
pub fn load(path: &Path, target_rate: u32) -> anyhow::Result<SampleBuffer> {
    SampleBuffer::load_wav(path, target_rate)
}

// Every kit sound that has a readable WAV next to the project. Sounds left
// out keep the engine's synthesized voice.
pub fn load_kit(project_dir: &Path, target_rate: u32) -> Vec<(DrumSound, SampleBuffer)> {
    let mut kit = Vec::new();
    for sound in DrumSound::ALL {
        let path = kit_path(project_dir, sound);
        if !path.exists() {
            tracing::debug!(%sound, "no sample, using synthesized voice");
            continue;
        }
        match load(&path, target_rate) {
            Ok(buffer) => {
                tracing::info!(%sound, frames = buffer.data.len(), "loaded sample {}", path.display());
                kit.push((sound, buffer));
            }
            Err(err) => tracing::warn!(%sound, "could not load {}: {err:#}", path.display()),
        }
    }
    kit
}
