pub use crate::audio::{EnvelopeParam, SampleBuffer, SynthType};
pub use crate::pipeline::effects::EffectKind;
use crate::sequencer::{DrumSound, Pitch};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrumTrigger {
    pub sound: DrumSound,
    pub time: f64, // engine clock, seconds
    pub velocity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteTrigger {
    pub pitch: Pitch,
    pub duration: f64,
    pub time: f64,
    pub velocity: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AudioCommand {
    // The engine can't load files (interrupts thread), so the loader decodes
    // the WAV up front and hands the finished buffer over
    RegisterSample { sound: DrumSound, buffer: SampleBuffer },

    // timed; held by the engine until its clock reaches `time`
    TriggerDrum(DrumTrigger),
    TriggerNote(NoteTrigger),

    ReleaseAll,
    SetSynthType(SynthType),
    SetEnvelope(EnvelopeParam, f32),
    SetEffectWet(EffectKind, f32),
    SetFilterCutoff(f32),
    SetBeatVolume(f32),
}

// Where the sequencer and the auto composer send their hits. Delivery is
// best effort: a hit that can't be delivered is simply lost.
pub trait SoundSink {
    fn trigger(&mut self, sound: DrumSound, time: f64, velocity: f32);
    fn trigger_note(&mut self, pitch: Pitch, duration: f64, time: f64, velocity: f32);

    // each note carries its own velocity
    fn trigger_chord(&mut self, notes: &[(Pitch, f32)], duration: f64, time: f64) {
        for &(pitch, velocity) in notes {
            self.trigger_note(pitch, duration, time, velocity);
        }
    }
}

// Collects commands during one controller call; main drains it into the
// audio channel afterwards.
#[derive(Debug, Default)]
pub struct CommandOutbox {
    cmds: Vec<AudioCommand>,
}

impl CommandOutbox {
    pub fn push(&mut self, cmd: AudioCommand) {
        self.cmds.push(cmd);
    }

    pub fn take(&mut self) -> Vec<AudioCommand> {
        std::mem::take(&mut self.cmds)
    }
}

impl SoundSink for CommandOutbox {
    fn trigger(&mut self, sound: DrumSound, time: f64, velocity: f32) {
        self.push(AudioCommand::TriggerDrum(DrumTrigger { sound, time, velocity }));
    }

    fn trigger_note(&mut self, pitch: Pitch, duration: f64, time: f64, velocity: f32) {
        self.push(AudioCommand::TriggerNote(NoteTrigger { pitch, duration, time, velocity }));
    }
}
