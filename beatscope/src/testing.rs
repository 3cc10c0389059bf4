// Recording fakes for the component seams. Test builds only.

use crate::audio_api::SoundSink;
use crate::sequencer::{DrumSound, Pitch};
use crate::viz::SignalTap;

#[derive(Clone, Debug, PartialEq)]
pub enum Hit {
    Drum { sound: DrumSound, time: f64, velocity: f32 },
    Note { pitch: Pitch, duration: f64, time: f64, velocity: f32 },
}

impl Hit {
    pub fn velocity(&self) -> f32 {
        match self {
            Hit::Drum { velocity, .. } | Hit::Note { velocity, .. } => *velocity,
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub hits: Vec<Hit>,
}

impl RecordingSink {
    pub fn drum_count(&self) -> usize {
        self.hits.iter().filter(|h| matches!(h, Hit::Drum { .. })).count()
    }

    pub fn note_count(&self) -> usize {
        self.hits.iter().filter(|h| matches!(h, Hit::Note { .. })).count()
    }
}

impl SoundSink for RecordingSink {
    fn trigger(&mut self, sound: DrumSound, time: f64, velocity: f32) {
        self.hits.push(Hit::Drum { sound, time, velocity });
    }

    fn trigger_note(&mut self, pitch: Pitch, duration: f64, time: f64, velocity: f32) {
        self.hits.push(Hit::Note { pitch, duration, time, velocity });
    }
}

// Hands out the same window every frame, or nothing at all.
#[derive(Debug, Default)]
pub struct FixedTap {
    pub frame: Option<Vec<f32>>,
}

impl FixedTap {
    pub fn constant(len: usize, value: f32) -> Self {
        Self { frame: Some(vec![value; len]) }
    }
}

impl SignalTap for FixedTap {
    fn sample_frame(&mut self) -> Option<&[f32]> {
        self.frame.as_deref()
    }
}
