// Idle/ambient layer: a random drum hit once per beat and, now and then,
// the next chord of a fixed I-IV-V-vi loop.

use rand::Rng;
use tracing::info;

use crate::audio_api::SoundSink;
use super::pitch::Pitch;
use super::sound::DrumSound;
use super::transport::{Clock, ScheduleHandle, Subdivision};

pub const CHORD_PROBABILITY: f64 = 0.3;

pub type Chord = [Pitch; 3];

// C3-E3-G3, F3-A3-C4, G3-B3-D4, A3-C4-E4
pub fn default_progression() -> Vec<Chord> {
    vec![
        [Pitch(48), Pitch(52), Pitch(55)],
        [Pitch(53), Pitch(57), Pitch(60)],
        [Pitch(55), Pitch(59), Pitch(62)],
        [Pitch(57), Pitch(60), Pitch(64)],
    ]
}

pub struct AutoComposer<R: Rng> {
    rng: R,
    sounds: Vec<DrumSound>,
    progression: Vec<Chord>,
    chord_index: usize,
    next_trigger_time: f64,
    schedule: Option<ScheduleHandle>, // Some while active
}

impl<R: Rng> AutoComposer<R> {
    pub fn new(rng: R, sounds: Vec<DrumSound>, progression: Vec<Chord>) -> Self {
        Self {
            rng,
            sounds,
            progression,
            chord_index: 0,
            next_trigger_time: 0.0,
            schedule: None,
        }
    }

    pub fn with_defaults(rng: R) -> Self {
        Self::new(rng, DrumSound::ALL.to_vec(), default_progression())
    }

    pub fn is_active(&self) -> bool {
        self.schedule.is_some()
    }

    pub fn chord_index(&self) -> usize {
        self.chord_index
    }

    #[cfg(test)]
    pub fn next_trigger_time(&self) -> f64 {
        self.next_trigger_time
    }

    pub fn owns(&self, handle: ScheduleHandle) -> bool {
        self.schedule == Some(handle)
    }

    pub fn toggle(&mut self, clock: &mut dyn Clock) {
        match self.schedule.take() {
            Some(handle) => {
                clock.cancel(handle);
                info!("auto composer off");
            }
            None => {
                self.next_trigger_time = clock.now();
                self.schedule = Some(clock.schedule_repeating(Subdivision::Sixteenth));
                info!("auto composer on");
            }
        }
    }

    // Checked every sixteenth; only does something once a beat is due.
    pub fn on_tick(&mut self, time: f64, bpm: f64, sink: &mut dyn SoundSink) {
        if !self.is_active() || self.sounds.is_empty() {
            return;
        }
        if time < self.next_trigger_time {
            return;
        }

        let sound = self.sounds[self.rng.gen_range(0..self.sounds.len())];
        let velocity = self.velocity();
        sink.trigger(sound, time, velocity);

        if !self.progression.is_empty() && self.rng.gen_bool(CHORD_PROBABILITY) {
            let chord = self.progression[self.chord_index];
            let notes = chord.map(|pitch| (pitch, self.velocity()));
            sink.trigger_chord(&notes, Subdivision::Eighth.seconds(bpm), time);
            self.chord_index = (self.chord_index + 1) % self.progression.len();
        }

        self.next_trigger_time = time + 60.0 / bpm;
    }

    fn velocity(&mut self) -> f32 {
        self.rng.gen_range(0.5..=1.0)
    }
}
