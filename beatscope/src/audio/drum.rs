// Synthesized stand-ins for the drum kit, used for any sound that has no
// WAV registered.

use std::f32::consts::TAU;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::sequencer::DrumSound;

#[derive(Clone, Debug)]
pub struct SynthDrum {
    sound: DrumSound,
    gain: f32,
    age: f32,
    phase: f32,
    rng: SmallRng,
    hp_prev_in: f32,
    hp_prev_out: f32,
}

impl SynthDrum {
    pub fn new(sound: DrumSound, gain: f32, seed: u64) -> Self {
        Self {
            sound,
            gain,
            age: 0.0,
            phase: 0.0,
            rng: SmallRng::seed_from_u64(seed),
            hp_prev_in: 0.0,
            hp_prev_out: 0.0,
        }
    }

    pub fn length_secs(sound: DrumSound) -> f32 {
        match sound {
            DrumSound::Kick => 0.5,
            DrumSound::Snare => 0.25,
            DrumSound::Hihat => 0.08,
            DrumSound::Clap => 0.3,
            DrumSound::Tom => 0.4,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.age < Self::length_secs(self.sound)
    }

    // one-pole high pass; takes the body out of the noise for hats
    fn high_pass(&mut self, x: f32) -> f32 {
        let y = 0.9 * (self.hp_prev_out + x - self.hp_prev_in);
        self.hp_prev_in = x;
        self.hp_prev_out = y;
        y
    }

    fn noise(&mut self) -> f32 {
        self.rng.gen_range(-1.0..=1.0)
    }

    fn tone(&mut self, freq: f32, dt: f32) -> f32 {
        self.phase = (self.phase + freq * dt).fract();
        (self.phase * TAU).sin()
    }

    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        if !self.is_alive() {
            return 0.0;
        }
        let dt = 1.0 / sample_rate;
        let t = self.age;
        let out = match self.sound {
            DrumSound::Kick => {
                // membrane: 10 octaves down to C1 over 50ms
                let sweep = (1.0 - t / 0.05).max(0.0);
                let freq = 32.7 * 2f32.powf(10.0 * sweep * sweep);
                self.tone(freq, dt) * (-t * 8.0).exp()
            }
            DrumSound::Snare => {
                let body = self.tone(180.0, dt) * (-t * 30.0).exp() * 0.5;
                body + self.noise() * (-t * 18.0).exp() * 0.6
            }
            DrumSound::Hihat => {
                let n = self.noise();
                self.high_pass(n) * (-t * 60.0).exp()
            }
            DrumSound::Clap => {
                // three quick bursts then a tail
                let burst = (t * 100.0) as u32;
                let local = t - burst as f32 * 0.01;
                let env = if burst < 3 { (-local * 300.0).exp() } else { (-(t - 0.03) * 20.0).exp() * 0.6 };
                let n = self.noise();
                self.high_pass(n) * env
            }
            DrumSound::Tom => {
                let freq = 80.0 + 120.0 * (-t * 12.0).exp();
                self.tone(freq, dt) * (-t * 9.0).exp()
            }
        };
        self.age += dt;
        out * self.gain
    }
}
