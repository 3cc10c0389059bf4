use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::sequencer::Pitch;

const HARMONICITY: f32 = 3.0;
const FM_INDEX: f32 = 10.0;
const MEMBRANE_OCTAVES: f32 = 2.0;
const MEMBRANE_SWEEP_SECS: f32 = 0.05;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthType {
    #[default]
    Basic,
    Fm,
    Am,
    Membrane,
}

impl SynthType {
    pub const ALL: [SynthType; 4] = [SynthType::Basic, SynthType::Fm, SynthType::Am, SynthType::Membrane];

    pub fn label(self) -> &'static str {
        match self {
            SynthType::Basic => "BASIC",
            SynthType::Fm => "FM",
            SynthType::Am => "AM",
            SynthType::Membrane => "MEMBR",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SynthType::Basic => SynthType::Fm,
            SynthType::Fm => SynthType::Am,
            SynthType::Am => SynthType::Membrane,
            SynthType::Membrane => SynthType::Basic,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeParam {
    Attack,
    Decay,
    Sustain,
    Release,
}

impl EnvelopeParam {
    // sustain is a level, the rest are seconds
    pub fn range(self) -> (f32, f32) {
        match self {
            EnvelopeParam::Sustain => (0.0, 1.0),
            _ => (0.001, 4.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for Adsr {
    fn default() -> Self {
        Self { attack: 0.1, decay: 0.2, sustain: 0.5, release: 0.8 }
    }
}

impl Adsr {
    pub fn for_type(synth: SynthType) -> Self {
        match synth {
            SynthType::Membrane => Self { attack: 0.01, decay: 0.2, sustain: 0.2, release: 1.0 },
            _ => Self::default(),
        }
    }

    pub fn get(&self, param: EnvelopeParam) -> f32 {
        match param {
            EnvelopeParam::Attack => self.attack,
            EnvelopeParam::Decay => self.decay,
            EnvelopeParam::Sustain => self.sustain,
            EnvelopeParam::Release => self.release,
        }
    }

    pub fn set(&mut self, param: EnvelopeParam, value: f32) {
        let (lo, hi) = param.range();
        let value = value.clamp(lo, hi);
        match param {
            EnvelopeParam::Attack => self.attack = value,
            EnvelopeParam::Decay => self.decay = value,
            EnvelopeParam::Sustain => self.sustain = value,
            EnvelopeParam::Release => self.release = value,
        }
    }

    // Level at `held` seconds into a gate that is still open.
    fn gate_level(&self, held: f32) -> f32 {
        if held < self.attack {
            held / self.attack
        } else if held < self.attack + self.decay {
            let t = (held - self.attack) / self.decay;
            1.0 - t * (1.0 - self.sustain)
        } else {
            self.sustain
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Stage {
    Gate,
    Release { from: f32, elapsed: f32 },
    Done,
}

#[derive(Clone, Copy, Debug)]
pub struct SynthVoice {
    kind: SynthType,
    env: Adsr,
    freq: f32,
    gain: f32,
    carrier_phase: f32,
    mod_phase: f32,
    age: f32,        // seconds since note on
    gate_secs: f32,  // how long the key is held
    stage: Stage,
}

#[inline]
fn square(phase: f32) -> f32 {
    if phase < 0.5 { 1.0 } else { -1.0 }
}

impl SynthVoice {
    pub fn new(kind: SynthType, env: Adsr, pitch: Pitch, duration: f32, velocity: f32) -> Self {
        Self {
            kind,
            env,
            freq: pitch.freq(),
            gain: velocity.clamp(0.0, 1.0),
            carrier_phase: 0.0,
            mod_phase: 0.0,
            age: 0.0,
            gate_secs: duration.max(0.0),
            stage: Stage::Gate,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.stage != Stage::Done
    }

    pub fn release(&mut self) {
        if let Stage::Gate = self.stage {
            self.stage = Stage::Release { from: self.env.gate_level(self.age), elapsed: 0.0 };
        }
    }

    fn envelope(&mut self, dt: f32) -> f32 {
        match self.stage {
            Stage::Gate => {
                if self.age >= self.gate_secs {
                    self.release();
                    return self.envelope(dt);
                }
                self.env.gate_level(self.age)
            }
            Stage::Release { from, elapsed } => {
                if elapsed >= self.env.release {
                    self.stage = Stage::Done;
                    return 0.0;
                }
                self.stage = Stage::Release { from, elapsed: elapsed + dt };
                from * (1.0 - elapsed / self.env.release)
            }
            Stage::Done => 0.0,
        }
    }

    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        if !self.is_alive() {
            return 0.0;
        }
        let dt = 1.0 / sample_rate;
        let level = self.envelope(dt);

        // phases are kept in cycles [0, 1)
        let (osc, carrier_freq) = match self.kind {
            SynthType::Basic => ((self.carrier_phase * TAU).sin(), self.freq),
            SynthType::Fm => {
                let m = square(self.mod_phase) * FM_INDEX / TAU;
                (((self.carrier_phase + m) * TAU).sin(), self.freq)
            }
            SynthType::Am => {
                let m = 0.5 * (1.0 + square(self.mod_phase));
                ((self.carrier_phase * TAU).sin() * m, self.freq)
            }
            SynthType::Membrane => {
                let sweep = (1.0 - self.age / MEMBRANE_SWEEP_SECS).max(0.0);
                let f = self.freq * 2f32.powf(MEMBRANE_OCTAVES * sweep);
                ((self.carrier_phase * TAU).sin(), f)
            }
        };

        self.carrier_phase = (self.carrier_phase + carrier_freq * dt).fract();
        self.mod_phase = (self.mod_phase + self.freq * HARMONICITY * dt).fract();
        self.age += dt;

        osc * level * self.gain
    }
}
