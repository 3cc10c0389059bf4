use std::f32::consts::PI;

use super::frame::StereoFrame;
use crate::pipeline::effects::{EffectKind, EffectLevels, DEFAULT_CUTOFF_HZ};

pub trait Effect: Send {
    fn process(&mut self, buf: &mut [StereoFrame]);
}

//low pass (RBJ biquad, q = 1/sqrt(2))
pub struct LowPass {
    sample_rate: f32,
    cutoff: f32,
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: StereoFrame,
    x2: StereoFrame,
    y1: StereoFrame,
    y2: StereoFrame,
}

impl LowPass {
    pub fn new(sample_rate: f32, cutoff: f32) -> Self {
        let mut f = Self {
            sample_rate,
            cutoff: 0.0,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: StereoFrame::zero(),
            x2: StereoFrame::zero(),
            y1: StereoFrame::zero(),
            y2: StereoFrame::zero(),
        };
        f.set_cutoff(cutoff);
        f
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    pub fn set_cutoff(&mut self, hz: f32) {
        // keep the corner under nyquist or the coefficients blow up
        let hz = hz.clamp(10.0, self.sample_rate * 0.45);
        self.cutoff = hz;
        let w0 = 2.0 * PI * hz / self.sample_rate;
        let alpha = w0.sin() / (2.0 * std::f32::consts::FRAC_1_SQRT_2);
        let cos = w0.cos();
        let a0 = 1.0 + alpha;
        self.b0 = (1.0 - cos) / 2.0 / a0;
        self.b1 = (1.0 - cos) / a0;
        self.b2 = self.b0;
        self.a1 = -2.0 * cos / a0;
        self.a2 = (1.0 - alpha) / a0;
    }
}

impl Effect for LowPass {
    fn process(&mut self, buf: &mut [StereoFrame]) {
        for f in buf.iter_mut() {
            let x = *f;
            let y = StereoFrame {
                left: self.b0 * x.left + self.b1 * self.x1.left + self.b2 * self.x2.left
                    - self.a1 * self.y1.left
                    - self.a2 * self.y2.left,
                right: self.b0 * x.right + self.b1 * self.x1.right + self.b2 * self.x2.right
                    - self.a1 * self.y1.right
                    - self.a2 * self.y2.right,
            };
            self.x2 = self.x1;
            self.x1 = x;
            self.y2 = self.y1;
            self.y1 = y;
            *f = y;
        }
    }
}

//distortion
pub struct Distortion {
    drive: f32,
    pub wet: f32,
}

impl Distortion {
    pub fn new(drive: f32, wet: f32) -> Self {
        Self {
            drive: drive.clamp(0.0, 1.0),
            wet: wet.clamp(0.0, 1.0),
        }
    }
}

impl Effect for Distortion {
    fn process(&mut self, buf: &mut [StereoFrame]) {
        let pre_gain = 1.0 + self.drive * 10.0;
        let dry = 1.0 - self.wet;
        for f in buf.iter_mut() {
            let l = (pre_gain * f.left.clamp(-1.0, 1.0)).tanh();
            let r = (pre_gain * f.right.clamp(-1.0, 1.0)).tanh();
            f.left = f.left * dry + l * self.wet;
            f.right = f.right * dry + r * self.wet;
        }
    }
}

//feedback delay
pub struct FeedbackDelay {
    line: Vec<StereoFrame>, // sized once, never grows
    pos: usize,
    feedback: f32,
    pub wet: f32,
}

impl FeedbackDelay {
    pub fn new(sample_rate: f32, delay_secs: f32, feedback: f32, wet: f32) -> Self {
        let len = ((sample_rate * delay_secs) as usize).max(1);
        Self {
            line: vec![StereoFrame::zero(); len],
            pos: 0,
            feedback: feedback.clamp(0.0, 0.95),
            wet: wet.clamp(0.0, 1.0),
        }
    }
}

impl Effect for FeedbackDelay {
    fn process(&mut self, buf: &mut [StereoFrame]) {
        let dry = 1.0 - self.wet;
        for f in buf.iter_mut() {
            let delayed = self.line[self.pos];
            self.line[self.pos] = StereoFrame {
                left: f.left + delayed.left * self.feedback,
                right: f.right + delayed.right * self.feedback,
            };
            self.pos = (self.pos + 1) % self.line.len();
            f.left = f.left * dry + delayed.left * self.wet;
            f.right = f.right * dry + delayed.right * self.wet;
        }
    }
}

//reverb (schroeder: parallel combs into series allpasses, mono send)
const COMB_TUNING: [f32; 4] = [0.0297, 0.0371, 0.0411, 0.0437];
const ALLPASS_TUNING: [f32; 2] = [0.005, 0.0017];
const ALLPASS_GAIN: f32 = 0.7;

struct Comb {
    line: Vec<f32>,
    pos: usize,
    feedback: f32,
}

impl Comb {
    fn tick(&mut self, x: f32) -> f32 {
        let y = self.line[self.pos];
        self.line[self.pos] = x + y * self.feedback;
        self.pos = (self.pos + 1) % self.line.len();
        y
    }
}

struct Allpass {
    line: Vec<f32>,
    pos: usize,
}

impl Allpass {
    fn tick(&mut self, x: f32) -> f32 {
        let delayed = self.line[self.pos];
        let y = delayed - ALLPASS_GAIN * x;
        self.line[self.pos] = x + ALLPASS_GAIN * y;
        self.pos = (self.pos + 1) % self.line.len();
        y
    }
}

pub struct Reverb {
    combs: Vec<Comb>,
    allpasses: Vec<Allpass>,
    pub wet: f32,
}

impl Reverb {
    // comb feedback is picked so each comb falls 60dB in `decay_secs`
    pub fn new(sample_rate: f32, decay_secs: f32, wet: f32) -> Self {
        let combs = COMB_TUNING
            .iter()
            .map(|&secs| {
                let len = ((sample_rate * secs) as usize).max(1);
                Comb {
                    line: vec![0.0; len],
                    pos: 0,
                    feedback: 10f32.powf(-3.0 * secs / decay_secs.max(0.1)),
                }
            })
            .collect();
        let allpasses = ALLPASS_TUNING
            .iter()
            .map(|&secs| Allpass {
                line: vec![0.0; ((sample_rate * secs) as usize).max(1)],
                pos: 0,
            })
            .collect();
        Self {
            combs,
            allpasses,
            wet: wet.clamp(0.0, 1.0),
        }
    }
}

impl Effect for Reverb {
    fn process(&mut self, buf: &mut [StereoFrame]) {
        let dry = 1.0 - self.wet;
        let n = self.combs.len() as f32;
        for f in buf.iter_mut() {
            let input = f.mid();
            let mut tail = self.combs.iter_mut().map(|c| c.tick(input)).sum::<f32>() / n;
            for ap in &mut self.allpasses {
                tail = ap.tick(tail);
            }
            f.left = f.left * dry + tail * self.wet;
            f.right = f.right * dry + tail * self.wet;
        }
    }
}

// The fixed master chain: filter -> distortion -> delay -> reverb.
pub struct EffectRack {
    pub filter: LowPass,
    pub distortion: Distortion,
    pub delay: FeedbackDelay,
    pub reverb: Reverb,
}

impl EffectRack {
    pub fn new(sample_rate: f32) -> Self {
        let levels = EffectLevels::default();
        Self {
            filter: LowPass::new(sample_rate, DEFAULT_CUTOFF_HZ),
            distortion: Distortion::new(0.4, levels.distortion),
            delay: FeedbackDelay::new(sample_rate, 0.25, 0.4, levels.delay),
            reverb: Reverb::new(sample_rate, 2.5, levels.reverb),
        }
    }

    pub fn set_wet(&mut self, kind: EffectKind, wet: f32) {
        let wet = wet.clamp(0.0, 1.0);
        match kind {
            EffectKind::Reverb => self.reverb.wet = wet,
            EffectKind::Delay => self.delay.wet = wet,
            EffectKind::Distortion => self.distortion.wet = wet,
        }
    }

    pub fn set_cutoff(&mut self, hz: f32) {
        self.filter.set_cutoff(hz);
    }
}

impl Effect for EffectRack {
    fn process(&mut self, buf: &mut [StereoFrame]) {
        self.filter.process(buf);
        self.distortion.process(buf);
        self.delay.process(buf);
        self.reverb.process(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse(len: usize) -> Vec<StereoFrame> {
        let mut buf = vec![StereoFrame::zero(); len];
        buf[0] = StereoFrame::mono(1.0);
        buf
    }

    #[test]
    fn dry_distortion_passes_through() {
        let mut d = Distortion::new(0.4, 0.0);
        let mut buf = vec![StereoFrame::mono(0.3); 4];
        d.process(&mut buf);
        assert!(buf.iter().all(|f| *f == StereoFrame::mono(0.3)));
    }

    #[test]
    fn wet_distortion_saturates() {
        let mut d = Distortion::new(1.0, 1.0);
        let mut buf = vec![StereoFrame::mono(0.5)];
        d.process(&mut buf);
        assert!(buf[0].left > 0.99 && buf[0].left <= 1.0);
    }

    #[test]
    fn delay_echoes_after_its_length() {
        let mut d = FeedbackDelay::new(100.0, 0.25, 0.4, 1.0);
        let mut buf = impulse(60);
        d.process(&mut buf);
        assert_eq!(buf[0].left, 0.0);
        assert_eq!(buf[25].left, 1.0);
        assert!((buf[50].left - 0.4).abs() < 1e-6);
    }

    #[test]
    fn low_pass_settles_to_dc_and_damps_nyquist() {
        let mut lp = LowPass::new(48_000.0, 1_000.0);
        let mut dc = vec![StereoFrame::mono(1.0); 2000];
        lp.process(&mut dc);
        assert!((dc[1999].left - 1.0).abs() < 1e-3);

        let mut lp = LowPass::new(48_000.0, 1_000.0);
        let mut alt: Vec<StereoFrame> =
            (0..2000).map(|i| StereoFrame::mono(if i % 2 == 0 { 1.0 } else { -1.0 })).collect();
        lp.process(&mut alt);
        assert!(alt[1999].left.abs() < 0.01);
    }

    #[test]
    fn cutoff_is_kept_below_nyquist() {
        let mut lp = LowPass::new(8_000.0, 1_000.0);
        lp.set_cutoff(20_000.0);
        assert!((lp.cutoff() - 3_600.0).abs() < 0.01);
    }

    #[test]
    fn reverb_tail_decays() {
        let rate = 8_000.0;
        let mut r = Reverb::new(rate, 0.5, 1.0);
        let mut buf = impulse(8_000);
        r.process(&mut buf);
        let energy = |s: &[StereoFrame]| s.iter().map(|f| f.left * f.left).sum::<f32>();
        let early = energy(&buf[0..2000]);
        let late = energy(&buf[6000..8000]);
        assert!(early > 0.0);
        assert!(late < early * 0.01);
    }

    #[test]
    fn rack_stays_finite() {
        let mut rack = EffectRack::new(44_100.0);
        rack.set_wet(EffectKind::Reverb, 1.0);
        rack.set_cutoff(500.0);
        let mut buf = impulse(4096);
        rack.process(&mut buf);
        assert!(buf.iter().all(|f| f.left.is_finite() && f.right.is_finite()));
    }
}
