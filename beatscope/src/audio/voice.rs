use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

// One playback of a loaded drum sample. The buffer itself stays in the
// engine's sample table; the voice only tracks where it is.
#[derive(Clone, Copy, Debug)]
pub struct SampleVoice {
    pub pos: f32,
    pub pitch: f32,
    pub gain: f32,
    pub active: bool,
}

impl SampleVoice {
    pub fn new(gain: f32) -> Self {
        Self {
            pos: 0.0,
            pitch: 1.0,
            gain,
            active: true,
        }
    }

    pub fn next_frame(&mut self, buffer: &SampleBuffer) -> StereoFrame {
        if !self.active {
            return StereoFrame::zero();
        }
        let data = &buffer.data;
        let i = self.pos as usize;
        if i >= data.len() {
            self.active = false;
            return StereoFrame::zero();
        }

        // read sample at current position
        let frac = self.pos - i as f32;
        let s0 = data[i];
        let s1 = data.get(i + 1).copied().unwrap_or(s0);
        let sample = StereoFrame {
            left: lerp(s0.left, s1.left, frac),
            right: lerp(s0.right, s1.right, frac),
        };

        self.pos += self.pitch;
        sample.scale(self.gain)
    }
}
