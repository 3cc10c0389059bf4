// The Effect Data: which wet levels the controller can turn, and where they start

use serde::{Deserialize, Serialize};

pub const DEFAULT_CUTOFF_HZ: f32 = 20_000.0;
pub const MIN_CUTOFF_HZ: f32 = 40.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Reverb,
    Delay,
    Distortion,
}

impl EffectKind {
    pub const ALL: [EffectKind; 3] = [EffectKind::Reverb, EffectKind::Delay, EffectKind::Distortion];

    pub fn label(self) -> &'static str {
        match self {
            EffectKind::Reverb => "REVERB",
            EffectKind::Delay => "DELAY",
            EffectKind::Distortion => "DRIVE",
        }
    }

    pub fn default_wet(self) -> f32 {
        match self {
            EffectKind::Reverb => 0.3,
            EffectKind::Delay => 0.2,
            EffectKind::Distortion => 0.1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectLevels {
    pub reverb: f32,
    pub delay: f32,
    pub distortion: f32,
    pub filter_cutoff: f32,
}

impl Default for EffectLevels {
    fn default() -> Self {
        Self {
            reverb: EffectKind::Reverb.default_wet(),
            delay: EffectKind::Delay.default_wet(),
            distortion: EffectKind::Distortion.default_wet(),
            filter_cutoff: DEFAULT_CUTOFF_HZ,
        }
    }
}

impl EffectLevels {
    pub fn wet(&self, kind: EffectKind) -> f32 {
        match kind {
            EffectKind::Reverb => self.reverb,
            EffectKind::Delay => self.delay,
            EffectKind::Distortion => self.distortion,
        }
    }

    pub fn set_wet(&mut self, kind: EffectKind, wet: f32) {
        let wet = wet.clamp(0.0, 1.0);
        match kind {
            EffectKind::Reverb => self.reverb = wet,
            EffectKind::Delay => self.delay = wet,
            EffectKind::Distortion => self.distortion = wet,
        }
    }

    pub fn set_cutoff(&mut self, hz: f32) {
        self.filter_cutoff = hz.clamp(MIN_CUTOFF_HZ, DEFAULT_CUTOFF_HZ);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_mix() {
        let levels = EffectLevels::default();
        assert_eq!(levels.wet(EffectKind::Reverb), 0.3);
        assert_eq!(levels.wet(EffectKind::Delay), 0.2);
        assert_eq!(levels.wet(EffectKind::Distortion), 0.1);
        assert_eq!(levels.filter_cutoff, 20_000.0);
    }

    #[test]
    fn wet_and_cutoff_are_clamped() {
        let mut levels = EffectLevels::default();
        levels.set_wet(EffectKind::Delay, 1.4);
        levels.set_cutoff(5.0);
        assert_eq!(levels.delay, 1.0);
        assert_eq!(levels.filter_cutoff, MIN_CUTOFF_HZ);
    }
}
