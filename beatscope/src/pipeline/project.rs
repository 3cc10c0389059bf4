// Everything about a session that survives a restart. The controller owns
// the live copy; persistence.rs reads and writes it.

use serde::{Deserialize, Serialize}; // serde does json

use crate::audio::{Adsr, SynthType, DEFAULT_BEAT_VOLUME};
use crate::pipeline::effects::EffectLevels;
use crate::viz::RenderConfig;

pub const DEFAULT_PATTERN: &str = "house";

// Missing fields fall back to defaults so older project files still load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectState {
    pub pattern: String,
    pub bpm: f64,
    pub beat_volume: f32,
    pub synth_type: SynthType,
    pub envelope: Option<Adsr>, // None until the user edits it; each synth keeps its own default
    pub effects: EffectLevels,
    pub render: RenderConfig,
}

impl Default for ProjectState {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            bpm: 128.0,
            beat_volume: DEFAULT_BEAT_VOLUME,
            synth_type: SynthType::default(),
            envelope: None,
            effects: EffectLevels::default(),
            render: RenderConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_in_defaults() {
        let state: ProjectState = serde_json::from_str(r#"{ "pattern": "techno", "bpm": 130 }"#).unwrap();
        assert_eq!(state.pattern, "techno");
        assert_eq!(state.bpm, 130.0);
        assert_eq!(state.effects, EffectLevels::default());
        assert_eq!(state.render, RenderConfig::default());
    }

    #[test]
    fn enums_serialize_by_name() {
        let state = ProjectState { synth_type: SynthType::Fm, ..Default::default() };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["synth_type"], "fm");
        assert_eq!(json["render"]["viz_type"], "particles");
        assert_eq!(json["render"]["color_scheme"], "neon");
    }
}
