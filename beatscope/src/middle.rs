// The middle layer: owns the sequencer, composer, transport, renderer and
// project state. The TUI sends it InputEvents and draws its DisplayState;
// main forwards the AudioCommands it returns to the engine.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::audio::{Adsr, EnvelopeParam};
use crate::audio_api::{AudioCommand, CommandOutbox, EffectKind, SoundSink};
use crate::error::{BeatError, BeatResult};
use crate::pipeline::project::{ProjectState, DEFAULT_PATTERN};
use crate::sequencer::{
    keyboard_notes, AutoComposer, Clock, PatternLibrary, PatternSequencer, Subdivision, Transport,
};
use crate::shared::{DisplayState, InputEvent, LedState, ParamPage, STEPS_PER_PATTERN};
use crate::viz::{FractalParamsUpdate, RenderConfig, SignalRenderer, SignalTap, Surface};

// how far ahead of the engine clock hits are handed over
pub const LOOKAHEAD_SECS: f64 = 0.1;
const NOTE_VELOCITY: f32 = 0.8;

pub struct Middle {
    state: ProjectState,
    transport: Transport,
    sequencer: PatternSequencer,
    composer: AutoComposer<StdRng>,
    renderer: SignalRenderer<StdRng>,
    param_page: ParamPage,
    status: String,
    outbox: CommandOutbox,
    // scheduled steps not yet reached by the engine clock, in time order
    playhead: VecDeque<(f64, u8)>,
    audible_step: Option<u8>,
}

impl Middle {
    // Loaded state is replayed through the same setters the knobs use, so
    // a hand-edited project file can't smuggle in bad values.
    pub fn new(state: ProjectState, library: PatternLibrary, seed: u64, fps: Option<u32>) -> BeatResult<Self> {
        let missing = library.get(&state.pattern).err();
        let initial = match missing {
            None => state.pattern.clone(),
            Some(_) => DEFAULT_PATTERN.to_string(),
        };
        let sequencer = PatternSequencer::new(library, &initial)?;
        let transport = Transport::new(sequencer.bpm());
        let renderer = SignalRenderer::new(
            StdRng::seed_from_u64(seed.wrapping_add(1)),
            RenderConfig { link_distance: state.render.link_distance, ..RenderConfig::default() },
        )
        .with_frame_cap(fps);

        let mut middle = Self {
            state: ProjectState { pattern: initial, ..ProjectState::default() },
            transport,
            sequencer,
            composer: AutoComposer::with_defaults(StdRng::seed_from_u64(seed)),
            renderer,
            param_page: ParamPage::Beat,
            status: String::new(),
            outbox: CommandOutbox::default(),
            playhead: VecDeque::new(),
            audible_step: None,
        };
        middle.restore(&state);
        if let Some(err) = missing {
            info!("saved pattern unavailable, using {DEFAULT_PATTERN}");
            middle.report(err);
        }
        Ok(middle)
    }

    fn restore(&mut self, saved: &ProjectState) {
        if let Err(err) = self.sequencer.set_tempo(saved.bpm, &mut self.transport) {
            self.report(err);
        }
        self.state.bpm = self.sequencer.bpm();

        self.state.beat_volume = saved.beat_volume.clamp(0.0, 1.0);
        self.outbox.push(AudioCommand::SetBeatVolume(self.state.beat_volume));

        self.state.synth_type = saved.synth_type;
        self.outbox.push(AudioCommand::SetSynthType(saved.synth_type));

        if let Some(saved_env) = saved.envelope {
            let mut env = Adsr::default();
            for param in [EnvelopeParam::Attack, EnvelopeParam::Decay, EnvelopeParam::Sustain, EnvelopeParam::Release] {
                env.set(param, saved_env.get(param));
                self.outbox.push(AudioCommand::SetEnvelope(param, env.get(param)));
            }
            self.state.envelope = Some(env);
        }

        for kind in EffectKind::ALL {
            self.state.effects.set_wet(kind, saved.effects.wet(kind));
            self.outbox.push(AudioCommand::SetEffectWet(kind, self.state.effects.wet(kind)));
        }
        self.state.effects.set_cutoff(saved.effects.filter_cutoff);
        self.outbox.push(AudioCommand::SetFilterCutoff(self.state.effects.filter_cutoff));

        let render = saved.render;
        self.renderer.update_viz_type(render.viz_type);
        self.renderer.update_color_scheme(render.color_scheme);
        let results = [
            self.renderer.update_particle_count(render.particle_count as i64),
            self.renderer.update_speed(render.speed),
            self.renderer.update_fractal_params(FractalParamsUpdate {
                zoom: Some(render.fractal.zoom),
                offset_x: Some(render.fractal.offset_x),
                offset_y: Some(render.fractal.offset_y),
                iterations: Some(render.fractal.iterations),
                color_offset: Some(render.fractal.color_offset),
            }),
        ];
        for err in results.into_iter().filter_map(Result::err) {
            self.report(err);
        }
        self.state.render = *self.renderer.config();
    }

    pub fn state(&self) -> &ProjectState {
        &self.state
    }

    // Commands queued outside handle_input/tick (startup restore).
    pub fn take_commands(&mut self) -> Vec<AudioCommand> {
        self.outbox.take()
    }

    fn report(&mut self, err: BeatError) {
        warn!(error = %err, "rejected");
        self.status = err.to_string();
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Vec<AudioCommand> {
        match event {
            InputEvent::PlayPress => {
                self.sequencer.toggle(&mut self.transport);
                if !self.sequencer.is_running() {
                    self.playhead.clear();
                    self.audible_step = None;
                }
                self.status = self.sequencer.mode().label().to_string();
            }
            InputEvent::SelectPattern(i) => {
                if let Err(err) = self.select_pattern_at(i as usize) {
                    self.report(err);
                }
            }
            InputEvent::ToggleComposer => {
                self.composer.toggle(&mut self.transport);
                self.status = if self.composer.is_active() { "AUTO ON".into() } else { "AUTO OFF".into() };
            }
            InputEvent::NextVizType => {
                self.renderer.update_viz_type(self.renderer.config().viz_type.next());
                self.state.render = *self.renderer.config();
            }
            InputEvent::NextColorScheme => {
                self.renderer.update_color_scheme(self.renderer.config().color_scheme.next());
                self.state.render = *self.renderer.config();
            }
            InputEvent::NextSynthType => {
                self.state.synth_type = self.state.synth_type.next();
                info!(synth = self.state.synth_type.label(), "synth type");
                self.outbox.push(AudioCommand::SetSynthType(self.state.synth_type));
            }
            InputEvent::NextPage => self.param_page = self.param_page.next(),
            InputEvent::KnobTurnA(delta) => {
                if let Err(err) = self.turn_knob(false, delta) {
                    self.report(err);
                }
            }
            InputEvent::KnobTurnB(delta) => {
                if let Err(err) = self.turn_knob(true, delta) {
                    self.report(err);
                }
            }
            InputEvent::NoteDown(key) => {
                if let Some(&pitch) = keyboard_notes().get(key as usize) {
                    let duration = Subdivision::Eighth.seconds(self.sequencer.bpm());
                    let now = self.transport.now();
                    self.outbox.trigger_note(pitch, duration, now, NOTE_VELOCITY);
                }
            }
            InputEvent::NoteUp => self.outbox.push(AudioCommand::ReleaseAll),
            InputEvent::Quit => {}
        }
        self.outbox.take()
    }

    // Number keys address patterns by library order.
    fn select_pattern_at(&mut self, index: usize) -> BeatResult<()> {
        let name = self
            .sequencer
            .library()
            .name_at(index)
            .map(str::to_string)
            .ok_or_else(|| BeatError::UnknownPattern(format!("#{}", index + 1)))?;
        self.sequencer.select_pattern(&name, &mut self.transport)?;
        self.state.pattern = name;
        self.state.bpm = self.sequencer.bpm();
        self.status = self.state.pattern.to_uppercase();
        Ok(())
    }

    fn envelope(&self) -> Adsr {
        self.state.envelope.unwrap_or_else(|| Adsr::for_type(self.state.synth_type))
    }

    fn nudge_envelope(&mut self, param: EnvelopeParam, delta: f32) {
        let mut env = self.envelope();
        env.set(param, env.get(param) + delta);
        self.state.envelope = Some(env);
        self.outbox.push(AudioCommand::SetEnvelope(param, env.get(param)));
    }

    fn nudge_wet(&mut self, kind: EffectKind, delta: f32) {
        let wet = self.state.effects.wet(kind) + delta;
        self.state.effects.set_wet(kind, wet);
        self.outbox.push(AudioCommand::SetEffectWet(kind, self.state.effects.wet(kind)));
    }

    // `delta` is one knob notch (±KNOB_STEP), scaled here per parameter.
    fn turn_knob(&mut self, knob_b: bool, delta: f32) -> BeatResult<()> {
        match (self.param_page, knob_b) {
            (ParamPage::Beat, false) => {
                let bpm = (self.sequencer.bpm() + delta as f64 * 20.0).round();
                self.sequencer.set_tempo(bpm, &mut self.transport)?;
                self.state.bpm = bpm;
            }
            (ParamPage::Beat, true) => {
                self.state.beat_volume = (self.state.beat_volume + delta).clamp(0.0, 1.0);
                self.outbox.push(AudioCommand::SetBeatVolume(self.state.beat_volume));
            }
            (ParamPage::EnvelopeAd, false) => self.nudge_envelope(EnvelopeParam::Attack, delta),
            (ParamPage::EnvelopeAd, true) => self.nudge_envelope(EnvelopeParam::Decay, delta),
            (ParamPage::EnvelopeSr, false) => self.nudge_envelope(EnvelopeParam::Sustain, delta),
            (ParamPage::EnvelopeSr, true) => self.nudge_envelope(EnvelopeParam::Release, delta),
            (ParamPage::Space, false) => self.nudge_wet(EffectKind::Reverb, delta),
            (ParamPage::Space, true) => self.nudge_wet(EffectKind::Delay, delta),
            (ParamPage::Tone, false) => self.nudge_wet(EffectKind::Distortion, delta),
            (ParamPage::Tone, true) => {
                // a notch is a fifth of an octave
                let hz = self.state.effects.filter_cutoff * 2f32.powf(delta * 4.0);
                self.state.effects.set_cutoff(hz);
                self.outbox.push(AudioCommand::SetFilterCutoff(self.state.effects.filter_cutoff));
            }
            (ParamPage::Visual, false) => {
                let count = self.renderer.config().particle_count as i64 + (delta * 100.0).round() as i64;
                self.renderer.update_particle_count(count)?;
            }
            (ParamPage::Visual, true) => {
                let speed = self.renderer.config().speed + delta * 2.0;
                self.renderer.update_speed(speed)?;
            }
            (ParamPage::Fractal, false) => {
                let zoom = self.renderer.fractal_params().zoom * 2f64.powf(delta as f64 * 10.0);
                self.renderer.update_fractal_params(FractalParamsUpdate { zoom: Some(zoom), ..Default::default() })?;
            }
            (ParamPage::Fractal, true) => {
                let iterations = self.renderer.fractal_params().iterations as i64 + (delta * 200.0).round() as i64;
                let iterations = u32::try_from(iterations).map_err(|_| BeatError::invalid("iterations", iterations as f64))?;
                self.renderer.update_fractal_params(FractalParamsUpdate { iterations: Some(iterations), ..Default::default() })?;
            }
        }
        self.state.render = *self.renderer.config();
        Ok(())
    }

    // Advance the transport to the engine clock and turn every tick inside
    // the lookahead window into timed hits.
    pub fn tick(&mut self, now: f64) -> Vec<AudioCommand> {
        for tick in self.transport.advance(now, LOOKAHEAD_SECS) {
            if self.sequencer.owns(tick.handle) {
                let step = (tick.index % STEPS_PER_PATTERN as u64) as usize;
                self.sequencer.on_clock_tick(step, tick.time, &mut self.outbox);
                // the cursor already points at the step after this one
                let played = (self.sequencer.step_cursor() + STEPS_PER_PATTERN - 1) % STEPS_PER_PATTERN;
                self.playhead.push_back((tick.time, played as u8));
            } else if self.composer.owns(tick.handle) {
                self.composer.on_tick(tick.time, self.sequencer.bpm(), &mut self.outbox);
            }
        }
        // the lit LED follows what is sounding, not what was just scheduled
        while let Some(&(time, step)) = self.playhead.front() {
            if time > now {
                break;
            }
            self.audible_step = Some(step);
            self.playhead.pop_front();
        }
        self.outbox.take()
    }

    pub fn draw(&mut self, now_ms: f64, tap: &mut dyn SignalTap, surface: &mut dyn Surface) -> bool {
        self.renderer.frame(now_ms, tap, surface)
    }

    fn knob_values(&self) -> (String, String) {
        let env = self.envelope();
        let fx = &self.state.effects;
        let render = self.renderer.config();
        match self.param_page {
            ParamPage::Beat => (format!("{:.0}", self.sequencer.bpm()), format!("{:.2}", self.state.beat_volume)),
            ParamPage::EnvelopeAd => (format!("{:.2}s", env.attack), format!("{:.2}s", env.decay)),
            ParamPage::EnvelopeSr => (format!("{:.2}", env.sustain), format!("{:.2}s", env.release)),
            ParamPage::Space => (format!("{:.2}", fx.reverb), format!("{:.2}", fx.delay)),
            ParamPage::Tone => (format!("{:.2}", fx.distortion), format!("{:.0}Hz", fx.filter_cutoff)),
            ParamPage::Visual => (render.particle_count.to_string(), format!("{:.1}", render.speed)),
            ParamPage::Fractal => (format!("{:.2}x", render.fractal.zoom), render.fractal.iterations.to_string()),
        }
    }

    pub fn display_state(&self) -> DisplayState {
        let playing = self.sequencer.is_running();
        let playing_step = if playing { self.audible_step } else { None };
        let pattern = self.sequencer.current_pattern();
        let leds = std::array::from_fn(|i| {
            if playing_step == Some(i as u8) {
                LedState::OnHigh
            } else if pattern.step(i).is_some() {
                LedState::OnMedium
            } else {
                LedState::Off
            }
        });
        let (knob_a_label, knob_b_label) = self.param_page.knob_labels();
        let (knob_a_value, knob_b_value) = self.knob_values();
        DisplayState {
            leds,
            playing_step,
            playing,
            composer_on: self.composer.is_active(),
            pattern_name: self.sequencer.current_pattern_name().to_string(),
            bpm: self.sequencer.bpm(),
            synth_label: self.state.synth_type.label(),
            viz_label: self.renderer.config().viz_type.label(),
            color_label: self.renderer.config().color_scheme.label(),
            display_text: self.status.clone(),
            param_page: self.param_page,
            knob_a_label,
            knob_b_label,
            knob_a_value,
            knob_b_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SynthType;
    use crate::audio_api::{DrumTrigger, NoteTrigger};
    use crate::sequencer::{DrumSound, Pitch};
    use crate::shared::KNOB_STEP;
    use crate::testing::FixedTap;
    use crate::viz::{PixelSurface, VizType};

    fn middle() -> Middle {
        let mut m = Middle::new(ProjectState::default(), PatternLibrary::builtin(), 42, None).unwrap();
        m.take_commands();
        m
    }

    fn drums(cmds: &[AudioCommand]) -> Vec<DrumTrigger> {
        cmds.iter()
            .filter_map(|c| match c {
                AudioCommand::TriggerDrum(t) => Some(*t),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn startup_replays_saved_settings_to_the_engine() {
        let mut m = Middle::new(ProjectState::default(), PatternLibrary::builtin(), 42, None).unwrap();
        let cmds = m.take_commands();
        assert!(cmds.contains(&AudioCommand::SetSynthType(SynthType::Basic)));
        assert!(cmds.contains(&AudioCommand::SetFilterCutoff(20_000.0)));
        assert!(cmds.contains(&AudioCommand::SetEffectWet(EffectKind::Reverb, 0.3)));
        assert_eq!(m.state().pattern, "house");
        assert_eq!(m.state().bpm, 128.0);
    }

    #[test]
    fn unknown_saved_pattern_falls_back() {
        let state = ProjectState { pattern: "polka".into(), ..Default::default() };
        let m = Middle::new(state, PatternLibrary::builtin(), 1, None).unwrap();
        let ds = m.display_state();
        assert_eq!(ds.pattern_name, "house");
        assert!(ds.display_text.contains("polka"), "{}", ds.display_text);
    }

    #[test]
    fn bad_saved_values_are_rejected_not_fatal() {
        let mut state = ProjectState { bpm: 999.0, ..Default::default() };
        state.render.speed = -3.0;
        let m = Middle::new(state, PatternLibrary::builtin(), 1, None).unwrap();
        assert_eq!(m.state().bpm, 128.0);
        assert_eq!(m.state().render.speed, 1.0);
        assert!(!m.display_state().display_text.is_empty());
    }

    #[test]
    fn play_schedules_the_pattern_ahead_of_the_clock() {
        let mut m = middle();
        m.handle_input(InputEvent::PlayPress);
        // house at 128 bpm: a sixteenth is ~0.117s, so only step 0 is in the window
        let hits = drums(&m.tick(0.0));
        assert_eq!(hits, vec![DrumTrigger { sound: DrumSound::Kick, time: 0.0, velocity: 1.0 }]);
        assert!(m.display_state().playing);
    }

    #[test]
    fn playhead_led_waits_for_the_engine_clock() {
        let mut m = middle();
        m.handle_input(InputEvent::PlayPress);
        // 128 bpm: steps every ~0.117s. At 0.05 step 1 is already scheduled
        // but has not sounded yet.
        m.tick(0.0);
        m.tick(0.05);
        assert_eq!(m.display_state().playing_step, Some(0));
        m.tick(0.12);
        let ds = m.display_state();
        assert_eq!(ds.playing_step, Some(1));
        assert_eq!(ds.leds[1], LedState::OnHigh);
        m.handle_input(InputEvent::PlayPress);
        assert_eq!(m.display_state().playing_step, None);
    }

    #[test]
    fn stop_silences_later_ticks() {
        let mut m = middle();
        m.handle_input(InputEvent::PlayPress);
        m.tick(0.0);
        m.handle_input(InputEvent::PlayPress);
        assert!(drums(&m.tick(2.0)).is_empty());
        let ds = m.display_state();
        assert!(!ds.playing);
        assert_eq!(ds.display_text, "STOP");
    }

    #[test]
    fn number_keys_follow_library_order() {
        let mut m = middle();
        m.handle_input(InputEvent::SelectPattern(1));
        let ds = m.display_state();
        assert_eq!(ds.pattern_name, "techno");
        assert_eq!(ds.bpm, 130.0);
        assert_eq!(m.state().pattern, "techno");
    }

    #[test]
    fn missing_pattern_key_shows_an_error() {
        let mut m = middle();
        m.handle_input(InputEvent::SelectPattern(40));
        let ds = m.display_state();
        assert_eq!(ds.pattern_name, "house");
        assert!(ds.display_text.contains("unknown pattern"));
    }

    #[test]
    fn leds_mirror_the_pattern() {
        let m = middle();
        let ds = m.display_state();
        let lit: Vec<usize> = (0..16).filter(|&i| ds.leds[i] == LedState::OnMedium).collect();
        assert_eq!(lit, vec![0, 2, 4, 6, 8, 10, 12, 14]);
        assert_eq!(ds.playing_step, None);
    }

    #[test]
    fn composer_toggle_produces_hits_without_the_sequencer() {
        let mut m = middle();
        m.handle_input(InputEvent::ToggleComposer);
        assert!(m.display_state().composer_on);
        let hits = drums(&m.tick(0.0));
        assert_eq!(hits.len(), 1);
        assert!(hits[0].velocity >= 0.5 && hits[0].velocity <= 1.0);
    }

    #[test]
    fn melodic_keys_play_and_release() {
        let mut m = middle();
        let cmds = m.handle_input(InputEvent::NoteDown(0));
        assert!(matches!(
            cmds.as_slice(),
            [AudioCommand::TriggerNote(NoteTrigger { pitch: Pitch(48), .. })]
        ));
        assert_eq!(m.handle_input(InputEvent::NoteUp), vec![AudioCommand::ReleaseAll]);
        assert!(m.handle_input(InputEvent::NoteDown(12)).is_empty());
    }

    #[test]
    fn bpm_knob_stops_at_the_limit() {
        let mut m = middle();
        for _ in 0..200 {
            m.handle_input(InputEvent::KnobTurnA(KNOB_STEP));
        }
        assert_eq!(m.display_state().bpm, 300.0);
        assert!(m.display_state().display_text.contains("bpm"));
    }

    #[test]
    fn particle_knob_rejects_negative_counts() {
        let mut m = middle();
        for _ in 0..5 {
            m.handle_input(InputEvent::NextPage);
        }
        assert_eq!(m.display_state().param_page, ParamPage::Visual);
        for _ in 0..11 {
            m.handle_input(InputEvent::KnobTurnA(-KNOB_STEP));
        }
        let ds = m.display_state();
        assert_eq!(ds.knob_a_value, "0");
        assert!(ds.display_text.contains("particle_count"));
    }

    #[test]
    fn envelope_edits_reach_the_engine() {
        let mut m = middle();
        m.handle_input(InputEvent::NextPage);
        let cmds = m.handle_input(InputEvent::KnobTurnA(KNOB_STEP));
        assert_eq!(cmds.len(), 1);
        assert!(matches!(cmds[0], AudioCommand::SetEnvelope(EnvelopeParam::Attack, a) if (a - 0.15).abs() < 1e-6));
        assert!(m.state().envelope.is_some());
    }

    #[test]
    fn cutoff_knob_is_clamped() {
        let mut m = middle();
        for _ in 0..4 {
            m.handle_input(InputEvent::NextPage);
        }
        assert_eq!(m.display_state().param_page, ParamPage::Tone);
        let cmds = m.handle_input(InputEvent::KnobTurnB(KNOB_STEP));
        assert_eq!(cmds, vec![AudioCommand::SetFilterCutoff(20_000.0)]);
    }

    #[test]
    fn viz_and_colour_cycle_and_persist() {
        let mut m = middle();
        m.handle_input(InputEvent::NextVizType);
        m.handle_input(InputEvent::NextColorScheme);
        assert_eq!(m.state().render.viz_type, VizType::Waveform);
        assert_eq!(m.display_state().color_label, m.state().render.color_scheme.label());
    }

    #[test]
    fn draw_renders_onto_the_surface() {
        let mut m = middle();
        m.handle_input(InputEvent::NextVizType); // waveform
        let mut surface = PixelSurface::new(40, 20);
        let mut tap = FixedTap::constant(1024, 0.0);
        assert!(m.draw(0.0, &mut tap, &mut surface));
        assert!(surface.lit_pixels() > 0);
    }
}
