use tracing::{debug, info};

use crate::audio_api::SoundSink;
use crate::error::{BeatError, BeatResult};
use crate::shared::STEPS_PER_PATTERN;
use super::pattern::{Pattern, PatternLibrary};
use super::transport::{Clock, ScheduleHandle, Subdivision};

pub const MIN_BPM: f64 = 20.0;
pub const MAX_BPM: f64 = 300.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequencerMode {
    Stopped,
    Running,
}

impl SequencerMode {
    pub fn label(self) -> &'static str {
        match self {
            SequencerMode::Stopped => "STOP",
            SequencerMode::Running => "PLAY",
        }
    }
}

// Plays the selected pattern one sixteenth at a time. The clock decides
// when a step happens; this only decides what sounds on it.
#[derive(Debug)]
pub struct PatternSequencer {
    library: PatternLibrary,
    current_name: String,
    current: Pattern,
    bpm: f64,
    step_cursor: usize,
    schedule: Option<ScheduleHandle>, // Some while running
}

impl PatternSequencer {
    // Starts on `initial` at its stored tempo.
    pub fn new(library: PatternLibrary, initial: &str) -> BeatResult<Self> {
        let current = library.get(initial)?.clone();
        Ok(Self {
            bpm: current.bpm as f64,
            library,
            current_name: initial.to_string(),
            current,
            step_cursor: 0,
            schedule: None,
        })
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    pub fn current_pattern_name(&self) -> &str {
        &self.current_name
    }

    pub fn current_pattern(&self) -> &Pattern {
        &self.current
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn step_cursor(&self) -> usize {
        self.step_cursor
    }

    pub fn mode(&self) -> SequencerMode {
        if self.schedule.is_some() { SequencerMode::Running } else { SequencerMode::Stopped }
    }

    pub fn is_running(&self) -> bool {
        self.mode() == SequencerMode::Running
    }

    pub fn owns(&self, handle: ScheduleHandle) -> bool {
        self.schedule == Some(handle)
    }

    pub fn select_pattern(&mut self, name: &str, clock: &mut dyn Clock) -> BeatResult<()> {
        let pattern = self.library.get(name)?.clone();
        let bpm = pattern.bpm as f64;
        self.current_name = name.to_string();
        self.current = pattern;
        self.bpm = bpm;
        clock.set_tempo(bpm);
        info!(pattern = name, bpm, "pattern selected");
        Ok(())
    }

    pub fn start(&mut self, clock: &mut dyn Clock) {
        if self.is_running() {
            return;
        }
        self.step_cursor = 0;
        self.schedule = Some(clock.schedule_repeating(Subdivision::Sixteenth));
        info!(pattern = %self.current_name, bpm = self.bpm, "sequencer started");
    }

    pub fn stop(&mut self, clock: &mut dyn Clock) {
        if let Some(handle) = self.schedule.take() {
            clock.cancel(handle);
            info!("sequencer stopped");
        }
    }

    pub fn toggle(&mut self, clock: &mut dyn Clock) {
        if self.is_running() {
            self.stop(clock);
        } else {
            self.start(clock);
        }
    }

    pub fn set_tempo(&mut self, bpm: f64, clock: &mut dyn Clock) -> BeatResult<()> {
        if !bpm.is_finite() || !(MIN_BPM..=MAX_BPM).contains(&bpm) {
            return Err(BeatError::invalid("bpm", bpm));
        }
        self.bpm = bpm;
        clock.set_tempo(bpm);
        debug!(bpm, "tempo changed");
        Ok(())
    }

    // `time` is the tick's scheduled time, not "now"
    pub fn on_clock_tick(&mut self, step_index: usize, time: f64, sink: &mut dyn SoundSink) {
        if !self.is_running() {
            return;
        }
        let step = step_index % STEPS_PER_PATTERN;
        if let Some(sound) = self.current.step(step) {
            sink.trigger(sound, time, 1.0);
        }
        self.step_cursor = (step + 1) % STEPS_PER_PATTERN;
    }
}
