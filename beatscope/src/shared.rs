// Types the TUI and the middle layer agree on.
//
// Keys (resolved in tui/input.rs):
//   Space             //  PlayPress
//   1 .. 8            //  SelectPattern(0 .. 7), library order
//   a                 //  ToggleComposer
//   v / c / s         //  NextVizType / NextColorScheme / NextSynthType
//   Tab               //  NextPage
//   Left / Right      //  KnobTurnA(-KNOB_STEP or KNOB_STEP)
//   Down / Up         //  KnobTurnB(-KNOB_STEP or KNOB_STEP)
//   q w e r t y u i o p [ ]   //  NoteDown(0 .. 11), NoteUp on release
//   Esc               //  Quit
//
// The middle layer owns all sequencer and parameter state; the TUI just
// renders the DisplayState snapshot it gets every frame.

pub const STEPS_PER_PATTERN: usize = 16;
pub const NUM_PATTERN_KEYS: usize = 8;
pub const KNOB_STEP: f32 = 0.05;

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    PlayPress,
    SelectPattern(u8),
    ToggleComposer,
    NextVizType,
    NextColorScheme,
    NextSynthType,
    NextPage,

    // knobs, normalized; the middle layer scales per parameter
    KnobTurnA(f32),
    KnobTurnB(f32),

    // melodic keyboard
    NoteDown(u8),
    NoteUp,

    Quit,
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    pub leds: [LedState; STEPS_PER_PATTERN],
    pub playing_step: Option<u8>,
    pub playing: bool,
    pub composer_on: bool,
    pub pattern_name: String,
    pub bpm: f64,
    pub synth_label: &'static str,
    pub viz_label: &'static str,
    pub color_label: &'static str,
    pub display_text: String, // last status or error
    pub param_page: ParamPage,
    pub knob_a_label: &'static str,
    pub knob_b_label: &'static str,
    pub knob_a_value: String,
    pub knob_b_value: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedState {
    Off,
    OnMedium, // step has a sound
    OnHigh,   // step under the playhead
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamPage {
    Beat,
    EnvelopeAd,
    EnvelopeSr,
    Space,
    Tone,
    Visual,
    Fractal,
}

impl ParamPage {
    pub fn next(self) -> Self {
        match self {
            ParamPage::Beat => ParamPage::EnvelopeAd,
            ParamPage::EnvelopeAd => ParamPage::EnvelopeSr,
            ParamPage::EnvelopeSr => ParamPage::Space,
            ParamPage::Space => ParamPage::Tone,
            ParamPage::Tone => ParamPage::Visual,
            ParamPage::Visual => ParamPage::Fractal,
            ParamPage::Fractal => ParamPage::Beat,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ParamPage::Beat => "BEAT",
            ParamPage::EnvelopeAd => "ENV A/D",
            ParamPage::EnvelopeSr => "ENV S/R",
            ParamPage::Space => "SPACE",
            ParamPage::Tone => "TONE",
            ParamPage::Visual => "VISUAL",
            ParamPage::Fractal => "FRACTAL",
        }
    }

    pub fn knob_labels(self) -> (&'static str, &'static str) {
        match self {
            ParamPage::Beat => ("BPM", "VOLUME"),
            ParamPage::EnvelopeAd => ("ATTACK", "DECAY"),
            ParamPage::EnvelopeSr => ("SUSTAIN", "RELEASE"),
            ParamPage::Space => ("REVERB", "DELAY"),
            ParamPage::Tone => ("DRIVE", "CUTOFF"),
            ParamPage::Visual => ("PARTCL", "SPEED"),
            ParamPage::Fractal => ("ZOOM", "ITER"),
        }
    }
}
