mod auto_composer;
mod pattern;
mod pattern_sequencer;
mod pitch;
mod sound;
mod transport;

pub use auto_composer::AutoComposer;
pub use pattern::PatternLibrary;
pub use pattern_sequencer::PatternSequencer;
pub use pitch::{keyboard_notes, Pitch};
pub use sound::{DrumSound, NUM_DRUMS};
pub use transport::{Clock, Subdivision, Transport};
