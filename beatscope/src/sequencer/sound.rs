use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// The percussion kit. Every pattern step and every auto composer hit names
// one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrumSound {
    Kick,
    Snare,
    Hihat,
    Clap,
    Tom,
}

pub const NUM_DRUMS: usize = 5;

impl DrumSound {
    pub const ALL: [DrumSound; NUM_DRUMS] = [
        DrumSound::Kick,
        DrumSound::Snare,
        DrumSound::Hihat,
        DrumSound::Clap,
        DrumSound::Tom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DrumSound::Kick => "kick",
            DrumSound::Snare => "snare",
            DrumSound::Hihat => "hihat",
            DrumSound::Clap => "clap",
            DrumSound::Tom => "tom",
        }
    }

    // stable slot for per-sound tables in the engine
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for DrumSound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DrumSound {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        DrumSound::ALL
            .into_iter()
            .find(|d| d.name() == lower)
            .ok_or_else(|| format!("unknown sound '{}'", s))
    }
}
