use std::fmt;
use std::str::FromStr;

// A note on the equal-tempered scale, stored as a MIDI note number
// (C4 = 60, A4 = 440 Hz).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pitch(pub u8);

const NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

impl Pitch {
    pub fn freq(self) -> f32 {
        440.0 * 2.0_f32.powf((self.0 as f32 - 69.0) / 12.0)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let octave = (self.0 / 12) as i32 - 1;
        write!(f, "{}{}", NAMES[(self.0 % 12) as usize], octave)
    }
}

impl FromStr for Pitch {
    type Err = String;

    // "C3", "F#4", "Bb2"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars().peekable();
        let base = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('C') => 0,
            Some('D') => 2,
            Some('E') => 4,
            Some('F') => 5,
            Some('G') => 7,
            Some('A') => 9,
            Some('B') => 11,
            _ => return Err(format!("bad note name '{}'", s)),
        };
        let accidental = match chars.peek() {
            Some('#') => { chars.next(); 1 }
            Some('b') => { chars.next(); -1 }
            _ => 0,
        };
        let octave: i32 = chars
            .collect::<String>()
            .parse()
            .map_err(|_| format!("bad octave in '{}'", s))?;
        let midi = (octave + 1) * 12 + base + accidental;
        if !(0..=127).contains(&midi) {
            return Err(format!("note '{}' out of range", s));
        }
        Ok(Pitch(midi as u8))
    }
}

// Notes played by the melodic keys, left to right.
pub fn keyboard_notes() -> [Pitch; 12] {
    // C3 D3 E3 F3 G3 A3 B3 C4 D4 E4 F4 G4
    [48, 50, 52, 53, 55, 57, 59, 60, 62, 64, 65, 67].map(Pitch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_note_names() {
        assert_eq!("C4".parse::<Pitch>(), Ok(Pitch(60)));
        assert_eq!("A4".parse::<Pitch>(), Ok(Pitch(69)));
        assert_eq!("F#3".parse::<Pitch>(), Ok(Pitch(54)));
        assert_eq!("Bb3".parse::<Pitch>(), Ok(Pitch(58)));
        assert!("H2".parse::<Pitch>().is_err());
        assert!("C".parse::<Pitch>().is_err());
    }

    #[test]
    fn a4_is_440() {
        assert!((Pitch(69).freq() - 440.0).abs() < 1e-3);
        assert!((Pitch(57).freq() - 220.0).abs() < 1e-3);
    }

    #[test]
    fn display_round_trips_sharps() {
        assert_eq!(Pitch(61).to_string(), "C#4");
        assert_eq!(Pitch(48).to_string(), "C3");
    }
}
