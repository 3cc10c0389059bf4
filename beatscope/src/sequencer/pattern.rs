// Pattern data: named 16-step templates with a tempo. Patterns are built
// once at startup (built-ins plus the optional user file) and only ever
// looked up by name afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BeatError, BeatResult};
use crate::shared::STEPS_PER_PATTERN;
use super::sound::DrumSound;
use DrumSound::{Hihat, Kick, Snare};

#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    pub bpm: u32,
    pub steps: [Option<DrumSound>; STEPS_PER_PATTERN],
}

impl Pattern {
    pub fn step(&self, index: usize) -> Option<DrumSound> {
        self.steps[index % STEPS_PER_PATTERN]
    }

    #[cfg(test)]
    pub fn active_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.is_some()).count()
    }
}

// On-disk form, same shape as the step tables the patterns were first
// written in: `{ "bpm": 128, "steps": [{ "time": "0:2", "note": "snare" }] }`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PatternSource {
    pub bpm: u32,
    pub steps: Vec<StepSource>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepSource {
    pub time: String,
    pub note: String,
}

// "bar:beat" -> step index, each part 0..4
pub fn parse_step_time(time: &str) -> Result<usize, String> {
    let (bar, beat) = time
        .split_once(':')
        .ok_or_else(|| format!("step time '{}' is not bar:beat", time))?;
    let bar: usize = bar.trim().parse().map_err(|_| format!("bad bar in '{}'", time))?;
    let beat: usize = beat.trim().parse().map_err(|_| format!("bad beat in '{}'", time))?;
    if bar >= 4 || beat >= 4 {
        return Err(format!("step time '{}' is outside one 16-step bar", time));
    }
    Ok(bar * 4 + beat)
}

impl PatternSource {
    pub fn compile(&self, name: &str) -> BeatResult<Pattern> {
        let fail = |reason: String| BeatError::PatternSource { name: name.to_string(), reason };
        if !(20..=300).contains(&self.bpm) {
            return Err(fail(format!("bpm {} out of range", self.bpm)));
        }
        let mut steps = [None; STEPS_PER_PATTERN];
        for step in &self.steps {
            let index = parse_step_time(&step.time).map_err(&fail)?;
            let sound: DrumSound = step.note.parse().map_err(&fail)?;
            if steps[index].is_some() {
                return Err(fail(format!("step {} is mapped twice", step.time)));
            }
            steps[index] = Some(sound);
        }
        Ok(Pattern { bpm: self.bpm, steps })
    }
}

#[derive(Clone, Debug)]
pub struct PatternLibrary {
    // insertion order is the order of the pattern keys in the UI
    entries: Vec<(String, Pattern)>,
}

impl PatternLibrary {
    pub fn builtin() -> Self {
        let mut lib = Self { entries: Vec::new() };
        for (name, bpm, hits) in BUILTIN {
            let mut steps = [None; STEPS_PER_PATTERN];
            for &(bar, beat, sound) in *hits {
                steps[bar * 4 + beat] = Some(sound);
            }
            lib.insert(name, Pattern { bpm: *bpm, steps });
        }
        lib
    }

    // A pattern with an existing name replaces it in place.
    pub fn insert(&mut self, name: &str, pattern: Pattern) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = pattern,
            None => self.entries.push((name.to_string(), pattern)),
        }
    }

    pub fn get(&self, name: &str) -> BeatResult<&Pattern> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
            .ok_or_else(|| BeatError::UnknownPattern(name.to_string()))
    }

    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // Parse a `name -> PatternSource` JSON object and add every entry.
    // All entries are validated before any is inserted.
    pub fn extend_from_json(&mut self, json: &str) -> anyhow::Result<usize> {
        let sources: BTreeMap<String, PatternSource> = serde_json::from_str(json)?;
        let compiled = sources
            .iter()
            .map(|(name, src)| src.compile(name).map(|p| (name.clone(), p)))
            .collect::<BeatResult<Vec<_>>>()?;
        let count = compiled.len();
        for (name, pattern) in compiled {
            self.insert(&name, pattern);
        }
        Ok(count)
    }

    pub fn extend_from_file(&mut self, path: &Path) -> anyhow::Result<usize> {
        let json = std::fs::read_to_string(path)?;
        self.extend_from_json(&json)
    }
}

type Hits = &'static [(usize, usize, DrumSound)];

const BUILTIN: &[(&str, u32, Hits)] = &[
    ("house", 128, &[
        (0, 0, Kick), (0, 2, Snare), (1, 0, Kick), (1, 2, Snare),
        (2, 0, Kick), (2, 2, Snare), (3, 0, Kick), (3, 2, Snare),
    ]),
    ("techno", 130, &[
        (0, 0, Kick), (0, 2, Hihat), (1, 0, Kick), (1, 2, Hihat),
        (2, 0, Kick), (2, 2, Hihat), (3, 0, Kick), (3, 2, Hihat),
    ]),
    ("dubstep", 140, &[
        (0, 0, Kick), (0, 3, Snare), (1, 0, Kick), (1, 2, Hihat),
        (2, 0, Kick), (2, 3, Snare), (3, 0, Kick), (3, 2, Hihat),
    ]),
    ("trance", 138, &[
        (0, 0, Kick), (0, 2, Hihat), (1, 0, Kick), (1, 2, Hihat),
        (2, 0, Kick), (2, 2, Hihat), (3, 0, Kick), (3, 2, Hihat),
    ]),
    ("drumandbass", 174, &[
        (0, 0, Kick), (0, 1, Hihat), (0, 2, Snare), (0, 3, Hihat),
        (1, 0, Kick), (1, 1, Hihat), (1, 2, Snare), (1, 3, Hihat),
    ]),
    ("hardstyle", 150, &[
        (0, 0, Kick), (0, 1, Kick), (0, 2, Snare),
        (1, 0, Kick), (1, 1, Kick), (1, 2, Snare),
        (2, 0, Kick), (2, 1, Kick), (2, 2, Snare),
        (3, 0, Kick), (3, 1, Kick), (3, 2, Snare),
    ]),
    ("progressive", 126, &[
        (0, 0, Kick), (0, 2, Snare), (0, 3, Hihat),
        (1, 0, Kick), (1, 2, Snare), (1, 3, Hihat),
        (2, 0, Kick), (2, 2, Snare), (2, 3, Hihat),
        (3, 0, Kick), (3, 2, Snare), (3, 3, Hihat),
    ]),
    ("futurebass", 150, &[
        (0, 0, Kick), (0, 2, Snare), (0, 3, Hihat),
        (1, 0, Kick), (1, 2, Snare), (1, 3, Hihat),
        (2, 0, Kick), (2, 2, Snare), (2, 3, Hihat),
        (3, 0, Kick), (3, 2, Snare), (3, 3, Hihat),
    ]),
];
