use std::time::Duration;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crate::shared::{InputEvent, KNOB_STEP, NUM_PATTERN_KEYS};
use super::mode::TuiState;

// melodic keyboard, one octave and a bit from C3
const NOTE_KEYS: [char; 12] = ['q', 'w', 'e', 'r', 't', 'y', 'u', 'i', 'o', 'p', '[', ']'];

// poll for input from tui, resolves keys into input events for the middle layer
pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    let mut events = Vec::new();
    // drain everything already queued so a burst of keys lands in one frame
    loop {
        if let Event::Key(key) = event::read()? {
            events.extend(handle_key(key, ts));
        }
        if !event::poll(Duration::ZERO)? {
            break;
        }
    }
    Ok(events)
}

fn handle_key(key: KeyEvent, ts: &mut TuiState) -> Vec<InputEvent> {
    match key.kind {
        KeyEventKind::Press => handle_press(key.code, ts),
        KeyEventKind::Release => handle_release(key.code, ts),
        KeyEventKind::Repeat => vec![], // held melodic keys shouldn't retrigger
    }
}

fn handle_press(code: KeyCode, ts: &mut TuiState) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc => vec![InputEvent::Quit],
        KeyCode::Char(' ') => vec![InputEvent::PlayPress],
        KeyCode::Tab => vec![InputEvent::NextPage],

        // pattern keys 1..8
        KeyCode::Char(c @ '1'..='9') => {
            let n = c as u8 - b'1';
            if (n as usize) < NUM_PATTERN_KEYS {
                vec![InputEvent::SelectPattern(n)]
            } else {
                vec![]
            }
        }

        KeyCode::Char('a') => vec![InputEvent::ToggleComposer],
        KeyCode::Char('v') => vec![InputEvent::NextVizType],
        KeyCode::Char('c') => vec![InputEvent::NextColorScheme],
        KeyCode::Char('s') => vec![InputEvent::NextSynthType],

        // knobs for more continuous control
        KeyCode::Left => vec![InputEvent::KnobTurnA(-KNOB_STEP)],
        KeyCode::Right => vec![InputEvent::KnobTurnA(KNOB_STEP)],
        KeyCode::Down => vec![InputEvent::KnobTurnB(-KNOB_STEP)],
        KeyCode::Up => vec![InputEvent::KnobTurnB(KNOB_STEP)],

        KeyCode::Char(c) => match char_to_note(c) {
            Some(n) => {
                ts.held_note = Some(n);
                vec![InputEvent::NoteDown(n)]
            }
            None => vec![],
        },
        _ => vec![],
    }
}

fn handle_release(code: KeyCode, ts: &mut TuiState) -> Vec<InputEvent> {
    let KeyCode::Char(c) = code else {
        return vec![];
    };
    match char_to_note(c) {
        // only the most recent key releases; rolling onto a new key keeps it sounding
        Some(n) if ts.held_note == Some(n) => {
            ts.held_note = None;
            vec![InputEvent::NoteUp]
        }
        _ => vec![],
    }
}

// convert char to melodic key index
fn char_to_note(c: char) -> Option<u8> {
    NOTE_KEYS.iter().position(|&k| k == c).map(|i| i as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent { code, modifiers: KeyModifiers::NONE, kind, state: KeyEventState::NONE }
    }

    fn press(code: KeyCode, ts: &mut TuiState) -> Vec<InputEvent> {
        handle_key(key(code, KeyEventKind::Press), ts)
    }

    #[test]
    fn pattern_keys_stop_at_eight() {
        let mut ts = TuiState::default();
        assert_eq!(press(KeyCode::Char('1'), &mut ts), vec![InputEvent::SelectPattern(0)]);
        assert_eq!(press(KeyCode::Char('8'), &mut ts), vec![InputEvent::SelectPattern(7)]);
        assert!(press(KeyCode::Char('9'), &mut ts).is_empty());
    }

    #[test]
    fn note_keys_map_in_order() {
        let mut ts = TuiState::default();
        assert_eq!(press(KeyCode::Char('q'), &mut ts), vec![InputEvent::NoteDown(0)]);
        assert_eq!(press(KeyCode::Char(']'), &mut ts), vec![InputEvent::NoteDown(11)]);
        assert_eq!(ts.held_note, Some(11));
    }

    #[test]
    fn release_of_held_key_ends_the_note() {
        let mut ts = TuiState::default();
        press(KeyCode::Char('w'), &mut ts);
        press(KeyCode::Char('e'), &mut ts);
        assert!(handle_key(key(KeyCode::Char('w'), KeyEventKind::Release), &mut ts).is_empty());
        assert_eq!(
            handle_key(key(KeyCode::Char('e'), KeyEventKind::Release), &mut ts),
            vec![InputEvent::NoteUp]
        );
        assert_eq!(ts.held_note, None);
    }

    #[test]
    fn repeats_are_ignored() {
        let mut ts = TuiState::default();
        assert!(handle_key(key(KeyCode::Char('q'), KeyEventKind::Repeat), &mut ts).is_empty());
    }

    #[test]
    fn arrows_turn_knobs() {
        let mut ts = TuiState::default();
        assert_eq!(press(KeyCode::Left, &mut ts), vec![InputEvent::KnobTurnA(-KNOB_STEP)]);
        assert_eq!(press(KeyCode::Up, &mut ts), vec![InputEvent::KnobTurnB(KNOB_STEP)]);
    }
}
