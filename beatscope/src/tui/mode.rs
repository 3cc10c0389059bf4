// state local to tui: which melodic key is down, so its release (when the
// terminal reports releases at all) can end the note
#[derive(Clone, Debug, Default)]
pub struct TuiState {
    pub held_note: Option<u8>,
}
