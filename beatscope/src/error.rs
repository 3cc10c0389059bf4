// Recoverable errors raised by the sequencer, composer and renderer.
// The controller catches these and turns them into status text; nothing
// in here ever takes the process down.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BeatError {
    #[error("unknown pattern '{0}'")]
    UnknownPattern(String),

    #[error("invalid value {value} for {param}")]
    InvalidConfiguration { param: &'static str, value: f64 },

    #[error("pattern '{name}': {reason}")]
    PatternSource { name: String, reason: String },
}

impl BeatError {
    pub fn invalid(param: &'static str, value: impl Into<f64>) -> Self {
        BeatError::InvalidConfiguration { param, value: value.into() }
    }
}

pub type BeatResult<T> = Result<T, BeatError>;
