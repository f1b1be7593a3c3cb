use thiserror::Error;

/// Caller-visible failures of engine operations. All are recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("position ({x},{y}) is outside the {n}x{n} board")]
    OutOfBounds { x: i64, y: i64, n: i64 },

    #[error("board size {n} is below the minimum of {min}")]
    InvalidSize { n: i64, min: i64 },

    #[error("robot has not been placed")]
    NotPlaced,
}

/// A string did not name one of the values of a closed enumeration
/// (direction, movement command, rotation).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
