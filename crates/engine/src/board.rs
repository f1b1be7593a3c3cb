use crate::EngineError;

/// Smallest side length a board may have.
pub const MIN_BOARD_SIZE: i64 = 5;

/// Side length used when the engine starts.
pub const DEFAULT_BOARD_SIZE: i64 = 5;

/// Square grid of side `n`. Boards never change once built; resizing
/// produces a replacement value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    n: i64,
}

impl Board {
    pub fn new(n: i64) -> Result<Self, EngineError> {
        if n < MIN_BOARD_SIZE {
            return Err(EngineError::InvalidSize {
                n,
                min: MIN_BOARD_SIZE,
            });
        }
        Ok(Self { n })
    }

    pub fn n(&self) -> i64 {
        self.n
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        (0..self.n).contains(&x) && (0..self.n).contains(&y)
    }

    /// Builds the board that would replace this one. `self` is untouched.
    pub fn resize(&self, n: i64) -> Result<Board, EngineError> {
        Board::new(n)
    }

    pub(crate) fn out_of_bounds(&self, x: i64, y: i64) -> EngineError {
        EngineError::OutOfBounds { x, y, n: self.n }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self {
            n: DEFAULT_BOARD_SIZE,
        }
    }
}
