use crate::{Board, EngineError, ParseError};
use std::fmt;
use std::str::FromStr;

/// Compass heading. Clockwise order is NORTH, EAST, SOUTH, WEST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::North, Self::East, Self::South, Self::West];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::North => "NORTH",
            Self::East => "EAST",
            Self::South => "SOUTH",
            Self::West => "WEST",
        }
    }

    pub fn clockwise(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    pub fn counter_clockwise(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
            Self::East => Self::North,
        }
    }

    /// Unit step `(dx, dy)`. y grows to the north.
    pub fn delta(self) -> (i64, i64) {
        match self {
            Self::North => (0, 1),
            Self::East => (1, 0),
            Self::South => (0, -1),
            Self::West => (-1, 0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::new("direction", s))
    }
}

/// Absolute movement command: face the matching heading, then step once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveCommand {
    Up,
    Down,
    Left,
    Right,
}

impl MoveCommand {
    pub const ALL: [MoveCommand; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Self::Up => Direction::North,
            Self::Down => Direction::South,
            Self::Left => Direction::West,
            Self::Right => Direction::East,
        }
    }
}

impl fmt::Display for MoveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoveCommand {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::new("command", s))
    }
}

/// In-place quarter turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    Left,
    Right,
}

impl Rotation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn apply(self, direction: Direction) -> Direction {
        match self {
            Self::Left => direction.counter_clockwise(),
            Self::Right => direction.clockwise(),
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rotation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(ParseError::new("rotation", s)),
        }
    }
}

/// Robot pose. Bounds are not known here; the engine checks them against
/// whatever board is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Robot {
    pub x: i64,
    pub y: i64,
    pub direction: Direction,
}

impl Robot {
    pub fn new(x: i64, y: i64, direction: Direction) -> Self {
        Self { x, y, direction }
    }

    pub fn position(&self) -> (i64, i64) {
        (self.x, self.y)
    }

    pub fn facing(self, direction: Direction) -> Self {
        Self { direction, ..self }
    }

    pub fn turned(self, rotation: Rotation) -> Self {
        self.facing(rotation.apply(self.direction))
    }

    /// One unit along the current heading, or `OutOfBounds` naming the
    /// rejected target.
    pub fn move_forward(&self, board: &Board) -> Result<Robot, EngineError> {
        let (dx, dy) = self.direction.delta();
        let (x, y) = (self.x + dx, self.y + dy);
        if !board.contains(x, y) {
            return Err(board.out_of_bounds(x, y));
        }
        Ok(Self { x, y, ..*self })
    }
}
