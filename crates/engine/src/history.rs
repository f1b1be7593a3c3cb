use crate::{Direction, MoveCommand, Rotation};
use std::fmt;
use time::OffsetDateTime;

/// What a movement attempt was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motion {
    /// Absolute command: turn to the command's heading, then step.
    Command(MoveCommand),
    /// Step along the current heading.
    Forward,
}

impl Motion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Command(cmd) => cmd.as_str(),
            Self::Forward => "forward",
        }
    }
}

impl fmt::Display for Motion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured record of one engine action. `Display` renders the
/// human-facing line shown in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Placed {
        x: i64,
        y: i64,
        direction: Direction,
    },
    Moved {
        motion: Motion,
        x: i64,
        y: i64,
    },
    /// The step would have left the board; (x, y) is where the robot stayed.
    Blocked {
        motion: Motion,
        x: i64,
        y: i64,
    },
    Turned {
        rotation: Rotation,
        direction: Direction,
        x: i64,
        y: i64,
    },
    Resized {
        n: i64,
        unplaced: bool,
    },
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Placed { .. } => "place",
            Self::Moved { .. } => "move",
            Self::Blocked { .. } => "blocked",
            Self::Turned { .. } => "turn",
            Self::Resized { .. } => "resize",
        }
    }

    /// False only for blocked movement attempts.
    pub fn succeeded(&self) -> bool {
        !matches!(self, Self::Blocked { .. })
    }

    /// Robot coordinates after the action, if a robot was involved.
    pub fn position(&self) -> Option<(i64, i64)> {
        match *self {
            Self::Placed { x, y, .. }
            | Self::Moved { x, y, .. }
            | Self::Blocked { x, y, .. }
            | Self::Turned { x, y, .. } => Some((x, y)),
            Self::Resized { .. } => None,
        }
    }

    /// Short qualifier for the action: the motion, the rotation, the new
    /// heading or the new board size.
    pub fn detail(&self) -> String {
        match self {
            Self::Placed { direction, .. } => direction.to_string(),
            Self::Moved { motion, .. } | Self::Blocked { motion, .. } => motion.to_string(),
            Self::Turned { rotation, .. } => rotation.to_string(),
            Self::Resized { n, .. } => n.to_string(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Placed { x, y, .. } => write!(f, "Placed at ({x},{y})"),
            Self::Moved { motion, x, y } => write!(f, "Moved {motion} to ({x},{y})"),
            Self::Blocked { motion, x, y } => write!(f, "Blocked {motion} at ({x},{y})"),
            Self::Turned {
                rotation,
                direction,
                x,
                y,
            } => write!(f, "Turned {rotation} to face {direction} at ({x},{y})"),
            Self::Resized { n, unplaced: false } => write!(f, "Board resized to {n}x{n}"),
            Self::Resized { n, unplaced: true } => write!(
                f,
                "Board resized to {n}x{n}; robot unplaced (was out of bounds)"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// 1-based position in the log.
    pub seq: u64,
    pub at: OffsetDateTime,
    pub action: Action,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.action.fmt(f)
    }
}

/// Append-only action history. There is no way to remove or rewrite an
/// entry; the log lives as long as the engine.
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    entries: Vec<LogEntry>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, action: Action) -> &LogEntry {
        let seq = self.entries.len() as u64 + 1;
        self.entries.push(LogEntry {
            seq,
            at: OffsetDateTime::now_utc(),
            action,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Owned copy, safe to hand out after the engine lock is released.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.clone()
    }
}
