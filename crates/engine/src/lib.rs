//! Authoritative simulation for a single toy robot on a square board.
//!
//! [`SimulationEngine`] owns the [`Board`], the optional [`Robot`] and the
//! [`CommandLog`]. It does no I/O and no locking; callers that share one
//! engine between threads serialize access themselves.

mod board;
mod error;
mod history;
mod robot;

pub use board::{Board, DEFAULT_BOARD_SIZE, MIN_BOARD_SIZE};
pub use error::{EngineError, ParseError};
pub use history::{Action, CommandLog, LogEntry, Motion};
pub use robot::{Direction, MoveCommand, Robot, Rotation};

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Unplaced,
    Placed,
}

/// Robot and board after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub robot: Option<Robot>,
    pub board: Board,
}

/// Result of a movement attempt. Blocked attempts are not errors: `moved`
/// is false and the robot keeps its coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub robot: Robot,
    pub board: Board,
    pub moved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub robot: Robot,
    pub board: Board,
    pub log: Vec<LogEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct SimulationEngine {
    board: Board,
    robot: Option<Robot>,
    log: CommandLog,
}

impl SimulationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_board(board: Board) -> Self {
        Self {
            board,
            ..Self::default()
        }
    }

    pub fn board(&self) -> Board {
        self.board
    }

    pub fn robot(&self) -> Option<Robot> {
        self.robot
    }

    pub fn log(&self) -> &CommandLog {
        &self.log
    }

    pub fn placement(&self) -> Placement {
        match self.robot {
            Some(_) => Placement::Placed,
            None => Placement::Unplaced,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            robot: self.robot,
            board: self.board,
        }
    }

    /// Puts the robot at (x, y), replacing any previous robot. Facing
    /// defaults to NORTH. On failure nothing changes and nothing is logged.
    pub fn place(
        &mut self,
        x: i64,
        y: i64,
        direction: Option<Direction>,
    ) -> Result<Robot, EngineError> {
        if !self.board.contains(x, y) {
            debug!(x, y, n = self.board.n(), "place rejected");
            return Err(self.board.out_of_bounds(x, y));
        }
        let robot = Robot::new(x, y, direction.unwrap_or_default());
        self.robot = Some(robot);
        self.log.append(Action::Placed {
            x,
            y,
            direction: robot.direction,
        });
        debug!(x, y, direction = %robot.direction, "placed");
        Ok(robot)
    }

    /// Turns to the command's heading and tries one step. The new heading
    /// sticks even when the step is blocked.
    pub fn move_robot(&mut self, command: MoveCommand) -> Result<MoveOutcome, EngineError> {
        let robot = self.placed()?.facing(command.direction());
        Ok(self.step(robot, Motion::Command(command)))
    }

    /// One step along the current heading.
    pub fn forward(&mut self) -> Result<MoveOutcome, EngineError> {
        let robot = self.placed()?;
        Ok(self.step(robot, Motion::Forward))
    }

    pub fn turn(&mut self, rotation: Rotation) -> Result<Robot, EngineError> {
        let robot = self.placed()?.turned(rotation);
        self.robot = Some(robot);
        self.log.append(Action::Turned {
            rotation,
            direction: robot.direction,
            x: robot.x,
            y: robot.y,
        });
        debug!(%rotation, direction = %robot.direction, "turned");
        Ok(robot)
    }

    pub fn report(&self) -> Result<Report, EngineError> {
        let robot = self.placed()?;
        Ok(Report {
            robot,
            board: self.board,
            log: self.log.snapshot(),
        })
    }

    /// Replaces the board. A robot left outside the new board becomes
    /// unplaced rather than being clamped.
    pub fn resize(&mut self, n: i64) -> Result<Snapshot, EngineError> {
        let board = self.board.resize(n)?;
        let unplaced = match self.robot {
            Some(robot) => !board.contains(robot.x, robot.y),
            None => false,
        };
        self.board = board;
        if unplaced {
            self.robot = None;
        }
        self.log.append(Action::Resized { n, unplaced });
        debug!(n, unplaced, "resized");
        Ok(self.snapshot())
    }

    fn placed(&self) -> Result<Robot, EngineError> {
        self.robot.ok_or(EngineError::NotPlaced)
    }

    fn step(&mut self, robot: Robot, motion: Motion) -> MoveOutcome {
        let (robot, action) = match robot.move_forward(&self.board) {
            Ok(next) => (
                next,
                Action::Moved {
                    motion,
                    x: next.x,
                    y: next.y,
                },
            ),
            Err(err) => {
                debug!(%motion, %err, "move blocked");
                (
                    robot,
                    Action::Blocked {
                        motion,
                        x: robot.x,
                        y: robot.y,
                    },
                )
            }
        };
        self.robot = Some(robot);
        self.log.append(action);
        MoveOutcome {
            robot,
            board: self.board,
            moved: action.succeeded(),
        }
    }
}
