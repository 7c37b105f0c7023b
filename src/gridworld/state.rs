//! Grid coordinates and the four movement actions

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A cell on the grid, addressed as (row, column) from the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridState {
    pub row: usize,
    pub col: usize,
}

impl GridState {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// The start cell of every preset world
    pub const fn origin() -> Self {
        Self { row: 0, col: 0 }
    }

    /// Whether the cell lies inside a `rows` x `cols` grid
    pub fn in_bounds(&self, rows: usize, cols: usize) -> bool {
        self.row < rows && self.col < cols
    }

    /// Manhattan distance to another cell
    pub fn manhattan(&self, other: &GridState) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// The cell one move away, clamped to the grid
    ///
    /// Leaving the grid is a no-op on the affected axis.
    pub fn moved(&self, action: Action, rows: usize, cols: usize) -> GridState {
        match action {
            Action::Left => GridState::new(self.row, self.col.saturating_sub(1)),
            Action::Up => GridState::new(self.row.saturating_sub(1), self.col),
            Action::Right => GridState::new(self.row, (self.col + 1).min(cols - 1)),
            Action::Down => GridState::new((self.row + 1).min(rows - 1), self.col),
        }
    }
}

impl fmt::Display for GridState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One of the four discrete moves
///
/// The discriminant is the action index used by the value tables, so the
/// order matters: greedy ties resolve to the lowest index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Left = 0,
    Up = 1,
    Right = 2,
    Down = 3,
}

impl Action {
    pub const COUNT: usize = 4;

    /// All actions in index order
    pub const ALL: [Action; Action::COUNT] =
        [Action::Left, Action::Up, Action::Right, Action::Down];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Convert a raw action index, rejecting anything outside 0-3
    pub fn from_index(index: usize) -> Result<Action> {
        Action::ALL
            .get(index)
            .copied()
            .ok_or(Error::InvalidAction { index })
    }

    /// Single-character arrow used when printing policies
    pub fn arrow(self) -> char {
        match self {
            Action::Left => '←',
            Action::Up => '↑',
            Action::Right => '→',
            Action::Down => '↓',
        }
    }
}

impl TryFrom<usize> for Action {
    type Error = Error;

    fn try_from(index: usize) -> Result<Self> {
        Action::from_index(index)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Left => "left",
            Action::Up => "up",
            Action::Right => "right",
            Action::Down => "down",
        };
        f.write_str(name)
    }
}
