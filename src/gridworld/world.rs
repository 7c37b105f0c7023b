//! Deterministic grid-world environment

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::state::{Action, GridState};
use crate::{Error, Result, ports::Environment};

/// Layout and reward structure of a grid world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub rows: usize,
    pub cols: usize,
    pub start: GridState,
    pub goal: GridState,
    /// Reward paid on every step, including the one that reaches the goal
    pub step_reward: f64,
    /// Cells that cannot be entered; moving into one leaves the state unchanged
    #[serde(default)]
    pub blocked: Vec<GridState>,
}

impl GridConfig {
    /// The 4x4 world used for state-value evaluation, goal in the far corner
    pub fn simple() -> Self {
        Self {
            rows: 4,
            cols: 4,
            start: GridState::origin(),
            goal: GridState::new(3, 3),
            step_reward: -1.0,
            blocked: Vec::new(),
        }
    }

    /// The 5x7 world used for control, goal eight steps from the origin
    pub fn control() -> Self {
        Self {
            rows: 5,
            cols: 7,
            start: GridState::origin(),
            goal: GridState::new(4, 4),
            step_reward: -1.0,
            blocked: Vec::new(),
        }
    }

    pub fn with_goal(mut self, goal: GridState) -> Self {
        self.goal = goal;
        self
    }

    pub fn with_blocked(mut self, blocked: Vec<GridState>) -> Self {
        self.blocked = blocked;
        self
    }

    pub fn with_step_reward(mut self, reward: f64) -> Self {
        self.step_reward = reward;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(Error::config(format!(
                "grid must have at least one row and column, got {}x{}",
                self.rows, self.cols
            )));
        }
        for (name, cell) in [("start", self.start), ("goal", self.goal)] {
            if !cell.in_bounds(self.rows, self.cols) {
                return Err(Error::config(format!(
                    "{name} {cell} is outside the {}x{} grid",
                    self.rows, self.cols
                )));
            }
            if self.blocked.contains(&cell) {
                return Err(Error::config(format!("{name} {cell} is a blocked cell")));
            }
        }
        if self.start == self.goal {
            return Err(Error::config(format!(
                "start and goal must differ, both are {}",
                self.start
            )));
        }
        if let Some(cell) = self
            .blocked
            .iter()
            .find(|cell| !cell.in_bounds(self.rows, self.cols))
        {
            return Err(Error::config(format!(
                "blocked cell {cell} is outside the {}x{} grid",
                self.rows, self.cols
            )));
        }
        if !self.step_reward.is_finite() {
            return Err(Error::config("step reward must be finite"));
        }
        Ok(())
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::simple()
    }
}

/// Result of a single environment step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub state: GridState,
    pub reward: f64,
    pub done: bool,
}

/// Grid world with a single agent position
///
/// Transitions are fully deterministic given the action sequence.
#[derive(Debug, Clone)]
pub struct GridWorld {
    config: GridConfig,
    blocked: HashSet<GridState>,
    position: GridState,
}

impl GridWorld {
    pub fn new(config: GridConfig) -> Result<Self> {
        config.validate()?;
        let blocked = config.blocked.iter().copied().collect();
        let position = config.start;
        Ok(Self {
            config,
            blocked,
            position,
        })
    }

    /// The 4x4 evaluation world
    pub fn simple() -> Self {
        Self::from_preset(GridConfig::simple())
    }

    /// The 5x7 control world
    pub fn control() -> Self {
        Self::from_preset(GridConfig::control())
    }

    fn from_preset(config: GridConfig) -> Self {
        let position = config.start;
        Self {
            config,
            blocked: HashSet::new(),
            position,
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn goal(&self) -> GridState {
        self.config.goal
    }

    pub fn is_goal(&self, state: &GridState) -> bool {
        *state == self.config.goal
    }

    pub fn is_blocked(&self, state: &GridState) -> bool {
        self.blocked.contains(state)
    }

    /// Where `action` leads from `state`, without moving the agent
    pub fn transition(&self, state: &GridState, action: Action) -> GridState {
        let next = state.moved(action, self.config.rows, self.config.cols);
        if self.is_blocked(&next) { *state } else { next }
    }

    /// Step with a raw action index, rejecting indices outside 0-3
    pub fn step_index(&mut self, index: usize) -> Result<StepOutcome> {
        let action = Action::from_index(index)?;
        Ok(self.step(action))
    }

    /// Length of the shortest path from the start to the goal
    ///
    /// Returns `None` if walls cut the goal off from the start.
    pub fn min_steps_to_goal(&self) -> Option<usize> {
        let mut seen = HashSet::from([self.config.start]);
        let mut frontier = VecDeque::from([(self.config.start, 0usize)]);
        while let Some((cell, depth)) = frontier.pop_front() {
            if self.is_goal(&cell) {
                return Some(depth);
            }
            for action in Action::ALL {
                let next = self.transition(&cell, action);
                if seen.insert(next) {
                    frontier.push_back((next, depth + 1));
                }
            }
        }
        None
    }
}

impl Environment for GridWorld {
    fn reset(&mut self) -> GridState {
        self.position = self.config.start;
        self.position
    }

    fn step(&mut self, action: Action) -> StepOutcome {
        self.position = self.transition(&self.position, action);
        StepOutcome {
            state: self.position,
            reward: self.config.step_reward,
            done: self.is_goal(&self.position),
        }
    }

    fn state(&self) -> GridState {
        self.position
    }

    fn dimensions(&self) -> (usize, usize) {
        (self.config.rows, self.config.cols)
    }
}
