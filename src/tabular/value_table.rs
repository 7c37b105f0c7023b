//! Dense value tables over grid cells

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    gridworld::{Action, GridState},
};

/// State-value table V(s), one scalar per grid cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateValues {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl StateValues {
    pub fn new(rows: usize, cols: usize, initial: f64) -> Self {
        Self {
            rows,
            cols,
            values: vec![initial; rows * cols],
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn offset(&self, state: &GridState) -> Result<usize> {
        if !state.in_bounds(self.rows, self.cols) {
            return Err(Error::InvalidState {
                row: state.row,
                col: state.col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(state.row * self.cols + state.col)
    }

    pub fn get(&self, state: &GridState) -> Result<f64> {
        Ok(self.values[self.offset(state)?])
    }

    pub fn set(&mut self, state: &GridState, value: f64) -> Result<()> {
        let offset = self.offset(state)?;
        self.values[offset] = value;
        Ok(())
    }

    /// Values laid out one row per grid row
    pub fn to_grid(&self) -> Vec<Vec<f64>> {
        self.values.chunks(self.cols).map(<[f64]>::to_vec).collect()
    }
}

/// Action-value table Q(s, a), four scalars per grid cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionValues {
    rows: usize,
    cols: usize,
    values: Vec<[f64; Action::COUNT]>,
}

impl ActionValues {
    pub fn new(rows: usize, cols: usize, initial: f64) -> Self {
        Self {
            rows,
            cols,
            values: vec![[initial; Action::COUNT]; rows * cols],
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn offset(&self, state: &GridState) -> Result<usize> {
        if !state.in_bounds(self.rows, self.cols) {
            return Err(Error::InvalidState {
                row: state.row,
                col: state.col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(state.row * self.cols + state.col)
    }

    /// All four action values for a state, in action-index order
    pub fn row(&self, state: &GridState) -> Result<&[f64; Action::COUNT]> {
        Ok(&self.values[self.offset(state)?])
    }

    pub fn get(&self, state: &GridState, action: Action) -> Result<f64> {
        Ok(self.row(state)?[action.index()])
    }

    pub fn set(&mut self, state: &GridState, action: Action, value: f64) -> Result<()> {
        let offset = self.offset(state)?;
        self.values[offset][action.index()] = value;
        Ok(())
    }

    /// Maximum Q-value over the legal actions of a state
    pub fn max_q(&self, state: &GridState) -> Result<f64> {
        let (_, value) = self.best(state)?;
        Ok(value)
    }

    /// Greedy action, ties broken toward the lowest action index
    pub fn greedy_action(&self, state: &GridState) -> Result<Action> {
        let (action, _) = self.best(state)?;
        Ok(action)
    }

    fn best(&self, state: &GridState) -> Result<(Action, f64)> {
        Ok(argmax(self.row(state)?))
    }

    /// max_a Q(s, a) for every cell, one row per grid row
    pub fn max_grid(&self) -> Vec<Vec<f64>> {
        self.values
            .chunks(self.cols)
            .map(|row| row.iter().map(|q| argmax(q).1).collect())
            .collect()
    }

    /// Greedy action for every cell, one row per grid row
    pub fn policy_grid(&self) -> Vec<Vec<Action>> {
        self.values
            .chunks(self.cols)
            .map(|row| row.iter().map(|q| argmax(q).0).collect())
            .collect()
    }
}

/// Best action of a Q row; the strict comparison keeps the earliest action on ties
pub fn argmax(q: &[f64; Action::COUNT]) -> (Action, f64) {
    let mut best = (Action::ALL[0], q[0]);
    for action in &Action::ALL[1..] {
        let value = q[action.index()];
        if value > best.1 {
            best = (*action, value);
        }
    }
    best
}

/// The table an agent learns: state values or action values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueTable {
    State(StateValues),
    Action(ActionValues),
}

impl ValueTable {
    pub fn kind(&self) -> TableKind {
        match self {
            ValueTable::State(_) => TableKind::StateValue,
            ValueTable::Action(_) => TableKind::ActionValue,
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        match self {
            ValueTable::State(table) => table.dimensions(),
            ValueTable::Action(table) => table.dimensions(),
        }
    }

    /// Scalar per cell: V(s), or max_a Q(s, a) for action-value tables
    pub fn value_grid(&self) -> Vec<Vec<f64>> {
        match self {
            ValueTable::State(table) => table.to_grid(),
            ValueTable::Action(table) => table.max_grid(),
        }
    }

    pub fn as_state_values(&self) -> Option<&StateValues> {
        match self {
            ValueTable::State(table) => Some(table),
            ValueTable::Action(_) => None,
        }
    }

    pub fn as_action_values(&self) -> Option<&ActionValues> {
        match self {
            ValueTable::Action(table) => Some(table),
            ValueTable::State(_) => None,
        }
    }
}

/// Which kind of table an algorithm learns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    StateValue,
    ActionValue,
}

impl TableKind {
    pub fn build(self, rows: usize, cols: usize, initial: f64) -> ValueTable {
        match self {
            TableKind::StateValue => ValueTable::State(StateValues::new(rows, cols, initial)),
            TableKind::ActionValue => ValueTable::Action(ActionValues::new(rows, cols, initial)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TableKind::StateValue => "state-value",
            TableKind::ActionValue => "action-value",
        }
    }
}
