//! Exploration: randomness sources, epsilon schedules and behaviour policies

use std::{collections::VecDeque, fmt};

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use super::value_table::ActionValues;
use crate::{
    Error, Result,
    gridworld::{Action, GridState},
};

/// Source of the random draws an exploring policy needs
///
/// Injected into agents so tests can replay exact sequences instead of
/// depending on a particular generator.
pub trait ExplorationSource: Send {
    /// Uniform draw in [0, 1)
    fn coin(&mut self) -> f64;

    /// Uniform index in 0..n
    fn index(&mut self, n: usize) -> usize;

    /// Uniformly random action
    fn action(&mut self) -> Action {
        Action::ALL[self.index(Action::COUNT) % Action::COUNT]
    }
}

/// Exploration backed by a standard RNG
#[derive(Debug, Clone)]
pub struct RngSource {
    rng: StdRng,
}

impl RngSource {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Seeded when a seed is given, entropy-seeded otherwise
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }
}

impl ExplorationSource for RngSource {
    fn coin(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn index(&mut self, n: usize) -> usize {
        self.rng.random_range(0..n)
    }
}

/// Replays fixed sequences of draws, cycling when exhausted
///
/// An empty coin sequence always returns 1.0 (never explore) and an empty
/// index sequence always returns 0.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    coins: VecDeque<f64>,
    indices: VecDeque<usize>,
}

impl ScriptedSource {
    pub fn new(coins: Vec<f64>, indices: Vec<usize>) -> Self {
        Self {
            coins: coins.into(),
            indices: indices.into(),
        }
    }

    /// Never explores
    pub fn greedy() -> Self {
        Self::default()
    }
}

impl ExplorationSource for ScriptedSource {
    fn coin(&mut self) -> f64 {
        match self.coins.pop_front() {
            Some(coin) => {
                self.coins.push_back(coin);
                coin
            }
            None => 1.0,
        }
    }

    fn index(&mut self, n: usize) -> usize {
        match self.indices.pop_front() {
            Some(index) => {
                self.indices.push_back(index);
                index % n
            }
            None => 0,
        }
    }
}

/// How epsilon shrinks after each episode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Annealing {
    /// Subtract a fixed step
    Linear { step: f64 },
    /// Multiply by a factor in (0, 1]
    Geometric { factor: f64 },
}

/// Epsilon schedule: start value, floor and per-episode annealing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    pub initial: f64,
    pub minimum: f64,
    pub annealing: Annealing,
}

impl EpsilonSchedule {
    pub fn linear(initial: f64, step: f64, minimum: f64) -> Self {
        Self {
            initial,
            minimum,
            annealing: Annealing::Linear { step },
        }
    }

    pub fn geometric(initial: f64, factor: f64, minimum: f64) -> Self {
        Self {
            initial,
            minimum,
            annealing: Annealing::Geometric { factor },
        }
    }

    /// Constant epsilon
    pub fn fixed(epsilon: f64) -> Self {
        Self::linear(epsilon, 0.0, epsilon)
    }

    /// Next epsilon after one completed episode, floored at the minimum
    pub fn anneal(&self, epsilon: f64) -> f64 {
        let next = match self.annealing {
            Annealing::Linear { step } => epsilon - step,
            Annealing::Geometric { factor } => epsilon * factor,
        };
        next.max(self.minimum).min(epsilon)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.initial) {
            return Err(Error::config(format!(
                "initial epsilon {} must be within [0, 1]",
                self.initial
            )));
        }
        if !(0.0..=self.initial).contains(&self.minimum) {
            return Err(Error::config(format!(
                "minimum epsilon {} must be within [0, {}]",
                self.minimum, self.initial
            )));
        }
        match self.annealing {
            Annealing::Linear { step } if !(step >= 0.0 && step.is_finite()) => Err(
                Error::config(format!("epsilon step {step} must be non-negative")),
            ),
            Annealing::Geometric { factor } if !(factor > 0.0 && factor <= 1.0) => Err(
                Error::config(format!("epsilon decay factor {factor} must be within (0, 1]")),
            ),
            _ => Ok(()),
        }
    }
}

/// Epsilon-greedy behaviour policy over an action-value table
pub struct EpsilonGreedy {
    epsilon: f64,
    schedule: EpsilonSchedule,
    source: Box<dyn ExplorationSource>,
}

impl EpsilonGreedy {
    pub fn new(schedule: EpsilonSchedule, source: Box<dyn ExplorationSource>) -> Self {
        Self {
            epsilon: schedule.initial,
            schedule,
            source,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn schedule(&self) -> &EpsilonSchedule {
        &self.schedule
    }

    /// Random action with probability epsilon, greedy action otherwise
    pub fn select(&mut self, table: &ActionValues, state: &GridState) -> Result<Action> {
        select_action(table, state, self.epsilon, self.source.as_mut())
    }

    /// The randomness behind this policy, shared with evaluation policies
    pub fn source_mut(&mut self) -> &mut dyn ExplorationSource {
        self.source.as_mut()
    }

    pub fn anneal(&mut self) -> f64 {
        self.epsilon = self.schedule.anneal(self.epsilon);
        self.epsilon
    }

    /// Restore the initial epsilon
    pub fn reset(&mut self) {
        self.epsilon = self.schedule.initial;
    }

    pub fn set_source(&mut self, source: Box<dyn ExplorationSource>) {
        self.source = source;
    }
}

impl fmt::Debug for EpsilonGreedy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EpsilonGreedy")
            .field("epsilon", &self.epsilon)
            .field("schedule", &self.schedule)
            .finish_non_exhaustive()
    }
}

/// Epsilon-greedy selection against an explicit epsilon and source
pub fn select_action(
    table: &ActionValues,
    state: &GridState,
    epsilon: f64,
    source: &mut dyn ExplorationSource,
) -> Result<Action> {
    if source.coin() < epsilon {
        Ok(source.action())
    } else {
        table.greedy_action(state)
    }
}

/// Deterministic action per grid cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyMap {
    rows: usize,
    cols: usize,
    actions: Vec<Action>,
}

impl PolicyMap {
    /// Same action in every cell
    pub fn uniform(rows: usize, cols: usize, action: Action) -> Self {
        Self {
            rows,
            cols,
            actions: vec![action; rows * cols],
        }
    }

    /// Shortest Manhattan path on an open grid: move vertically until the
    /// goal row, then horizontally
    pub fn toward_goal(rows: usize, cols: usize, goal: GridState) -> Self {
        let mut actions = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let action = if row < goal.row {
                    Action::Down
                } else if row > goal.row {
                    Action::Up
                } else if col < goal.col {
                    Action::Right
                } else {
                    Action::Left
                };
                actions.push(action);
            }
        }
        Self {
            rows,
            cols,
            actions,
        }
    }

    pub fn set(&mut self, state: &GridState, action: Action) -> Result<()> {
        let offset = self.offset(state)?;
        self.actions[offset] = action;
        Ok(())
    }

    pub fn action(&self, state: &GridState) -> Result<Action> {
        Ok(self.actions[self.offset(state)?])
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
}

/// Which fixed policy a state-value learner evaluates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationPolicyKind {
    /// Uniformly random action every step
    #[default]
    Uniform,
    /// Shortest path toward the goal
    TowardGoal,
}

/// Behaviour policy for state-value learners, which estimate a policy's
/// value instead of improving it
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationPolicy {
    Uniform,
    Fixed(PolicyMap),
}

impl EvaluationPolicy {
    pub fn from_kind(
        kind: EvaluationPolicyKind,
        rows: usize,
        cols: usize,
        goal: GridState,
    ) -> Self {
        match kind {
            EvaluationPolicyKind::Uniform => EvaluationPolicy::Uniform,
            EvaluationPolicyKind::TowardGoal => {
                EvaluationPolicy::Fixed(PolicyMap::toward_goal(rows, cols, goal))
            }
        }
    }

    pub fn select(&self, state: &GridState, source: &mut dyn ExplorationSource) -> Result<Action> {
        match self {
            EvaluationPolicy::Uniform => Ok(source.action()),
            EvaluationPolicy::Fixed(map) => map.action(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_anneal_floors_at_minimum() {
        let schedule = EpsilonSchedule::linear(0.9, 0.03, 0.1);
        let mut epsilon = schedule.initial;
        for _ in 0..100 {
            let next = schedule.anneal(epsilon);
            assert!(next <= epsilon);
            assert!(next >= schedule.minimum);
            epsilon = next;
        }
        assert_eq!(epsilon, 0.1);
    }

    #[test]
    fn test_geometric_anneal_is_monotonic() {
        let schedule = EpsilonSchedule::geometric(0.5, 0.9, 0.05);
        let mut epsilon = schedule.initial;
        for _ in 0..200 {
            let next = schedule.anneal(epsilon);
            assert!(next <= epsilon && next >= 0.05);
            epsilon = next;
        }
        assert_eq!(epsilon, 0.05);
    }

    #[test]
    fn test_anneal_never_raises_epsilon_below_floor_start() {
        // A caller-supplied epsilon already under the floor must not jump up
        let schedule = EpsilonSchedule::linear(0.9, 0.1, 0.2);
        assert_eq!(schedule.anneal(0.15), 0.15);
    }

    #[test]
    fn test_schedule_validation() {
        assert!(EpsilonSchedule::linear(0.9, 0.03, 0.1).validate().is_ok());
        assert!(EpsilonSchedule::linear(1.5, 0.03, 0.1).validate().is_err());
        assert!(EpsilonSchedule::linear(0.5, 0.03, 0.6).validate().is_err());
        assert!(EpsilonSchedule::linear(0.5, -0.1, 0.1).validate().is_err());
        assert!(EpsilonSchedule::geometric(0.5, 1.2, 0.1).validate().is_err());
        assert!(EpsilonSchedule::geometric(0.5, 0.0, 0.1).validate().is_err());
        assert!(EpsilonSchedule::fixed(0.0).validate().is_ok());
    }

    #[test]
    fn test_scripted_source_cycles() {
        let mut source = ScriptedSource::new(vec![0.1, 0.7], vec![3, 5]);
        assert_eq!(source.coin(), 0.1);
        assert_eq!(source.coin(), 0.7);
        assert_eq!(source.coin(), 0.1);
        assert_eq!(source.index(4), 3);
        assert_eq!(source.index(4), 1);
        assert_eq!(source.action(), Action::Down);

        let mut greedy = ScriptedSource::greedy();
        assert_eq!(greedy.coin(), 1.0);
        assert_eq!(greedy.index(4), 0);
    }

    #[test]
    fn test_rng_source_is_reproducible() {
        let mut a = RngSource::seeded(42);
        let mut b = RngSource::seeded(42);
        for _ in 0..20 {
            assert_eq!(a.coin(), b.coin());
            let index = a.index(4);
            assert_eq!(index, b.index(4));
            assert!(index < 4);
        }
    }

    #[test]
    fn test_select_action_explores_below_epsilon() {
        let mut table = ActionValues::new(4, 4, 0.0);
        let state = GridState::origin();
        table.set(&state, Action::Right, 1.0).unwrap();

        let mut explore = ScriptedSource::new(vec![0.05], vec![3]);
        assert_eq!(
            select_action(&table, &state, 0.1, &mut explore).unwrap(),
            Action::Down
        );

        let mut exploit = ScriptedSource::new(vec![0.5], vec![3]);
        assert_eq!(
            select_action(&table, &state, 0.1, &mut exploit).unwrap(),
            Action::Right
        );
    }

    #[test]
    fn test_zero_epsilon_is_greedy() {
        let table = ActionValues::new(4, 4, 0.0);
        let mut policy = EpsilonGreedy::new(
            EpsilonSchedule::fixed(0.0),
            Box::new(RngSource::seeded(3)),
        );
        for _ in 0..50 {
            assert_eq!(
                policy.select(&table, &GridState::origin()).unwrap(),
                Action::Left
            );
        }
    }

    #[test]
    fn test_epsilon_greedy_anneal_and_reset() {
        let mut policy = EpsilonGreedy::new(
            EpsilonSchedule::linear(0.9, 0.01, 0.2),
            Box::new(ScriptedSource::greedy()),
        );
        for _ in 0..1000 {
            policy.anneal();
        }
        assert!((policy.epsilon() - 0.2).abs() < 1e-12);
        policy.reset();
        assert_eq!(policy.epsilon(), 0.9);
    }

    #[test]
    fn test_toward_goal_policy_reaches_goal() {
        let goal = GridState::new(3, 3);
        let map = PolicyMap::toward_goal(4, 4, goal);
        let mut state = GridState::origin();
        let mut steps = 0;
        while state != goal {
            state = state.moved(map.action(&state).unwrap(), 4, 4);
            steps += 1;
            assert!(steps <= 6);
        }
        assert_eq!(steps, 6);
    }

    #[test]
    fn test_fixed_policy_overrides() {
        let mut map = PolicyMap::uniform(2, 2, Action::Right);
        map.set(&GridState::new(0, 1), Action::Down).unwrap();
        let policy = EvaluationPolicy::Fixed(map);
        let mut source = ScriptedSource::greedy();
        assert_eq!(
            policy.select(&GridState::new(0, 0), &mut source).unwrap(),
            Action::Right
        );
        assert_eq!(
            policy.select(&GridState::new(0, 1), &mut source).unwrap(),
            Action::Down
        );
        assert!(policy.select(&GridState::new(2, 0), &mut source).is_err());
    }
}
