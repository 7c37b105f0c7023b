//! Transitions and episode trajectories

use serde::{Deserialize, Serialize};

use crate::gridworld::{Action, GridState};

/// One environment step: (s, a, r, s') plus the termination flag
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: GridState,
    pub action: Action,
    pub reward: f64,
    pub next_state: GridState,
    pub done: bool,
}

impl Transition {
    pub fn new(
        state: GridState,
        action: Action,
        reward: f64,
        next_state: GridState,
        done: bool,
    ) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}

/// Ordered transitions of a single episode
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trajectory {
    transitions: Vec<Transition>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn last(&self) -> Option<&Transition> {
        self.transitions.last()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn clear(&mut self) {
        self.transitions.clear();
    }

    /// Whether the final transition reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.transitions.last().is_some_and(|t| t.done)
    }

    /// Undiscounted sum of rewards
    pub fn total_reward(&self) -> f64 {
        self.transitions.iter().map(|t| t.reward).sum()
    }

    pub fn rewards(&self) -> Vec<f64> {
        self.transitions.iter().map(|t| t.reward).collect()
    }

    /// Return from every step, in chronological order
    pub fn returns(&self, gamma: f64) -> Vec<f64> {
        discounted_returns(&self.rewards(), gamma)
    }
}

impl From<Vec<Transition>> for Trajectory {
    fn from(transitions: Vec<Transition>) -> Self {
        Self { transitions }
    }
}

/// Discounted return G_t for every step t of a reward sequence
///
/// The recurrence `G ← r + γG` runs from the last reward backwards, so the
/// final step's return is its own reward. Results are in chronological order.
pub fn discounted_returns(rewards: &[f64], gamma: f64) -> Vec<f64> {
    let mut returns = vec![0.0; rewards.len()];
    let mut g = 0.0;
    for (i, reward) in rewards.iter().enumerate().rev() {
        g = reward + gamma * g;
        returns[i] = g;
    }
    returns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_accumulate_in_reverse() {
        let returns = discounted_returns(&[-1.0, -1.0, -1.0], 1.0);
        let reverse: Vec<f64> = returns.iter().rev().copied().collect();
        assert_eq!(reverse, vec![-1.0, -2.0, -3.0]);
        assert_eq!(returns, vec![-3.0, -2.0, -1.0]);
    }

    #[test]
    fn test_discounting() {
        let returns = discounted_returns(&[0.0, 0.0, 1.0], 0.5);
        assert_eq!(returns, vec![0.25, 0.5, 1.0]);
    }

    #[test]
    fn test_empty_rewards() {
        assert!(discounted_returns(&[], 0.9).is_empty());
    }

    #[test]
    fn test_trajectory_bookkeeping() {
        let mut trajectory = Trajectory::new();
        assert!(trajectory.is_empty());
        assert!(!trajectory.is_terminal());

        trajectory.push(Transition::new(
            GridState::new(0, 0),
            Action::Right,
            -1.0,
            GridState::new(0, 1),
            false,
        ));
        trajectory.push(Transition::new(
            GridState::new(0, 1),
            Action::Down,
            -1.0,
            GridState::new(1, 1),
            true,
        ));

        assert_eq!(trajectory.len(), 2);
        assert!(trajectory.is_terminal());
        assert_eq!(trajectory.total_reward(), -2.0);
        assert_eq!(trajectory.returns(1.0), vec![-2.0, -1.0]);

        trajectory.clear();
        assert!(trajectory.is_empty());
    }
}
