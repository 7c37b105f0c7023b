//! Greedy evaluation of a trained control agent

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    gridworld::GridState,
    ports::Environment,
    tabular::TabularAgent,
};

/// Outcome of following the greedy policy from the start state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rollout {
    /// Cells visited, starting state first
    pub path: Vec<GridState>,
    pub total_return: f64,
    /// Whether the goal was reached within the step limit
    pub reached_goal: bool,
}

impl Rollout {
    pub fn steps(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

/// Follow the agent's greedy actions without exploring or learning
///
/// Stops at the goal or after `max_steps`. Requires an action-value table.
pub fn greedy_rollout(
    agent: &TabularAgent,
    env: &mut dyn Environment,
    max_steps: usize,
) -> Result<Rollout> {
    let mut state = env.reset();
    let mut path = vec![state];
    let mut total_return = 0.0;
    let mut reached_goal = false;

    while !reached_goal && path.len() <= max_steps {
        let action = agent.greedy_action(&state)?;
        let outcome = env.step(action);
        total_return += outcome.reward;
        state = outcome.state;
        reached_goal = outcome.done;
        path.push(state);
    }

    Ok(Rollout {
        path,
        total_return,
        reached_goal,
    })
}
