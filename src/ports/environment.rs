//! Environment port - the interface the training loop drives

use crate::gridworld::{Action, GridState, StepOutcome};

/// Episodic environment with discrete grid states
///
/// The training pipeline only talks to environments through this trait,
/// so alternative layouts or wrappers can be dropped in without touching
/// the agents.
///
/// # Examples
///
/// ```
/// use gridworld_rl::{
///     gridworld::{Action, GridState, GridWorld},
///     ports::Environment,
/// };
///
/// let mut env = GridWorld::simple();
/// assert_eq!(env.reset(), GridState::origin());
/// let outcome = env.step(Action::Right);
/// assert_eq!(outcome.state, GridState::new(0, 1));
/// assert!(!outcome.done);
/// ```
pub trait Environment: Send {
    /// Move back to the start cell and return it.
    ///
    /// Calling this repeatedly without stepping yields the same state.
    fn reset(&mut self) -> GridState;

    /// Apply one action and report the resulting state, reward and
    /// termination flag.
    fn step(&mut self, action: Action) -> StepOutcome;

    /// Current position, without side effects.
    fn state(&self) -> GridState;

    /// Grid size as (rows, cols), used to size value tables.
    fn dimensions(&self) -> (usize, usize);
}
