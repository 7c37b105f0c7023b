//! Observer port - abstraction for training observation and data collection
//!
//! Observers receive episode and step events from the training pipeline, so
//! progress bars, logs and file exports stay out of the training loop.

use serde::{Deserialize, Serialize};

use crate::{Result, trajectory::Transition};

/// What an observer learns about a finished episode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Number of steps taken
    pub steps: usize,
    /// Undiscounted sum of rewards
    pub total_return: f64,
    /// Epsilon in force during the episode, before annealing
    pub epsilon: f64,
    /// Whether the episode hit the step cap before reaching the goal
    pub truncated: bool,
}

/// Observer trait for monitoring training
///
/// # Event Sequence
///
/// 1. `on_training_start(total_episodes)` - once
/// 2. For each episode:
///    - `on_episode_start(episode)`
///    - `on_step(...)` for each transition, after the agent has seen it
///    - `on_episode_end(episode, summary)`
/// 3. `on_training_end()` - once
///
/// All methods default to doing nothing.
///
/// # Examples
///
/// ```
/// use gridworld_rl::ports::{EpisodeSummary, Observer};
///
/// struct LongestEpisode(usize);
///
/// impl Observer for LongestEpisode {
///     fn on_episode_end(
///         &mut self,
///         _episode: usize,
///         summary: &EpisodeSummary,
///     ) -> gridworld_rl::Result<()> {
///         self.0 = self.0.max(summary.steps);
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    fn on_training_start(&mut self, _total_episodes: usize) -> Result<()> {
        Ok(())
    }

    fn on_episode_start(&mut self, _episode: usize) -> Result<()> {
        Ok(())
    }

    /// Called for each transition of an episode
    ///
    /// `step` is 0-based within the episode and `epsilon` is the exploration
    /// rate the action was chosen under.
    fn on_step(
        &mut self,
        _episode: usize,
        _step: usize,
        _transition: &Transition,
        _epsilon: f64,
    ) -> Result<()> {
        Ok(())
    }

    fn on_episode_end(&mut self, _episode: usize, _summary: &EpisodeSummary) -> Result<()> {
        Ok(())
    }

    /// Called when training completes; flush files or finish progress bars here
    fn on_training_end(&mut self) -> Result<()> {
        Ok(())
    }
}
