//! Episodic training pipeline for tabular agents

use std::{fs::File, path::Path, time::Instant};

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::{info, warn};

use crate::{
    Error, Result,
    ports::{Environment, EpisodeSummary, Observer},
    tabular::TabularAgent,
    trajectory::Transition,
};

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of training episodes
    pub episodes: usize,

    /// Episodes still running after this many steps are truncated
    pub max_steps_per_episode: usize,

    /// Random seed, overriding the agent's own
    pub seed: Option<u64>,
}

impl TrainingConfig {
    pub fn new(episodes: usize) -> Self {
        Self {
            episodes,
            ..Self::default()
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps_per_episode = max_steps;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_steps_per_episode == 0 {
            return Err(Error::config("max_steps_per_episode must be at least 1"));
        }
        Ok(())
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 1000,
            max_steps_per_episode: 10_000,
            seed: None,
        }
    }
}

/// Result of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Display name of the algorithm trained
    pub algorithm: String,

    /// Episodes played
    pub episodes: usize,

    /// Steps across all episodes
    pub total_steps: usize,

    /// Episodes that hit the step cap
    pub truncated_episodes: usize,

    /// Mean episode length (0 when no episodes ran)
    pub mean_episode_length: f64,

    /// Sample standard deviation of episode length (0 with fewer than two episodes)
    pub std_episode_length: f64,

    /// Length of the final episode
    pub last_episode_length: usize,

    /// Mean undiscounted return per episode
    pub mean_return: f64,

    /// Epsilon after the final anneal
    pub final_epsilon: f64,
}

impl TrainingResult {
    fn from_episodes(algorithm: &str, summaries: &[EpisodeSummary], final_epsilon: f64) -> Self {
        let lengths: Vec<f64> = summaries.iter().map(|s| s.steps as f64).collect();
        let returns: Vec<f64> = summaries.iter().map(|s| s.total_return).collect();
        Self {
            algorithm: algorithm.to_string(),
            episodes: summaries.len(),
            total_steps: summaries.iter().map(|s| s.steps).sum(),
            truncated_episodes: summaries.iter().filter(|s| s.truncated).count(),
            mean_episode_length: finite_or_zero(lengths.iter().mean()),
            std_episode_length: finite_or_zero(lengths.iter().std_dev()),
            last_episode_length: summaries.last().map_or(0, |s| s.steps),
            mean_return: finite_or_zero(returns.iter().mean()),
            final_epsilon,
        }
    }

    /// Save result to JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create summary {}", path.display()),
            source,
        })?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open summary {}", path.display()),
            source,
        })?;
        Ok(serde_json::from_reader(file)?)
    }
}

// statrs yields NaN for empty input and for the deviation of a single sample
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Runs episodes of one agent in one environment
pub struct TrainingPipeline {
    config: TrainingConfig,
    observers: Vec<Box<dyn Observer>>,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    /// Add an observer to the pipeline
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train `agent` for the configured number of episodes
    ///
    /// Each episode resets the environment, lets the agent act until the
    /// goal or the step cap, closes the episode on the agent and anneals
    /// epsilon once.
    pub fn run(
        &mut self,
        agent: &mut TabularAgent,
        env: &mut dyn Environment,
    ) -> Result<TrainingResult> {
        self.config.validate()?;
        if env.dimensions() != agent.table().dimensions() {
            return Err(Error::config(format!(
                "environment is {:?} but the agent's table is {:?}",
                env.dimensions(),
                agent.table().dimensions()
            )));
        }
        if let Some(seed) = self.config.seed {
            agent.set_rng_seed(seed);
        }

        let started = Instant::now();
        info!(
            algorithm = agent.name(),
            episodes = self.config.episodes,
            max_steps = self.config.max_steps_per_episode,
            "training started"
        );

        for observer in &mut self.observers {
            observer.on_training_start(self.config.episodes)?;
        }

        let mut summaries = Vec::with_capacity(self.config.episodes);
        for episode in 0..self.config.episodes {
            let summary = self.run_episode(episode, agent, env)?;
            summaries.push(summary);
        }

        for observer in &mut self.observers {
            observer.on_training_end()?;
        }

        let result = TrainingResult::from_episodes(agent.name(), &summaries, agent.epsilon());
        info!(
            algorithm = agent.name(),
            episodes = result.episodes,
            total_steps = result.total_steps,
            truncated = result.truncated_episodes,
            elapsed = ?started.elapsed(),
            "training finished"
        );
        Ok(result)
    }

    fn run_episode(
        &mut self,
        episode: usize,
        agent: &mut TabularAgent,
        env: &mut dyn Environment,
    ) -> Result<EpisodeSummary> {
        for observer in &mut self.observers {
            observer.on_episode_start(episode)?;
        }

        let epsilon = agent.epsilon();
        let mut state = env.reset();
        let mut steps = 0;
        let mut total_return = 0.0;
        let mut done = false;

        while !done && steps < self.config.max_steps_per_episode {
            let action = agent.select_action(&state)?;
            let outcome = env.step(action);
            let transition =
                Transition::new(state, action, outcome.reward, outcome.state, outcome.done);
            agent.observe(transition)?;

            for observer in &mut self.observers {
                observer.on_step(episode, steps, &transition, epsilon)?;
            }

            total_return += outcome.reward;
            state = outcome.state;
            done = outcome.done;
            steps += 1;
        }

        agent.finish_episode()?;
        let truncated = !done;
        if truncated {
            warn!(
                episode,
                steps,
                state = %state,
                "episode truncated before reaching the goal"
            );
        }
        agent.anneal();

        let summary = EpisodeSummary {
            steps,
            total_return,
            epsilon,
            truncated,
        };
        for observer in &mut self.observers {
            observer.on_episode_end(episode, &summary)?;
        }
        Ok(summary)
    }
}
