//! Configuration types for agent creation.

use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    tabular::{Algorithm, EpsilonSchedule, EvaluationPolicyKind, LearningParams},
};

/// Configuration for creating a tabular agent.
///
/// Builder-style: start from the defaults of an algorithm and override what
/// differs.
///
/// # Examples
///
/// ```
/// use gridworld_rl::{AgentConfig, tabular::{Algorithm, EpsilonSchedule}};
///
/// let config = AgentConfig::for_algorithm(Algorithm::QLearning)
///     .with_learning_rate(0.1)
///     .with_exploration(EpsilonSchedule::linear(1.0, 0.01, 0.05))
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Update rule to learn with
    pub algorithm: Algorithm,
    /// Learning rate, discount and initial table value
    pub learning: LearningParams,
    /// Epsilon schedule for control algorithms
    pub exploration: EpsilonSchedule,
    /// Policy followed by state-value algorithms
    #[serde(default)]
    pub evaluation: EvaluationPolicyKind,
    /// Random seed for reproducibility
    #[serde(default)]
    pub seed: Option<u64>,
}

impl AgentConfig {
    /// Defaults of the classic grid-world exercise for `algorithm`:
    /// - α = 0.01 (0.001 for Monte-Carlo evaluation), γ = 1.0
    /// - ε from 0.9, annealed linearly to a 0.1 floor (0.2 for Q-learning)
    /// - uniformly random evaluation policy
    /// - no seed (non-deterministic)
    pub fn for_algorithm(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            learning: algorithm.default_params(),
            exploration: algorithm.default_schedule(),
            evaluation: EvaluationPolicyKind::default(),
            seed: None,
        }
    }

    pub fn with_learning_rate(mut self, alpha: f64) -> Self {
        self.learning.alpha = alpha;
        self
    }

    pub fn with_discount(mut self, gamma: f64) -> Self {
        self.learning.gamma = gamma;
        self
    }

    pub fn with_initial_value(mut self, value: f64) -> Self {
        self.learning.initial_value = value;
        self
    }

    pub fn with_exploration(mut self, schedule: EpsilonSchedule) -> Self {
        self.exploration = schedule;
        self
    }

    pub fn with_evaluation(mut self, kind: EvaluationPolicyKind) -> Self {
        self.evaluation = kind;
        self
    }

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.learning.validate()?;
        self.exploration.validate()
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open config {}", path.display()),
            source,
        })?;
        let config: AgentConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::for_algorithm(Algorithm::QLearning)
    }
}
