//! Training and evaluation pipelines
//!
//! - Episodic training of a tabular agent in an environment
//! - Greedy rollouts of a trained control agent
//! - Observers recording progress, logs and exports during training

pub mod evaluation;
pub mod observers;
pub mod training;

pub use evaluation::{Rollout, greedy_rollout};
pub use observers::{
    CsvObserver, EpisodeRecord, JsonlObserver, Observation, ProgressObserver, StepObservation,
    TracingObserver,
};
pub use training::{TrainingConfig, TrainingPipeline, TrainingResult};

pub use crate::ports::{EpisodeSummary, Observer};
