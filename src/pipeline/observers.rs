//! Observer implementations for training pipelines
//!
//! Observers collect data during training without coupling the training loop
//! to specific output formats.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    Error, Result,
    gridworld::{Action, GridState},
    ports::{EpisodeSummary, Observer},
    trajectory::Transition,
};

fn create(path: &Path, what: &str) -> Result<File> {
    File::create(path).map_err(|source| Error::Io {
        operation: format!("create {what} {}", path.display()),
        source,
    })
}

/// Progress bar observer - shows training progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    truncated: usize,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            truncated: 0,
        }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, total_episodes: usize) -> Result<()> {
        let pb = ProgressBar::new(total_episodes as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} episodes ({msg})")
                .map_err(|e| Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_episode_end(&mut self, episode: usize, summary: &EpisodeSummary) -> Result<()> {
        if summary.truncated {
            self.truncated += 1;
        }
        if let Some(pb) = &self.progress_bar {
            pb.set_position(episode as u64 + 1);
            pb.set_message(format!(
                "len {} eps {:.3} truncated {}",
                summary.steps, summary.epsilon, self.truncated
            ));
        }
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(format!("truncated {}", self.truncated));
        }
        Ok(())
    }
}

/// Logs every finished episode at DEBUG level
#[derive(Debug, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_episode_end(&mut self, episode: usize, summary: &EpisodeSummary) -> Result<()> {
        debug!(
            episode,
            steps = summary.steps,
            total_return = summary.total_return,
            epsilon = summary.epsilon,
            truncated = summary.truncated,
            "episode complete"
        );
        Ok(())
    }
}

/// One row of the per-episode CSV log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub episode: usize,
    pub steps: usize,
    #[serde(rename = "return")]
    pub total_return: f64,
    pub epsilon: f64,
    pub truncated: bool,
}

/// CSV observer - writes one row per episode
pub struct CsvObserver {
    writer: csv::Writer<File>,
}

impl CsvObserver {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = create(path.as_ref(), "episode log")?;
        Ok(Self {
            writer: csv::Writer::from_writer(file),
        })
    }
}

impl Observer for CsvObserver {
    fn on_episode_end(&mut self, episode: usize, summary: &EpisodeSummary) -> Result<()> {
        self.writer.serialize(EpisodeRecord {
            episode,
            steps: summary.steps,
            total_return: summary.total_return,
            epsilon: summary.epsilon,
            truncated: summary.truncated,
        })?;
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Observation of a single step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepObservation {
    pub step: usize,
    pub state: GridState,
    pub action: Action,
    pub reward: f64,
    pub next_state: GridState,
    pub done: bool,
}

impl StepObservation {
    fn new(step: usize, transition: &Transition) -> Self {
        Self {
            step,
            state: transition.state,
            action: transition.action,
            reward: transition.reward,
            next_state: transition.next_state,
            done: transition.done,
        }
    }
}

/// Complete observation of one episode, one JSON line each
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub episode: usize,
    pub epsilon: f64,
    pub total_return: f64,
    pub truncated: bool,
    pub steps: Vec<StepObservation>,
}

/// JSONL observer - exports observations to JSON Lines format
pub struct JsonlObserver {
    writer: BufWriter<File>,
    current_steps: Vec<StepObservation>,
}

impl JsonlObserver {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = create(path.as_ref(), "observations")?;
        Ok(Self {
            writer: BufWriter::new(file),
            current_steps: Vec::new(),
        })
    }
}

impl Observer for JsonlObserver {
    fn on_episode_start(&mut self, _episode: usize) -> Result<()> {
        self.current_steps.clear();
        Ok(())
    }

    fn on_step(
        &mut self,
        _episode: usize,
        step: usize,
        transition: &Transition,
        _epsilon: f64,
    ) -> Result<()> {
        self.current_steps.push(StepObservation::new(step, transition));
        Ok(())
    }

    fn on_episode_end(&mut self, episode: usize, summary: &EpisodeSummary) -> Result<()> {
        let observation = Observation {
            episode,
            epsilon: summary.epsilon,
            total_return: summary.total_return,
            truncated: summary.truncated,
            steps: std::mem::take(&mut self.current_steps),
        };
        serde_json::to_writer(&mut self.writer, &observation)?;
        writeln!(&mut self.writer)?;
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
