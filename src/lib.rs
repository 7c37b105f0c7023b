//! Tabular reinforcement learning on deterministic grid worlds
//!
//! This crate provides:
//! - Grid-world environments with clamped moves, optional walls and a single goal
//! - State-value evaluation with TD(0) and every-visit Monte-Carlo
//! - Control with SARSA, Q-learning and every-visit Monte-Carlo
//! - Epsilon-greedy exploration with linear or geometric annealing
//! - An episodic training pipeline with pluggable observers

pub mod cli;
pub mod config;
pub mod error;
pub mod gridworld;
pub mod pipeline;
pub mod ports;
pub mod tabular;
pub mod trajectory;

pub use config::AgentConfig;
pub use error::{Error, Result};
pub use gridworld::{Action, GridConfig, GridState, GridWorld};
pub use tabular::{Algorithm, TabularAgent};
pub use trajectory::{Trajectory, Transition};
