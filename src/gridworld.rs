//! Deterministic grid-world environments
//!
//! Two preset layouts are provided: a 4x4 world for state-value evaluation
//! and a 5x7 world for control. Both start at the origin, pay a constant
//! reward per step and terminate only at the goal cell.

pub mod state;
pub mod world;

pub use state::{Action, GridState};
pub use world::{GridConfig, GridWorld, StepOutcome};
