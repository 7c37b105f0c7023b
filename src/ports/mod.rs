//! Ports (trait boundaries) between the learning core and its surroundings
//!
//! The training pipeline drives any [`Environment`] and reports to any
//! number of [`Observer`]s; concrete grids and exporters are adapters.

pub mod environment;
pub mod observer;

pub use environment::Environment;
pub use observer::{EpisodeSummary, Observer};
