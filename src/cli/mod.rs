//! Command-line interface for training grid-world agents

pub mod commands;
pub mod output;
