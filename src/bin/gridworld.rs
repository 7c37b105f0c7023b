//! Grid-world CLI - train tabular reinforcement-learning agents
//!
//! Evaluates fixed policies with TD(0) and Monte-Carlo, and learns policies
//! with SARSA, Q-learning and Monte-Carlo control.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "gridworld")]
#[command(version, about = "Tabular reinforcement learning on grid worlds", long_about = None)]
struct Cli {
    /// Log at DEBUG level, including every episode
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train an agent and print its value table
    Train(Box<gridworld_rl::cli::commands::train::TrainArgs>),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Train(args) => gridworld_rl::cli::commands::train::execute(*args),
    }
}
