//! Train command - train a tabular agent on a grid world

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use serde_json::to_writer_pretty;

use crate::{
    AgentConfig,
    cli::output,
    gridworld::{Action, GridConfig, GridWorld},
    pipeline::{
        CsvObserver, JsonlObserver, ProgressObserver, Rollout, TracingObserver, TrainingConfig,
        TrainingPipeline, TrainingResult, greedy_rollout,
    },
    tabular::{Algorithm, Annealing, EvaluationPolicyKind, TabularAgent},
};

#[derive(Debug, Serialize)]
struct TrainingSummaryFile {
    agent: AgentConfig,
    world: GridConfig,
    training: TrainingResult,
    rollout: Option<Rollout>,
    values: Vec<Vec<f64>>,
    policy: Option<Vec<Vec<Action>>>,
}

fn sanitize_summary_path(raw: &Path) -> PathBuf {
    let mut normalized = raw.to_path_buf();
    let raw_str = raw.as_os_str().to_string_lossy();

    // Trailing separator or no file name means a directory target
    if raw_str.ends_with(std::path::MAIN_SEPARATOR) || normalized.file_name().is_none() {
        normalized.push("training_summary.json");
        return normalized;
    }

    match normalized.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => normalized,
        _ => {
            normalized.set_extension("json");
            normalized
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Train a tabular agent", allow_negative_numbers = true)]
pub struct TrainArgs {
    /// Learning algorithm
    #[arg(value_enum)]
    pub algorithm: AlgorithmArg,

    /// Grid layout (defaults to simple for evaluation, control for control algorithms)
    #[arg(long, value_enum)]
    pub world: Option<WorldPreset>,

    /// Number of training episodes
    #[arg(long, short = 'e', default_value_t = 1000)]
    pub episodes: usize,

    /// Learning rate α (0.0-1.0]
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Discount factor γ [0.0-1.0]
    #[arg(long)]
    pub gamma: Option<f64>,

    /// Initial exploration rate
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Subtract this from epsilon after every episode
    #[arg(long, conflicts_with = "epsilon_decay")]
    pub epsilon_step: Option<f64>,

    /// Multiply epsilon by this after every episode
    #[arg(long)]
    pub epsilon_decay: Option<f64>,

    /// Exploration floor
    #[arg(long)]
    pub min_epsilon: Option<f64>,

    /// Policy followed by TD(0) and Monte-Carlo evaluation
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Truncate episodes after this many steps
    #[arg(long, default_value_t = 10_000)]
    pub max_steps: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Agent configuration JSON; explicit flags take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Optional file for the per-episode CSV log
    #[arg(long)]
    pub episodes_csv: Option<PathBuf>,

    /// Optional file for JSONL observations
    #[arg(long)]
    pub observations: Option<PathBuf>,

    /// Show progress bar
    #[arg(long, default_value_t = false)]
    pub progress: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlgorithmArg {
    /// TD(0) state-value evaluation
    #[value(name = "td0", alias = "td")]
    Td0,
    /// Every-visit Monte-Carlo state-value evaluation
    #[value(alias = "mc")]
    MonteCarlo,
    /// SARSA (on-policy TD control)
    Sarsa,
    /// Q-learning (off-policy TD control)
    #[value(alias = "q")]
    QLearning,
    /// Every-visit Monte-Carlo control
    #[value(alias = "mc-control")]
    MonteCarloControl,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Td0 => Algorithm::TemporalDifference,
            AlgorithmArg::MonteCarlo => Algorithm::MonteCarlo,
            AlgorithmArg::Sarsa => Algorithm::Sarsa,
            AlgorithmArg::QLearning => Algorithm::QLearning,
            AlgorithmArg::MonteCarloControl => Algorithm::MonteCarloControl,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WorldPreset {
    /// 4x4, goal at (3, 3)
    Simple,
    /// 5x7, goal at (4, 4)
    Control,
}

impl WorldPreset {
    fn for_algorithm(algorithm: Algorithm) -> Self {
        if algorithm.is_control() {
            WorldPreset::Control
        } else {
            WorldPreset::Simple
        }
    }

    fn config(self) -> GridConfig {
        match self {
            WorldPreset::Simple => GridConfig::simple(),
            WorldPreset::Control => GridConfig::control(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Uniform,
    TowardGoal,
}

impl From<PolicyArg> for EvaluationPolicyKind {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Uniform => EvaluationPolicyKind::Uniform,
            PolicyArg::TowardGoal => EvaluationPolicyKind::TowardGoal,
        }
    }
}

/// Agent configuration from the config file (or algorithm defaults) plus flags
fn build_agent_config(args: &TrainArgs) -> Result<AgentConfig> {
    let algorithm = Algorithm::from(args.algorithm);
    let mut config = match &args.config {
        Some(path) => {
            let mut loaded = AgentConfig::load(path)
                .with_context(|| format!("Failed to load agent config {}", path.display()))?;
            loaded.algorithm = algorithm;
            loaded
        }
        None => AgentConfig::for_algorithm(algorithm),
    };

    if let Some(alpha) = args.alpha {
        config.learning.alpha = alpha;
    }
    if let Some(gamma) = args.gamma {
        config.learning.gamma = gamma;
    }
    if let Some(epsilon) = args.epsilon {
        config.exploration.initial = epsilon;
    }
    if let Some(minimum) = args.min_epsilon {
        config.exploration.minimum = minimum;
    }
    if let Some(step) = args.epsilon_step {
        config.exploration.annealing = Annealing::Linear { step };
    }
    if let Some(factor) = args.epsilon_decay {
        config.exploration.annealing = Annealing::Geometric { factor };
    }
    if let Some(policy) = args.policy {
        config.evaluation = policy.into();
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    config.validate().context("Invalid agent configuration")?;
    Ok(config)
}

fn print_tables(agent: &TabularAgent, world: &GridConfig) {
    if agent.algorithm().is_control() {
        output::print_section("Action values (max over actions)");
    } else {
        output::print_section("State values");
    }
    for row in agent.dump_values() {
        println!("{}", output::format_value_row(&row));
    }

    if let Some(policy) = agent.dump_policy() {
        output::print_section("Greedy policy");
        for (row, actions) in policy.iter().enumerate() {
            println!("{}", output::format_policy_row(row, actions, world.goal));
        }
    }
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let agent_config = build_agent_config(&args)?;
    let algorithm = agent_config.algorithm;
    let world = args
        .world
        .unwrap_or_else(|| WorldPreset::for_algorithm(algorithm))
        .config();

    let mut env = GridWorld::new(world.clone()).context("Invalid grid world")?;
    let mut agent = TabularAgent::new(agent_config, &world)?;

    let summary_spec = args.summary.as_ref().map(|raw| {
        let sanitized = sanitize_summary_path(raw);
        let normalized = sanitized != *raw;
        (sanitized, normalized)
    });

    let training_config = TrainingConfig {
        episodes: args.episodes,
        max_steps_per_episode: args.max_steps,
        seed: args.seed,
    };
    let mut pipeline = TrainingPipeline::new(training_config)
        .with_observer(Box::new(TracingObserver));
    if args.progress {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }
    if let Some(path) = &args.episodes_csv {
        let observer = CsvObserver::new(path)
            .with_context(|| format!("Failed to open episode log {}", path.display()))?;
        pipeline = pipeline.with_observer(Box::new(observer));
    }
    if let Some(path) = &args.observations {
        let observer = JsonlObserver::new(path)
            .with_context(|| format!("Failed to open observations {}", path.display()))?;
        pipeline = pipeline.with_observer(Box::new(observer));
    }

    println!(
        "Training {} for {} episodes on a {}x{} grid",
        agent.name(),
        output::format_number(args.episodes),
        world.rows,
        world.cols
    );
    let result = pipeline
        .run(&mut agent, &mut env)
        .context("Training failed")?;

    print_tables(&agent, &world);

    output::print_section("Training summary");
    output::print_kv("Episodes", &output::format_number(result.episodes));
    output::print_kv(
        "Mean length",
        &format!(
            "{:.2} ± {:.2}",
            result.mean_episode_length, result.std_episode_length
        ),
    );
    output::print_kv("Last length", &result.last_episode_length.to_string());
    output::print_kv("Truncated", &result.truncated_episodes.to_string());
    output::print_kv("Final epsilon", &format!("{:.3}", result.final_epsilon));

    let rollout = if algorithm.is_control() {
        let rollout = greedy_rollout(&agent, &mut env, args.max_steps)?;
        if rollout.reached_goal {
            println!("\nGreedy rollout reaches the goal in {} steps", rollout.steps());
        } else {
            println!(
                "\nGreedy rollout did not reach the goal within {} steps",
                rollout.steps()
            );
        }
        Some(rollout)
    } else {
        None
    };

    if let Some((summary_path, normalized)) = summary_spec {
        if normalized {
            println!("\nNormalizing summary path to {}", summary_path.display());
        }

        if let Some(parent) = summary_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let summary = TrainingSummaryFile {
            agent: agent.config().clone(),
            world,
            training: result,
            rollout,
            values: agent.dump_values(),
            policy: agent.dump_policy(),
        };

        let file = File::create(&summary_path)
            .with_context(|| format!("Failed to create {}", summary_path.display()))?;
        to_writer_pretty(file, &summary)?;
        println!("\nSummary written to {}", summary_path.display());
    }

    Ok(())
}
