//! Tabular value functions, exploration and update rules
//!
//! State-value tables back the evaluation algorithms (TD(0) and
//! Monte-Carlo); action-value tables back the control algorithms (SARSA,
//! Q-learning and Monte-Carlo control).

pub mod agent;
pub mod exploration;
pub mod update;
pub mod value_table;

pub use agent::TabularAgent;
pub use exploration::{
    Annealing, EpsilonGreedy, EpsilonSchedule, EvaluationPolicy, EvaluationPolicyKind,
    ExplorationSource, PolicyMap, RngSource, ScriptedSource, select_action,
};
pub use update::{
    Algorithm, LearningParams, UpdateTiming, monte_carlo_control_update, monte_carlo_update,
    q_learning_update, sarsa_update, td0_update,
};
pub use value_table::{ActionValues, StateValues, TableKind, ValueTable, argmax};
