//! Table-update rules
//!
//! Every rule shares one signature: a mutable table, a slice of experience,
//! the learning parameters and the behaviour policy. Online rules consume the
//! most recent transition of the slice; episode rules consume all of it in
//! reverse order.

use serde::{Deserialize, Serialize};

use super::{
    exploration::{EpsilonGreedy, EpsilonSchedule},
    value_table::{ActionValues, StateValues, TableKind, ValueTable},
};
use crate::{Error, Result, gridworld::Action, trajectory::Transition};

/// Step size, discount and initial table value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningParams {
    /// Learning rate α
    pub alpha: f64,
    /// Discount factor γ
    pub gamma: f64,
    /// Value of every table entry before learning
    #[serde(default)]
    pub initial_value: f64,
}

impl LearningParams {
    pub fn new(alpha: f64, gamma: f64) -> Self {
        Self {
            alpha,
            gamma,
            initial_value: 0.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(Error::config(format!(
                "learning rate {} must be within (0, 1]",
                self.alpha
            )));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(Error::config(format!(
                "discount factor {} must be within [0, 1]",
                self.gamma
            )));
        }
        if !self.initial_value.is_finite() {
            return Err(Error::config("initial table value must be finite"));
        }
        Ok(())
    }
}

impl Default for LearningParams {
    fn default() -> Self {
        Self::new(0.01, 1.0)
    }
}

/// When an algorithm's update runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateTiming {
    /// After every transition, from that transition alone
    EveryStep,
    /// Once per episode, from the whole trajectory
    EndOfEpisode,
}

/// The tabular learning algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// TD(0) state-value evaluation
    TemporalDifference,
    /// Every-visit Monte-Carlo state-value evaluation
    MonteCarlo,
    /// On-policy TD control
    Sarsa,
    /// Off-policy TD control
    QLearning,
    /// Every-visit Monte-Carlo control over action values
    MonteCarloControl,
}

impl Algorithm {
    pub const ALL: [Algorithm; 5] = [
        Algorithm::TemporalDifference,
        Algorithm::MonteCarlo,
        Algorithm::Sarsa,
        Algorithm::QLearning,
        Algorithm::MonteCarloControl,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::TemporalDifference => "TD(0)",
            Algorithm::MonteCarlo => "Monte-Carlo",
            Algorithm::Sarsa => "SARSA",
            Algorithm::QLearning => "Q-Learning",
            Algorithm::MonteCarloControl => "Monte-Carlo Control",
        }
    }

    pub fn table_kind(self) -> TableKind {
        match self {
            Algorithm::TemporalDifference | Algorithm::MonteCarlo => TableKind::StateValue,
            Algorithm::Sarsa | Algorithm::QLearning | Algorithm::MonteCarloControl => {
                TableKind::ActionValue
            }
        }
    }

    pub fn timing(self) -> UpdateTiming {
        match self {
            Algorithm::TemporalDifference | Algorithm::Sarsa | Algorithm::QLearning => {
                UpdateTiming::EveryStep
            }
            Algorithm::MonteCarlo | Algorithm::MonteCarloControl => UpdateTiming::EndOfEpisode,
        }
    }

    /// Whether the algorithm improves a policy (control) or only evaluates one
    pub fn is_control(self) -> bool {
        self.table_kind() == TableKind::ActionValue
    }

    /// Learning parameters used by the classic grid-world exercises
    pub fn default_params(self) -> LearningParams {
        match self {
            Algorithm::MonteCarlo => LearningParams::new(0.001, 1.0),
            _ => LearningParams::new(0.01, 1.0),
        }
    }

    /// Exploration schedule used by the classic grid-world exercises
    pub fn default_schedule(self) -> EpsilonSchedule {
        match self {
            Algorithm::QLearning => EpsilonSchedule::linear(0.9, 0.01, 0.2),
            Algorithm::Sarsa | Algorithm::MonteCarloControl => {
                EpsilonSchedule::linear(0.9, 0.03, 0.1)
            }
            // Evaluation follows a fixed policy; epsilon is unused
            Algorithm::TemporalDifference | Algorithm::MonteCarlo => EpsilonSchedule::fixed(0.0),
        }
    }

    /// Apply this algorithm's update rule to `table`
    ///
    /// # Errors
    ///
    /// * `EmptyTrajectory` if `experience` is empty
    /// * `TableMismatch` if `table` is the wrong kind for this algorithm
    /// * `InvalidState` if a transition refers to a cell outside the table
    pub fn update(
        self,
        table: &mut ValueTable,
        experience: &[Transition],
        params: &LearningParams,
        policy: &mut EpsilonGreedy,
    ) -> Result<()> {
        let latest = experience.last().ok_or(Error::EmptyTrajectory)?;
        match (self, table) {
            (Algorithm::TemporalDifference, ValueTable::State(v)) => td0_update(v, latest, params),
            (Algorithm::MonteCarlo, ValueTable::State(v)) => {
                monte_carlo_update(v, experience, params)
            }
            (Algorithm::Sarsa, ValueTable::Action(q)) => {
                let next_action = if latest.done {
                    None
                } else {
                    Some(policy.select(q, &latest.next_state)?)
                };
                sarsa_update(q, latest, next_action, params)
            }
            (Algorithm::QLearning, ValueTable::Action(q)) => q_learning_update(q, latest, params),
            (Algorithm::MonteCarloControl, ValueTable::Action(q)) => {
                monte_carlo_control_update(q, experience, params)
            }
            (algorithm, _) => Err(Error::TableMismatch {
                algorithm: algorithm.name(),
                expected: algorithm.table_kind().label(),
            }),
        }
    }
}

/// TD(0): V(s) ← V(s) + α[r + γV(s') − V(s)]
///
/// The bootstrap term is zero when the transition is terminal.
pub fn td0_update(
    table: &mut StateValues,
    transition: &Transition,
    params: &LearningParams,
) -> Result<()> {
    let current = table.get(&transition.state)?;
    let next_value = if transition.done {
        0.0
    } else {
        table.get(&transition.next_state)?
    };
    let td_target = transition.reward + params.gamma * next_value;
    table.set(
        &transition.state,
        current + params.alpha * (td_target - current),
    )
}

/// Every-visit Monte-Carlo: V(s) ← V(s) + α[G − V(s)] with G accumulated in reverse
///
/// Each step first folds its reward into the return (`G ← r + γG`) and then
/// moves the value of the state it started from toward that return.
pub fn monte_carlo_update(
    table: &mut StateValues,
    trajectory: &[Transition],
    params: &LearningParams,
) -> Result<()> {
    if trajectory.is_empty() {
        return Err(Error::EmptyTrajectory);
    }
    let mut g = 0.0;
    for transition in trajectory.iter().rev() {
        g = transition.reward + params.gamma * g;
        let current = table.get(&transition.state)?;
        table.set(&transition.state, current + params.alpha * (g - current))?;
    }
    Ok(())
}

/// SARSA: Q(s,a) ← Q(s,a) + α[r + γQ(s',a') − Q(s,a)]
///
/// `next_action` is the action the behaviour policy picked for s'. It is
/// ignored, and may be `None`, when the transition is terminal.
pub fn sarsa_update(
    table: &mut ActionValues,
    transition: &Transition,
    next_action: Option<Action>,
    params: &LearningParams,
) -> Result<()> {
    let current = table.get(&transition.state, transition.action)?;
    let next_q = match (transition.done, next_action) {
        (false, Some(action)) => table.get(&transition.next_state, action)?,
        _ => 0.0,
    };
    let td_target = transition.reward + params.gamma * next_q;
    table.set(
        &transition.state,
        transition.action,
        current + params.alpha * (td_target - current),
    )
}

/// Q-learning: Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') − Q(s,a)]
pub fn q_learning_update(
    table: &mut ActionValues,
    transition: &Transition,
    params: &LearningParams,
) -> Result<()> {
    let current = table.get(&transition.state, transition.action)?;
    let max_next_q = if transition.done {
        0.0
    } else {
        table.max_q(&transition.next_state)?
    };
    let td_target = transition.reward + params.gamma * max_next_q;
    table.set(
        &transition.state,
        transition.action,
        current + params.alpha * (td_target - current),
    )
}

/// Every-visit Monte-Carlo control: Q(s,a) ← Q(s,a) + α[G − Q(s,a)]
pub fn monte_carlo_control_update(
    table: &mut ActionValues,
    trajectory: &[Transition],
    params: &LearningParams,
) -> Result<()> {
    if trajectory.is_empty() {
        return Err(Error::EmptyTrajectory);
    }
    let mut g = 0.0;
    for transition in trajectory.iter().rev() {
        g = transition.reward + params.gamma * g;
        let current = table.get(&transition.state, transition.action)?;
        table.set(
            &transition.state,
            transition.action,
            current + params.alpha * (g - current),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        gridworld::GridState,
        tabular::exploration::{EpsilonSchedule, ScriptedSource},
    };

    fn step(from: (usize, usize), action: Action, to: (usize, usize), done: bool) -> Transition {
        Transition::new(
            GridState::new(from.0, from.1),
            action,
            -1.0,
            GridState::new(to.0, to.1),
            done,
        )
    }

    fn greedy_policy() -> EpsilonGreedy {
        EpsilonGreedy::new(EpsilonSchedule::fixed(0.0), Box::new(ScriptedSource::greedy()))
    }

    #[test]
    fn test_td0_update() {
        let mut v = StateValues::new(4, 4, 0.0);
        v.set(&GridState::new(0, 1), -2.0).unwrap();
        let params = LearningParams::new(0.5, 1.0);

        td0_update(&mut v, &step((0, 0), Action::Right, (0, 1), false), &params).unwrap();

        // 0 + 0.5 * (-1 + (-2) - 0) = -1.5
        assert!((v.get(&GridState::origin()).unwrap() + 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_td0_terminal_ignores_next_value() {
        let mut v = StateValues::new(4, 4, 0.0);
        v.set(&GridState::new(3, 3), -100.0).unwrap();
        let params = LearningParams::new(1.0, 1.0);

        td0_update(&mut v, &step((3, 2), Action::Right, (3, 3), true), &params).unwrap();
        assert_eq!(v.get(&GridState::new(3, 2)).unwrap(), -1.0);
    }

    #[test]
    fn test_monte_carlo_uses_reverse_returns() {
        let mut v = StateValues::new(4, 4, 0.0);
        let trajectory = [
            step((0, 0), Action::Right, (0, 1), false),
            step((0, 1), Action::Right, (0, 2), false),
            step((0, 2), Action::Right, (0, 3), true),
        ];
        let params = LearningParams::new(1.0, 1.0);

        monte_carlo_update(&mut v, &trajectory, &params).unwrap();

        assert_eq!(v.get(&GridState::new(0, 2)).unwrap(), -1.0);
        assert_eq!(v.get(&GridState::new(0, 1)).unwrap(), -2.0);
        assert_eq!(v.get(&GridState::new(0, 0)).unwrap(), -3.0);
        assert_eq!(v.get(&GridState::new(0, 3)).unwrap(), 0.0);
    }

    #[test]
    fn test_monte_carlo_every_visit() {
        // The origin is visited twice: returns -3 and -2, alpha 0.5
        let mut v = StateValues::new(4, 4, 0.0);
        let trajectory = [
            step((0, 0), Action::Left, (0, 0), false),
            step((0, 0), Action::Right, (0, 1), false),
            step((0, 1), Action::Down, (1, 1), true),
        ];
        let params = LearningParams::new(0.5, 1.0);
        monte_carlo_update(&mut v, &trajectory, &params).unwrap();

        // Reverse order: G=-2 moves it to -1.0, then G=-3 moves it to -2.0
        assert!((v.get(&GridState::origin()).unwrap() + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_monte_carlo_rejects_empty() {
        let mut v = StateValues::new(4, 4, 0.0);
        assert!(matches!(
            monte_carlo_update(&mut v, &[], &LearningParams::default()),
            Err(Error::EmptyTrajectory)
        ));
    }

    #[test]
    fn test_sarsa_and_q_learning_diverge() {
        let mut q = ActionValues::new(5, 7, 0.0);
        let next = GridState::new(0, 1);
        q.set(&next, Action::Left, -1.0).unwrap();
        q.set(&next, Action::Up, -5.0).unwrap();
        q.set(&next, Action::Right, -2.0).unwrap();
        q.set(&next, Action::Down, -3.0).unwrap();
        let mut sarsa_table = q.clone();
        let transition = step((0, 0), Action::Right, (0, 1), false);
        let params = LearningParams::new(0.5, 1.0);

        sarsa_update(&mut sarsa_table, &transition, Some(Action::Up), &params).unwrap();
        q_learning_update(&mut q, &transition, &params).unwrap();

        let sarsa_value = sarsa_table.get(&GridState::origin(), Action::Right).unwrap();
        let q_value = q.get(&GridState::origin(), Action::Right).unwrap();
        // SARSA: 0.5 * (-1 + -5) = -3.0, Q-learning: 0.5 * (-1 + -1) = -1.0
        assert!((sarsa_value + 3.0).abs() < 1e-12);
        assert!((q_value + 1.0).abs() < 1e-12);
        assert_ne!(sarsa_value, q_value);
    }

    #[test]
    fn test_sarsa_terminal_ignores_next_action() {
        let mut q = ActionValues::new(4, 4, 0.0);
        q.set(&GridState::new(3, 3), Action::Left, -50.0).unwrap();
        let params = LearningParams::new(1.0, 1.0);
        sarsa_update(
            &mut q,
            &step((3, 2), Action::Right, (3, 3), true),
            Some(Action::Left),
            &params,
        )
        .unwrap();
        assert_eq!(q.get(&GridState::new(3, 2), Action::Right).unwrap(), -1.0);
    }

    #[test]
    fn test_algorithm_dispatch_samples_sarsa_next_action() {
        let mut table = TableKind::ActionValue.build(5, 7, 0.0);
        if let ValueTable::Action(q) = &mut table {
            q.set(&GridState::new(0, 1), Action::Left, -1.0).unwrap();
            q.set(&GridState::new(0, 1), Action::Up, -5.0).unwrap();
        }
        // Coin 0.0 always explores; index 1 samples Up
        let mut policy = EpsilonGreedy::new(
            EpsilonSchedule::fixed(0.5),
            Box::new(ScriptedSource::new(vec![0.0], vec![1])),
        );
        let params = LearningParams::new(0.5, 1.0);
        let transition = step((0, 0), Action::Right, (0, 1), false);

        Algorithm::Sarsa
            .update(&mut table, &[transition], &params, &mut policy)
            .unwrap();

        let q = table.as_action_values().unwrap();
        assert!((q.get(&GridState::origin(), Action::Right).unwrap() + 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_algorithm_dispatch_uses_latest_transition() {
        let mut table = TableKind::ActionValue.build(4, 4, 0.0);
        let experience = [
            step((0, 0), Action::Right, (0, 1), false),
            step((0, 1), Action::Down, (1, 1), false),
        ];
        Algorithm::QLearning
            .update(
                &mut table,
                &experience,
                &LearningParams::new(1.0, 1.0),
                &mut greedy_policy(),
            )
            .unwrap();

        let q = table.as_action_values().unwrap();
        assert_eq!(q.get(&GridState::origin(), Action::Right).unwrap(), 0.0);
        assert_eq!(q.get(&GridState::new(0, 1), Action::Down).unwrap(), -1.0);
    }

    #[test]
    fn test_monte_carlo_control_update() {
        let mut table = TableKind::ActionValue.build(4, 4, 0.0);
        let experience = [
            step((0, 0), Action::Right, (0, 1), false),
            step((0, 1), Action::Down, (1, 1), true),
        ];
        Algorithm::MonteCarloControl
            .update(
                &mut table,
                &experience,
                &LearningParams::new(1.0, 1.0),
                &mut greedy_policy(),
            )
            .unwrap();

        let q = table.as_action_values().unwrap();
        assert_eq!(q.get(&GridState::origin(), Action::Right).unwrap(), -2.0);
        assert_eq!(q.get(&GridState::new(0, 1), Action::Down).unwrap(), -1.0);
    }

    #[test]
    fn test_table_mismatch() {
        let mut table = TableKind::StateValue.build(4, 4, 0.0);
        let result = Algorithm::QLearning.update(
            &mut table,
            &[step((0, 0), Action::Right, (0, 1), false)],
            &LearningParams::default(),
            &mut greedy_policy(),
        );
        assert!(matches!(result, Err(Error::TableMismatch { .. })));
    }

    #[test]
    fn test_empty_experience() {
        let mut table = TableKind::StateValue.build(4, 4, 0.0);
        let result = Algorithm::TemporalDifference.update(
            &mut table,
            &[],
            &LearningParams::default(),
            &mut greedy_policy(),
        );
        assert!(matches!(result, Err(Error::EmptyTrajectory)));
    }

    #[test]
    fn test_algorithm_metadata() {
        assert_eq!(Algorithm::TemporalDifference.table_kind(), TableKind::StateValue);
        assert_eq!(Algorithm::MonteCarlo.timing(), UpdateTiming::EndOfEpisode);
        assert_eq!(Algorithm::Sarsa.timing(), UpdateTiming::EveryStep);
        assert!(Algorithm::QLearning.is_control());
        assert!(!Algorithm::MonteCarlo.is_control());
    }

    #[test]
    fn test_params_validation() {
        assert!(LearningParams::default().validate().is_ok());
        assert!(LearningParams::new(0.0, 1.0).validate().is_err());
        assert!(LearningParams::new(0.5, 1.5).validate().is_err());
        assert!(LearningParams::new(f64::NAN, 1.0).validate().is_err());
    }
}
