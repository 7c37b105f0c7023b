//! Tabular learning agent
//!
//! Owns the value table, the behaviour policy and the current episode's
//! transitions, and routes experience to the configured update rule.

use tracing::debug;

use super::{
    exploration::{EpsilonGreedy, EvaluationPolicy, ExplorationSource, RngSource},
    update::{Algorithm, LearningParams, UpdateTiming},
    value_table::ValueTable,
};
use crate::{
    AgentConfig, Error, Result,
    gridworld::{Action, GridConfig, GridState},
    trajectory::{Trajectory, Transition},
};

/// Agent learning one value table with one update rule
///
/// # Examples
///
/// ```
/// use gridworld_rl::{
///     AgentConfig,
///     gridworld::{GridConfig, GridState},
///     tabular::{Algorithm, TabularAgent},
/// };
///
/// let config = AgentConfig::for_algorithm(Algorithm::QLearning).with_seed(1);
/// let mut agent = TabularAgent::new(config, &GridConfig::control()).unwrap();
/// let action = agent.select_action(&GridState::origin()).unwrap();
/// assert!(action.index() < 4);
/// ```
#[derive(Debug)]
pub struct TabularAgent {
    config: AgentConfig,
    table: ValueTable,
    policy: EpsilonGreedy,
    evaluation: EvaluationPolicy,
    episode: Trajectory,
}

impl TabularAgent {
    /// Create an agent sized for `world`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the learning parameters or the
    /// epsilon schedule are out of range.
    pub fn new(config: AgentConfig, world: &GridConfig) -> Result<Self> {
        config.validate()?;
        let table = config.algorithm.table_kind().build(
            world.rows,
            world.cols,
            config.learning.initial_value,
        );
        let policy = EpsilonGreedy::new(
            config.exploration,
            Box::new(RngSource::from_seed_option(config.seed)),
        );
        let evaluation =
            EvaluationPolicy::from_kind(config.evaluation, world.rows, world.cols, world.goal);
        Ok(Self {
            config,
            table,
            policy,
            evaluation,
            episode: Trajectory::new(),
        })
    }

    /// Replace the randomness source, e.g. with a scripted one in tests
    pub fn with_source(mut self, source: Box<dyn ExplorationSource>) -> Self {
        self.policy.set_source(source);
        self
    }

    /// Replace the evaluation policy followed by state-value algorithms
    pub fn with_evaluation_policy(mut self, policy: EvaluationPolicy) -> Self {
        self.evaluation = policy;
        self
    }

    /// Reseed the randomness source
    pub fn set_rng_seed(&mut self, seed: u64) {
        self.policy.set_source(Box::new(RngSource::seeded(seed)));
    }

    pub fn algorithm(&self) -> Algorithm {
        self.config.algorithm
    }

    pub fn name(&self) -> &'static str {
        self.config.algorithm.name()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn params(&self) -> &LearningParams {
        &self.config.learning
    }

    pub fn table(&self) -> &ValueTable {
        &self.table
    }

    pub fn epsilon(&self) -> f64 {
        self.policy.epsilon()
    }

    /// Transitions recorded so far in the current episode
    pub fn episode(&self) -> &Trajectory {
        &self.episode
    }

    /// Action to take in `state`
    ///
    /// Control algorithms act epsilon-greedily on their Q-table; evaluation
    /// algorithms follow their fixed evaluation policy.
    pub fn select_action(&mut self, state: &GridState) -> Result<Action> {
        match &self.table {
            ValueTable::Action(q) => self.policy.select(q, state),
            ValueTable::State(_) => self.evaluation.select(state, self.policy.source_mut()),
        }
    }

    /// Greedy action without exploration, for control algorithms
    pub fn greedy_action(&self, state: &GridState) -> Result<Action> {
        match &self.table {
            ValueTable::Action(q) => q.greedy_action(state),
            ValueTable::State(_) => Err(Error::TableMismatch {
                algorithm: "greedy action selection",
                expected: "action-value",
            }),
        }
    }

    /// Record one transition, updating immediately for online algorithms
    pub fn observe(&mut self, transition: Transition) -> Result<()> {
        self.episode.push(transition);
        if self.config.algorithm.timing() == UpdateTiming::EveryStep {
            self.config.algorithm.update(
                &mut self.table,
                std::slice::from_ref(&transition),
                &self.config.learning,
                &mut self.policy,
            )?;
        }
        Ok(())
    }

    /// Close the current episode and return its trajectory
    ///
    /// End-of-episode algorithms update from the whole trajectory here.
    /// Epsilon is not touched; the driver anneals separately.
    pub fn finish_episode(&mut self) -> Result<Trajectory> {
        let trajectory = std::mem::take(&mut self.episode);
        if self.config.algorithm.timing() == UpdateTiming::EndOfEpisode && !trajectory.is_empty()
        {
            self.config.algorithm.update(
                &mut self.table,
                trajectory.transitions(),
                &self.config.learning,
                &mut self.policy,
            )?;
        }
        debug!(
            algorithm = self.name(),
            steps = trajectory.len(),
            terminal = trajectory.is_terminal(),
            "episode finished"
        );
        Ok(trajectory)
    }

    /// Anneal epsilon once; call after each completed episode
    pub fn anneal(&mut self) -> f64 {
        self.policy.anneal()
    }

    /// Forget everything learned and restore the initial epsilon
    pub fn reset(&mut self) {
        let (rows, cols) = self.table.dimensions();
        self.table = self.config.algorithm.table_kind().build(
            rows,
            cols,
            self.config.learning.initial_value,
        );
        self.policy.reset();
        self.episode.clear();
    }

    /// One scalar per cell, one row per grid row
    ///
    /// V(s) for evaluation algorithms, max_a Q(s, a) for control algorithms.
    pub fn dump_values(&self) -> Vec<Vec<f64>> {
        self.table.value_grid()
    }

    /// Greedy action per cell, or `None` for evaluation algorithms
    pub fn dump_policy(&self) -> Option<Vec<Vec<Action>>> {
        self.table.as_action_values().map(|q| q.policy_grid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabular::{
        exploration::{EpsilonSchedule, EvaluationPolicyKind, PolicyMap, ScriptedSource},
        value_table::TableKind,
    };

    fn transition(from: (usize, usize), action: Action, to: (usize, usize), done: bool) -> Transition {
        Transition::new(
            GridState::new(from.0, from.1),
            action,
            -1.0,
            GridState::new(to.0, to.1),
            done,
        )
    }

    #[test]
    fn test_agent_builds_matching_table() {
        let td = TabularAgent::new(
            AgentConfig::for_algorithm(Algorithm::TemporalDifference),
            &GridConfig::simple(),
        )
        .unwrap();
        assert_eq!(td.table().kind(), TableKind::StateValue);
        assert_eq!(td.table().dimensions(), (4, 4));

        let q = TabularAgent::new(
            AgentConfig::for_algorithm(Algorithm::QLearning),
            &GridConfig::control(),
        )
        .unwrap();
        assert_eq!(q.table().kind(), TableKind::ActionValue);
        assert_eq!(q.table().dimensions(), (5, 7));
        assert_eq!(q.epsilon(), 0.9);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AgentConfig::for_algorithm(Algorithm::Sarsa).with_learning_rate(0.0);
        assert!(TabularAgent::new(config, &GridConfig::control()).is_err());
    }

    #[test]
    fn test_online_algorithms_update_on_observe() {
        let config = AgentConfig::for_algorithm(Algorithm::QLearning).with_learning_rate(0.5);
        let mut agent = TabularAgent::new(config, &GridConfig::control()).unwrap();
        agent
            .observe(transition((0, 0), Action::Right, (0, 1), false))
            .unwrap();

        let q = agent.table().as_action_values().unwrap();
        assert_eq!(q.get(&GridState::origin(), Action::Right).unwrap(), -0.5);
        assert_eq!(agent.episode().len(), 1);
    }

    #[test]
    fn test_monte_carlo_waits_for_episode_end() {
        let config = AgentConfig::for_algorithm(Algorithm::MonteCarlo).with_learning_rate(1.0);
        let mut agent = TabularAgent::new(config, &GridConfig::simple()).unwrap();
        agent
            .observe(transition((0, 0), Action::Right, (0, 1), false))
            .unwrap();
        agent
            .observe(transition((0, 1), Action::Right, (0, 2), false))
            .unwrap();
        agent
            .observe(transition((0, 2), Action::Right, (0, 3), false))
            .unwrap();
        assert!(agent.dump_values().iter().flatten().all(|v| *v == 0.0));

        let trajectory = agent.finish_episode().unwrap();
        assert_eq!(trajectory.len(), 3);
        assert!(agent.episode().is_empty());

        let values = agent.dump_values();
        assert_eq!(values[0][..3], [-3.0, -2.0, -1.0]);
        assert_eq!(values[0][3], 0.0);
    }

    #[test]
    fn test_finish_empty_episode_is_noop() {
        let mut agent = TabularAgent::new(
            AgentConfig::for_algorithm(Algorithm::MonteCarloControl),
            &GridConfig::control(),
        )
        .unwrap();
        let trajectory = agent.finish_episode().unwrap();
        assert!(trajectory.is_empty());
    }

    #[test]
    fn test_evaluation_algorithms_follow_fixed_policy() {
        let config = AgentConfig::for_algorithm(Algorithm::TemporalDifference)
            .with_evaluation(EvaluationPolicyKind::TowardGoal);
        let mut agent = TabularAgent::new(config, &GridConfig::simple()).unwrap();
        assert_eq!(
            agent.select_action(&GridState::origin()).unwrap(),
            Action::Down
        );
        assert_eq!(
            agent.select_action(&GridState::new(3, 1)).unwrap(),
            Action::Right
        );

        let mut agent = agent.with_evaluation_policy(EvaluationPolicy::Fixed(
            PolicyMap::uniform(4, 4, Action::Up),
        ));
        assert_eq!(
            agent.select_action(&GridState::new(2, 2)).unwrap(),
            Action::Up
        );
    }

    #[test]
    fn test_scripted_source_drives_exploration() {
        let config = AgentConfig::for_algorithm(Algorithm::Sarsa)
            .with_exploration(EpsilonSchedule::fixed(0.5));
        let mut agent = TabularAgent::new(config, &GridConfig::control())
            .unwrap()
            .with_source(Box::new(ScriptedSource::new(vec![0.9, 0.1], vec![2])));

        // 0.9 >= epsilon: greedy, all ties resolve to Left
        assert_eq!(
            agent.select_action(&GridState::origin()).unwrap(),
            Action::Left
        );
        // 0.1 < epsilon: explore with index 2
        assert_eq!(
            agent.select_action(&GridState::origin()).unwrap(),
            Action::Right
        );
    }

    #[test]
    fn test_greedy_action_requires_action_values() {
        let agent = TabularAgent::new(
            AgentConfig::for_algorithm(Algorithm::MonteCarlo),
            &GridConfig::simple(),
        )
        .unwrap();
        assert!(matches!(
            agent.greedy_action(&GridState::origin()),
            Err(Error::TableMismatch { .. })
        ));
        assert!(agent.dump_policy().is_none());
    }

    #[test]
    fn test_anneal_and_reset() {
        let config = AgentConfig::for_algorithm(Algorithm::QLearning).with_learning_rate(1.0);
        let mut agent = TabularAgent::new(config, &GridConfig::control()).unwrap();
        agent
            .observe(transition((0, 0), Action::Down, (1, 0), false))
            .unwrap();
        for _ in 0..5 {
            agent.anneal();
        }
        assert!((agent.epsilon() - 0.85).abs() < 1e-9);

        agent.reset();
        assert_eq!(agent.epsilon(), 0.9);
        assert!(agent.episode().is_empty());
        assert!(agent.dump_values().iter().flatten().all(|v| *v == 0.0));
    }

    #[test]
    fn test_dump_policy_shape() {
        let agent = TabularAgent::new(
            AgentConfig::for_algorithm(Algorithm::Sarsa),
            &GridConfig::control(),
        )
        .unwrap();
        let policy = agent.dump_policy().unwrap();
        assert_eq!(policy.len(), 5);
        assert!(policy.iter().all(|row| row.len() == 7));
    }
}
