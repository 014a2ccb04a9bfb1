//! Epsilon-greedy Q-learning agent
//!
//! The agent owns the replay buffer and the value function. It picks actions
//! with a linearly decaying exploration schedule, trains on every transition
//! as it happens, and replays a sample of past transitions once per episode.

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::approximator::{ValueFunction, argmax};
use super::buffer::{ReplayBuffer, Transition};
use super::config::{AgentConfig, ExplorationSchedule};
use super::features::Features;
use crate::error::Result;
use crate::game::RelativeAction;

/// Policy agent driving a [`ValueFunction`]
///
/// # Type Parameters
///
/// * `V` - The value-function approximator, e.g. [`crate::rl::QTrainer`]
///
/// # Example
///
/// ```rust,ignore
/// use deep_snake::rl::{AgentConfig, PolicyAgent, QTrainer, TrainingBackend, default_device};
///
/// let config = AgentConfig::default();
/// let trainer = QTrainer::<TrainingBackend>::new(config.clone(), default_device())?;
/// let mut agent = PolicyAgent::new(trainer, config)?;
///
/// let action = agent.select_action(&[0.0; 11])?;
/// ```
pub struct PolicyAgent<V: ValueFunction> {
    /// Value-function approximator
    value_fn: V,

    /// Replay memory, owned exclusively by the agent
    memory: ReplayBuffer,

    config: AgentConfig,

    schedule: ExplorationSchedule,

    /// Episodes completed
    generation: u32,

    rng: StdRng,
}

impl<V: ValueFunction> PolicyAgent<V> {
    /// Create a new agent
    pub fn new(value_fn: V, config: AgentConfig) -> Result<Self> {
        Self::with_rng(value_fn, config, StdRng::from_entropy())
    }

    /// Create an agent with a fixed seed for exploration and replay sampling
    pub fn with_seed(value_fn: V, config: AgentConfig, seed: u64) -> Result<Self> {
        Self::with_rng(value_fn, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(value_fn: V, config: AgentConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            value_fn,
            memory: ReplayBuffer::new(config.memory_capacity)?,
            schedule: config.exploration(),
            config,
            generation: 0,
            rng,
        })
    }

    /// Choose an action for `state`
    ///
    /// With probability `max(0, start - generation) / range` a uniformly random
    /// action is returned; otherwise the action with the highest predicted
    /// value, ties going to the first index.
    pub fn select_action(&mut self, state: &Features) -> Result<RelativeAction> {
        let epsilon = self.schedule.epsilon(self.generation);

        if self.rng.gen_range(0..self.schedule.range) < epsilon {
            let idx = self.rng.gen_range(0..RelativeAction::ALL.len());
            return Ok(RelativeAction::ALL[idx]);
        }

        let values = self.value_fn.predict(state)?;
        Ok(RelativeAction::ALL[argmax(&values)])
    }

    /// Store a transition in replay memory
    pub fn remember(&mut self, transition: Transition) {
        self.memory.push(transition);
    }

    /// Train on a single fresh transition
    pub fn train_step_short(&mut self, transition: &Transition) -> Result<f32> {
        self.value_fn.train_step(std::slice::from_ref(transition))
    }

    /// Replay up to `batch_size` stored transitions in one update
    ///
    /// Returns `None` when memory is empty and no update was made.
    pub fn train_step_long(&mut self) -> Result<Option<f32>> {
        if self.memory.is_empty() {
            return Ok(None);
        }

        let batch = self.memory.sample(self.config.batch_size, &mut self.rng);
        self.value_fn.train_step(&batch).map(Some)
    }

    /// Mark the end of an episode
    pub fn increment_generation(&mut self) {
        self.generation += 1;
    }

    /// Number of completed episodes
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Current probability of a random action
    pub fn exploration_probability(&self) -> f64 {
        self.schedule.probability(self.generation)
    }

    pub fn memory(&self) -> &ReplayBuffer {
        &self.memory
    }

    pub fn value_fn(&self) -> &V {
        &self.value_fn
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::rl::approximator::{ActionValues, Estimator};
    use std::cell::Cell;
    use std::path::Path;

    /// Value function with fixed predictions that records every training batch
    #[derive(Default)]
    pub(crate) struct RecordingValueFn {
        pub values: ActionValues,
        pub batches: Vec<Vec<Transition>>,
        pub saves: Cell<usize>,
        pub fail: bool,
    }

    impl RecordingValueFn {
        pub fn with_values(values: ActionValues) -> Self {
            Self {
                values,
                ..Default::default()
            }
        }
    }

    impl Estimator for RecordingValueFn {
        fn predict(&self, _state: &Features) -> Result<ActionValues> {
            if self.fail {
                return Err(crate::error::SnakeError::Approximator("boom".to_string()));
            }
            Ok(self.values)
        }
    }

    impl ValueFunction for RecordingValueFn {
        fn train_step(&mut self, batch: &[Transition]) -> Result<f32> {
            if self.fail {
                return Err(crate::error::SnakeError::Approximator("boom".to_string()));
            }
            self.batches.push(batch.to_vec());
            Ok(batch.len() as f32)
        }

        fn save(&self, _path: &Path) -> Result<()> {
            self.saves.set(self.saves.get() + 1);
            Ok(())
        }
    }

    fn transition(id: usize, terminal: bool) -> Transition {
        Transition {
            state: [id as f32; 11],
            action: RelativeAction::Straight,
            reward: 0.0,
            next_state: [0.0; 11],
            terminal,
        }
    }

    fn agent_with(values: ActionValues, config: AgentConfig) -> PolicyAgent<RecordingValueFn> {
        PolicyAgent::with_seed(RecordingValueFn::with_values(values), config, 1234).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AgentConfig {
            memory_capacity: 0,
            ..Default::default()
        };
        assert!(PolicyAgent::new(RecordingValueFn::default(), config).is_err());
    }

    #[test]
    fn test_exploits_after_schedule_ends() {
        let mut agent = agent_with([0.1, 0.9, 0.3], AgentConfig::default());
        for _ in 0..80 {
            agent.increment_generation();
        }
        assert_eq!(agent.exploration_probability(), 0.0);

        for _ in 0..500 {
            assert_eq!(
                agent.select_action(&[0.0; 11]).unwrap(),
                RelativeAction::TurnRight
            );
        }
    }

    #[test]
    fn test_ties_pick_first_action() {
        let mut agent = agent_with([1.0, 1.0, 1.0], AgentConfig {
            exploration_start: 0,
            ..Default::default()
        });

        assert_eq!(
            agent.select_action(&[0.0; 11]).unwrap(),
            RelativeAction::Straight
        );
    }

    #[test]
    fn test_explores_at_generation_zero() {
        // Greedy choice is always Straight, so any other action is exploration
        let mut agent = agent_with([5.0, 0.0, 0.0], AgentConfig::default());
        let trials = 4000;

        let explored = (0..trials)
            .filter(|_| agent.select_action(&[0.0; 11]).unwrap() != RelativeAction::Straight)
            .count();

        // Expected: 0.4 * 2/3 of trials pick a non-greedy action
        let rate = explored as f64 / trials as f64;
        assert!((rate - 0.4 * 2.0 / 3.0).abs() < 0.05, "rate was {rate}");
    }

    #[test]
    fn test_remember_respects_capacity() {
        let config = AgentConfig {
            memory_capacity: 3,
            ..Default::default()
        };
        let mut agent = agent_with([0.0; 3], config);

        for i in 0..5 {
            agent.remember(transition(i, false));
        }

        assert_eq!(agent.memory().len(), 3);
        let firsts: Vec<f32> = agent.memory().iter().map(|t| t.state[0]).collect();
        assert_eq!(firsts, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_short_training_uses_single_transition() {
        let mut agent = agent_with([0.0; 3], AgentConfig::default());
        let t = transition(7, false);

        agent.train_step_short(&t).unwrap();

        assert_eq!(agent.value_fn().batches, vec![vec![t]]);
        assert!(agent.memory().is_empty());
    }

    #[test]
    fn test_long_training_uses_whole_memory_when_small() {
        let config = AgentConfig {
            batch_size: 10,
            ..Default::default()
        };
        let mut agent = agent_with([0.0; 3], config);
        for i in 0..10 {
            agent.remember(transition(i, false));
        }

        agent.train_step_long().unwrap();
        assert_eq!(agent.value_fn().batches[0].len(), 10);
    }

    #[test]
    fn test_long_training_samples_batch_size() {
        let config = AgentConfig {
            batch_size: 4,
            ..Default::default()
        };
        let mut agent = agent_with([0.0; 3], config);
        for i in 0..25 {
            agent.remember(transition(i, false));
        }

        let loss = agent.train_step_long().unwrap();

        assert_eq!(loss, Some(4.0));
        assert_eq!(agent.value_fn().batches[0].len(), 4);
        assert_eq!(agent.memory().len(), 25);
    }

    #[test]
    fn test_long_training_skips_empty_memory() {
        let mut agent = agent_with([0.0; 3], AgentConfig::default());
        assert_eq!(agent.train_step_long().unwrap(), None);
        assert!(agent.value_fn().batches.is_empty());
    }

    #[test]
    fn test_approximator_failure_propagates() {
        let value_fn = RecordingValueFn {
            fail: true,
            ..Default::default()
        };
        let config = AgentConfig {
            exploration_start: 0,
            ..Default::default()
        };
        let mut agent = PolicyAgent::with_seed(value_fn, config, 1).unwrap();

        assert!(agent.select_action(&[0.0; 11]).is_err());
        assert!(agent.train_step_short(&transition(0, true)).is_err());
    }
}
