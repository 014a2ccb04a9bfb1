//! Agent hyperparameters and the exploration schedule

use serde::{Deserialize, Serialize};

use crate::error::{Result, SnakeError};

/// Configuration for the Q-learning agent
///
/// # Example
///
/// ```rust
/// use deep_snake::rl::AgentConfig;
///
/// let config = AgentConfig {
///     gamma: 0.95,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Discount factor for the Bellman target
    ///
    /// Default: 0.9
    pub gamma: f32,

    /// Learning rate for the Adam optimizer
    ///
    /// Default: 0.001
    pub learning_rate: f64,

    /// Replay buffer capacity
    ///
    /// Default: 100_000
    pub memory_capacity: usize,

    /// Number of transitions replayed after each episode
    ///
    /// Default: 1000
    pub batch_size: usize,

    /// Width of the hidden layer of the Q-network
    ///
    /// Default: 256
    pub hidden_size: usize,

    /// Exploration weight at generation zero; decays by one per generation
    ///
    /// Default: 80
    pub exploration_start: u32,

    /// Denominator of the exploration probability
    ///
    /// Default: 200
    pub exploration_range: u32,
}

impl AgentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(SnakeError::InvalidConfiguration(format!(
                "gamma must be in [0, 1], got {}",
                self.gamma
            )));
        }

        if self.learning_rate <= 0.0 {
            return Err(SnakeError::InvalidConfiguration(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }

        if self.memory_capacity == 0 {
            return Err(SnakeError::InvalidConfiguration(
                "memory_capacity must be at least 1".to_string(),
            ));
        }

        if self.batch_size == 0 {
            return Err(SnakeError::InvalidConfiguration(
                "batch_size must be at least 1".to_string(),
            ));
        }

        if self.hidden_size == 0 {
            return Err(SnakeError::InvalidConfiguration(
                "hidden_size must be at least 1".to_string(),
            ));
        }

        if self.exploration_range == 0 {
            return Err(SnakeError::InvalidConfiguration(
                "exploration_range must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn exploration(&self) -> ExplorationSchedule {
        ExplorationSchedule {
            start: self.exploration_start,
            range: self.exploration_range,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            gamma: 0.9,
            learning_rate: 0.001,
            memory_capacity: 100_000,
            batch_size: 1000,
            hidden_size: 256,
            exploration_start: 80,
            exploration_range: 200,
        }
    }
}

/// Linearly decaying exploration: `max(0, start - generation)` out of `range`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplorationSchedule {
    pub start: u32,
    pub range: u32,
}

impl ExplorationSchedule {
    /// Exploration weight for a generation; compare against a draw in `0..range`
    pub fn epsilon(&self, generation: u32) -> u32 {
        self.start.saturating_sub(generation)
    }

    /// Probability of a random action at `generation`
    pub fn probability(&self, generation: u32) -> f64 {
        f64::from(self.epsilon(generation).min(self.range)) / f64::from(self.range)
    }
}
