//! Online Q-learning training loop
//!
//! Every step encodes the board, asks the agent for an action, advances the
//! game, trains on the fresh transition and stores it in replay memory. When
//! an episode ends the board is reset, the generation counter advances and a
//! sample of replay memory is trained on.
//!
//! The loop stops after an optional episode budget or when its cancellation
//! flag is raised.
//!
//! # Example
//!
//! ```rust,ignore
//! use deep_snake::modes::{TrainConfig, TrainingLoop};
//! use deep_snake::rl::{QTrainer, TrainingBackend, default_device};
//!
//! let config = TrainConfig::new(Some(500), Some("models/snake.mpk".into()));
//! let trainer = QTrainer::<TrainingBackend>::new(config.agent_config.clone(), default_device())?;
//!
//! let mut training = TrainingLoop::new(trainer, config)?;
//! training.run()?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use super::watch::Simulation;
use crate::game::{GameConfig, GameEngine, GameState};
use crate::metrics::TrainingStats;
use crate::rl::{AgentConfig, PolicyAgent, Transition, ValueFunction, encode};

/// Configuration for training mode
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Number of episodes to train; `None` runs until cancelled
    pub episodes: Option<usize>,

    /// Where to save the approximator whenever the record score improves
    pub save_path: Option<PathBuf>,

    /// Log an episode report every N episodes
    pub log_frequency: usize,

    /// Board size and rewards
    pub game_config: GameConfig,

    /// Learning hyperparameters
    pub agent_config: AgentConfig,
}

impl TrainConfig {
    /// Create a training configuration with default game and agent settings
    ///
    /// ```rust
    /// use deep_snake::modes::TrainConfig;
    ///
    /// let config = TrainConfig::new(Some(1000), None);
    /// assert_eq!(config.log_frequency, 1);
    /// ```
    pub fn new(episodes: Option<usize>, save_path: Option<PathBuf>) -> Self {
        Self {
            episodes,
            save_path,
            log_frequency: 1,
            game_config: GameConfig::default(),
            agent_config: AgentConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.log_frequency == 0 {
            bail!("log_frequency must be at least 1");
        }
        self.game_config.validate()?;
        self.agent_config.validate()?;
        Ok(())
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Report for a finished episode
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    /// Generation counter after the episode
    pub generation: u32,
    pub score: u32,
    pub steps: u32,
    /// Sum of rewards over the episode
    pub reward: f32,
    /// Best score so far, including this episode
    pub record: u32,
    pub new_record: bool,
}

/// Result of one training step
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub reward: f32,
    pub terminated: bool,
    pub score: u32,
    /// Set when this step ended an episode
    pub episode: Option<EpisodeSummary>,
}

/// Game engine, agent and statistics wired into one training loop
pub struct TrainingLoop<V: ValueFunction> {
    engine: GameEngine,
    state: GameState,
    agent: PolicyAgent<V>,
    stats: TrainingStats,
    config: TrainConfig,
    cancel: Arc<AtomicBool>,

    /// Reward accumulated in the running episode
    episode_reward: f32,
}

impl<V: ValueFunction> TrainingLoop<V> {
    /// Create a training loop around `value_fn`
    pub fn new(value_fn: V, config: TrainConfig) -> Result<Self> {
        config.validate()?;
        let engine = GameEngine::new(config.game_config.clone())?;
        let agent = PolicyAgent::new(value_fn, config.agent_config.clone())?;
        Self::from_parts(engine, agent, config)
    }

    /// Create a training loop with seeded food placement and exploration
    pub fn with_seed(value_fn: V, config: TrainConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let engine = GameEngine::with_seed(config.game_config.clone(), seed)?;
        let agent = PolicyAgent::with_seed(value_fn, config.agent_config.clone(), seed)?;
        Self::from_parts(engine, agent, config)
    }

    fn from_parts(
        mut engine: GameEngine,
        agent: PolicyAgent<V>,
        config: TrainConfig,
    ) -> Result<Self> {
        let state = engine.reset().context("Failed to reset game")?;

        Ok(Self {
            engine,
            state,
            agent,
            stats: TrainingStats::default(),
            config,
            cancel: Arc::new(AtomicBool::new(false)),
            episode_reward: 0.0,
        })
    }

    /// Flag that stops [`run`](Self::run) before its next step once set
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Advance the game by one step and train on the result
    pub fn step(&mut self) -> Result<StepOutcome> {
        let state_old = encode(&self.state);
        let action = self
            .agent
            .select_action(&state_old)
            .context("Failed to select action")?;

        let result = self.engine.step(&mut self.state, action)?;
        let state_new = encode(&self.state);

        let transition = Transition {
            state: state_old,
            action,
            reward: result.reward,
            next_state: state_new,
            terminal: result.terminated,
        };
        self.agent
            .train_step_short(&transition)
            .context("Short-term training failed")?;
        self.agent.remember(transition);
        self.episode_reward += result.reward;

        let episode = if result.terminated {
            Some(self.finish_episode()?)
        } else {
            None
        };

        Ok(StepOutcome {
            reward: result.reward,
            terminated: result.terminated,
            score: result.score,
            episode,
        })
    }

    fn finish_episode(&mut self) -> Result<EpisodeSummary> {
        let score = self.state.score;
        let steps = self.state.steps;
        let reward = std::mem::take(&mut self.episode_reward);

        self.state = self.engine.reset().context("Failed to reset game")?;
        self.agent.increment_generation();

        if let Some(loss) = self
            .agent
            .train_step_long()
            .context("Long-term training failed")?
        {
            self.stats.record_loss(loss);
        }

        let new_record = self.stats.record_episode(score, steps, reward);
        if new_record {
            if let Some(path) = &self.config.save_path {
                self.agent
                    .value_fn()
                    .save(path)
                    .with_context(|| format!("Failed to save model to {path:?}"))?;
                debug!(path = ?path, record = score, "saved model on new record");
            }
        }

        let summary = EpisodeSummary {
            generation: self.agent.generation(),
            score,
            steps,
            reward,
            record: self.stats.record(),
            new_record,
        };

        if summary.generation as usize % self.config.log_frequency == 0 {
            info!(
                generation = summary.generation,
                score,
                record = summary.record,
                mean_score = self.stats.all_time_mean_score(),
                "episode finished"
            );
        }

        Ok(summary)
    }

    /// Train until the episode budget is spent or the loop is cancelled
    pub fn run(&mut self) -> Result<()> {
        info!(
            episodes = ?self.config.episodes,
            width = self.config.game_config.width,
            height = self.config.game_config.height,
            gamma = self.config.agent_config.gamma,
            learning_rate = self.config.agent_config.learning_rate,
            batch_size = self.config.agent_config.batch_size,
            "starting training"
        );

        while !self.is_finished() {
            self.step()?;
        }

        info!(summary = %self.stats.format_summary(), "training stopped");
        Ok(())
    }

    /// Whether the budget is spent or cancellation was requested
    pub fn is_finished(&self) -> bool {
        if self.cancel.load(Ordering::Relaxed) {
            return true;
        }
        self.config
            .episodes
            .is_some_and(|budget| self.stats.total_episodes() >= budget)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn agent(&self) -> &PolicyAgent<V> {
        &self.agent
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn generation(&self) -> u32 {
        self.agent.generation()
    }

    pub fn record(&self) -> u32 {
        self.stats.record()
    }
}

impl<V: ValueFunction> Simulation for TrainingLoop<V> {
    fn label(&self) -> &'static str {
        "Training"
    }

    fn advance(&mut self) -> Result<()> {
        self.step().map(|_| ())
    }

    fn state(&self) -> &GameState {
        &self.state
    }

    fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn is_finished(&self) -> bool {
        TrainingLoop::is_finished(self)
    }
}
