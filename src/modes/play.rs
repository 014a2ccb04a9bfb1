//! Greedy play with a trained network
//!
//! The player always takes the highest scoring action for the encoded board.
//! Nothing is explored, remembered or trained, so a saved model can be judged
//! on its own.
//!
//! # Example
//!
//! ```rust,ignore
//! use deep_snake::modes::{GreedyPlayer, PlayConfig, WatchMode};
//! use deep_snake::rl::{FrozenQNetwork, InferenceBackend, default_device, load_network};
//!
//! let device = default_device();
//! let (network, _) = load_network::<InferenceBackend>("model/model.mpk".as_ref(), &device)?;
//! let player = GreedyPlayer::new(FrozenQNetwork::new(network, device), PlayConfig::default())?;
//! WatchMode::new(player).run().await?;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use tracing::info;

use super::train::{EpisodeSummary, StepOutcome};
use super::watch::Simulation;
use crate::game::{GameConfig, GameEngine, GameState, RelativeAction};
use crate::metrics::TrainingStats;
use crate::rl::{Estimator, argmax, encode};

/// Configuration for play mode
#[derive(Debug, Clone)]
pub struct PlayConfig {
    /// Number of episodes to play; `None` runs until cancelled
    pub episodes: Option<usize>,

    /// Log an episode report every N episodes
    pub log_frequency: usize,

    pub game_config: GameConfig,
}

impl PlayConfig {
    pub fn new(episodes: Option<usize>) -> Self {
        Self {
            episodes,
            log_frequency: 1,
            game_config: GameConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.log_frequency == 0 {
            bail!("log_frequency must be at least 1");
        }
        self.game_config.validate()?;
        Ok(())
    }
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Plays the game with `argmax(predict(encode(state)))` and never learns
pub struct GreedyPlayer<E: Estimator> {
    engine: GameEngine,
    state: GameState,
    estimator: E,
    stats: TrainingStats,
    config: PlayConfig,
    cancel: Arc<AtomicBool>,
    episode_reward: f32,
}

impl<E: Estimator> GreedyPlayer<E> {
    pub fn new(estimator: E, config: PlayConfig) -> Result<Self> {
        config.validate()?;
        let engine = GameEngine::new(config.game_config.clone())?;
        Self::from_parts(engine, estimator, config)
    }

    /// Create a player with seeded food placement
    pub fn with_seed(estimator: E, config: PlayConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let engine = GameEngine::with_seed(config.game_config.clone(), seed)?;
        Self::from_parts(engine, estimator, config)
    }

    fn from_parts(mut engine: GameEngine, estimator: E, config: PlayConfig) -> Result<Self> {
        let state = engine.reset().context("Failed to reset game")?;

        Ok(Self {
            engine,
            state,
            estimator,
            stats: TrainingStats::default(),
            config,
            cancel: Arc::new(AtomicBool::new(false)),
            episode_reward: 0.0,
        })
    }

    /// Take the greedy action for the current board
    pub fn step(&mut self) -> Result<StepOutcome> {
        let values = self
            .estimator
            .predict(&encode(&self.state))
            .context("Failed to evaluate board")?;
        let action = RelativeAction::ALL[argmax(&values)];

        let result = self.engine.step(&mut self.state, action)?;
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
        let new_record = self.stats.record_episode(score, steps, reward);

        let summary = EpisodeSummary {
            generation: self.stats.total_episodes() as u32,
            score,
            steps,
            reward,
            record: self.stats.record(),
            new_record,
        };

        if summary.generation as usize % self.config.log_frequency == 0 {
            info!(
                episode = summary.generation,
                score,
                record = summary.record,
                mean_score = self.stats.all_time_mean_score(),
                "game over"
            );
        }

        Ok(summary)
    }

    /// Play until the episode budget is spent or the player is cancelled
    pub fn run(&mut self) -> Result<()> {
        while !self.is_finished() {
            self.step()?;
        }

        info!(summary = %self.stats.format_summary(), "play stopped");
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        if self.cancel.load(Ordering::Relaxed) {
            return true;
        }
        self.config
            .episodes
            .is_some_and(|budget| self.stats.total_episodes() >= budget)
    }

    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }
}

impl<E: Estimator> Simulation for GreedyPlayer<E> {
    fn label(&self) -> &'static str {
        "Playing"
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
        GreedyPlayer::is_finished(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Position;
    use crate::rl::agent::tests::RecordingValueFn;

    fn config() -> PlayConfig {
        let mut config = PlayConfig::new(None);
        config.game_config = GameConfig::with_cells(10, 10);
        config
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = config();
        config.log_frequency = 0;
        assert!(GreedyPlayer::new(RecordingValueFn::default(), config).is_err());
    }

    #[test]
    fn test_takes_highest_valued_action() {
        let estimator = RecordingValueFn::with_values([0.0, 2.0, 1.0]);
        let mut player = GreedyPlayer::with_seed(estimator, config(), 3).unwrap();
        player.state.food = Some(Position::new(0, 0));
        let head = player.state().snake.head();

        let outcome = player.step().unwrap();

        assert!(!outcome.terminated);
        assert_eq!(player.state().snake.head(), Position::new(head.x, head.y + 20));
    }

    #[test]
    fn test_never_trains() {
        let estimator = RecordingValueFn::with_values([5.0, 0.0, 0.0]);
        let mut config = config();
        config.episodes = Some(3);
        let mut player = GreedyPlayer::with_seed(estimator, config, 3).unwrap();

        player.run().unwrap();

        assert_eq!(player.stats().total_episodes(), 3);
        assert!(player.is_finished());
        assert!(player.estimator().batches.is_empty());
        assert_eq!(player.estimator().saves.get(), 0);
    }

    #[test]
    fn test_episode_end_resets_board() {
        let estimator = RecordingValueFn::with_values([5.0, 0.0, 0.0]);
        let mut player = GreedyPlayer::with_seed(estimator, config(), 3).unwrap();
        player.state.food = Some(Position::new(0, 0));

        let summary = loop {
            if let Some(summary) = player.step().unwrap().episode {
                break summary;
            }
        };

        assert_eq!(summary.generation, 1);
        assert_eq!(summary.score, 0);
        assert_eq!(summary.reward, -10.0);
        assert!(player.state().is_alive);
        assert_eq!(player.state().steps, 0);
    }

    #[test]
    fn test_estimator_failure_aborts() {
        let estimator = RecordingValueFn {
            fail: true,
            ..Default::default()
        };
        let mut player = GreedyPlayer::with_seed(estimator, config(), 3).unwrap();

        assert!(player.step().is_err());
        assert!(player.run().is_err());
    }

    #[test]
    fn test_cancel_stops_run() {
        let mut player = GreedyPlayer::with_seed(RecordingValueFn::default(), config(), 3).unwrap();
        player.cancel_handle().store(true, Ordering::Relaxed);

        player.run().unwrap();

        assert_eq!(player.stats().total_episodes(), 0);
    }
}
