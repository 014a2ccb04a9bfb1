//! Reinforcement learning core for the Snake game
//!
//! Provides:
//! - 11-element feature encoding of the game state
//! - A bounded experience replay buffer
//! - The value-function capability traits and their Burn implementations
//! - An epsilon-greedy Q-learning agent
//! - Model persistence

pub mod agent;
pub mod approximator;
pub mod buffer;
pub mod config;
pub mod features;
pub mod network;
pub mod persistence;
pub mod trainer;

pub use agent::PolicyAgent;
pub use approximator::{ACTION_COUNT, ActionValues, Estimator, ValueFunction, argmax};
pub use buffer::{ReplayBuffer, Transition};
pub use config::{AgentConfig, ExplorationSchedule};
pub use features::{FEATURE_COUNT, Features, encode};
pub use network::{FrozenQNetwork, QNetwork, QNetworkConfig};
pub use persistence::{ModelMetadata, load_model, load_network, save_model};
pub use trainer::{InferenceBackend, QTrainer, TrainingBackend, default_device};
