//! Burn-backed value function
//!
//! [`QTrainer`] owns a [`QNetwork`] and its Adam optimizer. Each training step
//! regresses the value of the action taken toward the one-step Bellman target
//! computed with the same network:
//!
//! ```text
//! target = r                                  if terminal
//! target = r + γ * max_a' Q(s', a')           otherwise
//! loss   = mean((Q(s, a) - target)²)
//! ```

use std::path::Path;

use burn::{
    backend::{
        Autodiff,
        ndarray::{NdArray, NdArrayDevice},
    },
    module::AutodiffModule,
    optim::{Adam, AdamConfig, GradientsParams, Optimizer, adaptor::OptimizerAdaptor},
    tensor::{ElementConversion, Tensor, TensorData, backend::AutodiffBackend},
};

use super::approximator::{ACTION_COUNT, ActionValues, Estimator, ValueFunction};
use super::buffer::Transition;
use super::config::AgentConfig;
use super::features::Features;
use super::network::{QNetwork, QNetworkConfig, features_tensor};
use super::persistence::save_model;
use crate::error::{Result, SnakeError};

/// Backend used for training (CPU with autodiff)
pub type TrainingBackend = Autodiff<NdArray<f32>>;

/// Backend used for greedy play with a trained network
pub type InferenceBackend = NdArray<f32>;

/// Default CPU device
pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::default()
}

/// Q-network plus optimizer, exposed to the agent as a [`ValueFunction`]
pub struct QTrainer<B: AutodiffBackend> {
    network: QNetwork<B>,
    optim: OptimizerAdaptor<Adam, QNetwork<B>, B>,
    config: AgentConfig,
    updates: usize,
    device: B::Device,
}

impl<B: AutodiffBackend> QTrainer<B> {
    /// Create a trainer with a freshly initialised network
    pub fn new(config: AgentConfig, device: B::Device) -> Result<Self> {
        let network = QNetworkConfig::new(config.hidden_size).init::<B>(&device);
        Self::from_network(network, config, device)
    }

    /// Wrap an existing network, e.g. one restored from disk
    pub fn from_network(
        network: QNetwork<B>,
        config: AgentConfig,
        device: B::Device,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            network,
            optim: AdamConfig::new().init(),
            config,
            updates: 0,
            device,
        })
    }

    pub fn network(&self) -> &QNetwork<B> {
        &self.network
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Number of optimizer steps taken
    pub fn updates(&self) -> usize {
        self.updates
    }

    pub(crate) fn set_updates(&mut self, updates: usize) {
        self.updates = updates;
    }
}

impl<B: AutodiffBackend> Estimator for QTrainer<B> {
    fn predict(&self, state: &Features) -> Result<ActionValues> {
        self.network.valid().predict_one(state, &self.device)
    }
}

impl<B: AutodiffBackend> ValueFunction for QTrainer<B> {
    fn train_step(&mut self, batch: &[Transition]) -> Result<f32> {
        if batch.is_empty() {
            return Ok(0.0);
        }
        let n = batch.len();

        let states: Vec<Features> = batch.iter().map(|t| t.state).collect();
        let next_states: Vec<Features> = batch.iter().map(|t| t.next_state).collect();

        // Bootstrap values come from the same network, without gradients
        let next_max: Vec<f32> = self
            .network
            .clone()
            .valid()
            .forward(features_tensor::<B::InnerBackend>(&next_states, &self.device))
            .max_dim(1)
            .into_data()
            .to_vec()
            .map_err(|e| {
                SnakeError::Approximator(format!("failed to read next-state values: {e:?}"))
            })?;

        let targets: Vec<f32> = batch
            .iter()
            .zip(next_max)
            .map(|(t, next)| {
                if t.terminal {
                    t.reward
                } else {
                    t.reward + self.config.gamma * next
                }
            })
            .collect();
        let action_mask: Vec<f32> = batch.iter().flat_map(|t| t.action.one_hot()).collect();

        let targets: Tensor<B, 1> = Tensor::from_data(TensorData::new(targets, [n]), &self.device);
        let action_mask: Tensor<B, 2> =
            Tensor::from_data(TensorData::new(action_mask, [n, ACTION_COUNT]), &self.device);

        // Only the value of the action taken contributes to the loss
        let q_values = self.network.forward(features_tensor::<B>(&states, &self.device));
        let q_taken = (q_values * action_mask).sum_dim(1).squeeze::<1>(1);
        let diff = q_taken - targets;
        let loss = (diff.clone() * diff).mean();

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.network);
        self.network = self
            .optim
            .step(self.config.learning_rate, self.network.clone(), grads);
        self.updates += 1;

        Ok(loss.into_scalar().elem::<f32>())
    }

    fn save(&self, path: &Path) -> Result<()> {
        save_model(self, path)
    }
}
