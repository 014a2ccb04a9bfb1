//! Q-network for the snake agent
//!
//! A two-layer perceptron mapping the 11 binary features to one value per
//! relative action.
//!
//! ```text
//! Input: [batch, 11]
//!   ↓ Linear(11 → hidden) + ReLU
//!   ↓ Linear(hidden → 3)
//! Output: [batch, 3] action values
//! ```
//!
//! # Example
//!
//! ```rust
//! use deep_snake::rl::QNetworkConfig;
//! use burn::backend::NdArray;
//! use burn::backend::ndarray::NdArrayDevice;
//! use burn::tensor::Tensor;
//!
//! let device = NdArrayDevice::default();
//! let network = QNetworkConfig::new(256).init::<NdArray<f32>>(&device);
//!
//! let values = network.forward(Tensor::zeros([4, 11], &device));
//! assert_eq!(values.dims(), [4, 3]);
//! ```

use burn::{
    module::Module,
    nn::{Linear, LinearConfig},
    tensor::{Tensor, TensorData, activation::relu, backend::Backend},
};

use super::approximator::{ACTION_COUNT, ActionValues, Estimator};
use super::features::{FEATURE_COUNT, Features};
use crate::error::{Result, SnakeError};

/// Configuration for the Q-network
#[derive(Debug, Clone)]
pub struct QNetworkConfig {
    /// Input width (default: 11 features)
    pub input_size: usize,

    /// Hidden layer width
    pub hidden_size: usize,

    /// Output width (default: 3 relative actions)
    pub num_actions: usize,
}

impl QNetworkConfig {
    /// Create a configuration for the standard feature and action sizes
    pub fn new(hidden_size: usize) -> Self {
        Self {
            input_size: FEATURE_COUNT,
            hidden_size,
            num_actions: ACTION_COUNT,
        }
    }

    /// Initialize the network on `device`
    pub fn init<B: Backend>(&self, device: &B::Device) -> QNetwork<B> {
        QNetwork {
            hidden: LinearConfig::new(self.input_size, self.hidden_size).init(device),
            output: LinearConfig::new(self.hidden_size, self.num_actions).init(device),
        }
    }
}

impl Default for QNetworkConfig {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Feed-forward Q-network
#[derive(Module, Debug)]
pub struct QNetwork<B: Backend> {
    hidden: Linear<B>,
    output: Linear<B>,
}

impl<B: Backend> QNetwork<B> {
    /// Forward pass: `[batch, 11]` features to `[batch, 3]` action values
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.hidden.forward(features));
        self.output.forward(x)
    }

    /// Action values for a single state
    pub fn predict_one(&self, state: &Features, device: &B::Device) -> Result<ActionValues> {
        let values: Vec<f32> = self
            .forward(features_tensor::<B>(std::slice::from_ref(state), device))
            .into_data()
            .to_vec()
            .map_err(|e| SnakeError::Approximator(format!("failed to read predictions: {e:?}")))?;

        values.try_into().map_err(|values: Vec<f32>| {
            SnakeError::Approximator(format!(
                "expected {ACTION_COUNT} action values, got {}",
                values.len()
            ))
        })
    }
}

/// A trained network used for greedy play only
///
/// Runs on a plain backend without autodiff and has no optimizer, so it can
/// score states but never learn.
pub struct FrozenQNetwork<B: Backend> {
    network: QNetwork<B>,
    device: B::Device,
}

impl<B: Backend> FrozenQNetwork<B> {
    pub fn new(network: QNetwork<B>, device: B::Device) -> Self {
        Self { network, device }
    }
}

impl<B: Backend> Estimator for FrozenQNetwork<B> {
    fn predict(&self, state: &Features) -> Result<ActionValues> {
        self.network.predict_one(state, &self.device)
    }
}

/// Stack feature vectors into a `[batch, 11]` tensor
pub(crate) fn features_tensor<B: Backend>(
    states: &[Features],
    device: &B::Device,
) -> Tensor<B, 2> {
    let flat: Vec<f32> = states.iter().flatten().copied().collect();
    Tensor::from_data(TensorData::new(flat, [states.len(), FEATURE_COUNT]), device)
}
