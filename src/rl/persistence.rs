//! Model persistence for saving and restoring the Q-network
//!
//! Weights go through Burn's record system; the hyperparameters needed to
//! rebuild the network are stored next to them as JSON.

use std::path::Path;

use burn::{
    module::Module,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
    tensor::backend::{AutodiffBackend, Backend},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::AgentConfig;
use super::network::{QNetwork, QNetworkConfig};
use super::trainer::QTrainer;
use crate::error::{Result, SnakeError};

/// Metadata saved with the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Agent configuration used during training
    pub agent_config: AgentConfig,

    /// Optimizer steps taken before the save
    pub updates: usize,

    /// Version identifier for compatibility checking
    pub version: String,
}

impl ModelMetadata {
    pub fn new(agent_config: AgentConfig, updates: usize) -> Self {
        Self {
            agent_config,
            updates,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Save a trainer's network to `path`
///
/// Creates parent directories if needed. Two files are written:
/// - the network weights (Burn record format, `.mpk` extension)
/// - `<path>.meta.json` with [`ModelMetadata`]
pub fn save_model<B: AutodiffBackend>(trainer: &QTrainer<B>, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            SnakeError::Approximator(format!("failed to create directory {parent:?}: {e}"))
        })?;
    }

    let record = trainer.network().clone().into_record();
    NamedMpkFileRecorder::<FullPrecisionSettings>::new()
        .record(record, path.to_path_buf())
        .map_err(|e| SnakeError::Approximator(format!("failed to save network weights: {e:?}")))?;

    let metadata = ModelMetadata::new(trainer.config().clone(), trainer.updates());
    let meta_path = path.with_extension("meta.json");
    let meta_json = serde_json::to_string_pretty(&metadata)
        .map_err(|e| SnakeError::Approximator(format!("failed to serialize metadata: {e}")))?;
    std::fs::write(&meta_path, meta_json).map_err(|e| {
        SnakeError::Approximator(format!("failed to write metadata to {meta_path:?}: {e}"))
    })?;

    debug!(path = ?path, updates = trainer.updates(), "model saved");
    Ok(())
}

/// Restore a network saved with [`save_model`] onto any backend
///
/// Weights are backend independent, so a network trained with autodiff can be
/// loaded onto a plain inference backend.
pub fn load_network<B: Backend>(
    path: &Path,
    device: &B::Device,
) -> Result<(QNetwork<B>, ModelMetadata)> {
    let meta_path = path.with_extension("meta.json");
    let meta_json = std::fs::read_to_string(&meta_path).map_err(|e| {
        SnakeError::Approximator(format!("failed to read metadata from {meta_path:?}: {e}"))
    })?;
    let metadata: ModelMetadata = serde_json::from_str(&meta_json)
        .map_err(|e| SnakeError::Approximator(format!("failed to deserialize metadata: {e}")))?;

    let network = QNetworkConfig::new(metadata.agent_config.hidden_size).init::<B>(device);
    let record = NamedMpkFileRecorder::<FullPrecisionSettings>::new()
        .load(path.to_path_buf(), device)
        .map_err(|e| {
            SnakeError::Approximator(format!("failed to load network weights from {path:?}: {e:?}"))
        })?;

    debug!(path = ?path, updates = metadata.updates, "model loaded");
    Ok((network.load_record(record), metadata))
}

/// Restore a trainer saved with [`save_model`]
///
/// The optimizer starts fresh; only the network weights and configuration are
/// restored.
pub fn load_model<B: AutodiffBackend>(
    path: &Path,
    device: &B::Device,
) -> Result<(QTrainer<B>, ModelMetadata)> {
    let (network, metadata) = load_network::<B>(path, device)?;

    let mut trainer =
        QTrainer::from_network(network, metadata.agent_config.clone(), device.clone())?;
    trainer.set_updates(metadata.updates);

    Ok((trainer, metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rl::{
        Estimator, FrozenQNetwork, InferenceBackend, TrainingBackend, ValueFunction,
        default_device,
    };
    use tempfile::TempDir;

    fn small_config() -> AgentConfig {
        AgentConfig {
            hidden_size: 16,
            ..Default::default()
        }
    }

    #[test]
    fn test_metadata_serialization() {
        let metadata = ModelMetadata::new(small_config(), 42);

        let json = serde_json::to_string(&metadata).unwrap();
        let deserialized: ModelMetadata = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.agent_config, small_config());
        assert_eq!(deserialized.updates, 42);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("model.bin");

        let device = default_device();
        let trainer = QTrainer::<TrainingBackend>::new(small_config(), device.clone()).unwrap();
        let state = [1.0; 11];
        let expected = trainer.predict(&state).unwrap();

        trainer.save(&path).unwrap();
        assert!(path.with_extension("meta.json").exists());

        let (loaded, metadata) = load_model::<TrainingBackend>(&path, &device).unwrap();
        assert_eq!(metadata.agent_config.hidden_size, 16);

        let restored = loaded.predict(&state).unwrap();
        for (a, b) in expected.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_trained_weights_load_for_inference() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.mpk");

        let device = default_device();
        let trainer = QTrainer::<TrainingBackend>::new(small_config(), device.clone()).unwrap();
        trainer.save(&path).unwrap();

        let (network, _) = load_network::<InferenceBackend>(&path, &device).unwrap();
        let frozen = FrozenQNetwork::new(network, device);

        let state = [0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0];
        let expected = trainer.predict(&state).unwrap();
        let restored = frozen.predict(&state).unwrap();
        for (a, b) in expected.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_load_missing_model_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.bin");

        let result = load_model::<TrainingBackend>(&path, &default_device());
        assert!(matches!(result, Err(SnakeError::Approximator(_))));
    }
}
