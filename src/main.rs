use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use deep_snake::game::GameConfig;
use deep_snake::modes::{GreedyPlayer, PlayConfig, TrainConfig, TrainingLoop, WatchMode};
use deep_snake::rl::{
    FrozenQNetwork, InferenceBackend, QTrainer, TrainingBackend, default_device, load_model,
    load_network,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "deep_snake")]
#[command(version, about = "Snake game that learns to play itself with deep Q-learning")]
struct Cli {
    /// Train headless with log output, watch training, or watch a saved model play
    #[arg(long, default_value = "train")]
    mode: Mode,

    /// Stop after this many episodes (default: run until Ctrl+C)
    #[arg(long)]
    episodes: Option<usize>,

    /// Board width in pixels
    #[arg(long, default_value = "640")]
    width: i32,

    /// Board height in pixels
    #[arg(long, default_value = "480")]
    height: i32,

    /// Cell size in pixels
    #[arg(long, default_value = "20")]
    block_size: i32,

    /// Where to save the model on every new record
    #[arg(long, default_value = "model/model.mpk")]
    save_path: PathBuf,

    /// Report every N episodes
    #[arg(long, default_value = "1")]
    log_frequency: usize,

    /// Continue from a previously saved model; play mode defaults to --save-path
    #[arg(long)]
    load: Option<PathBuf>,
}

#[derive(Clone, ValueEnum)]
enum Mode {
    /// Train with one log line per episode
    Train,
    /// Watch the agent train in a terminal view
    Watch,
    /// Watch a saved model play greedily without training
    Play,
}

fn init_logging() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("deep_snake=info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set default subscriber")
}

fn build_config(cli: &Cli) -> TrainConfig {
    let mut game_config = GameConfig::new(cli.width, cli.height);
    game_config.block_size = cli.block_size;

    let mut config = TrainConfig::new(cli.episodes, Some(cli.save_path.clone()));
    config.log_frequency = cli.log_frequency;
    config.game_config = game_config;
    config
}

fn build_trainer(cli: &Cli, config: &mut TrainConfig) -> Result<QTrainer<TrainingBackend>> {
    let device = default_device();

    match &cli.load {
        Some(path) => {
            let (trainer, metadata) = load_model::<TrainingBackend>(path, &device)
                .with_context(|| format!("Failed to load model from {path:?}"))?;
            info!(
                path = ?path,
                updates = metadata.updates,
                version = %metadata.version,
                "loaded model"
            );
            config.agent_config = metadata.agent_config;
            Ok(trainer)
        }
        None => QTrainer::new(config.agent_config.clone(), device)
            .context("Failed to create Q-network trainer"),
    }
}

fn build_training(cli: &Cli) -> Result<TrainingLoop<QTrainer<TrainingBackend>>> {
    let mut config = build_config(cli);
    let trainer = build_trainer(cli, &mut config)?;
    TrainingLoop::new(trainer, config).context("Failed to set up training")
}

fn build_player(cli: &Cli) -> Result<GreedyPlayer<FrozenQNetwork<InferenceBackend>>> {
    let path = cli.load.as_ref().unwrap_or(&cli.save_path);
    let device = default_device();
    let (network, _) = load_network::<InferenceBackend>(path, &device)
        .with_context(|| format!("Failed to load model from {path:?}"))?;

    let mut config = PlayConfig::new(cli.episodes);
    config.log_frequency = cli.log_frequency;
    config.game_config = build_config(cli).game_config;

    GreedyPlayer::new(FrozenQNetwork::new(network, device), config)
        .context("Failed to set up play")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The terminal views own the screen, so they run without log output
    if matches!(cli.mode, Mode::Train) {
        init_logging()?;
    }

    match cli.mode {
        Mode::Train => {
            let mut training = build_training(&cli)?;
            let cancel = training.cancel_handle();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("interrupt received, stopping after the current step");
                    cancel.store(true, Ordering::Relaxed);
                }
            });

            training.run()?;
        }
        Mode::Watch => {
            let mut watch = WatchMode::new(build_training(&cli)?);
            watch.run().await?;
        }
        Mode::Play => {
            let mut watch = WatchMode::new(build_player(&cli)?);
            watch.run().await?;
        }
    }

    Ok(())
}
