pub mod play;
pub mod train;
pub mod watch;

pub use play::{GreedyPlayer, PlayConfig};
pub use train::{EpisodeSummary, StepOutcome, TrainConfig, TrainingLoop};
pub use watch::{Simulation, WatchMode};
