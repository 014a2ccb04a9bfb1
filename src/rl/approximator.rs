use std::path::Path;

use super::buffer::Transition;
use super::features::Features;
use crate::error::Result;

/// Number of discrete actions the approximator scores
pub const ACTION_COUNT: usize = 3;

/// Estimated value of each relative action, in `RelativeAction::ALL` order
pub type ActionValues = [f32; ACTION_COUNT];

/// Read-only scoring of the relative actions for a state
pub trait Estimator {
    /// Score every action for a state
    fn predict(&self, state: &Features) -> Result<ActionValues>;
}

/// A learnable estimate of action values
///
/// The agent only talks to its network through this trait, so any numeric
/// backend can be plugged in. `train_step` moves the value of the action taken
/// toward `reward + gamma * max(predict(next_state))`, or toward `reward`
/// alone for terminal transitions.
pub trait ValueFunction: Estimator {
    /// Apply one update from a batch and return the batch loss
    fn train_step(&mut self, batch: &[Transition]) -> Result<f32>;

    /// Persist parameters to `path`
    fn save(&self, path: &Path) -> Result<()>;
}

/// Index of the largest value; ties go to the lowest index
pub fn argmax(values: &ActionValues) -> usize {
    values
        .iter()
        .enumerate()
        .fold(0, |best, (idx, &value)| {
            if value > values[best] { idx } else { best }
        })
}
