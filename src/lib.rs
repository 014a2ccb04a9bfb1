//! Deep Snake - a Snake game that learns to play itself
//!
//! This library provides:
//! - Core game logic (game module)
//! - Feature encoding, replay memory and the Q-learning agent (rl module)
//! - The bounded, cancellable training loop, greedy play and their terminal view (modes module)
//! - Training statistics (metrics module)
//! - TUI rendering (render module)

pub mod error;
pub mod game;
pub mod metrics;
pub mod modes;
pub mod render;
pub mod rl;

pub use error::{Result, SnakeError};
