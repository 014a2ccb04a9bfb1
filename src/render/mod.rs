//! Terminal rendering of the board and training progress

pub mod renderer;

pub use renderer::{Hud, Renderer};
