use serde::{Deserialize, Serialize};

use crate::error::{Result, SnakeError};

/// Configuration for the game board and its reward constants
///
/// Dimensions are in pixels; the snake moves one `block_size` per step, so
/// every position on the board is a multiple of `block_size`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Board width in pixels
    pub width: i32,
    /// Board height in pixels
    pub height: i32,
    /// Side length of one cell in pixels
    pub block_size: i32,
    /// Length of the snake after reset
    pub initial_snake_length: usize,

    /// Reward for eating food
    pub food_reward: f32,
    /// Reward on collision or stagnation
    pub death_penalty: f32,
    /// An episode stagnates once its step counter exceeds this times the snake length
    pub stall_factor: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            block_size: 20,
            initial_snake_length: 3,
            food_reward: 10.0,
            death_penalty: -10.0,
            stall_factor: 100,
        }
    }
}

impl GameConfig {
    /// Create a configuration with custom board size in pixels
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Create a board measured in cells rather than pixels
    pub fn with_cells(columns: i32, rows: i32) -> Self {
        let block_size = Self::default().block_size;
        Self::new(columns * block_size, rows * block_size)
    }

    /// Number of cell columns
    pub fn columns(&self) -> i32 {
        self.width / self.block_size
    }

    /// Number of cell rows
    pub fn rows(&self) -> i32 {
        self.height / self.block_size
    }

    /// Check that the board can hold the initial snake
    pub fn validate(&self) -> Result<()> {
        if self.block_size <= 0 {
            return Err(SnakeError::InvalidConfiguration(format!(
                "block_size must be positive, got {}",
                self.block_size
            )));
        }

        if self.width <= 0 || self.height <= 0 {
            return Err(SnakeError::InvalidConfiguration(format!(
                "board dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }

        if self.width % self.block_size != 0 || self.height % self.block_size != 0 {
            return Err(SnakeError::InvalidConfiguration(format!(
                "board {}x{} is not a multiple of block_size {}",
                self.width, self.height, self.block_size
            )));
        }

        if self.initial_snake_length == 0 {
            return Err(SnakeError::InvalidConfiguration(
                "initial_snake_length must be at least 1".to_string(),
            ));
        }

        // The snake starts at the center column and extends leftwards
        let head_column = (self.columns() / 2) as usize;
        if head_column + 1 < self.initial_snake_length {
            return Err(SnakeError::InvalidConfiguration(format!(
                "board with {} columns cannot hold an initial snake of length {}",
                self.columns(),
                self.initial_snake_length
            )));
        }

        if self.stall_factor == 0 {
            return Err(SnakeError::InvalidConfiguration(
                "stall_factor must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
