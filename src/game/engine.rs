use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::debug;

use super::{
    action::{Heading, RelativeAction},
    config::GameConfig,
    state::{GameState, Position, Snake, TerminationCause},
};
use crate::error::{Result, SnakeError};

/// Minimum number of random draws before falling back to a scan of free cells
const MIN_FOOD_ATTEMPTS: usize = 64;

/// Information about a step
#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    /// Whether the snake ate food this step
    pub ate_food: bool,
    /// Why the episode ended, if it did
    pub termination: Option<TerminationCause>,
}

/// Result of a game step
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// One of the death penalty, zero, or the food reward
    pub reward: f32,
    /// Whether the game has terminated
    pub terminated: bool,
    /// Score after the step
    pub score: u32,
    /// Additional information about the step
    pub info: StepInfo,
}

/// The game engine that handles all game logic
pub struct GameEngine {
    config: GameConfig,
    rng: StdRng,
}

impl GameEngine {
    /// Create a new game engine with the given configuration
    pub fn new(config: GameConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create an engine with a fixed food-placement seed
    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Reset the game to initial state
    ///
    /// The snake starts at the center cell heading right, with its body
    /// trailing to the left.
    pub fn reset(&mut self) -> Result<GameState> {
        let block = self.config.block_size;
        let center = Position::new(
            self.config.columns() / 2 * block,
            self.config.rows() / 2 * block,
        );

        let snake = Snake::new(
            center,
            Heading::Right,
            self.config.initial_snake_length,
            block,
        );

        let food = self.spawn_food_avoid_snake(&snake)?;

        Ok(GameState::new(
            snake,
            food,
            self.config.width,
            self.config.height,
            block,
        ))
    }

    /// Execute one step of the game
    ///
    /// On termination the new head stays inserted and the tail is not popped,
    /// leaving the snake in its colliding configuration.
    pub fn step(&mut self, state: &mut GameState, action: RelativeAction) -> Result<StepResult> {
        if !state.is_alive {
            return Ok(StepResult {
                reward: 0.0,
                terminated: true,
                score: state.score,
                info: StepInfo {
                    ate_food: false,
                    termination: None,
                },
            });
        }

        state.steps += 1;
        state.snake.heading = state.snake.heading.turn(action);

        let new_head = state
            .snake
            .head()
            .moved_in_heading(state.snake.heading, state.block_size);
        state.snake.push_head(new_head);

        if let Some(cause) = self.check_termination(state) {
            state.is_alive = false;

            return Ok(StepResult {
                reward: self.config.death_penalty,
                terminated: true,
                score: state.score,
                info: StepInfo {
                    ate_food: false,
                    termination: Some(cause),
                },
            });
        }

        let ate_food = state.food == Some(new_head);
        let reward = if ate_food {
            state.score += 1;
            match self.spawn_food_avoid_snake(&state.snake) {
                Ok(food) => state.food = Some(food),
                Err(SnakeError::BoardFull { .. }) => {
                    debug!(score = state.score, "snake filled the board");
                    state.food = None;
                    state.is_alive = false;

                    return Ok(StepResult {
                        reward: self.config.food_reward,
                        terminated: true,
                        score: state.score,
                        info: StepInfo {
                            ate_food,
                            termination: Some(TerminationCause::BoardFull),
                        },
                    });
                }
                Err(e) => return Err(e),
            }
            self.config.food_reward
        } else {
            state.snake.pop_tail();
            0.0
        };

        Ok(StepResult {
            reward,
            terminated: false,
            score: state.score,
            info: StepInfo {
                ate_food,
                termination: None,
            },
        })
    }

    /// Check the freshly inserted head for collisions and the stall limit
    fn check_termination(&self, state: &GameState) -> Option<TerminationCause> {
        let head = state.snake.head();

        if !state.is_in_bounds(head) {
            return Some(TerminationCause::Wall);
        }

        if state.snake.collides_with_body(head) {
            return Some(TerminationCause::SelfCollision);
        }

        let stall_limit = self.config.stall_factor as usize * state.snake.len();
        if state.steps as usize > stall_limit {
            return Some(TerminationCause::Stagnation);
        }

        None
    }

    /// Spawn food at a random cell not covered by the snake
    ///
    /// Rejection sampling is capped; after the cap the free cells are scanned
    /// and one is drawn uniformly, so a nearly full board still terminates.
    fn spawn_food_avoid_snake(&mut self, snake: &Snake) -> Result<Position> {
        let columns = self.config.columns();
        let rows = self.config.rows();
        let block = self.config.block_size;
        let cells = (columns * rows) as usize;
        let max_attempts = MIN_FOOD_ATTEMPTS.max(4 * cells);

        for _ in 0..max_attempts {
            let x = self.rng.gen_range(0..columns) * block;
            let y = self.rng.gen_range(0..rows) * block;
            let pos = Position::new(x, y);

            if !snake.occupies(pos) {
                return Ok(pos);
            }
        }

        debug!(
            attempts = max_attempts,
            snake_len = snake.len(),
            "food sampling exhausted, scanning free cells"
        );

        let free: Vec<Position> = (0..rows)
            .flat_map(|row| (0..columns).map(move |col| Position::new(col * block, row * block)))
            .filter(|pos| !snake.occupies(*pos))
            .collect();

        if free.is_empty() {
            return Err(SnakeError::BoardFull {
                attempts: max_attempts,
            });
        }

        Ok(free[self.rng.gen_range(0..free.len())])
    }
}
