use thiserror::Error;

/// Errors surfaced by the game engine and the learning core.
///
/// None of these are recoverable within a run: configuration errors are raised
/// at construction time and approximator failures abort training.
#[derive(Error, Debug)]
pub enum SnakeError {
    /// A board, buffer or agent parameter is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The value-function approximator failed to predict, train or persist
    #[error("approximator failure: {0}")]
    Approximator(String),

    /// No free cell was left to place food on
    #[error("board full: no free cell for food after {attempts} attempts")]
    BoardFull { attempts: usize },
}

pub type Result<T> = std::result::Result<T, SnakeError>;
