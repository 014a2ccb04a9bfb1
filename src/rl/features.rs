use crate::game::{GameState, Heading, RelativeAction};

/// Number of entries in a feature vector
pub const FEATURE_COUNT: usize = 11;

/// Observation fed to the value function
pub type Features = [f32; FEATURE_COUNT];

/// Encode a game state into an 11-element feature vector
///
/// Layout:
/// - 0..3: danger one block straight / right / left of the current heading
/// - 3..7: heading is left / right / up / down
/// - 7..11: food is left / right / above / below the head
///
/// Every entry is 0.0 or 1.0. Food flags compare raw coordinates only and are
/// all zero once the board is full.
pub fn encode(state: &GameState) -> Features {
    let head = state.snake.head();
    let heading = state.heading();
    let (food_left, food_right, food_up, food_down) = match state.food {
        Some(food) => (
            food.x < head.x,
            food.x > head.x,
            food.y < head.y,
            food.y > head.y,
        ),
        None => (false, false, false, false),
    };

    let danger = |action: RelativeAction| {
        let ahead = head.moved_in_heading(heading.turn(action), state.block_size);
        state.is_collision_at(ahead)
    };

    let flags = [
        danger(RelativeAction::Straight),
        danger(RelativeAction::TurnRight),
        danger(RelativeAction::TurnLeft),
        heading == Heading::Left,
        heading == Heading::Right,
        heading == Heading::Up,
        heading == Heading::Down,
        food_left,
        food_right,
        food_up,
        food_down,
    ];

    flags.map(|flag| if flag { 1.0 } else { 0.0 })
}
