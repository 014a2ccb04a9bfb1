use std::collections::VecDeque;

use super::action::Heading;

/// A position on the board in pixel units, always a multiple of the block size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Move one block in a heading
    pub fn moved_in_heading(&self, heading: Heading, block_size: i32) -> Self {
        let (dx, dy) = heading.delta();
        self.moved_by(dx * block_size, dy * block_size)
    }
}

/// The snake in the game
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    /// Body segments, with head at the front
    body: VecDeque<Position>,
    /// Current heading
    pub heading: Heading,
}

impl Snake {
    /// Create a snake whose body trails behind `head`, opposite to `heading`
    pub fn new(head: Position, heading: Heading, length: usize, block_size: i32) -> Self {
        let (dx, dy) = heading.delta();
        let body = (0..length as i32)
            .map(|i| head.moved_by(-dx * block_size * i, -dy * block_size * i))
            .collect();

        Self { body, heading }
    }

    /// Build a snake from explicit segments, head first
    pub fn from_segments(segments: impl IntoIterator<Item = Position>, heading: Heading) -> Self {
        Self {
            body: segments.into_iter().collect(),
            heading,
        }
    }

    /// Get the head position
    pub fn head(&self) -> Position {
        self.body[0]
    }

    /// All segments, head first
    pub fn segments(&self) -> impl Iterator<Item = &Position> {
        self.body.iter()
    }

    /// Segments excluding the head
    pub fn body_segments(&self) -> impl Iterator<Item = &Position> {
        self.body.iter().skip(1)
    }

    /// Check if position collides with snake body (excluding head)
    pub fn collides_with_body(&self, pos: Position) -> bool {
        self.body_segments().any(|&segment| segment == pos)
    }

    /// Check if position is covered by any segment, head included
    pub fn occupies(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    pub(crate) fn push_head(&mut self, head: Position) {
        self.body.push_front(head);
    }

    pub(crate) fn pop_tail(&mut self) -> Option<Position> {
        self.body.pop_back()
    }

    /// Get the length of the snake
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Check if the snake is empty (should never happen in practice)
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Why an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationCause {
    /// Snake left the board
    Wall,
    /// Snake ran into itself
    SelfCollision,
    /// Step counter exceeded the stall limit for the current length
    Stagnation,
    /// Snake covers every cell, so no food can be placed
    BoardFull,
}

/// Complete state of one episode
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub snake: Snake,
    /// `None` only once the snake has filled the board
    pub food: Option<Position>,
    pub width: i32,
    pub height: i32,
    pub block_size: i32,
    pub score: u32,
    pub steps: u32,
    pub is_alive: bool,
}

impl GameState {
    /// Create a new game state
    pub fn new(snake: Snake, food: Position, width: i32, height: i32, block_size: i32) -> Self {
        Self {
            snake,
            food: Some(food),
            width,
            height,
            block_size,
            score: 0,
            steps: 0,
            is_alive: true,
        }
    }

    /// Current heading of the snake
    pub fn heading(&self) -> Heading {
        self.snake.heading
    }

    /// Check if a position lies on the board
    pub fn is_in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0
            && pos.x <= self.width - self.block_size
            && pos.y >= 0
            && pos.y <= self.height - self.block_size
    }

    /// True when the head is off the board or overlaps the body
    pub fn is_collision(&self) -> bool {
        self.is_collision_at(self.snake.head())
    }

    /// True when `pos` is off the board or overlaps a segment other than the head
    pub fn is_collision_at(&self, pos: Position) -> bool {
        !self.is_in_bounds(pos) || self.snake.collides_with_body(pos)
    }

    /// Check if a position is occupied by the snake
    pub fn is_occupied_by_snake(&self, pos: Position) -> bool {
        self.snake.occupies(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(snake: Snake) -> GameState {
        GameState::new(snake, Position::new(0, 0), 200, 200, 20)
    }

    #[test]
    fn test_position_movement() {
        let pos = Position::new(100, 100);
        assert_eq!(pos.moved_in_heading(Heading::Right, 20), Position::new(120, 100));
        assert_eq!(pos.moved_in_heading(Heading::Left, 20), Position::new(80, 100));
        assert_eq!(pos.moved_in_heading(Heading::Down, 20), Position::new(100, 120));
        assert_eq!(pos.moved_in_heading(Heading::Up, 20), Position::new(100, 80));
    }

    #[test]
    fn test_snake_creation() {
        let snake = Snake::new(Position::new(320, 240), Heading::Right, 3, 20);
        let segments: Vec<_> = snake.segments().copied().collect();
        assert_eq!(
            segments,
            vec![
                Position::new(320, 240),
                Position::new(300, 240),
                Position::new(280, 240)
            ]
        );
    }

    #[test]
    fn test_body_collision_excludes_head() {
        let snake = Snake::new(Position::new(100, 100), Heading::Right, 3, 20);
        assert!(!snake.collides_with_body(Position::new(100, 100)));
        assert!(snake.collides_with_body(Position::new(80, 100)));
        assert!(!snake.collides_with_body(Position::new(160, 160)));
        assert!(snake.occupies(Position::new(100, 100)));
    }

    #[test]
    fn test_bounds_checking() {
        let state = state_with(Snake::new(Position::new(100, 100), Heading::Right, 3, 20));

        assert!(state.is_in_bounds(Position::new(0, 0)));
        assert!(state.is_in_bounds(Position::new(180, 180)));
        assert!(!state.is_in_bounds(Position::new(-20, 0)));
        assert!(!state.is_in_bounds(Position::new(200, 0)));
        assert!(!state.is_in_bounds(Position::new(0, 200)));
    }

    #[test]
    fn test_is_collision_at_head() {
        let mut state = state_with(Snake::new(Position::new(100, 100), Heading::Right, 3, 20));
        assert!(!state.is_collision());

        // Head pushed onto its own body
        state.snake.push_head(Position::new(80, 100));
        assert!(state.is_collision());

        let outside = state_with(Snake::new(Position::new(200, 100), Heading::Right, 3, 20));
        assert!(outside.is_collision());
    }
}
