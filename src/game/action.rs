/// Absolute direction the snake is heading in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Heading {
    Right,
    Down,
    Left,
    Up,
}

/// Headings in clockwise order. Relative turns index into this table.
pub const CLOCKWISE: [Heading; 4] = [Heading::Right, Heading::Down, Heading::Left, Heading::Up];

impl Heading {
    /// Position of this heading in [`CLOCKWISE`]
    pub fn clockwise_index(&self) -> usize {
        match self {
            Heading::Right => 0,
            Heading::Down => 1,
            Heading::Left => 2,
            Heading::Up => 3,
        }
    }

    /// Resolve a relative action into the new absolute heading
    pub fn turn(&self, action: RelativeAction) -> Heading {
        CLOCKWISE[(self.clockwise_index() + action.clockwise_steps()) % CLOCKWISE.len()]
    }

    /// Returns true if `other` points the opposite way
    pub fn is_opposite(&self, other: Heading) -> bool {
        (self.clockwise_index() + 2) % CLOCKWISE.len() == other.clockwise_index()
    }

    /// Unit delta (dx, dy) in cells; y grows downwards
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Heading::Up => (0, -1),
            Heading::Down => (0, 1),
            Heading::Left => (-1, 0),
            Heading::Right => (1, 0),
        }
    }
}

/// Action relative to the current heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelativeAction {
    Straight,
    TurnRight,
    TurnLeft,
}

impl RelativeAction {
    /// All actions in one-hot index order
    pub const ALL: [RelativeAction; 3] = [
        RelativeAction::Straight,
        RelativeAction::TurnRight,
        RelativeAction::TurnLeft,
    ];

    /// Number of clockwise steps through [`CLOCKWISE`] this action applies
    fn clockwise_steps(&self) -> usize {
        match self {
            RelativeAction::Straight => 0,
            RelativeAction::TurnRight => 1,
            RelativeAction::TurnLeft => 3,
        }
    }

    /// Index into [`RelativeAction::ALL`]
    pub fn index(&self) -> usize {
        match self {
            RelativeAction::Straight => 0,
            RelativeAction::TurnRight => 1,
            RelativeAction::TurnLeft => 2,
        }
    }

    /// One-hot encoding `[straight, right, left]`
    pub fn one_hot(&self) -> [f32; 3] {
        let mut encoded = [0.0; 3];
        encoded[self.index()] = 1.0;
        encoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_keeps_heading() {
        for heading in CLOCKWISE {
            assert_eq!(heading.turn(RelativeAction::Straight), heading);
        }
    }

    #[test]
    fn test_right_turns_follow_clockwise_cycle() {
        assert_eq!(Heading::Right.turn(RelativeAction::TurnRight), Heading::Down);
        assert_eq!(Heading::Down.turn(RelativeAction::TurnRight), Heading::Left);
        assert_eq!(Heading::Left.turn(RelativeAction::TurnRight), Heading::Up);
        assert_eq!(Heading::Up.turn(RelativeAction::TurnRight), Heading::Right);
    }

    #[test]
    fn test_left_turns_follow_counter_clockwise_cycle() {
        assert_eq!(Heading::Right.turn(RelativeAction::TurnLeft), Heading::Up);
        assert_eq!(Heading::Up.turn(RelativeAction::TurnLeft), Heading::Left);
        assert_eq!(Heading::Left.turn(RelativeAction::TurnLeft), Heading::Down);
        assert_eq!(Heading::Down.turn(RelativeAction::TurnLeft), Heading::Right);
    }

    #[test]
    fn test_relative_turn_never_reverses() {
        for heading in CLOCKWISE {
            for action in RelativeAction::ALL {
                assert!(!heading.is_opposite(heading.turn(action)));
            }
        }
    }

    #[test]
    fn test_opposite_headings() {
        assert!(Heading::Up.is_opposite(Heading::Down));
        assert!(Heading::Left.is_opposite(Heading::Right));
        assert!(!Heading::Up.is_opposite(Heading::Left));
    }

    #[test]
    fn test_one_hot_matches_index() {
        assert_eq!(RelativeAction::TurnRight.one_hot(), [0.0, 1.0, 0.0]);
        for action in RelativeAction::ALL {
            assert_eq!(RelativeAction::ALL[action.index()], action);
        }
    }
}
