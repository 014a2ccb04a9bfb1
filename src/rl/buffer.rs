//! Experience replay buffer
//!
//! Stores the most recent transitions in a fixed-capacity ring. Once full, each
//! push evicts the oldest entry. Sampling draws uniformly without replacement
//! and leaves the buffer untouched.

use std::collections::VecDeque;

use rand::{Rng, seq::index};

use super::features::Features;
use crate::error::{Result, SnakeError};
use crate::game::RelativeAction;

/// One environment step as seen by the learner
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Features before the step
    pub state: Features,
    /// Action taken
    pub action: RelativeAction,
    /// Reward received
    pub reward: f32,
    /// Features after the step
    pub next_state: Features,
    /// Whether the step ended the episode
    pub terminal: bool,
}

/// Bounded FIFO of transitions
///
/// # Example
///
/// ```rust
/// use deep_snake::game::RelativeAction;
/// use deep_snake::rl::{ReplayBuffer, Transition};
///
/// let mut buffer = ReplayBuffer::new(2).unwrap();
/// for reward in [1.0, 2.0, 3.0] {
///     buffer.push(Transition {
///         state: [0.0; 11],
///         action: RelativeAction::Straight,
///         reward,
///         next_state: [0.0; 11],
///         terminal: false,
///     });
/// }
///
/// let rewards: Vec<f32> = buffer.iter().map(|t| t.reward).collect();
/// assert_eq!(rewards, vec![2.0, 3.0]);
/// ```
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    transitions: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayBuffer {
    /// Create an empty buffer holding at most `capacity` transitions
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(SnakeError::InvalidConfiguration(
                "replay buffer capacity must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            transitions: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Append a transition, evicting the oldest one when full
    pub fn push(&mut self, transition: Transition) {
        if self.transitions.len() >= self.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Draw `n` distinct transitions uniformly, or everything if fewer are stored
    ///
    /// The order of the returned transitions is unspecified.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<Transition> {
        if self.transitions.len() <= n {
            return self.transitions.iter().cloned().collect();
        }

        index::sample(rng, self.transitions.len(), n)
            .into_iter()
            .map(|i| self.transitions[i].clone())
            .collect()
    }

    /// Stored transitions, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }

    /// Get the number of stored transitions
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Check if the buffer has reached capacity
    pub fn is_full(&self) -> bool {
        self.transitions.len() >= self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    fn transition(id: usize) -> Transition {
        let mut state = [0.0; 11];
        state[0] = id as f32;
        Transition {
            state,
            action: RelativeAction::Straight,
            reward: id as f32,
            next_state: [0.0; 11],
            terminal: false,
        }
    }

    fn ids(transitions: impl IntoIterator<Item = Transition>) -> Vec<usize> {
        transitions.into_iter().map(|t| t.reward as usize).collect()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            ReplayBuffer::new(0),
            Err(SnakeError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_push_below_capacity() {
        let mut buffer = ReplayBuffer::new(10).unwrap();
        assert!(buffer.is_empty());

        for i in 0..4 {
            buffer.push(transition(i));
        }

        assert_eq!(buffer.len(), 4);
        assert!(!buffer.is_full());
    }

    #[test]
    fn test_keeps_last_capacity_in_insertion_order() {
        let capacity = 5;
        let mut buffer = ReplayBuffer::new(capacity).unwrap();

        for i in 0..capacity + 3 {
            buffer.push(transition(i));
            assert!(buffer.len() <= capacity);
        }

        assert!(buffer.is_full());
        assert_eq!(ids(buffer.iter().cloned()), vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_sample_returns_all_when_short() {
        let mut buffer = ReplayBuffer::new(10).unwrap();
        for i in 0..3 {
            buffer.push(transition(i));
        }

        let mut rng = StdRng::seed_from_u64(1);
        let sample = buffer.sample(5, &mut rng);
        assert_eq!(ids(sample), vec![0, 1, 2]);
    }

    #[test]
    fn test_sample_without_replacement() {
        let mut buffer = ReplayBuffer::new(100).unwrap();
        for i in 0..100 {
            buffer.push(transition(i));
        }

        let mut rng = StdRng::seed_from_u64(42);
        let sample = ids(buffer.sample(30, &mut rng));
        assert_eq!(sample.len(), 30);

        let unique: HashSet<_> = sample.iter().collect();
        assert_eq!(unique.len(), 30);
        assert!(sample.iter().all(|&id| id < 100));
    }

    #[test]
    fn test_sample_does_not_mutate() {
        let mut buffer = ReplayBuffer::new(20).unwrap();
        for i in 0..20 {
            buffer.push(transition(i));
        }
        let before = ids(buffer.iter().cloned());

        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..10 {
            buffer.sample(7, &mut rng);
        }

        assert_eq!(ids(buffer.iter().cloned()), before);
    }

    #[test]
    fn test_sample_covers_whole_buffer() {
        let mut buffer = ReplayBuffer::new(10).unwrap();
        for i in 0..10 {
            buffer.push(transition(i));
        }

        let mut rng = StdRng::seed_from_u64(5);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            seen.extend(ids(buffer.sample(2, &mut rng)));
        }

        assert_eq!(seen.len(), 10);
    }
}
