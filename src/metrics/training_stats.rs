//! Training statistics tracking
//!
//! Tracks per-episode scores, the record score, rolling and all-time mean
//! scores, and the loss of recent training updates.

use std::collections::VecDeque;

/// Training statistics tracker with rolling averages
///
/// # Example
///
/// ```rust
/// use deep_snake::metrics::TrainingStats;
///
/// let mut stats = TrainingStats::new(100);
///
/// stats.record_episode(5, 150, 40.0);
/// stats.record_loss(0.25);
///
/// assert_eq!(stats.record(), 5);
/// println!("{}", stats.format_summary());
/// ```
#[derive(Debug, Clone)]
pub struct TrainingStats {
    /// Episode scores (rolling window)
    episode_scores: VecDeque<u32>,

    /// Episode lengths in steps (rolling window)
    episode_lengths: VecDeque<u32>,

    /// Summed episode rewards (rolling window)
    episode_rewards: VecDeque<f32>,

    /// Training losses (rolling window)
    losses: VecDeque<f32>,

    /// Best score of any episode so far
    record: u32,

    /// Sum of all episode scores, for the all-time mean
    total_score: u64,

    total_episodes: usize,

    total_steps: usize,

    window_size: usize,
}

impl TrainingStats {
    /// Create a tracker keeping the last `window_size` values for rolling means
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            episode_scores: VecDeque::with_capacity(window_size),
            episode_lengths: VecDeque::with_capacity(window_size),
            episode_rewards: VecDeque::with_capacity(window_size),
            losses: VecDeque::with_capacity(window_size),
            record: 0,
            total_score: 0,
            total_episodes: 0,
            total_steps: 0,
            window_size,
        }
    }

    /// Record the end of an episode
    ///
    /// Returns `true` when `score` beats the previous record.
    pub fn record_episode(&mut self, score: u32, steps: u32, reward: f32) -> bool {
        Self::push_deque(&mut self.episode_scores, score, self.window_size);
        Self::push_deque(&mut self.episode_lengths, steps, self.window_size);
        Self::push_deque(&mut self.episode_rewards, reward, self.window_size);
        self.total_score += u64::from(score);
        self.total_episodes += 1;
        self.total_steps += steps as usize;

        let new_record = score > self.record;
        if new_record {
            self.record = score;
        }
        new_record
    }

    /// Record the loss of one training update
    pub fn record_loss(&mut self, loss: f32) {
        Self::push_deque(&mut self.losses, loss, self.window_size);
    }

    /// Best episode score so far
    pub fn record(&self) -> u32 {
        self.record
    }

    /// Mean score over the rolling window
    pub fn mean_score(&self) -> f32 {
        if self.episode_scores.is_empty() {
            return 0.0;
        }
        let sum: u32 = self.episode_scores.iter().sum();
        sum as f32 / self.episode_scores.len() as f32
    }

    /// Mean score over every episode recorded
    pub fn all_time_mean_score(&self) -> f32 {
        if self.total_episodes == 0 {
            return 0.0;
        }
        self.total_score as f32 / self.total_episodes as f32
    }

    /// Mean episode length over the rolling window
    pub fn mean_episode_length(&self) -> f32 {
        if self.episode_lengths.is_empty() {
            return 0.0;
        }
        let sum: u32 = self.episode_lengths.iter().sum();
        sum as f32 / self.episode_lengths.len() as f32
    }

    pub fn mean_episode_reward(&self) -> f32 {
        Self::mean(&self.episode_rewards)
    }

    pub fn mean_loss(&self) -> f32 {
        Self::mean(&self.losses)
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// One-line summary of the current statistics
    ///
    /// ```text
    /// Episodes: 1 | Steps: 150 | Record: 5 | Score: 5.00 | Mean: 5.00 | Len: 150.0 | Loss: 0.2500
    /// ```
    pub fn format_summary(&self) -> String {
        format!(
            "Episodes: {} | Steps: {} | Record: {} | Score: {:.2} | Mean: {:.2} | Len: {:.1} | Loss: {:.4}",
            self.total_episodes,
            self.total_steps,
            self.record,
            self.mean_score(),
            self.all_time_mean_score(),
            self.mean_episode_length(),
            self.mean_loss(),
        )
    }

    fn mean(deque: &VecDeque<f32>) -> f32 {
        if deque.is_empty() {
            0.0
        } else {
            deque.iter().sum::<f32>() / deque.len() as f32
        }
    }

    fn push_deque<T>(deque: &mut VecDeque<T>, value: T, window_size: usize) {
        if deque.len() >= window_size {
            deque.pop_front();
        }
        deque.push_back(value);
    }
}

impl Default for TrainingStats {
    fn default() -> Self {
        Self::new(100)
    }
}
