//! Watch mode: a terminal view of a running game loop
//!
//! Each tick advances the loop by one step and the board is redrawn at a fixed
//! frame rate. The loop is either live training or greedy play with a saved
//! network.
//!
//! # Controls
//!
//! - Space: Pause/unpause
//! - 1-4: Speed control (1=slow, 2=normal, 3=fast, 4=very fast)
//! - Q/Esc: Quit
//!
//! # Example
//!
//! ```rust,ignore
//! use deep_snake::modes::{TrainConfig, TrainingLoop, WatchMode};
//! use deep_snake::rl::{QTrainer, TrainingBackend, default_device};
//!
//! let config = TrainConfig::default();
//! let trainer = QTrainer::<TrainingBackend>::new(config.agent_config.clone(), default_device())?;
//! let mut watch = WatchMode::new(TrainingLoop::new(trainer, config)?);
//! watch.run().await?;
//! ```

use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    io::{Stderr, stderr},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::time::{Interval, interval};

use crate::game::GameState;
use crate::metrics::TrainingStats;
use crate::render::{Hud, Renderer};

/// A stepping game loop the watch view can drive
pub trait Simulation {
    /// Name shown in the header
    fn label(&self) -> &'static str;

    /// Advance the game by one step
    fn advance(&mut self) -> Result<()>;

    fn state(&self) -> &GameState;

    fn stats(&self) -> &TrainingStats;

    fn cancel_handle(&self) -> Arc<AtomicBool>;

    fn is_finished(&self) -> bool;
}

/// Playback speed settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchSpeed {
    /// 2 Hz
    Slow,
    /// 8 Hz
    Normal,
    /// 20 Hz
    Fast,
    /// 60 Hz
    VeryFast,
}

impl WatchSpeed {
    fn tick_interval(&self) -> Duration {
        match self {
            Self::Slow => Duration::from_millis(500),
            Self::Normal => Duration::from_millis(125),
            Self::Fast => Duration::from_millis(50),
            Self::VeryFast => Duration::from_millis(16),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Slow => "Slow",
            Self::Normal => "Normal",
            Self::Fast => "Fast",
            Self::VeryFast => "Very Fast",
        }
    }
}

/// Terminal front end driving a [`Simulation`]
pub struct WatchMode<S: Simulation> {
    simulation: S,

    renderer: Renderer,

    should_quit: bool,

    paused: bool,

    speed: WatchSpeed,
}

impl<S: Simulation> WatchMode<S> {
    pub fn new(simulation: S) -> Self {
        Self {
            simulation,
            renderer: Renderer::new(),
            should_quit: false,
            paused: false,
            speed: WatchSpeed::Normal,
        }
    }

    pub fn simulation(&self) -> &S {
        &self.simulation
    }

    /// Take over the terminal until the user quits or the loop finishes
    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        let result = self.run_watch_loop(&mut terminal).await;

        self.cleanup_terminal(&mut terminal)?;

        result
    }

    async fn run_watch_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();
        let mut tick_timer = interval(self.speed.tick_interval());

        // Render at 30 FPS
        let mut render_timer = interval(Duration::from_millis(33));

        loop {
            tokio::select! {
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event, &mut tick_timer);
                    }
                }

                _ = tick_timer.tick() => {
                    if !self.paused {
                        self.simulation.advance()?;
                    }
                }

                _ = render_timer.tick() => {
                    terminal.draw(|frame| {
                        self.renderer.render(frame, self.simulation.state(), &self.hud());
                    }).context("Failed to draw frame")?;
                }

                _ = tokio::signal::ctrl_c() => {
                    self.simulation.cancel_handle().store(true, Ordering::Relaxed);
                }
            }

            if self.should_quit || self.simulation.is_finished() {
                break;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event, tick_timer: &mut Interval) {
        let Event::Key(key) = event else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            // Raw mode delivers Ctrl+C as a key press
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Char(' ') => self.paused = !self.paused,
            KeyCode::Char('1') => self.change_speed(WatchSpeed::Slow, tick_timer),
            KeyCode::Char('2') => self.change_speed(WatchSpeed::Normal, tick_timer),
            KeyCode::Char('3') => self.change_speed(WatchSpeed::Fast, tick_timer),
            KeyCode::Char('4') => self.change_speed(WatchSpeed::VeryFast, tick_timer),
            _ => {}
        }
    }

    fn change_speed(&mut self, speed: WatchSpeed, tick_timer: &mut Interval) {
        self.speed = speed;
        *tick_timer = interval(speed.tick_interval());
    }

    fn hud(&self) -> Hud {
        let stats = self.simulation.stats();
        Hud {
            mode: self.simulation.label(),
            episodes: stats.total_episodes(),
            record: stats.record(),
            mean_score: stats.all_time_mean_score(),
            speed: self.speed.as_str(),
            paused: self.paused,
        }
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use crate::modes::{GreedyPlayer, PlayConfig, TrainConfig, TrainingLoop};
    use crate::rl::agent::tests::RecordingValueFn;
    use crossterm::event::KeyEvent;

    fn watch_mode() -> WatchMode<TrainingLoop<RecordingValueFn>> {
        let mut config = TrainConfig::default();
        config.game_config = GameConfig::with_cells(10, 10);
        let training = TrainingLoop::with_seed(RecordingValueFn::default(), config, 5).unwrap();
        WatchMode::new(training)
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_watch_speed() {
        assert_eq!(WatchSpeed::Slow.tick_interval(), Duration::from_millis(500));
        assert_eq!(WatchSpeed::Normal.tick_interval(), Duration::from_millis(125));
        assert_eq!(WatchSpeed::Fast.tick_interval(), Duration::from_millis(50));
        assert_eq!(WatchSpeed::VeryFast.tick_interval(), Duration::from_millis(16));
    }

    #[tokio::test]
    async fn test_key_handling() {
        let mut watch = watch_mode();
        let mut timer = interval(watch.speed.tick_interval());

        watch.handle_event(key(KeyCode::Char(' ')), &mut timer);
        assert!(watch.paused);
        assert!(watch.hud().paused);

        watch.handle_event(key(KeyCode::Char('4')), &mut timer);
        assert_eq!(watch.speed, WatchSpeed::VeryFast);
        assert_eq!(timer.period(), Duration::from_millis(16));

        watch.handle_event(key(KeyCode::Char('c')), &mut timer);
        assert!(!watch.should_quit);

        watch.handle_event(key(KeyCode::Esc), &mut timer);
        assert!(watch.should_quit);
    }

    #[tokio::test]
    async fn test_ctrl_c_quits() {
        let mut watch = watch_mode();
        let mut timer = interval(watch.speed.tick_interval());

        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        watch.handle_event(ctrl_c, &mut timer);
        assert!(watch.should_quit);
    }

    #[test]
    fn test_hud_tracks_training() {
        let watch = watch_mode();
        let hud = watch.hud();

        assert_eq!(hud.mode, "Training");
        assert_eq!(hud.episodes, 0);
        assert_eq!(hud.record, 0);
        assert_eq!(hud.speed, "Normal");
        assert_eq!(watch.simulation().generation(), 0);
    }

    #[test]
    fn test_advance_drives_greedy_play() {
        let mut config = PlayConfig::default();
        config.game_config = GameConfig::with_cells(10, 10);
        let estimator = RecordingValueFn::with_values([5.0, 0.0, 0.0]);
        let player = GreedyPlayer::with_seed(estimator, config, 5).unwrap();
        let mut watch = WatchMode::new(player);

        let head = watch.simulation().state().snake.head();
        while watch.simulation().stats().total_episodes() == 0 {
            watch.simulation.advance().unwrap();
        }

        let hud = watch.hud();
        assert_eq!(hud.mode, "Playing");
        assert_eq!(hud.episodes, 1);
        assert_eq!(watch.simulation().state().snake.head(), head);
        assert!(watch.simulation().estimator().batches.is_empty());
    }
}
