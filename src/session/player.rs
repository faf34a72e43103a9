//! Replay engine for recorded event logs
//!
//! Events are dispatched strictly in log order. Each event's timestamp is an
//! offset from the moment replay starts; the engine sleeps until that
//! deadline when it lies in the future and dispatches immediately when it
//! is already past, so a slow injector never causes reordering or negative
//! sleeps.
//!
//! Key and button names are translated from listener text to injector
//! names (see [`super::keymap`]) and positions are clamped to the current
//! screen. A failing injection is logged and replay moves on.

use std::time::{Duration, Instant};

use crate::backend::InputInjector;
use crate::config::AppConfig;
use crate::error::Result;
use crate::types::{Event, KeyAction, Position};

use super::context::StopSignal;
use super::keymap::translate_key;
use super::types::{EventLog, SessionState};

/// Replay tuning
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Countdown before the replay clock starts
    pub countdown: Duration,
    /// Log progress every N events (0 disables)
    pub progress_every: usize,
    /// Granularity of stop checks while waiting
    pub poll_interval: Duration,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            countdown: Duration::from_secs(3),
            progress_every: 10,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl ReplayOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            countdown: Duration::from_secs(u64::from(config.replay.countdown_secs)),
            progress_every: config.replay.progress_every,
            poll_interval: config.recording.poll_interval(),
        }
    }

    /// No countdown, for tests and back-to-back replays
    pub fn immediate() -> Self {
        Self {
            countdown: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Summary of one replay
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub total: usize,
    /// Events handed to the injector, failed ones included
    pub dispatched: usize,
    pub failed: usize,
    pub aborted: bool,
    pub elapsed: Duration,
}

impl ReplayReport {
    pub fn succeeded(&self) -> usize {
        self.dispatched - self.failed
    }
}

/// Replays event logs against an [`InputInjector`]
#[derive(Debug)]
pub struct ReplayEngine {
    options: ReplayOptions,
    stop: Option<StopSignal>,
    state: SessionState,
}

impl Default for ReplayEngine {
    fn default() -> Self {
        Self::new(ReplayOptions::default())
    }
}

impl ReplayEngine {
    pub fn new(options: ReplayOptions) -> Self {
        Self {
            options,
            stop: None,
            state: SessionState::Idle,
        }
    }

    /// Abort the replay when `stop` fires
    pub fn with_stop(mut self, stop: StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Replay every event of `log` in order
    pub fn replay(&mut self, injector: &mut dyn InputInjector, log: &EventLog) -> ReplayReport {
        let total = log.len();
        let mut report = ReplayReport {
            total,
            dispatched: 0,
            failed: 0,
            aborted: false,
            elapsed: Duration::ZERO,
        };

        if self.countdown() {
            report.aborted = true;
            tracing::warn!("Replay cancelled during countdown");
            return report;
        }

        let screen = match injector.screen_size() {
            Ok(size) => Some(size),
            Err(e) => {
                tracing::warn!("Could not query screen size, positions left unclamped: {}", e);
                None
            }
        };

        self.state = SessionState::Replaying;
        tracing::info!("Replaying {} events ({:.2}s)", total, log.duration_secs());
        let replay_start = Instant::now();

        for (i, event) in log.iter().enumerate() {
            let offset =
                Duration::try_from_secs_f64(event.timestamp().max(0.0)).unwrap_or_default();
            if self.wait_until(replay_start + offset) {
                report.aborted = true;
                tracing::warn!("Replay aborted after {} of {} events", report.dispatched, total);
                break;
            }

            if let Err(e) = dispatch(injector, event, screen) {
                report.failed += 1;
                tracing::error!("Error during replay of event {}: {}", i + 1, e);
            }
            report.dispatched += 1;

            let done = i + 1;
            if self.options.progress_every > 0 && done % self.options.progress_every == 0 {
                tracing::info!(
                    "Progress: {:.1}% ({}/{} events)",
                    done as f64 * 100.0 / total as f64,
                    done,
                    total
                );
            }
        }

        report.elapsed = replay_start.elapsed();
        self.state = SessionState::Stopped;
        tracing::info!(
            "Replay finished: {} dispatched, {} failed in {:.2}s",
            report.dispatched,
            report.failed,
            report.elapsed.as_secs_f64()
        );
        report
    }

    /// Returns `true` if stopped during the countdown
    fn countdown(&self) -> bool {
        let secs = self.options.countdown.as_secs();
        if secs == 0 {
            return false;
        }
        tracing::info!("Starting replay in {} seconds...", secs);
        for remaining in (1..=secs).rev() {
            tracing::info!("{}...", remaining);
            if self.sleep(Duration::from_secs(1)) {
                return true;
            }
        }
        false
    }

    /// Sleep until `deadline`; returns `true` if stopped meanwhile
    fn wait_until(&self, deadline: Instant) -> bool {
        let now = Instant::now();
        if deadline <= now {
            return self.stop.as_ref().is_some_and(StopSignal::is_set);
        }
        self.sleep(deadline - now)
    }

    fn sleep(&self, duration: Duration) -> bool {
        match &self.stop {
            Some(stop) => stop.sleep(duration, self.options.poll_interval),
            None => {
                std::thread::sleep(duration);
                false
            }
        }
    }
}

fn clamp(position: Position, screen: Option<(u32, u32)>) -> Position {
    match screen {
        Some((w, h)) => position.clamped(w, h),
        None => position,
    }
}

/// Send one event to the injector
fn dispatch(
    injector: &mut dyn InputInjector,
    event: &Event,
    screen: Option<(u32, u32)>,
) -> Result<()> {
    match event {
        Event::Keyboard { action, key, .. } => {
            let key = translate_key(key);
            match action {
                KeyAction::Press => injector.key_down(&key),
                KeyAction::Release => injector.key_up(&key),
            }
        }
        Event::MouseMove { position, .. } => {
            let p = clamp(*position, screen);
            injector.move_to(p.x, p.y)
        }
        Event::MouseClick {
            position,
            button,
            pressed,
            ..
        } => {
            let p = clamp(*position, screen);
            if *pressed {
                injector.mouse_down(p.x, p.y, button.injector_name())
            } else {
                injector.mouse_up(p.x, p.y, button.injector_name())
            }
        }
        Event::MouseScroll {
            position, delta, ..
        } => {
            let p = clamp(*position, screen);
            injector.scroll(delta.dx, delta.dy, p.x, p.y)
        }
    }
}
