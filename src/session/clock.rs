//! Session clock with pause/resume accounting
//!
//! All event timestamps are "active recording time": wall time since the
//! session started minus every interval spent paused.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct ClockState {
    start_time: Instant,
    pause_started_at: Option<Instant>,
    total_paused: Duration,
}

/// Tracks session start and cumulative paused time
///
/// Shared between the capture loop, the input sink and the hotkey handler,
/// so every method takes `&self`. `is_paused` is a lock-free read.
#[derive(Debug)]
pub struct PauseController {
    paused: AtomicBool,
    state: Mutex<ClockState>,
}

impl PauseController {
    /// Start a running clock now
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    /// Start a running clock at a given instant
    pub fn started_at(start_time: Instant) -> Self {
        Self {
            paused: AtomicBool::new(false),
            state: Mutex::new(ClockState {
                start_time,
                pause_started_at: None,
                total_paused: Duration::ZERO,
            }),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Flip between running and paused; returns the new paused state
    pub fn toggle(&self) -> bool {
        self.toggle_at(Instant::now())
    }

    pub fn toggle_at(&self, now: Instant) -> bool {
        let mut state = self.lock();
        let paused = match state.pause_started_at.take() {
            Some(pause_start) => {
                state.total_paused += now.saturating_duration_since(pause_start);
                false
            }
            None => {
                state.pause_started_at = Some(now);
                true
            }
        };
        self.paused.store(paused, Ordering::SeqCst);

        if paused {
            tracing::info!("Recording paused");
        } else {
            tracing::info!(
                "Recording resumed (total paused {:.2}s)",
                state.total_paused.as_secs_f64()
            );
        }
        paused
    }

    /// Active time elapsed at `now`
    ///
    /// While paused the value is frozen at the instant the pause began.
    pub fn relative_time(&self, now: Instant) -> Duration {
        let state = self.lock();
        let effective_now = match state.pause_started_at {
            Some(pause_start) if pause_start < now => pause_start,
            _ => now,
        };
        effective_now
            .saturating_duration_since(state.start_time)
            .saturating_sub(state.total_paused)
    }

    /// Active time elapsed right now, in seconds
    pub fn elapsed_secs(&self) -> f64 {
        self.relative_time(Instant::now()).as_secs_f64()
    }

    /// Total time spent paused so far (excluding an in-progress pause)
    pub fn total_paused(&self) -> Duration {
        self.lock().total_paused
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ClockState> {
        // Every update is a plain field assignment, so a poisoned state is still valid
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for PauseController {
    fn default() -> Self {
        Self::new()
    }
}
