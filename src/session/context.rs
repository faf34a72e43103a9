//! Per-session shared state handed to every recording component
//!
//! There is no global recording state: the orchestrator builds one
//! [`SessionContext`] and gives listeners an [`InputSink`] derived from it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::backend::RawInput;
use crate::types::{Event, MouseButton};

use super::clock::PauseController;
use super::queue::EventQueue;

/// Cloneable stop flag observed by every loop
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Sleep for `duration`, waking early (within `poll`) if the signal fires
    ///
    /// Returns `true` if the signal was set.
    pub fn sleep(&self, duration: Duration, poll: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_set() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            std::thread::sleep((deadline - now).min(poll));
        }
    }
}

/// Shared primitives of one recording session
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub clock: Arc<PauseController>,
    pub queue: EventQueue,
    pub stop: StopSignal,
    pause_hotkey: Arc<str>,
}

impl SessionContext {
    pub fn new(stop: StopSignal, pause_hotkey: &str) -> Self {
        Self {
            clock: Arc::new(PauseController::new()),
            queue: EventQueue::new(),
            stop,
            pause_hotkey: Arc::from(pause_hotkey),
        }
    }

    /// A fresh, active sink for one listener
    pub fn input_sink(&self) -> InputSink {
        InputSink {
            clock: self.clock.clone(),
            queue: self.queue.clone(),
            pause_hotkey: self.pause_hotkey.clone(),
            active: Arc::new(AtomicBool::new(true)),
        }
    }
}

/// Where input listeners deliver raw input
///
/// `emit` never blocks: it checks the pause state, stamps the event with
/// active session time and pushes it onto the ingestion queue. The pause
/// hotkey toggles the session clock and is itself not recorded.
#[derive(Debug, Clone)]
pub struct InputSink {
    clock: Arc<PauseController>,
    queue: EventQueue,
    pause_hotkey: Arc<str>,
    active: Arc<AtomicBool>,
}

impl InputSink {
    pub fn emit(&self, raw: RawInput) {
        if !self.active.load(Ordering::Relaxed) {
            return;
        }

        match &raw {
            RawInput::KeyPress(key) if **key == *self.pause_hotkey => {
                self.clock.toggle();
                return;
            }
            RawInput::KeyRelease(key) if **key == *self.pause_hotkey => return,
            _ => {}
        }

        if self.clock.is_paused() {
            return;
        }

        let timestamp = self.clock.relative_time(Instant::now()).as_secs_f64();
        self.queue.enqueue(to_event(raw, timestamp));
    }

    /// Stop accepting input; clones share the flag
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }
}

fn to_event(raw: RawInput, timestamp: f64) -> Event {
    match raw {
        RawInput::KeyPress(key) => Event::key_press(key, timestamp),
        RawInput::KeyRelease(key) => Event::key_release(key, timestamp),
        RawInput::MouseMove { x, y } => Event::mouse_move(x, y, timestamp),
        RawInput::MouseClick {
            x,
            y,
            button,
            pressed,
        } => Event::mouse_click(x, y, MouseButton::from_raw(&button), pressed, timestamp),
        RawInput::MouseScroll { x, y, dx, dy } => Event::mouse_scroll(x, y, dx, dy, timestamp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(ctx: &SessionContext) -> Vec<Event> {
        ctx.queue.drain_pending()
    }

    #[test]
    fn test_emit_stamps_and_enqueues() {
        let ctx = SessionContext::new(StopSignal::new(), "Key.pause");
        let sink = ctx.input_sink();

        sink.emit(RawInput::MouseMove { x: 3, y: 4 });
        sink.emit(RawInput::KeyPress("'q'".to_string()));

        let events = drain(&ctx);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].position().unwrap().x, 3);
        assert!(events[1].is_keyboard());
        assert!(events[1].timestamp() >= events[0].timestamp());
    }

    #[test]
    fn test_paused_input_is_discarded() {
        let ctx = SessionContext::new(StopSignal::new(), "Key.pause");
        let sink = ctx.input_sink();

        sink.emit(RawInput::KeyPress("Key.pause".to_string()));
        assert!(sink.is_paused());
        sink.emit(RawInput::KeyRelease("Key.pause".to_string()));
        sink.emit(RawInput::MouseMove { x: 1, y: 1 });
        sink.emit(RawInput::KeyPress("'x'".to_string()));
        assert!(drain(&ctx).is_empty());

        sink.emit(RawInput::KeyPress("Key.pause".to_string()));
        assert!(!sink.is_paused());
        sink.emit(RawInput::MouseClick {
            x: 1,
            y: 2,
            button: "Button.right".to_string(),
            pressed: true,
        });

        let events = drain(&ctx);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Event::MouseClick {
                button: MouseButton::Right,
                pressed: true,
                ..
            }
        ));
    }

    #[test]
    fn test_deactivated_sink_drops_everything() {
        let ctx = SessionContext::new(StopSignal::new(), "Key.pause");
        let sink = ctx.input_sink();
        let clone = sink.clone();
        sink.deactivate();

        clone.emit(RawInput::MouseScroll {
            x: 0,
            y: 0,
            dx: 0,
            dy: 1,
        });
        assert!(!clone.is_active());
        assert!(ctx.queue.is_empty());
    }

    #[test]
    fn test_stop_signal_sleep_wakes_early() {
        let stop = StopSignal::new();
        let remote = stop.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            remote.trigger();
        });

        let start = Instant::now();
        assert!(stop.sleep(Duration::from_secs(5), Duration::from_millis(10)));
        assert!(start.elapsed() < Duration::from_secs(2));
        handle.join().unwrap();

        stop.reset();
        assert!(!stop.sleep(Duration::from_millis(5), Duration::from_millis(1)));
    }
}
