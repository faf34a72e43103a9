//! Test data builders for creating test objects

use replaykit_rs::{Event, EventLog, MouseButton};

/// Builder for event logs with steadily increasing timestamps
pub struct EventLogBuilder {
    events: Vec<Event>,
    time: f64,
}

impl EventLogBuilder {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            time: 0.0,
        }
    }

    /// Advance the clock for the next event
    pub fn after(mut self, secs: f64) -> Self {
        self.time += secs;
        self
    }

    pub fn move_to(mut self, x: i32, y: i32) -> Self {
        self.events.push(Event::mouse_move(x, y, self.time));
        self
    }

    /// Press and release of the same key
    pub fn tap(mut self, key: &str) -> Self {
        self.events.push(Event::key_press(key, self.time));
        self.events.push(Event::key_release(key, self.time));
        self
    }

    /// Mouse down and up at one position
    pub fn click(mut self, x: i32, y: i32, button: MouseButton) -> Self {
        self.events.push(Event::mouse_click(x, y, button, true, self.time));
        self.events.push(Event::mouse_click(x, y, button, false, self.time));
        self
    }

    pub fn scroll(mut self, x: i32, y: i32, dx: i32, dy: i32) -> Self {
        self.events.push(Event::mouse_scroll(x, y, dx, dy, self.time));
        self
    }

    pub fn build(self) -> EventLog {
        EventLog::from_events(self.events)
    }
}

impl Default for EventLogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_builder() {
        let log = EventLogBuilder::new()
            .move_to(1, 2)
            .after(0.5)
            .tap("'a'")
            .build();

        assert_eq!(log.len(), 3);
        assert_eq!(log.events()[2].timestamp(), 0.5);
    }
}
