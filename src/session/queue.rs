//! Event ingestion queue
//!
//! Listener contexts must return immediately, so they only push onto this
//! unbounded channel. The drain task pulls events off with a short timeout
//! so it can notice the stop signal.

use crate::types::Event;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Thread-safe unbounded FIFO of recorded events
#[derive(Debug, Clone)]
pub struct EventQueue {
    sender: Sender<Event>,
    receiver: Receiver<Event>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Push an event; never blocks and never fails
    pub fn enqueue(&self, event: Event) {
        // Both ends live in `self`, so the channel cannot be disconnected here
        let _ = self.sender.send(event);
    }

    /// Wait up to `timeout` for the next event
    pub fn drain_with_timeout(&self, timeout: Duration) -> Option<Event> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Take whatever is queued right now without waiting
    pub fn drain_pending(&self) -> Vec<Event> {
        self.receiver.try_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
