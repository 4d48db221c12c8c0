//! Legacy command-queue analytics backend.
//!
//! The legacy global is a plain array the analytics script drains once it
//! loads. Each event is appended as `["_trackEvent", category, action, label]`.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::backends::traits::Reporter;
use crate::error::{Result, TrackError};
use crate::event::TrackedEvent;

/// Tag prepended to every queued event.
pub const TRACK_EVENT: &str = "_trackEvent";

/// A shared, append-only command queue.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    commands: Arc<Mutex<Vec<Vec<String>>>>,
}

impl CommandQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command.
    pub fn push(&self, command: Vec<String>) -> Result<()> {
        self.commands
            .lock()
            .map_err(|_| TrackError::backend("command queue lock poisoned"))?
            .push(command);
        Ok(())
    }

    /// Copy of the queued commands, oldest first.
    pub fn snapshot(&self) -> Vec<Vec<String>> {
        self.commands
            .lock()
            .map(|commands| commands.clone())
            .unwrap_or_default()
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.commands.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Serialize for CommandQueue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

/// Reporter over a legacy command queue.
#[derive(Debug, Clone)]
pub struct QueueReporter {
    queue: CommandQueue,
}

impl QueueReporter {
    /// Create a reporter appending to `queue`.
    pub fn new(queue: CommandQueue) -> Self {
        Self { queue }
    }
}

impl Reporter for QueueReporter {
    fn report(&self, event: &TrackedEvent) -> Result<()> {
        let mut command = Vec::with_capacity(4);
        command.push(TRACK_EVENT.to_string());
        command.extend(event.args().iter().map(|s| s.to_string()));
        self.queue.push(command)
    }

    fn name(&self) -> &'static str {
        "gaq"
    }
}
