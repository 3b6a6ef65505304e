//! Append-only command/event log.

use etherline_types::Event;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandLog {
    events: Vec<Event>,
}

impl CommandLog {
    pub fn append(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns every event appended at or after `since` (an index
    /// previously returned by `len`), for a host to incrementally replay.
    pub fn events_since(&self, since: usize) -> &[Event] {
        if since >= self.events.len() {
            &[]
        } else {
            &self.events[since..]
        }
    }

    pub fn all(&self) -> &[Event] {
        &self.events
    }
}
