use parking_lot::Mutex;
use std::sync::Arc;

use super::{Event, EventKind, Reporter};

/// Reporter that records every event it receives.
///
/// Clones share the same buffer, so one clone can be registered on a suite
/// while another is kept to inspect the stream afterwards.
#[derive(Debug, Clone, Default)]
pub struct Collector {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Kinds of the events received so far.
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().iter().map(Event::kind).collect()
    }

    /// Each event as `"kind path"`, e.g. `"pass outer > inner"`.
    pub fn outline(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .map(|event| {
                let names: Vec<&str> = event.path().iter().map(|s| s.name.as_str()).collect();
                if names.is_empty() {
                    event.kind().to_string()
                } else {
                    format!("{} {}", event.kind(), names.join(" > "))
                }
            })
            .collect()
    }

    /// Removes and returns everything recorded so far.
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl Reporter for Collector {
    fn report(&mut self, event: &Event) {
        self.events.lock().push(event.clone());
    }
}
