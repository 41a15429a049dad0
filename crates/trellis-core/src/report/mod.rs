//! The reporter protocol.
//!
//! The runner turns each state transition into an [`Event`] and hands it to
//! the single registered [`Reporter`], one event at a time and in order.

mod collector;
mod event;
mod log;
mod summary;

pub use collector::Collector;
pub use event::{Event, EventKind, ExtraCall, Path, Segment, Speed, Timing};
pub use log::TracingReporter;
pub use summary::RunSummary;

/// Consumer of the event stream.
///
/// Reporters are called for their side effects only. Any closure taking an
/// `&Event` is a reporter.
pub trait Reporter: Send {
    fn report(&mut self, event: &Event);
}

impl<F> Reporter for F
where
    F: FnMut(&Event) + Send,
{
    fn report(&mut self, event: &Event) {
        self(event)
    }
}
