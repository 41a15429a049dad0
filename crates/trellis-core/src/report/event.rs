use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

use crate::failure::Failure;
use crate::tree::Limit;

/// One step of a node's path: its name and position among its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Segment {
    pub name: String,
    pub index: usize,
}

impl Segment {
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }
}

/// Location of a node, from the outermost group down to the node itself.
/// The root has an empty path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Path(Vec<Segment>);

impl Path {
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.name.as_str())
    }

    /// Returns a new path one level deeper.
    pub fn child(&self, name: impl Into<String>, index: usize) -> Path {
        let mut segments = self.0.clone();
        segments.push(Segment::new(name, index));
        Path(segments)
    }
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        Path(segments)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " > ")?;
            }
            write!(f, "{}", segment.name)?;
        }
        Ok(())
    }
}

/// How a duration compares to its slow threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    /// At most half the threshold.
    Fast,
    /// Above half the threshold, at most the threshold.
    Medium,
    /// Above the threshold.
    Slow,
}

/// Timing attached to `enter`, `pass` and `fail` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timing {
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
    pub slow: Limit,
}

impl Timing {
    pub fn new(duration: Duration, slow: Limit) -> Self {
        Self { duration, slow }
    }

    pub fn speed(&self) -> Speed {
        let Some(threshold) = self.slow.as_duration() else {
            return Speed::Fast;
        };
        if self.duration > threshold {
            Speed::Slow
        } else if self.duration > threshold / 2 {
            Speed::Medium
        } else {
            Speed::Fast
        }
    }

    pub fn is_slow(&self) -> bool {
        self.speed() == Speed::Slow
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}

/// A signal received from a node after it already settled.
#[derive(Debug, Clone, Serialize)]
pub struct ExtraCall {
    /// How many signals the node has produced, counting this one.
    pub count: usize,
    /// The failure carried by the signal, if it was not a success.
    pub value: Option<Failure>,
}

/// Type tag of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Start,
    Enter,
    Leave,
    Pass,
    Fail,
    Skip,
    Extra,
    End,
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::Enter => "enter",
            EventKind::Leave => "leave",
            EventKind::Pass => "pass",
            EventKind::Fail => "fail",
            EventKind::Skip => "skip",
            EventKind::Extra => "extra",
            EventKind::End => "end",
            EventKind::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle event delivered to the reporter.
///
/// For a group the stream contains `enter`, the events of its children and
/// `leave`; a test produces exactly one of `pass`, `fail` or `skip`, possibly
/// followed by `extra` events. `start` and `end` frame the whole run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    Start,
    Enter { path: Path, data: Timing },
    Leave { path: Path },
    Pass { path: Path, data: Timing },
    Fail { path: Path, value: Failure, data: Timing },
    Skip { path: Path },
    Extra { path: Path, value: ExtraCall },
    End,
    /// A failure in a root-level hook, which has no test path to attach to.
    Error { path: Path, value: Failure },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Start => EventKind::Start,
            Event::Enter { .. } => EventKind::Enter,
            Event::Leave { .. } => EventKind::Leave,
            Event::Pass { .. } => EventKind::Pass,
            Event::Fail { .. } => EventKind::Fail,
            Event::Skip { .. } => EventKind::Skip,
            Event::Extra { .. } => EventKind::Extra,
            Event::End => EventKind::End,
            Event::Error { .. } => EventKind::Error,
        }
    }

    /// Path of the node the event belongs to. Empty for `start` and `end`.
    pub fn path(&self) -> &[Segment] {
        match self {
            Event::Start | Event::End => &[],
            Event::Enter { path, .. }
            | Event::Leave { path }
            | Event::Pass { path, .. }
            | Event::Fail { path, .. }
            | Event::Skip { path }
            | Event::Extra { path, .. }
            | Event::Error { path, .. } => path.segments(),
        }
    }

    pub fn timing(&self) -> Option<&Timing> {
        match self {
            Event::Enter { data, .. } | Event::Pass { data, .. } | Event::Fail { data, .. } => {
                Some(data)
            }
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Event::Fail { value, .. } | Event::Error { value, .. } => Some(value),
            Event::Extra { value, .. } => value.value.as_ref(),
            _ => None,
        }
    }
}
