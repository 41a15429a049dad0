use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use super::{Event, Path};

/// Totals for one run, returned by [`Suite::run`](crate::Suite::run).
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub passed: usize,
    pub failed: usize,
    /// `beforeAll`/`afterAll` failures reported on a group.
    pub hook_failures: usize,
    pub skipped: usize,
    pub slow: usize,
    pub extras: usize,
    pub errors: usize,
    #[serde(skip)]
    groups: Vec<Path>,
}

impl RunSummary {
    pub(crate) fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            duration: Duration::ZERO,
            passed: 0,
            failed: 0,
            hook_failures: 0,
            skipped: 0,
            slow: 0,
            extras: 0,
            errors: 0,
            groups: Vec::new(),
        }
    }

    /// Counts a single event.
    pub(crate) fn record(&mut self, event: &Event) {
        match event {
            Event::Pass { data, .. } => {
                self.passed += 1;
                if data.is_slow() {
                    self.slow += 1;
                }
            }
            Event::Fail { path, .. } if self.groups.last() == Some(path) => {
                self.hook_failures += 1;
            }
            Event::Fail { data, .. } => {
                self.failed += 1;
                if data.is_slow() {
                    self.slow += 1;
                }
            }
            Event::Skip { .. } => self.skipped += 1,
            Event::Extra { .. } => self.extras += 1,
            Event::Error { .. } => self.errors += 1,
            Event::Enter { path, .. } => self.groups.push(path.clone()),
            Event::Leave { .. } => {
                self.groups.pop();
            }
            Event::Start | Event::End => {}
        }
    }

    /// Number of tests that were reported.
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    /// True when nothing failed. Extra signals do not affect success.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.hook_failures == 0 && self.errors == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::Failure;
    use crate::report::{ExtraCall, Path, Timing};
    use crate::tree::Limit;

    #[test]
    fn test_record_counts_outcomes() {
        let path = Path::default().child("a", 0);
        let slow = Timing::new(Duration::from_millis(100), Limit::Millis(75));
        let fast = Timing::new(Duration::from_millis(1), Limit::Millis(75));

        let mut summary = RunSummary::new();
        for event in [
            Event::Start,
            Event::Pass { path: path.clone(), data: slow },
            Event::Fail {
                path: path.clone(),
                value: Failure::message("x"),
                data: fast,
            },
            Event::Extra {
                path: path.clone(),
                value: ExtraCall { count: 2, value: None },
            },
            Event::Skip { path },
            Event::End,
        ] {
            summary.record(&event);
        }

        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.slow, 1);
        assert_eq!(summary.extras, 1);
        assert_eq!(summary.total(), 3);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_group_failure_is_not_a_test() {
        let group = Path::default().child("g", 0);
        let test = group.child("a", 0);
        let data = Timing::new(Duration::from_millis(1), Limit::Millis(75));

        let mut summary = RunSummary::new();
        for event in [
            Event::Start,
            Event::Enter { path: group.clone(), data },
            Event::Fail {
                path: test,
                value: Failure::message("a"),
                data,
            },
            Event::Fail {
                path: group.clone(),
                value: Failure::message("teardown"),
                data,
            },
            Event::Leave { path: group },
            Event::End,
        ] {
            summary.record(&event);
        }

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.hook_failures, 1);
        assert_eq!(summary.total(), 1);
        assert!(!summary.is_success());
    }
}
