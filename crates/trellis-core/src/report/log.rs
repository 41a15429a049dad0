use super::{Event, Reporter, Speed};
use crate::config::ReporterConfig;

/// Reporter that writes the event stream to `tracing`.
///
/// Used when a suite runs without a registered reporter. Failures are logged
/// at `warn`, passes at `info` (or `debug` when `show_passes` is off).
#[derive(Debug, Clone, Default)]
pub struct TracingReporter {
    config: ReporterConfig,
}

impl TracingReporter {
    pub fn new(config: ReporterConfig) -> Self {
        Self { config }
    }

    /// Factory usable with [`Suite::reporter`](crate::Suite::reporter).
    pub fn from_options(options: Option<ReporterConfig>) -> Self {
        Self::new(options.unwrap_or_default())
    }
}

impl Reporter for TracingReporter {
    fn report(&mut self, event: &Event) {
        match event {
            Event::Start => tracing::info!("run started"),
            Event::End => tracing::info!("run finished"),
            Event::Enter { path, .. } => tracing::debug!(%path, "enter"),
            Event::Leave { path } => tracing::debug!(%path, "leave"),
            Event::Pass { path, data } => {
                let ms = data.duration.as_millis() as u64;
                match (data.speed(), self.config.show_passes) {
                    (Speed::Slow, _) => tracing::info!(%path, ms, "pass (slow)"),
                    (_, true) => tracing::info!(%path, ms, "pass"),
                    (_, false) => tracing::debug!(%path, ms, "pass"),
                }
            }
            Event::Fail { path, value, data } => {
                let ms = data.duration.as_millis() as u64;
                tracing::warn!(%path, ms, "fail: {}", value)
            }
            Event::Skip { path } => {
                if self.config.show_skipped {
                    tracing::info!(%path, "skip");
                } else {
                    tracing::debug!(%path, "skip");
                }
            }
            Event::Extra { path, value } => match &value.value {
                Some(failure) => tracing::warn!(%path, count = value.count, "extra: {}", failure),
                None => tracing::warn!(%path, count = value.count, "extra completion"),
            },
            Event::Error { path, value } => tracing::error!(%path, "error: {}", value),
        }
    }
}
