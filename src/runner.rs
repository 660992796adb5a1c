//! Runner driver: executes one framework's batch and folds its events into a summary.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use testrig_interface::{Event, EventSink, Runner, ScopeHint, Status, TestDefinition};
use tracing::{error, info, warn};

/// Result of one framework's batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub framework: String,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
    pub ignored: usize,
    pub duration: Duration,
    /// The runner returned an error or panicked.
    pub aborted: bool,
}

impl RunSummary {
    pub fn new(framework: impl Into<String>) -> Self {
        Self {
            framework: framework.into(),
            ..Self::default()
        }
    }

    /// Whether the batch passed: no failure or error event and no aborted runner.
    pub fn passed(&self) -> bool {
        self.failed == 0 && self.errored == 0 && !self.aborted
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errored + self.skipped + self.ignored
    }

    pub fn record(&mut self, status: Status) {
        match status {
            Status::Success => self.passed += 1,
            Status::Failure => self.failed += 1,
            Status::Error => self.errored += 1,
            Status::Skipped => self.skipped += 1,
            Status::Ignored => self.ignored += 1,
        }
    }

    /// `"3 passed, 1 failed"`, without timing.
    pub fn counts(&self) -> String {
        let parts: Vec<String> = [
            (self.passed, "passed"),
            (self.failed, "failed"),
            (self.errored, "errored"),
            (self.skipped, "skipped"),
            (self.ignored, "ignored"),
        ]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, label)| format!("{count} {label}"))
        .collect();
        if parts.is_empty() {
            "no tests ran".to_string()
        } else {
            parts.join(", ")
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} in {:.2}s", self.framework, self.counts(), self.duration.as_secs_f64())?;
        if self.aborted {
            f.write_str(" (aborted)")?;
        }
        Ok(())
    }
}

/// Forwards every event immediately while counting statuses.
struct TallySink<'a> {
    inner: &'a mut dyn EventSink,
    summary: RunSummary,
}

impl EventSink for TallySink<'_> {
    fn suite_started(&mut self, suite: &str) {
        self.inner.suite_started(suite);
    }

    fn event(&mut self, event: Event) {
        self.summary.record(event.status);
        self.inner.event(event);
    }

    fn suite_finished(&mut self, suite: &str) {
        self.inner.suite_finished(suite);
    }
}

/// Run `tests` through `runner`, streaming events into `sink`.
///
/// ## Notes
/// - A runner error or panic is logged, marks the batch aborted and fails it. It never propagates.
#[tracing::instrument(skip_all, fields(framework = framework, tests = tests.len()))]
pub fn execute(
    framework: &str,
    runner: &mut dyn Runner,
    tests: &[TestDefinition],
    hint: Option<&ScopeHint>,
    sink: &mut dyn EventSink,
) -> RunSummary {
    let started = Instant::now();
    let mut tally = TallySink {
        inner: sink,
        summary: RunSummary::new(framework),
    };

    let result = panic::catch_unwind(AssertUnwindSafe(|| runner.run(tests, hint, &mut tally)));
    match result {
        Ok(Ok(())) => {}
        Ok(Err(message)) => {
            error!("framework '{framework}' failed to run its tests: {message}");
            tally.summary.aborted = true;
        }
        Err(payload) => {
            error!("framework '{framework}' panicked: {}", panic_message(payload.as_ref()));
            tally.summary.aborted = true;
        }
    }

    let mut summary = tally.summary;
    summary.duration = started.elapsed();
    if summary.passed() {
        info!("{summary}");
    } else {
        warn!("{summary}");
    }
    summary
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
