//! Execution events streamed from runners to the orchestrator.

use std::fmt;
use std::time::Duration;

/// Outcome of one executed case or suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    /// An assertion did not hold.
    Failure,
    /// The test could not run to completion (missing code, crash, launch failure).
    Error,
    Skipped,
    Ignored,
}

impl Status {
    /// Whether this status fails the run.
    pub fn is_failure(self) -> bool {
        matches!(self, Status::Failure | Status::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Success => "PASSED",
            Status::Failure => "FAILED",
            Status::Error => "ERROR",
            Status::Skipped => "SKIPPED",
            Status::Ignored => "IGNORED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reported result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Fully-qualified name of the test definition this event belongs to.
    pub suite: String,
    /// Nested case name, `None` when the event covers the whole definition.
    pub case: Option<String>,
    pub status: Status,
    pub duration: Duration,
    pub message: Option<String>,
}

impl Event {
    pub fn new(suite: impl Into<String>, case: Option<String>, status: Status) -> Self {
        Self {
            suite: suite.into(),
            case,
            status,
            duration: Duration::ZERO,
            message: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// `suite::case`, or just `suite` for suite-level events.
    pub fn display_name(&self) -> String {
        match &self.case {
            Some(case) => format!("{}::{}", self.suite, case),
            None => self.suite.clone(),
        }
    }
}

/// Receives events as they happen.
///
/// Implementations must not buffer until the end of a run: progress has to be visible if the process is
/// interrupted.
pub trait EventSink {
    /// Called before the first case of a test definition runs.
    fn suite_started(&mut self, _suite: &str) {}

    /// Called once per executed (or skipped) case.
    fn event(&mut self, event: Event);

    /// Called after the last case of a test definition ran.
    fn suite_finished(&mut self, _suite: &str) {}
}

/// Collects events in memory.
impl EventSink for Vec<Event> {
    fn event(&mut self, event: Event) {
        self.push(event);
    }
}
