//! Logging setup and the streaming event sink.
//!
//! All output goes through `tracing`. The CLI installs one `fmt` subscriber on stderr whose filter comes from
//! `RUST_LOG` when set, and from [`Verbosity`] otherwise. Errors and warnings are shown at every verbosity.

use std::io::IsTerminal;
use std::time::Duration;

use clap::ValueEnum;
use testrig_interface::{Event, EventSink, Status};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// How much progress output to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Verbosity {
    /// Errors and warnings only.
    Low,
    /// Adds per-test results and summaries.
    #[default]
    Medium,
    /// Adds discovery, context and suite lifecycle details.
    High,
}

impl Verbosity {
    /// `EnvFilter` directive for this verbosity.
    pub fn directive(self) -> &'static str {
        match self {
            Verbosity::Low => "warn",
            Verbosity::Medium => "info",
            Verbosity::High => "debug",
        }
    }
}

/// When to emit ANSI colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn enabled(self) -> bool {
        match self {
            ColorChoice::Auto => std::io::stderr().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(verbosity: Verbosity, color: ColorChoice) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(color.enabled())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Streams every event to the log as soon as it arrives.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn suite_started(&mut self, suite: &str) {
        debug!("{suite} started");
    }

    fn event(&mut self, event: Event) {
        let name = event.display_name();
        let millis = format_millis(event.duration);
        match (event.status, event.message.as_deref()) {
            (Status::Success, _) => info!("{name} {} ({millis})", event.status),
            (Status::Failure | Status::Error, Some(message)) => {
                error!("{name} {} ({millis})\n{message}", event.status)
            }
            (Status::Failure | Status::Error, None) => error!("{name} {} ({millis})", event.status),
            (Status::Skipped | Status::Ignored, Some(reason)) => info!("{name} {} ({reason})", event.status),
            (Status::Skipped | Status::Ignored, None) => info!("{name} {}", event.status),
        }
    }

    fn suite_finished(&mut self, suite: &str) {
        debug!("{suite} finished");
    }
}

fn format_millis(duration: Duration) -> String {
    format!("{}ms", duration.as_millis())
}

/// Warn once per framework that could not be loaded.
pub(crate) fn report_load_failure(err: &crate::error::LoadError) {
    warn!("skipping framework: {err}");
}
