//! Command implementations for the testrig CLI

use std::io::{self, Write};

use super::{CliError, CliResult, ExitCode};
use crate::config::Config;
use crate::frameworks::host_context;
use crate::logging::LogSink;
use crate::orchestrator::{Batch, Orchestrator};

/// Run every selected test and map the outcome to an exit code.
pub fn run_tests(config: Config) -> CliResult<ExitCode> {
    let orchestrator = Orchestrator::new(config, host_context());
    let outcome = orchestrator.run(&mut LogSink)?;
    Ok(outcome.exit_code())
}

/// Print the selected test names, one per line, in execution order.
pub fn list_tests(config: Config) -> CliResult<ExitCode> {
    let orchestrator = Orchestrator::new(config, host_context());
    let batches = orchestrator.list()?;
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(render_listing(&batches).as_bytes())
        .map_err(|e| CliError::new(format!("Error writing test listing: {e}"), ExitCode::FAILURE))?;
    Ok(ExitCode::SUCCESS)
}

/// One test name per line across all batches.
pub fn render_listing(batches: &[Batch]) -> String {
    let mut out = String::new();
    for test in batches.iter().flat_map(|b| &b.tests) {
        out.push_str(test.name());
        out.push('\n');
    }
    out
}
