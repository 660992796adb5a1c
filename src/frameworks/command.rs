//! Command tests: standalone executables annotated as tests.
//!
//! A command test passes when the program exits with status 0. The framework arguments become the program's argv
//! and the scope hint, if any, is exported as `TESTRIG_TEST_SCOPE`.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Instant;

use testrig_interface::{
    COMMAND_ANNOTATION, CaseError, Event, EventSink, Fingerprint, Framework, Resolver, Runner, ScopeHint, Status,
    Suite, TestDefinition,
};

use super::COMMAND;

/// Environment variable carrying the scope hint into a command test.
pub const SCOPE_VAR: &str = "TESTRIG_TEST_SCOPE";

/// Runs one executable.
#[derive(Debug, Clone)]
pub struct CommandSuite {
    program: PathBuf,
}

impl CommandSuite {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Suite for CommandSuite {
    fn cases(&self) -> Vec<String> {
        Vec::new()
    }

    fn run(&self, case: Option<&str>, args: &[String]) -> Result<(), CaseError> {
        let mut command = Command::new(&self.program);
        command.args(args).stdin(Stdio::null());
        if let Some(scope) = case {
            command.env(SCOPE_VAR, scope);
        }
        let output = command
            .output()
            .map_err(|err| CaseError::Errored(format!("failed to launch '{}': {err}", self.program.display())))?;
        if output.status.success() {
            return Ok(());
        }
        let mut message = format!("'{}' exited with {}", self.program.display(), output.status);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim_end();
        if !stderr.is_empty() {
            message.push('\n');
            message.push_str(stderr);
        }
        Err(CaseError::Failed(message))
    }
}

#[derive(Debug, Default)]
pub struct CommandFramework;

impl Framework for CommandFramework {
    fn name(&self) -> &str {
        COMMAND
    }

    fn fingerprints(&self) -> Vec<Fingerprint> {
        vec![Fingerprint::annotated(COMMAND_ANNOTATION, false)]
    }

    fn runner(&self, context: Arc<dyn Resolver>, args: &[String]) -> Box<dyn Runner> {
        Box::new(CommandRunner {
            context,
            args: args.to_vec(),
        })
    }
}

struct CommandRunner {
    context: Arc<dyn Resolver>,
    args: Vec<String>,
}

impl Runner for CommandRunner {
    fn run(
        &mut self,
        tests: &[TestDefinition],
        hint: Option<&ScopeHint>,
        sink: &mut dyn EventSink,
    ) -> Result<(), String> {
        for test in tests {
            let name = test.name();
            sink.suite_started(name);
            let started = Instant::now();
            let event = match self.context.resolve_suite(name) {
                Ok(suite) => match suite.run(hint.map(ScopeHint::as_str), &self.args) {
                    Ok(()) => Event::new(name, None, Status::Success),
                    Err(err) => Event::new(name, None, err.status()).with_message(err.message()),
                },
                Err(err) => Event::new(name, None, Status::Error).with_message(err.to_string()),
            };
            sink.event(event.with_duration(started.elapsed()));
            sink.suite_finished(name);
        }
        Ok(())
    }
}
