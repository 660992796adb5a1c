//! Native suites: symbols implementing `testrig.interface.Suite` directly.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use testrig_interface::{
    CaseError, Event, EventSink, Fingerprint, Framework, Resolver, Runner, SUITE_SUPERTYPE, ScopeHint, Status, Suite,
    TestDefinition,
};

use super::NATIVE;
use crate::runner::panic_message;

#[derive(Debug, Default)]
pub struct NativeFramework;

impl Framework for NativeFramework {
    fn name(&self) -> &str {
        NATIVE
    }

    fn fingerprints(&self) -> Vec<Fingerprint> {
        vec![Fingerprint::subclass(SUITE_SUPERTYPE, true)]
    }

    fn runner(&self, context: Arc<dyn Resolver>, args: &[String]) -> Box<dyn Runner> {
        Box::new(NativeRunner {
            context,
            args: args.to_vec(),
        })
    }
}

struct NativeRunner {
    context: Arc<dyn Resolver>,
    args: Vec<String>,
}

impl NativeRunner {
    fn run_suite(&self, name: &str, suite: &dyn Suite, hint: Option<&ScopeHint>, sink: &mut dyn EventSink) {
        let cases = suite.cases();
        if cases.is_empty() {
            let event = self.run_case(name, None, suite, hint.map(ScopeHint::as_str));
            sink.event(event);
            return;
        }

        let selected: Vec<&String> = cases.iter().filter(|case| hint.is_none_or(|h| h.matches(case))).collect();
        // Only reachable with a hint.
        if selected.is_empty() {
            let scope = hint.map(ScopeHint::as_str).unwrap_or_default();
            let reason = format!("no case matches scope '{scope}'");
            sink.event(Event::new(name, None, Status::Skipped).with_message(reason));
            return;
        }

        for case in selected {
            let event = self.run_case(name, Some(case.clone()), suite, Some(case.as_str()));
            sink.event(event);
        }
    }

    fn run_case(&self, name: &str, case: Option<String>, suite: &dyn Suite, scope: Option<&str>) -> Event {
        let started = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| suite.run(scope, &self.args)))
            .unwrap_or_else(|payload| Err(CaseError::Failed(format!("panicked: {}", panic_message(payload.as_ref())))));
        let event = match result {
            Ok(()) => Event::new(name, case, Status::Success),
            Err(err) => Event::new(name, case, err.status()).with_message(err.message()),
        };
        event.with_duration(started.elapsed())
    }
}

impl Runner for NativeRunner {
    fn run(
        &mut self,
        tests: &[TestDefinition],
        hint: Option<&ScopeHint>,
        sink: &mut dyn EventSink,
    ) -> Result<(), String> {
        for test in tests {
            let name = test.name();
            sink.suite_started(name);
            match self.context.resolve_suite(name) {
                Ok(suite) => self.run_suite(name, suite.as_ref(), hint, sink),
                Err(err) => sink.event(Event::new(name, None, Status::Error).with_message(err.to_string())),
            }
            sink.suite_finished(name);
        }
        Ok(())
    }
}
