//! The capability contract every test framework implements.
//!
//! The orchestrator loads a [`Framework`] by identifier, asks it for its [`Fingerprint`]s to discover tests, and
//! then asks it for a [`Runner`] bound to an execution context. The runner drives the framework's own execution
//! protocol and streams [`Event`](crate::Event)s back.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::definition::TestDefinition;
use crate::event::EventSink;
use crate::fingerprint::Fingerprint;
use crate::library::Suite;

/// Narrows a run to one nested test or scope.
///
/// A hint matches a case named exactly like the hint, or any case below it when case names are `/`-separated
/// scope paths (`parser/empty input` is below `parser`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeHint(String);

impl ScopeHint {
    /// Returns `None` for an empty hint.
    pub fn new(hint: impl Into<String>) -> Option<Self> {
        let hint = hint.into();
        if hint.is_empty() { None } else { Some(Self(hint)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, case: &str) -> bool {
        case == self.0 || case.strip_prefix(self.0.as_str()).is_some_and(|rest| rest.starts_with('/'))
    }
}

impl fmt::Display for ScopeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failure to resolve a name inside an execution context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    NotFound { name: String, context: String },
    /// A contract name that the host context does not define.
    BridgeNotInHost { name: String },
    /// The name resolves, but not to a suite.
    NotASuite { name: String },
    Instantiation { name: String, message: String },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NotFound { name, context } => write!(f, "'{name}' was not found in context '{context}'"),
            ResolveError::BridgeNotInHost { name } => {
                write!(f, "contract name '{name}' is not provided by the host context")
            }
            ResolveError::NotASuite { name } => write!(f, "'{name}' does not resolve to a suite"),
            ResolveError::Instantiation { name, message } => write!(f, "failed to instantiate '{name}': {message}"),
        }
    }
}

impl Error for ResolveError {}

/// What a runner sees of its execution context.
pub trait Resolver: Send + Sync {
    /// Human-readable label, used in diagnostics.
    fn label(&self) -> &str;

    /// Resolve `name` to a suite instance.
    ///
    /// ## Notes
    /// - Instances are created at most once per owning context. Resolving the same name twice through the same
    ///   context yields the same instance.
    fn resolve_suite(&self, name: &str) -> Result<Arc<dyn Suite>, ResolveError>;
}

/// Executes already-selected tests inside one execution context.
pub trait Runner {
    /// Run `tests` in order, streaming events into `sink`.
    ///
    /// ## Returns
    /// - `Ok(())` when the framework ran to completion (individual test failures are reported as events).
    /// - `Err(message)` when the framework itself could not run the batch.
    fn run(&mut self, tests: &[TestDefinition], hint: Option<&ScopeHint>, sink: &mut dyn EventSink)
    -> Result<(), String>;
}

/// A loaded test framework.
pub trait Framework: Send + Sync {
    fn name(&self) -> &str;

    /// Predicates used to recognize this framework's tests in the symbol index.
    fn fingerprints(&self) -> Vec<Fingerprint>;

    /// Build a runner bound to `context`.
    ///
    /// `args` are passed through unchanged from the orchestrator configuration.
    fn runner(&self, context: Arc<dyn Resolver>, args: &[String]) -> Box<dyn Runner>;
}
