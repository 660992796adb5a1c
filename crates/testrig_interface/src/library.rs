//! Named definitions contributed by classpath entries.
//!
//! A [`Library`] is what one classpath entry provides: a lookup from fully-qualified names to [`Definition`]s.
//! Definitions are factories, not instances. Execution contexts decide when to instantiate them and how long
//! instances live, which is what makes isolation between contexts possible.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::event::Status;
use crate::framework::Framework;

/// Why a case did not pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseError {
    /// The case ran and an expectation did not hold.
    Failed(String),
    /// The case could not run.
    Errored(String),
}

impl CaseError {
    pub fn status(&self) -> Status {
        match self {
            CaseError::Failed(_) => Status::Failure,
            CaseError::Errored(_) => Status::Error,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CaseError::Failed(m) | CaseError::Errored(m) => m,
        }
    }
}

impl From<String> for CaseError {
    fn from(message: String) -> Self {
        CaseError::Failed(message)
    }
}

impl From<&str> for CaseError {
    fn from(message: &str) -> Self {
        CaseError::Failed(message.to_string())
    }
}

/// Runnable code behind a test definition.
pub trait Suite: Send + Sync {
    /// Names of the nested cases. Empty when the suite runs as one unit.
    fn cases(&self) -> Vec<String>;

    /// Run one case, or the whole suite when `case` is `None`.
    ///
    /// Suites without nested cases receive the requested scope (if any) as `case`.
    fn run(&self, case: Option<&str>, args: &[String]) -> Result<(), CaseError>;
}

pub type FrameworkFactory = Arc<dyn Fn() -> Result<Box<dyn Framework>, String> + Send + Sync>;
pub type SuiteFactory = Arc<dyn Fn() -> Result<Arc<dyn Suite>, String> + Send + Sync>;

/// A named, instantiable item.
#[derive(Clone)]
pub enum Definition {
    Framework(FrameworkFactory),
    Suite(SuiteFactory),
}

impl Definition {
    pub fn framework<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Framework>, String> + Send + Sync + 'static,
    {
        Definition::Framework(Arc::new(factory))
    }

    pub fn suite<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Suite>, String> + Send + Sync + 'static,
    {
        Definition::Suite(Arc::new(factory))
    }

    pub fn is_framework(&self) -> bool {
        matches!(self, Definition::Framework(_))
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Definition::Framework(_) => f.write_str("Definition::Framework(..)"),
            Definition::Suite(_) => f.write_str("Definition::Suite(..)"),
        }
    }
}

/// Lookup from names to definitions.
pub trait Library: Send + Sync {
    fn lookup(&self, name: &str) -> Option<Definition>;
}

/// A library backed by an in-memory table.
#[derive(Debug, Clone, Default)]
pub struct StaticLibrary {
    definitions: HashMap<String, Definition>,
}

impl StaticLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition, replacing any previous one with the same name.
    pub fn with(mut self, name: impl Into<String>, definition: Definition) -> Self {
        self.insert(name, definition);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, definition: Definition) {
        self.definitions.insert(name.into(), definition);
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Library for StaticLibrary {
    fn lookup(&self, name: &str) -> Option<Definition> {
        self.definitions.get(name).cloned()
    }
}
