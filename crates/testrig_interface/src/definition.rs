//! Discovered test definitions.

use crate::fingerprint::{Fingerprint, TestKind};

/// One test a framework recognized in the symbol index.
///
/// Created during discovery and consumed by runners. Fields are private so a definition cannot change after it has
/// been discovered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestDefinition {
    name: String,
    fingerprint: Fingerprint,
    kind: TestKind,
}

impl TestDefinition {
    pub fn new(name: impl Into<String>, fingerprint: Fingerprint) -> Self {
        let kind = fingerprint.kind();
        Self {
            name: name.into(),
            fingerprint,
            kind,
        }
    }

    /// Fully-qualified symbol name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The fingerprint that matched, needed to re-invoke the test.
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn kind(&self) -> TestKind {
        self.kind
    }

    pub fn is_group(&self) -> bool {
        self.kind == TestKind::Group
    }
}
