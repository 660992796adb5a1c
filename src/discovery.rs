//! Test discovery: matching a framework's fingerprints against the symbol index.

use testrig_interface::{Framework, TestDefinition};

use crate::index::SymbolIndex;

// ============================================================================
// Discovery Interface
// ============================================================================

/// Find the tests a framework recognizes.
///
/// Separates how tests are found from how they are selected and run, so embedders can swap in cached or
/// pre-computed discovery.
pub trait TestDiscovery {
    fn discover(&self, framework: &dyn Framework, index: &SymbolIndex) -> Vec<TestDefinition>;
}

/// Discovery from the symbol index alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct IndexDiscovery;

impl TestDiscovery for IndexDiscovery {
    fn discover(&self, framework: &dyn Framework, index: &SymbolIndex) -> Vec<TestDefinition> {
        discover(framework, index)
    }
}

// ============================================================================
// Matching
// ============================================================================

/// One definition per symbol matched by any of the framework's fingerprints.
///
/// ## Notes
/// - Fingerprints are tried in the order the framework declares them; the first match wins.
/// - Output follows index order, which callers must not rely on.
#[tracing::instrument(skip_all, fields(framework = framework.name(), symbols = index.len()))]
pub fn discover(framework: &dyn Framework, index: &SymbolIndex) -> Vec<TestDefinition> {
    let fingerprints = framework.fingerprints();
    let tests: Vec<TestDefinition> = index
        .shapes()
        .filter_map(|shape| {
            fingerprints
                .iter()
                .find(|fp| fp.matches(shape))
                .map(|fp| TestDefinition::new(shape.name.clone(), fp.clone()))
        })
        .collect();
    tracing::debug!("discovered {} tests", tests.len());
    tests
}
