//! Framework loading.
//!
//! Frameworks are looked up by identifier through the base execution context, so a framework can come from the
//! host (built-ins, embedder registrations) or from the classpath. A framework that cannot be loaded is reported
//! and skipped; it never stops the others.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use testrig_interface::{Definition, Framework};
use tracing::debug;

use crate::error::LoadError;
use crate::isolation::ExecutionContext;
use crate::logging::report_load_failure;
use crate::runner::panic_message;

/// A framework instance together with the identifier it was loaded under.
#[derive(Clone)]
pub struct LoadedFramework {
    pub id: String,
    pub framework: Arc<dyn Framework>,
}

impl std::fmt::Debug for LoadedFramework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFramework")
            .field("id", &self.id)
            .field("name", &self.framework.name())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct LoadReport {
    /// In the order the identifiers were given.
    pub loaded: Vec<LoadedFramework>,
    pub failures: Vec<LoadError>,
}

/// Load every framework in `ids`, logging and collecting the failures.
pub fn load_frameworks(context: &ExecutionContext, ids: &[String]) -> LoadReport {
    let mut report = LoadReport::default();
    for id in ids {
        match load_framework(context, id) {
            Ok(loaded) => {
                debug!("loaded framework '{id}' ({})", loaded.framework.name());
                report.loaded.push(loaded);
            }
            Err(err) => {
                report_load_failure(&err);
                report.failures.push(err);
            }
        }
    }
    report
}

/// Load a single framework.
///
/// ## Errors
/// - [`LoadError::NotFound`] when no definition exists for `id`.
/// - [`LoadError::MissingCapability`] when the definition is not a framework.
/// - [`LoadError::Instantiation`] when the factory fails or panics.
pub fn load_framework(context: &ExecutionContext, id: &str) -> Result<LoadedFramework, LoadError> {
    let factory = match context.definition(id) {
        Some(Definition::Framework(factory)) => factory,
        Some(Definition::Suite(_)) => return Err(LoadError::MissingCapability { id: id.to_string() }),
        None => return Err(LoadError::NotFound { id: id.to_string() }),
    };

    let framework = panic::catch_unwind(AssertUnwindSafe(|| factory()))
        .unwrap_or_else(|payload| Err(format!("panicked: {}", panic_message(payload.as_ref()))))
        .map_err(|message| LoadError::Instantiation {
            id: id.to_string(),
            message,
        })?;

    Ok(LoadedFramework {
        id: id.to_string(),
        framework: Arc::from(framework),
    })
}
