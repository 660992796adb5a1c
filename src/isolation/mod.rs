//! Isolation strategies: which execution context each batch of tests runs in.
//!
//! ## Notes
//! - `shared`: one context over the whole classpath, reused by every batch. Cheapest, no isolation.
//! - `isolated`: the shared-classpath subset is loaded once into a base context; every batch gets a fresh child
//!   context over the remaining entries, so suite instances defined there never leak between batches.
//! - `process`: accepted on the command line but not implemented; building the strategy fails.

pub mod classpath;
pub mod context;

use std::fmt;
use std::sync::Arc;

use clap::ValueEnum;
use tracing::debug;

pub use classpath::{Classpath, ClasspathEntry, DirectoryLibrary, DirectoryLoader, LibraryLoader};
pub use context::{BridgeRule, ExecutionContext, Source};

use crate::error::FatalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum IsolationMode {
    #[default]
    Shared,
    Isolated,
    Process,
}

impl fmt::Display for IsolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IsolationMode::Shared => "shared",
            IsolationMode::Isolated => "isolated",
            IsolationMode::Process => "process",
        };
        f.write_str(name)
    }
}

enum Layout {
    Shared,
    Isolated { entries: Vec<ClasspathEntry> },
}

/// Produces the base context and one context per batch.
pub struct IsolationStrategy {
    mode: IsolationMode,
    base: Arc<ExecutionContext>,
    layout: Layout,
}

impl IsolationStrategy {
    /// ## Errors
    /// [`FatalError::UnsupportedIsolation`] for [`IsolationMode::Process`].
    pub fn new(mode: IsolationMode, classpath: &Classpath, host: &Arc<ExecutionContext>) -> Result<Self, FatalError> {
        let (base, layout) = match mode {
            IsolationMode::Shared => (ExecutionContext::child("shared", classpath.all(), host), Layout::Shared),
            IsolationMode::Isolated => (
                ExecutionContext::child("shared", classpath.shared_entries(), host),
                Layout::Isolated {
                    entries: classpath.isolated_entries(),
                },
            ),
            IsolationMode::Process => return Err(FatalError::UnsupportedIsolation { mode }),
        };
        debug!("isolation mode '{mode}' over {} classpath entries", classpath.len());
        Ok(Self { mode, base, layout })
    }

    pub fn mode(&self) -> IsolationMode {
        self.mode
    }

    /// Context frameworks are loaded in.
    pub fn base_context(&self) -> Arc<ExecutionContext> {
        Arc::clone(&self.base)
    }

    /// Context for one framework's batch.
    pub fn batch_context(&self, framework_id: &str) -> Arc<ExecutionContext> {
        match &self.layout {
            Layout::Shared => Arc::clone(&self.base),
            Layout::Isolated { entries } => {
                ExecutionContext::child(format!("isolated:{framework_id}"), entries.clone(), &self.base)
            }
        }
    }
}

impl fmt::Debug for IsolationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsolationStrategy")
            .field("mode", &self.mode)
            .field("base", &self.base.id())
            .finish()
    }
}
