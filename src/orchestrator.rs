//! End-to-end orchestration of one run.
//!
//! Sequencing is strict:
//!
//! 1. Validate the name pattern and touch the status file.
//! 2. Read the symbol index.
//! 3. Load the classpath and build the isolation strategy.
//! 4. Load frameworks in the base context.
//! 5. For each loaded framework, in load order: discover, select, and, if anything was selected, run the batch in
//!    its own batch context.
//!
//! The run passes when every batch passes. No frameworks, or nothing selected, is a pass.

use std::sync::Arc;

use testrig_interface::{EventSink, TestDefinition};
use tracing::{info, warn};

use crate::cli::ExitCode;
use crate::config::Config;
use crate::discovery::{IndexDiscovery, TestDiscovery};
use crate::error::{FatalError, LoadError};
use crate::index::SymbolIndex;
use crate::isolation::{Classpath, DirectoryLoader, ExecutionContext, IsolationStrategy, LibraryLoader};
use crate::loader::{LoadedFramework, load_frameworks};
use crate::runner::{self, RunSummary};
use crate::select::{NamePattern, TestSelector};
use crate::status_file;

/// Outcome of [`Orchestrator::run`].
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub passed: bool,
    /// One per framework that had tests selected, in load order.
    pub summaries: Vec<RunSummary>,
    pub load_failures: usize,
}

impl RunOutcome {
    pub fn exit_code(&self) -> ExitCode {
        if self.passed { ExitCode::SUCCESS } else { ExitCode::FAILURE }
    }
}

/// The tests one framework would run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub framework: String,
    pub tests: Vec<TestDefinition>,
}

/// Everything resolved before the first framework is processed.
struct Plan {
    index: SymbolIndex,
    strategy: IsolationStrategy,
    frameworks: Vec<LoadedFramework>,
    load_failures: Vec<LoadError>,
    selector: TestSelector,
}

pub struct Orchestrator {
    config: Config,
    host: Arc<ExecutionContext>,
    loader: Box<dyn LibraryLoader>,
    discovery: Box<dyn TestDiscovery>,
}

impl Orchestrator {
    /// Create an orchestrator that loads classpath directories from disk and discovers from the index.
    pub fn new(config: Config, host: Arc<ExecutionContext>) -> Self {
        Self {
            config,
            host,
            loader: Box::new(DirectoryLoader),
            discovery: Box::new(IndexDiscovery),
        }
    }

    pub fn with_loader(mut self, loader: impl LibraryLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn with_discovery(mut self, discovery: impl TestDiscovery + 'static) -> Self {
        self.discovery = Box::new(discovery);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute every selected test, streaming events into `sink`.
    ///
    /// ## Errors
    /// Only configuration and input problems are errors. Failing tests and frameworks that cannot be loaded are
    /// reported through the outcome.
    pub fn run(&self, sink: &mut dyn EventSink) -> Result<RunOutcome, FatalError> {
        let pattern = self.config.name_pattern()?;
        if let Some(path) = &self.config.status_file {
            status_file::touch(path)?;
        }
        let mut plan = self.plan(pattern)?;
        let hint = self.config.scope_hint();

        let mut outcome = RunOutcome {
            passed: true,
            summaries: Vec::new(),
            load_failures: plan.load_failures.len(),
        };
        for loaded in &plan.frameworks {
            let discovered = self.discovery.discover(loaded.framework.as_ref(), &plan.index);
            let tests = plan.selector.select(discovered);
            if tests.is_empty() {
                info!("{}: no tests selected", loaded.id);
                continue;
            }

            let context = plan.strategy.batch_context(&loaded.id);
            let mut batch_runner = loaded.framework.runner(context, &self.config.framework_args);
            let summary = runner::execute(&loaded.id, batch_runner.as_mut(), &tests, hint, sink);
            outcome.passed &= summary.passed();
            outcome.summaries.push(summary);
        }

        if outcome.passed {
            info!("run passed ({} frameworks ran)", outcome.summaries.len());
        } else {
            warn!("run failed");
        }
        Ok(outcome)
    }

    /// Discover and select without executing anything.
    ///
    /// Returns one batch per loaded framework, including empty ones, in the order they would run.
    pub fn list(&self) -> Result<Vec<Batch>, FatalError> {
        let pattern = self.config.name_pattern()?;
        let mut plan = self.plan(pattern)?;
        let batches = plan
            .frameworks
            .iter()
            .map(|loaded| {
                let discovered = self.discovery.discover(loaded.framework.as_ref(), &plan.index);
                Batch {
                    framework: loaded.id.clone(),
                    tests: plan.selector.select(discovered),
                }
            })
            .collect();
        Ok(batches)
    }

    fn plan(&self, pattern: Option<NamePattern>) -> Result<Plan, FatalError> {
        let index = SymbolIndex::read(&self.config.index)?;
        let classpath = Classpath::load(self.loader.as_ref(), &self.config.classpath, &self.config.shared_classpath);
        let strategy = IsolationStrategy::new(self.config.isolation, &classpath, &self.host)?;
        let report = load_frameworks(&strategy.base_context(), &self.config.frameworks);
        if report.loaded.is_empty() && !self.config.frameworks.is_empty() {
            warn!("none of the {} configured frameworks could be loaded", self.config.frameworks.len());
        }
        Ok(Plan {
            index,
            strategy,
            frameworks: report.loaded,
            load_failures: report.failures,
            selector: TestSelector::new(pattern, self.config.shard),
        })
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}
