#![forbid(unsafe_code)]
//! testrig: a test-execution orchestrator
//!
//! testrig sits between a build tool and any number of test frameworks. From a pre-computed symbol index it
//! discovers tests per framework, filters and shards them deterministically across the whole run, and executes
//! each framework's batch inside an execution context chosen by the isolation policy.
//!
//! The contract frameworks implement lives in the `testrig_interface` crate, re-exported here as [`interface`].
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Framework code**: panics raised by framework factories, runners or suites are caught at the loader and
//!   runner boundaries and reported as failures. They never abort the run.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod frameworks;
pub mod index;
pub mod isolation;
pub mod loader;
pub mod logging;
pub mod orchestrator;
pub mod runner;
pub mod select;
pub mod status_file;

pub use testrig_interface as interface;

pub use config::{Config, EnvSelectors, TestOnly};
pub use error::{FatalError, LoadError};
pub use index::SymbolIndex;
pub use isolation::{IsolationMode, IsolationStrategy};
pub use orchestrator::{Batch, Orchestrator, RunOutcome};
pub use runner::RunSummary;
pub use select::{NamePattern, ShardSpec, TestSelector};
