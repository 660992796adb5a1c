//! Error taxonomy for an orchestration run.
//!
//! - [`FatalError`]: configuration or input problems at the orchestrator boundary. The run aborts before any test
//!   executes and the CLI exits non-zero with the rendered diagnostic.
//! - [`LoadError`]: one framework could not be loaded. Logged and skipped; the run continues.
//!
//! Test failures are not errors. They are events folded into the run's pass/fail result.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::isolation::IsolationMode;

#[derive(Debug, Error, Diagnostic)]
pub enum FatalError {
    #[error("failed to read symbol index '{}'", .path.display())]
    #[diagnostic(
        code(testrig::index::read),
        help("the symbol index is written by the build step that compiled the test classpath")
    )]
    IndexRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse symbol index '{}'", .path.display())]
    #[diagnostic(code(testrig::index::parse))]
    IndexParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value '{value}' for {var}: expected a non-negative integer")]
    #[diagnostic(code(testrig::env::invalid))]
    InvalidEnv { var: &'static str, value: String },

    #[error("shard index {index} is out of range for {total} total shards")]
    #[diagnostic(
        code(testrig::env::shard),
        help("TEST_TOTAL_SHARDS must be positive and TEST_SHARD_INDEX lower than it")
    )]
    InvalidShard { index: u64, total: u64 },

    #[error("invalid test filter pattern '{pattern}'")]
    #[diagnostic(code(testrig::filter))]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to touch status file '{}'", .path.display())]
    #[diagnostic(code(testrig::status_file))]
    StatusFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("isolation mode '{mode}' is not implemented")]
    #[diagnostic(
        code(testrig::isolation::unsupported),
        help("use `--isolation shared` or `--isolation isolated`")
    )]
    UnsupportedIsolation { mode: IsolationMode },
}

/// Why a single framework could not be loaded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("framework '{id}' was not found")]
    NotFound { id: String },

    #[error("'{id}' does not provide the framework capability")]
    MissingCapability { id: String },

    #[error("framework '{id}' failed to instantiate: {message}")]
    Instantiation { id: String, message: String },
}

impl LoadError {
    /// Identifier of the framework that failed.
    pub fn id(&self) -> &str {
        match self {
            LoadError::NotFound { id } | LoadError::MissingCapability { id } | LoadError::Instantiation { id, .. } => {
                id
            }
        }
    }
}
