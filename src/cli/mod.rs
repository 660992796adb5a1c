//! CLI module for the testrig orchestrator
//!
//! ## Commands
//!
//! - `run` - Discover, select and execute tests; exit 0 when everything passed, 1 otherwise
//! - `list` - Discover and select only, printing the selected test names in execution order
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.
//!
//! Environment selectors (`TESTBRIDGE_TEST_ONLY`, `TEST_SHARD_INDEX`, `TEST_TOTAL_SHARDS`,
//! `TEST_SHARD_STATUS_FILE`) are read here, once, and folded into the [`Config`].

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use crate::config::{Config, EnvSelectors};
use crate::error::FatalError;
use crate::isolation::IsolationMode;
use crate::logging::{self, ColorChoice, Verbosity};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// At least one test failed.
    pub const FAILURE: ExitCode = ExitCode(1);
    /// The run was aborted before executing tests.
    pub const FATAL: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a fatal error (exit code 2).
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FATAL)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Render the diagnostic with its code, help and source chain.
impl From<FatalError> for CliError {
    fn from(err: FatalError) -> Self {
        Self::fatal(format!("{:?}", miette::Report::new(err)))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Test-execution orchestrator
#[derive(Parser, Debug)]
#[command(name = "testrig")]
#[command(version = VERSION)]
#[command(about = "Discover, shard and run tests across pluggable frameworks", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the selected tests
    Run(RunArgs),

    /// Print the selected tests without running them
    List(RunArgs),
}

impl Command {
    pub fn args(&self) -> &RunArgs {
        match self {
            Command::Run(args) | Command::List(args) => args,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Symbol index written by the build
    #[arg(long, value_name = "PATH")]
    pub index: PathBuf,

    /// Framework identifier to load (repeatable, load order is kept)
    #[arg(long = "framework", value_name = "ID")]
    pub frameworks: Vec<String>,

    /// Classpath entry (repeatable)
    #[arg(long = "classpath", value_name = "PATH")]
    pub classpath: Vec<PathBuf>,

    /// Classpath entry shared by every isolated batch (repeatable)
    #[arg(long = "shared-classpath", value_name = "PATH")]
    pub shared_classpath: Vec<PathBuf>,

    #[arg(long, value_enum, default_value_t = IsolationMode::Shared)]
    pub isolation: IsolationMode,

    #[arg(long, value_enum, default_value_t = Verbosity::Medium)]
    pub verbosity: Verbosity,

    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Argument handed to every framework runner (repeatable)
    #[arg(long = "framework-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub framework_args: Vec<String>,

    /// Single-test selector `PATTERN[#SCOPE]`, overrides TESTBRIDGE_TEST_ONLY
    #[arg(long, value_name = "SELECTOR")]
    pub test_only: Option<String>,
}

impl RunArgs {
    /// Combine flags with environment selectors. Flags win.
    pub fn into_config(self, env: EnvSelectors) -> Config {
        let mut config = Config::new(self.index).with_isolation(self.isolation);
        config.frameworks = self.frameworks;
        config.classpath = self.classpath;
        config.shared_classpath = self.shared_classpath;
        config.verbosity = self.verbosity;
        config.color = self.color;
        config.framework_args = self.framework_args;
        if let Some(raw) = &self.test_only {
            config = config.with_test_only(raw);
        }
        config.with_env(env)
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    let args = cli.command.args();
    logging::init(args.verbosity, args.color);

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code != ExitCode::SUCCESS {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let env = EnvSelectors::from_process_env()?;
    match cli.command {
        Command::Run(args) => commands::run_tests(args.into_config(env)),
        Command::List(args) => commands::list_tests(args.into_config(env)),
    }
}

// ============================================================================
// Tests
// ============================================================================
