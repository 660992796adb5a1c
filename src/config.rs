//! Run configuration.
//!
//! Everything the orchestrator needs is collected once at startup into a [`Config`]: command-line settings plus
//! the selectors an invoking harness passes through environment variables. Core logic only ever sees the
//! `Config`; it never reads the process environment itself.

use std::collections::HashMap;
use std::path::PathBuf;

use testrig_interface::ScopeHint;
use tracing::warn;

use crate::error::FatalError;
use crate::isolation::IsolationMode;
use crate::logging::{ColorChoice, Verbosity};
use crate::select::{NamePattern, ShardSpec};

/// Single-test selector: `PATTERN[#SCOPE]`.
pub const TEST_ONLY_VAR: &str = "TESTBRIDGE_TEST_ONLY";
/// Zero-based shard index.
pub const SHARD_INDEX_VAR: &str = "TEST_SHARD_INDEX";
/// Number of shards.
pub const TOTAL_SHARDS_VAR: &str = "TEST_TOTAL_SHARDS";
/// File touched to tell the harness that sharding is supported.
pub const STATUS_FILE_VAR: &str = "TEST_SHARD_STATUS_FILE";

/// A parsed single-test selector.
///
/// The part before the first `#` is a name pattern matched against whole test names; the part after it narrows
/// execution to a nested scope inside the selected tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOnly {
    pub pattern: Option<String>,
    pub hint: Option<ScopeHint>,
}

impl TestOnly {
    pub fn parse(raw: &str) -> Self {
        let (pattern, scope) = match raw.split_once('#') {
            Some((pattern, scope)) => (pattern, Some(scope)),
            None => (raw, None),
        };
        Self {
            pattern: (!pattern.is_empty()).then(|| pattern.to_string()),
            hint: scope.and_then(ScopeHint::new),
        }
    }
}

/// Selectors provided by the invoking harness.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSelectors {
    pub test_only: Option<TestOnly>,
    pub shard: Option<ShardSpec>,
    pub status_file: Option<PathBuf>,
}

impl EnvSelectors {
    /// Read selectors from a variable map.
    ///
    /// ## Errors
    /// - Shard variables that are not non-negative integers.
    /// - A shard index outside `0..total`, or a total of zero.
    ///
    /// ## Notes
    /// - Only one of the two shard variables being set is not an error: sharding stays off and a warning is logged.
    /// - Empty values count as unset.
    pub fn from_map(env: &HashMap<String, String>) -> Result<Self, FatalError> {
        let get = |var: &str| env.get(var).map(String::as_str).filter(|v| !v.is_empty());

        let shard = match (get(SHARD_INDEX_VAR), get(TOTAL_SHARDS_VAR)) {
            (Some(index), Some(total)) => {
                let index = parse_count(SHARD_INDEX_VAR, index)?;
                let total = parse_count(TOTAL_SHARDS_VAR, total)?;
                Some(ShardSpec::new(index, total).ok_or(FatalError::InvalidShard { index, total })?)
            }
            (None, None) => None,
            (Some(_), None) | (None, Some(_)) => {
                warn!("only one of {SHARD_INDEX_VAR} and {TOTAL_SHARDS_VAR} is set; sharding disabled");
                None
            }
        };

        Ok(Self {
            test_only: get(TEST_ONLY_VAR).map(TestOnly::parse),
            shard,
            status_file: get(STATUS_FILE_VAR).map(PathBuf::from),
        })
    }

    pub fn from_process_env() -> Result<Self, FatalError> {
        Self::from_map(&std::env::vars().collect())
    }
}

fn parse_count(var: &'static str, value: &str) -> Result<u64, FatalError> {
    value.trim().parse().map_err(|_| FatalError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

/// Complete configuration of one orchestration run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Symbol index produced by the build.
    pub index: PathBuf,
    /// Framework identifiers, in load order.
    pub frameworks: Vec<String>,
    pub classpath: Vec<PathBuf>,
    /// Entries of `classpath` loaded once and shared by every isolated batch.
    pub shared_classpath: Vec<PathBuf>,
    pub isolation: IsolationMode,
    pub verbosity: Verbosity,
    pub color: ColorChoice,
    /// Arguments handed unchanged to every framework runner.
    pub framework_args: Vec<String>,
    pub test_only: Option<TestOnly>,
    pub shard: Option<ShardSpec>,
    pub status_file: Option<PathBuf>,
}

impl Config {
    /// Create a config with default settings for the given index.
    pub fn new(index: impl Into<PathBuf>) -> Self {
        Self {
            index: index.into(),
            frameworks: Vec::new(),
            classpath: Vec::new(),
            shared_classpath: Vec::new(),
            isolation: IsolationMode::default(),
            verbosity: Verbosity::default(),
            color: ColorChoice::default(),
            framework_args: Vec::new(),
            test_only: None,
            shard: None,
            status_file: None,
        }
    }

    pub fn with_framework(mut self, id: impl Into<String>) -> Self {
        self.frameworks.push(id.into());
        self
    }

    pub fn with_classpath_entry(mut self, entry: impl Into<PathBuf>, shared: bool) -> Self {
        let entry = entry.into();
        if shared {
            self.shared_classpath.push(entry.clone());
        }
        self.classpath.push(entry);
        self
    }

    pub fn with_isolation(mut self, mode: IsolationMode) -> Self {
        self.isolation = mode;
        self
    }

    pub fn with_test_only(mut self, raw: &str) -> Self {
        self.test_only = Some(TestOnly::parse(raw));
        self
    }

    pub fn with_shard(mut self, shard: ShardSpec) -> Self {
        self.shard = Some(shard);
        self
    }

    pub fn with_status_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.status_file = Some(path.into());
        self
    }

    /// Apply environment selectors. Values already set on the config win.
    pub fn with_env(mut self, env: EnvSelectors) -> Self {
        self.test_only = self.test_only.or(env.test_only);
        self.shard = self.shard.or(env.shard);
        self.status_file = self.status_file.or(env.status_file);
        self
    }

    /// Compile the name pattern of the single-test selector, if any.
    pub fn name_pattern(&self) -> Result<Option<NamePattern>, FatalError> {
        let Some(pattern) = self.test_only.as_ref().and_then(|t| t.pattern.as_deref()) else {
            return Ok(None);
        };
        NamePattern::new(pattern)
            .map(Some)
            .map_err(|source| FatalError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn scope_hint(&self) -> Option<&ScopeHint> {
        self.test_only.as_ref().and_then(|t| t.hint.as_ref())
    }
}
