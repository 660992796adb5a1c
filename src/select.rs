//! Deterministic filtering and sharding of discovered tests.
//!
//! One [`TestSelector`] is created per orchestration run and reused for every framework. Its counter is never
//! reset, so shards partition the union of all frameworks' tests as one continuous stream:
//!
//! 1. Sort each framework's tests by name (byte-wise, stable).
//! 2. Drop tests whose full name does not match the anchored name pattern.
//! 3. Give each surviving test the next ordinal from the run-wide counter.
//! 4. Keep the test if no shard is configured, or if `ordinal % total == index`.

use regex::Regex;
use testrig_interface::TestDefinition;

/// One shard out of `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShardSpec {
    index: u64,
    total: u64,
}

impl ShardSpec {
    /// Returns `None` unless `total > 0` and `index < total`.
    pub fn new(index: u64, total: u64) -> Option<Self> {
        (index < total).then_some(Self { index, total })
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Whether the test at `ordinal` belongs to this shard.
    pub fn contains(&self, ordinal: u64) -> bool {
        ordinal % self.total == self.index
    }
}

/// A regular expression that must match a whole test name.
#[derive(Debug, Clone)]
pub struct NamePattern {
    source: String,
    regex: Regex,
}

impl NamePattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as written, without anchors.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// Run-wide filter and shard state.
#[derive(Debug)]
pub struct TestSelector {
    pattern: Option<NamePattern>,
    shard: Option<ShardSpec>,
    counter: u64,
}

impl TestSelector {
    pub fn new(pattern: Option<NamePattern>, shard: Option<ShardSpec>) -> Self {
        Self {
            pattern,
            shard,
            counter: 0,
        }
    }

    /// A selector that keeps everything (still sorts).
    pub fn unfiltered() -> Self {
        Self::new(None, None)
    }

    /// Number of tests that passed the name filter so far, across all calls.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Sort, filter and shard one framework's tests.
    pub fn select(&mut self, mut tests: Vec<TestDefinition>) -> Vec<TestDefinition> {
        tests.sort_by(|a, b| a.name().cmp(b.name()));

        let mut selected = Vec::new();
        for test in tests {
            if self.pattern.as_ref().is_some_and(|p| !p.is_match(test.name())) {
                continue;
            }

            let ordinal = self.counter;
            self.counter += 1;

            if self.shard.is_none_or(|shard| shard.contains(ordinal)) {
                selected.push(test);
            }
        }
        selected
    }
}
