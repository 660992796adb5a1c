//! End-to-end orchestration tests
//!
//! Frameworks and suites are registered in memory; the symbol index and status files live in scratch
//! directories.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use tempfile::TempDir;
use testrig::cli::ExitCode;
use testrig::cli::commands::render_listing;
use testrig::discovery::TestDiscovery;
use testrig::frameworks::{COMMAND, NATIVE, host_context, host_context_with};
use testrig::interface::{
    COMMAND_ANNOTATION, CaseError, Definition, Event, EventSink, Fingerprint, Framework, Library, Resolver, Runner,
    SUITE_SUPERTYPE, ScopeHint, StaticLibrary, Status, Suite, TestDefinition,
};
use testrig::isolation::LibraryLoader;
use testrig::{Config, FatalError, IsolationMode, Orchestrator, ShardSpec, SymbolIndex};

// =============================================================================
// Fixtures
// =============================================================================

/// Resolves classpath paths to in-memory libraries; unknown paths provide nothing.
#[derive(Default)]
struct MemoryLoader {
    libraries: HashMap<PathBuf, StaticLibrary>,
}

impl MemoryLoader {
    fn with(mut self, path: &str, library: StaticLibrary) -> Self {
        self.libraries.insert(PathBuf::from(path), library);
        self
    }
}

impl LibraryLoader for MemoryLoader {
    fn load(&self, path: &Path) -> Arc<dyn Library> {
        Arc::new(self.libraries.get(path).cloned().unwrap_or_default())
    }
}

/// Recognizes symbols carrying its annotation and reports each as passed, or failed when the name says so.
struct Tagged {
    annotation: &'static str,
}

impl Framework for Tagged {
    fn name(&self) -> &str {
        self.annotation
    }

    fn fingerprints(&self) -> Vec<Fingerprint> {
        vec![Fingerprint::annotated(self.annotation, false)]
    }

    fn runner(&self, _context: Arc<dyn Resolver>, _args: &[String]) -> Box<dyn Runner> {
        Box::new(TaggedRunner)
    }
}

struct TaggedRunner;

impl Runner for TaggedRunner {
    fn run(
        &mut self,
        tests: &[TestDefinition],
        _hint: Option<&ScopeHint>,
        sink: &mut dyn EventSink,
    ) -> Result<(), String> {
        for test in tests {
            let status = if test.name().contains("fail") { Status::Failure } else { Status::Success };
            sink.event(Event::new(test.name(), None, status));
        }
        Ok(())
    }
}

fn tagged(annotation: &'static str) -> Definition {
    Definition::framework(move || Ok(Box::new(Tagged { annotation }) as Box<dyn Framework>))
}

/// Fails on its second run, which only happens when an instance is reused.
#[derive(Default)]
struct RunOnce {
    runs: AtomicUsize,
}

impl Suite for RunOnce {
    fn cases(&self) -> Vec<String> {
        Vec::new()
    }

    fn run(&self, _case: Option<&str>, _args: &[String]) -> Result<(), CaseError> {
        let run = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        if run == 1 { Ok(()) } else { Err(format!("state leaked: run #{run}").into()) }
    }
}

struct Math;

impl Suite for Math {
    fn cases(&self) -> Vec<String> {
        ["adds/small", "adds/large", "divides"].map(String::from).to_vec()
    }

    fn run(&self, _case: Option<&str>, _args: &[String]) -> Result<(), CaseError> {
        Ok(())
    }
}

struct Outcome(Result<(), CaseError>);

impl Suite for Outcome {
    fn cases(&self) -> Vec<String> {
        Vec::new()
    }

    fn run(&self, _case: Option<&str>, _args: &[String]) -> Result<(), CaseError> {
        self.0.clone()
    }
}

fn suite<S: Suite + 'static>(make: fn() -> S) -> Definition {
    Definition::suite(move || Ok(Arc::new(make()) as Arc<dyn Suite>))
}

fn host_library() -> StaticLibrary {
    StaticLibrary::new()
        .with("fw.First", tagged("first"))
        .with("fw.Second", tagged("second"))
        .with("fw.Broken", Definition::framework(|| Err("missing runtime".to_string())))
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Write a symbol index and return its path.
    fn index(&self, symbols: serde_json::Value) -> PathBuf {
        let path = self.dir.path().join("index.json");
        fs::write(&path, json!({ "symbols": symbols }).to_string()).unwrap();
        path
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

fn tagged_symbol(name: &str, annotation: &str) -> serde_json::Value {
    json!({ "name": name, "kind": "function", "annotations": [annotation] })
}

fn suite_symbol(name: &str) -> serde_json::Value {
    json!({ "name": name, "kind": "module", "parents": [SUITE_SUPERTYPE] })
}

fn orchestrator(config: Config, extra: StaticLibrary) -> Orchestrator {
    Orchestrator::new(config, host_context_with(extra))
}

fn run(orchestrator: &Orchestrator) -> (testrig::RunOutcome, Vec<Event>) {
    let mut events: Vec<Event> = Vec::new();
    let outcome = orchestrator.run(&mut events).unwrap();
    (outcome, events)
}

fn event_names(events: &[Event]) -> Vec<String> {
    events.iter().map(Event::display_name).collect()
}

// =============================================================================
// Selection across frameworks
// =============================================================================

#[test]
fn shard_counter_spans_frameworks() {
    let ws = Workspace::new();
    let index = ws.index(json!([
        tagged_symbol("d", "second"),
        tagged_symbol("a", "first"),
        tagged_symbol("c", "second"),
        tagged_symbol("b", "first"),
    ]));
    let config = Config::new(index)
        .with_framework("fw.First")
        .with_framework("fw.Second")
        .with_shard(ShardSpec::new(1, 2).unwrap());

    let (outcome, events) = run(&orchestrator(config, host_library()));

    assert!(outcome.passed);
    assert_eq!(event_names(&events), ["b", "d"]);
}

#[test]
fn shards_partition_the_whole_run() {
    let ws = Workspace::new();
    let index = ws.index(json!([
        tagged_symbol("a", "first"),
        tagged_symbol("b", "first"),
        tagged_symbol("c", "first"),
        tagged_symbol("d", "second"),
        tagged_symbol("e", "second"),
    ]));

    let mut all = Vec::new();
    for shard in 0..3 {
        let config = Config::new(&index)
            .with_framework("fw.First")
            .with_framework("fw.Second")
            .with_shard(ShardSpec::new(shard, 3).unwrap());
        let (_, events) = run(&orchestrator(config, host_library()));
        all.extend(event_names(&events));
    }
    all.sort();
    assert_eq!(all, ["a", "b", "c", "d", "e"]);
}

#[test]
fn name_pattern_matching_nothing_is_a_vacuous_pass() {
    let ws = Workspace::new();
    let index = ws.index(json!([tagged_symbol("a.fails", "first")]));
    let config = Config::new(index).with_framework("fw.First").with_test_only("nothing\\.here");

    let (outcome, events) = run(&orchestrator(config, host_library()));

    assert!(outcome.passed);
    assert!(outcome.summaries.is_empty());
    assert!(events.is_empty());
    assert_eq!(outcome.exit_code(), ExitCode::SUCCESS);
}

#[test]
fn name_pattern_is_anchored() {
    let ws = Workspace::new();
    let index = ws.index(json!([tagged_symbol("a.Math", "first"), tagged_symbol("a.MathSuite", "first")]));
    let config = Config::new(index).with_framework("fw.First").with_test_only("a\\.Math");

    let (_, events) = run(&orchestrator(config, host_library()));

    assert_eq!(event_names(&events), ["a.Math"]);
}

#[test]
fn no_frameworks_is_a_vacuous_pass() {
    let ws = Workspace::new();
    let config = Config::new(ws.index(json!([tagged_symbol("a", "first")])));

    let (outcome, _) = run(&orchestrator(config, host_library()));

    assert!(outcome.passed);
}

#[test]
fn list_reports_selection_without_running() {
    let ws = Workspace::new();
    let index = ws.index(json!([
        tagged_symbol("z.fails", "first"),
        tagged_symbol("b.ok", "first"),
        tagged_symbol("a.ok", "second"),
        suite_symbol("t.Math"),
    ]));
    let config = Config::new(index)
        .with_framework("fw.First")
        .with_framework("fw.Second")
        .with_framework(NATIVE);
    let extra = host_library().with("t.Math", suite(|| Math));

    let batches = orchestrator(config, extra).list().unwrap();

    let frameworks: Vec<_> = batches.iter().map(|b| b.framework.as_str()).collect();
    assert_eq!(frameworks, ["fw.First", "fw.Second", NATIVE]);
    insta::assert_snapshot!(render_listing(&batches), @r"
    b.ok
    z.fails
    a.ok
    t.Math
    ");
}

// =============================================================================
// Outcomes
// =============================================================================

#[test]
fn failing_test_fails_the_run() {
    let ws = Workspace::new();
    let index = ws.index(json!([tagged_symbol("a.ok", "first"), tagged_symbol("b.fails", "second")]));
    let config = Config::new(index).with_framework("fw.First").with_framework("fw.Second");

    let (outcome, _) = run(&orchestrator(config, host_library()));

    assert!(!outcome.passed);
    assert_eq!(outcome.exit_code(), ExitCode::FAILURE);
    let verdicts: Vec<_> = outcome.summaries.iter().map(|s| (s.framework.as_str(), s.passed())).collect();
    assert_eq!(verdicts, [("fw.First", true), ("fw.Second", false)]);
}

#[test]
fn broken_framework_does_not_block_others() {
    let ws = Workspace::new();
    let index = ws.index(json!([tagged_symbol("a.ok", "first")]));
    let config = Config::new(index)
        .with_framework("fw.Broken")
        .with_framework("fw.Missing")
        .with_framework("fw.First");

    let (outcome, events) = run(&orchestrator(config, host_library()));

    assert!(outcome.passed);
    assert_eq!(outcome.load_failures, 2);
    assert_eq!(event_names(&events), ["a.ok"]);
}

#[test]
fn scope_hint_reaches_the_runner() {
    let ws = Workspace::new();
    let index = ws.index(json!([suite_symbol("t.Math")]));
    let config = Config::new(index).with_framework(NATIVE).with_test_only("t\\.Math#adds");
    let extra = StaticLibrary::new().with("t.Math", suite(|| Math));

    let (outcome, events) = run(&orchestrator(config, extra));

    assert!(outcome.passed);
    assert_eq!(event_names(&events), ["t.Math::adds/small", "t.Math::adds/large"]);
}

/// Reports one fixed test for every framework, whatever the index holds.
struct FixedDiscovery;

impl TestDiscovery for FixedDiscovery {
    fn discover(&self, _framework: &dyn Framework, _index: &SymbolIndex) -> Vec<TestDefinition> {
        vec![TestDefinition::new("cached.fails", Fingerprint::annotated("first", false))]
    }
}

#[test]
fn discovery_can_be_replaced() {
    let ws = Workspace::new();
    let config = Config::new(ws.index(json!([tagged_symbol("a.ok", "first")]))).with_framework("fw.First");

    let orchestrator = orchestrator(config, host_library()).with_discovery(FixedDiscovery);
    assert_eq!(orchestrator.config().frameworks, ["fw.First"]);
    let (outcome, events) = run(&orchestrator);

    assert!(!outcome.passed);
    assert_eq!(event_names(&events), ["cached.fails"]);
}

#[cfg(unix)]
#[test]
fn classpath_executables_run_through_the_command_framework() {
    use std::os::unix::fs::PermissionsExt;

    let ws = Workspace::new();
    let bin = ws.path("classpath").join("bin");
    fs::create_dir_all(&bin).unwrap();
    for (name, code) in [("ok", 0), ("fails", 1)] {
        let script = bin.join(name);
        fs::write(&script, format!("#!/bin/sh\nexit {code}\n")).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    }
    let symbol = |name: &str| json!({ "name": name, "kind": "function", "annotations": [COMMAND_ANNOTATION] });
    let index = ws.index(json!([symbol("bin.ok"), symbol("bin.fails"), symbol("bin.absent")]));
    let config = Config::new(index)
        .with_framework(COMMAND)
        .with_classpath_entry(ws.path("classpath"), false);

    let (outcome, events) = run(&Orchestrator::new(config, host_context()));

    assert!(!outcome.passed);
    let verdicts: Vec<_> = events.iter().map(|e| (e.display_name(), e.status)).collect();
    assert_eq!(
        verdicts,
        [
            ("bin.absent".to_string(), Status::Error),
            ("bin.fails".to_string(), Status::Failure),
            ("bin.ok".to_string(), Status::Success),
        ]
    );
}

// =============================================================================
// Isolation
// =============================================================================

fn leak_fixture(mode: IsolationMode) -> (Workspace, Orchestrator) {
    let ws = Workspace::new();
    let index = ws.index(json!([suite_symbol("t.RunOnce")]));
    let config = Config::new(index)
        .with_framework(NATIVE)
        .with_framework(NATIVE)
        .with_classpath_entry("deps", true)
        .with_classpath_entry("tests", false)
        .with_isolation(mode);
    let loader = MemoryLoader::default().with("tests", StaticLibrary::new().with("t.RunOnce", suite(RunOnce::default)));
    let orchestrator = orchestrator(config, StaticLibrary::new()).with_loader(loader);
    (ws, orchestrator)
}

#[test]
fn isolated_batches_do_not_share_state() {
    let (_ws, orchestrator) = leak_fixture(IsolationMode::Isolated);

    let (outcome, events) = run(&orchestrator);

    assert_eq!(events.len(), 2);
    assert!(outcome.passed, "{events:?}");
}

#[test]
fn shared_mode_reuses_suite_instances() {
    let (_ws, orchestrator) = leak_fixture(IsolationMode::Shared);

    let (outcome, events) = run(&orchestrator);

    assert!(!outcome.passed);
    assert_eq!(events[1].message.as_deref(), Some("state leaked: run #2"));
}

#[test]
fn bridge_names_resolve_from_host_in_every_mode() {
    for mode in [IsolationMode::Shared, IsolationMode::Isolated] {
        let ws = Workspace::new();
        let index = ws.index(json!([suite_symbol("testrig.interface.Probe")]));
        let config = Config::new(index)
            .with_framework(NATIVE)
            .with_classpath_entry("tests", false)
            .with_isolation(mode);
        let host = StaticLibrary::new().with("testrig.interface.Probe", suite(|| Outcome(Ok(()))));
        let shadow = StaticLibrary::new().with(
            "testrig.interface.Probe",
            suite(|| Outcome(Err(CaseError::Failed("resolved from the test classpath".into())))),
        );
        let orchestrator = orchestrator(config, host).with_loader(MemoryLoader::default().with("tests", shadow));

        let (outcome, events) = run(&orchestrator);

        assert!(outcome.passed, "{mode}: {events:?}");
    }
}

#[test]
fn process_isolation_is_rejected() {
    let ws = Workspace::new();
    let config = Config::new(ws.index(json!([]))).with_isolation(IsolationMode::Process);

    let err = orchestrator(config, StaticLibrary::new()).run(&mut Vec::<Event>::new()).unwrap_err();

    assert!(matches!(err, FatalError::UnsupportedIsolation { .. }));
    insta::assert_snapshot!(err.to_string(), @"isolation mode 'process' is not implemented");
}

// =============================================================================
// Inputs
// =============================================================================

#[test]
fn unreadable_index_is_fatal_with_path() {
    let ws = Workspace::new();
    let missing = ws.path("missing.json");
    let config = Config::new(&missing).with_framework("fw.First");

    let err = orchestrator(config, host_library()).run(&mut Vec::<Event>::new()).unwrap_err();

    match err {
        FatalError::IndexRead { path, .. } => assert_eq!(path, missing),
        other => panic!("expected IndexRead, got {other:?}"),
    }
}

#[test]
fn malformed_index_is_fatal() {
    let ws = Workspace::new();
    let path = ws.path("index.json");
    fs::write(&path, "{ not json").unwrap();

    let err = orchestrator(Config::new(path), host_library()).run(&mut Vec::<Event>::new()).unwrap_err();

    assert!(matches!(err, FatalError::IndexParse { .. }));
}

#[test]
fn status_file_is_created() {
    let ws = Workspace::new();
    let status = ws.path("status");
    let config = Config::new(ws.index(json!([]))).with_status_file(&status);

    run(&orchestrator(config, StaticLibrary::new()));

    assert!(status.is_file());
}

#[test]
fn status_file_is_refreshed() {
    let ws = Workspace::new();
    let status = ws.path("status");
    fs::write(&status, "").unwrap();
    let old = std::time::SystemTime::now() - std::time::Duration::from_secs(3600);
    fs::File::options().write(true).open(&status).unwrap().set_modified(old).unwrap();
    let config = Config::new(ws.index(json!([]))).with_status_file(&status);

    run(&orchestrator(config, StaticLibrary::new()));

    assert!(fs::metadata(&status).unwrap().modified().unwrap() > old);
}
