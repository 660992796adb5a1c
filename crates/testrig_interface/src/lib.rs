//! Provide the contract types shared between the testrig orchestrator and test frameworks.
//!
//! Everything a framework needs to plug into a run lives here: how it recognizes tests in a symbol index
//! ([`Fingerprint`]), how it is handed the tests to run ([`TestDefinition`], [`ScopeHint`]), how it resolves
//! runnable code ([`Resolver`], [`Suite`]) and how it reports progress ([`Event`], [`EventSink`]).
//!
//! ## Notes
//!
//! - This is the "bridge" crate: names under [`BRIDGE_PREFIX`] always resolve from the orchestrator's host
//!   context, never from an isolated test context, so both sides agree on type identity.
//! - The crate has **no dependencies**, no IO and no global state. Frameworks depend on it alone.

pub mod definition;
pub mod event;
pub mod fingerprint;
pub mod framework;
pub mod library;

pub use definition::TestDefinition;
pub use event::{Event, EventSink, Status};
pub use fingerprint::{Fingerprint, SymbolKind, SymbolShape, TestKind};
pub use framework::{Framework, ResolveError, Resolver, Runner, ScopeHint};
pub use library::{CaseError, Definition, FrameworkFactory, Library, StaticLibrary, Suite, SuiteFactory};

/// Name prefix reserved for contract symbols.
///
/// Contexts resolve any name starting with this prefix from the host context only.
pub const BRIDGE_PREFIX: &str = "testrig.interface.";

/// Supertype a symbol lists among its parents to be recognized as a native suite.
pub const SUITE_SUPERTYPE: &str = "testrig.interface.Suite";

/// Annotation marking a standalone executable as a command test.
pub const COMMAND_ANNOTATION: &str = "testrig.interface.Command";
