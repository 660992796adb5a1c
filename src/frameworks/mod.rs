//! Built-in frameworks and the host library that provides them.

pub mod command;
pub mod native;

use std::sync::Arc;

use testrig_interface::{BRIDGE_PREFIX, Definition, Framework, StaticLibrary};

use crate::isolation::{BridgeRule, ClasspathEntry, ExecutionContext};

pub use command::{CommandFramework, CommandSuite};
pub use native::NativeFramework;

/// Identifier of [`NativeFramework`].
pub const NATIVE: &str = "testrig.frameworks.Native";
/// Identifier of [`CommandFramework`].
pub const COMMAND: &str = "testrig.frameworks.Command";
/// Namespace of the built-in framework identifiers. Names under it always resolve from the host.
pub const BUILTIN_PREFIX: &str = "testrig.frameworks.";

/// Definitions the orchestrator itself provides.
pub fn host_library() -> StaticLibrary {
    StaticLibrary::new()
        .with(NATIVE, Definition::framework(|| Ok(Box::new(NativeFramework) as Box<dyn Framework>)))
        .with(COMMAND, Definition::framework(|| Ok(Box::new(CommandFramework) as Box<dyn Framework>)))
}

/// Host context with only the built-in frameworks.
pub fn host_context() -> Arc<ExecutionContext> {
    host_context_with(StaticLibrary::new())
}

/// Host context with the built-in frameworks plus `extra`. Entries in `extra` take precedence.
pub fn host_context_with(extra: StaticLibrary) -> Arc<ExecutionContext> {
    let entries = vec![
        ClasspathEntry::new("<embedded>", Arc::new(extra)),
        ClasspathEntry::new("<builtin>", Arc::new(host_library())),
    ];
    ExecutionContext::host(entries, BridgeRule::new([BRIDGE_PREFIX, BUILTIN_PREFIX]))
}
