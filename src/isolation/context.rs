//! Execution contexts: layered name resolution with per-context instances.
//!
//! A context owns an ordered list of classpath entries and optionally a parent. Resolving a name walks an
//! explicit [`Source`] order instead of relying on inheritance:
//!
//! - names covered by the [`BridgeRule`] resolve from the host context only,
//! - every other name resolves from the local entries first, then from the parent.
//!
//! Suites are instantiated lazily and cached in the context whose entries define them. A suite reached through a
//! parent is therefore the parent's instance, while a suite defined in a child is private to that child.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use testrig_interface::{BRIDGE_PREFIX, Definition, ResolveError, Resolver, Suite, SuiteFactory};
use tracing::debug;

use super::classpath::ClasspathEntry;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Names that must resolve to the same definition on both sides of an isolation boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeRule {
    prefixes: Vec<String>,
}

impl BridgeRule {
    pub fn new(prefixes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn covers(&self, name: &str) -> bool {
        self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }
}

impl Default for BridgeRule {
    fn default() -> Self {
        Self::new([BRIDGE_PREFIX])
    }
}

/// Where a context looks for a name, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Host,
    Local,
    Parent,
}

/// An isolation boundary that resolves names to definitions and suite instances.
pub struct ExecutionContext {
    id: u64,
    label: String,
    entries: Vec<ClasspathEntry>,
    parent: Option<Arc<ExecutionContext>>,
    /// `None` for the host context itself.
    host: Option<Arc<ExecutionContext>>,
    bridge: BridgeRule,
    suites: Mutex<HashMap<String, Arc<dyn Suite>>>,
}

impl ExecutionContext {
    /// Create the orchestrator's own context.
    pub fn host(entries: Vec<ClasspathEntry>, bridge: BridgeRule) -> Arc<Self> {
        Arc::new(Self::build("host".to_string(), entries, None, None, bridge))
    }

    /// Create a context layered on top of `parent`. The host and bridge rule are inherited.
    pub fn child(label: impl Into<String>, entries: Vec<ClasspathEntry>, parent: &Arc<Self>) -> Arc<Self> {
        let host = match &parent.host {
            Some(host) => Arc::clone(host),
            None => Arc::clone(parent),
        };
        let context = Self::build(
            label.into(),
            entries,
            Some(Arc::clone(parent)),
            Some(host),
            parent.bridge.clone(),
        );
        debug!(
            "created context '{}' (#{}) with {} entries over '{}'",
            context.label,
            context.id,
            context.entries.len(),
            parent.label
        );
        Arc::new(context)
    }

    fn build(
        label: String,
        entries: Vec<ClasspathEntry>,
        parent: Option<Arc<Self>>,
        host: Option<Arc<Self>>,
        bridge: BridgeRule,
    ) -> Self {
        Self {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
            label,
            entries,
            parent,
            host,
            bridge,
            suites: Mutex::new(HashMap::new()),
        }
    }

    /// Unique id, distinct for every context created in this process.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_host(&self) -> bool {
        self.host.is_none()
    }

    pub fn entries(&self) -> &[ClasspathEntry] {
        &self.entries
    }

    pub fn parent(&self) -> Option<&Arc<ExecutionContext>> {
        self.parent.as_ref()
    }

    /// The order in which sources are consulted for `name`.
    pub fn resolution_order(&self, name: &str) -> Vec<Source> {
        if self.is_host() {
            return vec![Source::Local];
        }
        if self.bridge.covers(name) {
            return vec![Source::Host];
        }
        let mut order = vec![Source::Local];
        if self.parent.is_some() {
            order.push(Source::Parent);
        }
        order
    }

    /// Find `name` and the context that owns its definition.
    fn locate(&self, name: &str) -> Option<(&ExecutionContext, Definition)> {
        for source in self.resolution_order(name) {
            let found = match source {
                Source::Host => self.host.as_deref().and_then(|host| host.locate(name)),
                Source::Local => self.lookup_local(name).map(|definition| (self, definition)),
                Source::Parent => self.parent.as_deref().and_then(|parent| parent.locate(name)),
            };
            if found.is_some() {
                return found;
            }
        }
        None
    }

    fn lookup_local(&self, name: &str) -> Option<Definition> {
        self.entries.iter().find_map(|entry| entry.library.lookup(name))
    }

    /// Resolve `name` to its definition without instantiating it.
    pub fn definition(&self, name: &str) -> Option<Definition> {
        self.locate(name).map(|(_, definition)| definition)
    }

    /// Label of the context that would provide `name`.
    pub fn owner_of(&self, name: &str) -> Option<&str> {
        self.locate(name).map(|(owner, _)| owner.label.as_str())
    }

    fn instantiate(&self, name: &str, factory: &SuiteFactory) -> Result<Arc<dyn Suite>, ResolveError> {
        let mut suites = self.suites.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(suite) = suites.get(name) {
            return Ok(Arc::clone(suite));
        }
        let suite = factory().map_err(|message| ResolveError::Instantiation {
            name: name.to_string(),
            message,
        })?;
        debug!("instantiated '{name}' in context '{}'", self.label);
        suites.insert(name.to_string(), Arc::clone(&suite));
        Ok(suite)
    }
}

impl Resolver for ExecutionContext {
    fn label(&self) -> &str {
        &self.label
    }

    fn resolve_suite(&self, name: &str) -> Result<Arc<dyn Suite>, ResolveError> {
        let Some((owner, definition)) = self.locate(name) else {
            if !self.is_host() && self.bridge.covers(name) {
                return Err(ResolveError::BridgeNotInHost { name: name.to_string() });
            }
            return Err(ResolveError::NotFound {
                name: name.to_string(),
                context: self.label.clone(),
            });
        };
        match definition {
            Definition::Suite(factory) => owner.instantiate(name, &factory),
            Definition::Framework(_) => Err(ResolveError::NotASuite { name: name.to_string() }),
        }
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("entries", &self.entries)
            .field("parent", &self.parent.as_ref().map(|p| p.label.as_str()))
            .field("is_host", &self.is_host())
            .finish()
    }
}
