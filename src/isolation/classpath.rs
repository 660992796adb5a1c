//! Classpath entries and the libraries behind them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use testrig_interface::{Definition, Library, StaticLibrary, Suite};
use tracing::{debug, warn};

use crate::frameworks::command::CommandSuite;

/// One location on the classpath together with what it provides.
#[derive(Clone)]
pub struct ClasspathEntry {
    pub path: PathBuf,
    pub library: Arc<dyn Library>,
}

impl ClasspathEntry {
    pub fn new(path: impl Into<PathBuf>, library: Arc<dyn Library>) -> Self {
        Self {
            path: path.into(),
            library,
        }
    }
}

impl fmt::Debug for ClasspathEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClasspathEntry").field(&self.path).finish()
    }
}

/// Turns a classpath location into a library.
pub trait LibraryLoader {
    fn load(&self, path: &Path) -> Arc<dyn Library>;
}

/// Loads directories of executables as [`DirectoryLibrary`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectoryLoader;

impl LibraryLoader for DirectoryLoader {
    fn load(&self, path: &Path) -> Arc<dyn Library> {
        if !path.is_dir() {
            warn!("classpath entry '{}' is not a directory; it provides nothing", path.display());
            return Arc::new(StaticLibrary::new());
        }
        Arc::new(DirectoryLibrary::new(path))
    }
}

/// A directory where `a.b.C` names the executable `<root>/a/b/C`.
#[derive(Debug, Clone)]
pub struct DirectoryLibrary {
    root: PathBuf,
}

impl DirectoryLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a dotted name to a path below the root, rejecting names that could escape it.
    pub fn path_for(&self, name: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        for segment in name.split('.') {
            if segment.is_empty() || segment.contains(['/', '\\']) {
                return None;
            }
            path.push(segment);
        }
        Some(path)
    }
}

impl Library for DirectoryLibrary {
    fn lookup(&self, name: &str) -> Option<Definition> {
        let program = self.path_for(name).filter(|p| p.is_file())?;
        debug!("'{name}' resolves to {}", program.display());
        Some(Definition::suite(move || {
            Ok(Arc::new(CommandSuite::new(program.clone())) as Arc<dyn Suite>)
        }))
    }
}

/// Classpath split into the entries shared by every batch and the rest.
#[derive(Debug, Clone, Default)]
pub struct Classpath {
    entries: Vec<ClasspathEntry>,
    shared: Vec<bool>,
}

impl Classpath {
    /// Load every path through `loader`.
    ///
    /// ## Notes
    /// - Entries keep the order of `paths`.
    /// - A shared path that is not in `paths` is ignored with a warning.
    pub fn load(loader: &dyn LibraryLoader, paths: &[PathBuf], shared: &[PathBuf]) -> Self {
        for path in shared {
            if !paths.contains(path) {
                warn!("shared classpath entry '{}' is not on the classpath; ignoring it", path.display());
            }
        }
        let mut classpath = Self::default();
        for path in paths {
            classpath.push(ClasspathEntry::new(path.clone(), loader.load(path)), shared.contains(path));
        }
        classpath
    }

    pub fn push(&mut self, entry: ClasspathEntry, shared: bool) {
        self.entries.push(entry);
        self.shared.push(shared);
    }

    pub fn all(&self) -> Vec<ClasspathEntry> {
        self.entries.clone()
    }

    pub fn shared_entries(&self) -> Vec<ClasspathEntry> {
        self.partition(true)
    }

    pub fn isolated_entries(&self) -> Vec<ClasspathEntry> {
        self.partition(false)
    }

    fn partition(&self, shared: bool) -> Vec<ClasspathEntry> {
        self.entries
            .iter()
            .zip(&self.shared)
            .filter(|(_, is_shared)| **is_shared == shared)
            .map(|(entry, _)| entry.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
