//! Structural predicates frameworks use to recognize runnable tests.
//!
//! A fingerprint never looks at code. It only inspects the [`SymbolShape`] recorded in the symbol index by the
//! upstream build step: the symbol's kind, visibility, declared parents and annotations.

/// Kind of a top-level symbol as recorded in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SymbolKind {
    /// A type that has to be instantiated before use.
    #[default]
    Type,
    /// A singleton declaration (one instance per execution context).
    Module,
    /// A free-standing entry point, such as an executable or a function.
    Function,
}

/// Structural shape of one top-level symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolShape {
    pub name: String,
    pub kind: SymbolKind,
    pub is_abstract: bool,
    pub is_public: bool,
    pub parents: Vec<String>,
    pub annotations: Vec<String>,
}

impl SymbolShape {
    /// Create a public, concrete symbol with no parents or annotations.
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_abstract: false,
            is_public: true,
            parents: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    pub fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn private(mut self) -> Self {
        self.is_public = false;
        self
    }

    pub fn is_module(&self) -> bool {
        self.kind == SymbolKind::Module
    }

    /// Whether a runner could ever obtain an instance of this symbol.
    fn is_runnable(&self) -> bool {
        self.is_public && !self.is_abstract
    }
}

/// Whether a discovered test is one test or a group of nested cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestKind {
    Single,
    Group,
}

/// A framework-defined predicate over symbol shapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fingerprint {
    /// Matches symbols that list `supertype` among their parents.
    ///
    /// `is_module` selects between singleton suites ([`SymbolKind::Module`]) and instantiable ones
    /// ([`SymbolKind::Type`]).
    Subclass { supertype: String, is_module: bool },
    /// Matches symbols carrying `annotation`. Functions count as non-module symbols.
    Annotated { annotation: String, is_module: bool },
}

impl Fingerprint {
    pub fn subclass(supertype: impl Into<String>, is_module: bool) -> Self {
        Fingerprint::Subclass {
            supertype: supertype.into(),
            is_module,
        }
    }

    pub fn annotated(annotation: impl Into<String>, is_module: bool) -> Self {
        Fingerprint::Annotated {
            annotation: annotation.into(),
            is_module,
        }
    }

    /// Check whether `shape` is a runnable test under this fingerprint.
    ///
    /// ## Notes
    /// - Private and abstract symbols never match.
    /// - Subclass fingerprints never match functions.
    pub fn matches(&self, shape: &SymbolShape) -> bool {
        if !shape.is_runnable() {
            return false;
        }
        match self {
            Fingerprint::Subclass { supertype, is_module } => {
                let expected = if *is_module { SymbolKind::Module } else { SymbolKind::Type };
                shape.kind == expected && shape.parents.iter().any(|p| p == supertype)
            }
            Fingerprint::Annotated { annotation, is_module } => {
                shape.is_module() == *is_module && shape.annotations.iter().any(|a| a == annotation)
            }
        }
    }

    /// Subclass matches are suites of nested cases; annotated matches are single tests.
    pub fn kind(&self) -> TestKind {
        match self {
            Fingerprint::Subclass { .. } => TestKind::Group,
            Fingerprint::Annotated { .. } => TestKind::Single,
        }
    }
}
